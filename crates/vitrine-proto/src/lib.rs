pub mod caption;
pub mod config;
pub mod platform;
pub mod status;
pub mod uptime;
pub mod wire;
