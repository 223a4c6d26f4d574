//! Client-side widget plumbing: the two status fetchers, the caption
//! engine with its session cache, and the pollers that drive them.

pub mod caption;
pub mod frequency;
pub mod player;
pub mod poll;
