//! Seed formatting and the deterministic caption fallback.
//!
//! When the remote caption call is unavailable the widget still needs a
//! phrase, so one of eight fixed lines is picked by a rolling hash of the
//! seed. Same seed, same phrase, every run: no randomness, no I/O.

use crate::status::{TrackInfo, TrackStatus};

/// Sentinel seed used when nothing is playing.
pub const SILENCE_SEED: &str = "[SILENCE]";

pub const ACTIVE_PHRASES: [&str; 8] = [
    "Signal locked.",
    "Loud enough to think.",
    "The static parts for this one.",
    "On repeat until further notice.",
    "This one rewires something.",
    "Frequencies aligned.",
    "Transmission worth keeping.",
    "Volume up, world off.",
];

pub const IDLE_PHRASES: [&str; 8] = [
    "Dead air.",
    "Silence is also a frequency.",
    "Nothing on the wire.",
    "The needle rests.",
    "Between transmissions.",
    "Quiet hours.",
    "Standing by.",
    "Room tone only.",
];

/// Seed string for a live track: `"<artist> - <title>"`.
pub fn track_seed(track: &TrackInfo) -> String {
    format!("{} - {}", track.artist, track.track)
}

/// The (activity, seed) pair a status resolves to, or `None` while the
/// widget is still loading. Anything that is not live counts as idle.
pub fn caption_request_for(status: &TrackStatus) -> Option<(bool, String)> {
    match status {
        TrackStatus::Loading => None,
        TrackStatus::Live { track } => Some((true, track_seed(track))),
        TrackStatus::Historical { .. } | TrackStatus::Error => {
            Some((false, SILENCE_SEED.to_string()))
        }
    }
}

/// Composite cache key for the session caption cache.
pub fn cache_key(is_active: bool, seed: &str) -> String {
    if is_active {
        format!("active:{}", seed)
    } else {
        format!("idle:{}", seed)
    }
}

/// Signed 32-bit rolling hash over the seed's UTF-16 code units:
/// `h = unit + ((h << 5) - h)`, accumulated left to right with wrapping
/// arithmetic.
pub fn seed_hash(seed: &str) -> i32 {
    let mut hash: i32 = 0;
    for unit in seed.encode_utf16() {
        hash = (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    hash
}

/// Deterministic local caption: `|hash(seed)| mod 8` into the matching
/// phrase list. Knows nothing about any particular seed.
pub fn fallback_caption(is_active: bool, seed: &str) -> &'static str {
    let phrases = if is_active {
        &ACTIVE_PHRASES
    } else {
        &IDLE_PHRASES
    };
    let idx = seed_hash(seed).unsigned_abs() as usize % phrases.len();
    phrases[idx]
}
