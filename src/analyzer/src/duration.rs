//! Duration literals (`5m`, `1h30m`, `250ms`) and their conversion to seconds

use once_cell::sync::Lazy;
use regex::Regex;

/// Units accepted in a PromQL duration, longest first so `ms` wins over `m`
pub const UNITS: [(&str, f64); 7] = [
    ("ms", 0.001),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3_600.0),
    ("d", 86_400.0),
    ("w", 604_800.0),
    ("y", 31_536_000.0),
];

static DURATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+(?:ms|s|m|h|d|w|y))+$").unwrap());
static DURATION_PART: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)(ms|s|m|h|d|w|y)").unwrap());

/// Convert `value` in `unit` to seconds
///
/// Unknown units fall back to a multiplier of 1.
pub fn to_seconds(value: u64, unit: &str) -> f64 {
    let multiplier = UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0);
    value as f64 * multiplier
}

/// True if `text` is a complete duration literal
pub fn is_duration(text: &str) -> bool {
    DURATION.is_match(text)
}

/// Parse a duration literal into seconds, summing compound forms like `1h30m`
pub fn parse_seconds(text: &str) -> Option<f64> {
    if !is_duration(text) {
        return None;
    }
    DURATION_PART
        .captures_iter(text)
        .map(|caps| Some(to_seconds(caps[1].parse().ok()?, &caps[2])))
        .sum()
}
