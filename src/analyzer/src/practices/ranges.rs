//! Range-vector and subquery window checks

use once_cell::sync::Lazy;
use regex::Regex;

use crate::duration::parse_seconds;
use crate::normalize::blank_string_literals;
use crate::types::Finding;

const DAY: f64 = 86_400.0;

static SUBQUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]:]+):([^\]]*)\]").unwrap());
static IRATE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\birate\s*\([^)]*\[([^\]]*)\]").unwrap());
static RATE_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brate\s*\([^)]*\[([^\]]*)\]").unwrap());
static PREDICT_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bpredict_linear\s*\([^)]*\[([^\]]*)\]").unwrap());

/// Ranges captured by `pattern` whose length in seconds satisfies `out_of_bounds`
///
/// Subquery ranges and malformed durations do not parse and are skipped.
fn ranges_where<'q>(
    query: &'q str,
    pattern: &'q Regex,
    out_of_bounds: impl Fn(f64) -> bool + 'q,
) -> impl Iterator<Item = (String, f64)> + 'q {
    pattern.captures_iter(query).filter_map(move |caps| {
        let range = caps[1].trim();
        parse_seconds(range)
            .filter(|&seconds| out_of_bounds(seconds))
            .map(|seconds| (range.to_string(), seconds))
    })
}

/// Subqueries reaching back more than a week
pub fn check_subquery_ranges(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    ranges_where(&blanked, &SUBQUERY, |seconds| seconds > 7.0 * DAY)
        .map(|(range, seconds)| {
            Finding::warning(
                "expensive_subquery",
                format!(
                    "Subquery [{range}] may cause OOM or timeout: {}d of data",
                    (seconds / DAY) as u64
                ),
            )
            .with_recommendation(
                "Use recording rules for ranges >7d, or reduce resolution: [7d:5m]",
            )
        })
        .collect()
}

/// irate() only reads the last two samples, so a long window is wasted
pub fn check_irate_ranges(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    ranges_where(&blanked, &IRATE_RANGE, |seconds| seconds > 300.0)
        .map(|(range, _)| {
            Finding::warning(
                "irate_long_range",
                format!(
                    "irate() with [{range}] only uses the last 2 samples: the extra range is wasted lookback"
                ),
            )
            .with_recommendation(
                "Use rate() for trends over >5m, or irate([2m]) for spike detection",
            )
        })
        .collect()
}

pub fn check_rate_ranges(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    ranges_where(&blanked, &RATE_RANGE, |seconds| seconds < 120.0)
        .map(|(range, _)| {
            Finding::warning(
                "rate_short_range",
                format!("rate() with [{range}] needs >=3 samples for reliable extrapolation"),
            )
            .with_recommendation(">= 4x scrape interval, typically [2m]+ with 30s scrape")
        })
        .collect()
}

pub fn check_predict_ranges(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    ranges_where(&blanked, &PREDICT_RANGE, |seconds| seconds < 600.0)
        .map(|(range, _)| {
            Finding::warning(
                "predict_linear_short_range",
                format!(
                    "predict_linear() with [{range}] has too few data points for reliable linear regression"
                ),
            )
            .with_recommendation(
                "Use [10m]+ for sufficient data points; [1h]+ for production forecasts",
            )
        })
        .collect()
}
