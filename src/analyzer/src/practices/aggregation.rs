//! Aggregation, vector matching and query complexity

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::blank_string_literals;
use crate::types::Finding;

const AGGREGATIONS: [&str; 5] = ["sum", "avg", "min", "max", "count"];

/// Per aggregation: the call itself, and the call with a grouping clause on
/// either side of its argument
static AGGREGATION_PATTERNS: Lazy<Vec<(&'static str, Regex, Regex)>> = Lazy::new(|| {
    AGGREGATIONS
        .iter()
        .map(|&agg| {
            let call = Regex::new(&format!(r"\b{agg}\s*\(")).unwrap();
            let grouped = Regex::new(&format!(
                r"(?s)\b{agg}(?:\s+(?:by|without)\s*\(|\s*\(.*\)\s*(?:by|without)\s*\()"
            ))
            .unwrap();
            (agg, call, grouped)
        })
        .collect()
});
static THRESHOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:>=|<=|==|!=|>|<)\s*[\d.]").unwrap());

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-z_]+\s*\(").unwrap());
static NESTED_AGGREGATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:sum|avg|min|max)\s*\([^)]*\b(?:sum|avg|min|max)\s*\(").unwrap());
static SUBQUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+:[^\]]+\]").unwrap());

static GROUP_MODIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:group_left|group_right)\s*\(").unwrap());
static MATCHING_CLAUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:on|ignoring)\s*\(").unwrap());

/// Aggregations that collapse every label because they name none
///
/// When the query compares against a threshold the collapse is probably
/// intended, and the finding says so.
pub fn check_unbounded_aggregations(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    let is_alert = THRESHOLD.is_match(&blanked);

    AGGREGATION_PATTERNS
        .iter()
        .filter(|(_, call, grouped)| call.is_match(&blanked) && !grouped.is_match(&blanked))
        .map(|(agg, _, _)| {
            let (consequence, recommendation) = if is_alert {
                (
                    " (likely intentional for alerting threshold)".to_string(),
                    "Add by(label) for per-label breakdown".to_string(),
                )
            } else {
                (
                    ": produces a single-value result losing all dimensional data".to_string(),
                    format!("Add by()/without() to {agg}() for explicit label control"),
                )
            };
            Finding::info(
                "missing_aggregation_clause",
                format!("{agg}() without by()/without(){consequence}"),
            )
            .with_recommendation(recommendation)
        })
        .collect()
}

/// Complexity score: many calls, nested aggregation, subqueries, sheer length
fn complexity(query: &str) -> usize {
    [
        FUNCTION_CALL.find_iter(query).count() >= 3,
        NESTED_AGGREGATION.is_match(query),
        SUBQUERY.is_match(query),
        query.chars().count() > 150,
    ]
    .into_iter()
    .filter(|&signal| signal)
    .count()
}

pub fn check_recording_opportunity(query: &str) -> Vec<Finding> {
    if complexity(query) < 2 {
        return Vec::new();
    }
    vec![
        Finding::info(
            "recording_rule_opportunity",
            "Complex query (3+ functions, nested aggregations, or >150 chars): recording rules \
             pre-compute at scrape time for a 10-40x speedup",
        )
        .with_recommendation("Create a level:metric:operations recording rule if used frequently"),
    ]
}

/// group_left/group_right are only valid after on() or ignoring()
pub fn check_vector_matching(query: &str) -> Vec<Finding> {
    let lowered = blank_string_literals(query).to_ascii_lowercase();
    if !GROUP_MODIFIER.is_match(&lowered) || MATCHING_CLAUSE.is_match(&lowered) {
        return Vec::new();
    }
    vec![
        Finding::error(
            "group_without_matching",
            "group_left/right without on()/ignoring(): Prometheus requires explicit label \
             matching for many-to-one joins",
        )
        .with_recommendation("Add on(label1, label2) before group_left/right"),
    ]
}
