//! Declarative best-practice rules
//!
//! Each rule is a single pattern: every match is one finding. Rules that
//! need more than a pattern live in the sibling modules as plain functions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::rule::CheckSpec;
use crate::types::Severity;

pub(super) static BEST_PRACTICE_SPECS: Lazy<Vec<CheckSpec>> = Lazy::new(|| {
    vec![
        CheckSpec::new(
            "averaging_quantiles",
            Regex::new(r"avg\s*\([^)]*\{[^}]*quantile\s*=").unwrap(),
            Severity::Error,
            |_| {
                "Averaging pre-calculated quantiles is mathematically invalid: quantiles are \
                 not additive, and the average of p99s is not the p99 of the union"
                    .to_string()
            },
        )
        .with_recommendation("Use histogram_quantile() over histogram buckets instead"),
        CheckSpec::new(
            "deprecated_function",
            Regex::new(r"\bholt_winters\s*\(").unwrap(),
            Severity::Warning,
            |_| "holt_winters() is deprecated in Prometheus 3.0 and was renamed".to_string(),
        )
        .with_recommendation(
            "Use double_exponential_smoothing() (requires --enable-feature=promql-experimental-functions)",
        ),
        CheckSpec::new(
            "changes_resets_limitation",
            Regex::new(r"\b(changes|resets)\s*\(").unwrap(),
            Severity::Info,
            |caps| {
                format!(
                    "{}() misses events between scrapes because it only sees sampled values",
                    &caps[1]
                )
            },
        )
        .with_recommendation(
            "Consider alternatives for alerting: a higher scrape frequency or event-based metrics",
        ),
        CheckSpec::new(
            "absent_with_aggregation",
            Regex::new(r"absent\s*\(\s*(sum|avg|min|max|count|group|stddev|stdvar)\s*\(").unwrap(),
            Severity::Warning,
            |caps| {
                format!(
                    "absent() wrapping {}() may not detect missing metrics: the aggregation \
                     returns an empty set, not an absent one",
                    &caps[1]
                )
            },
        )
        .with_recommendation("Use: group(present_over_time(m[r])) unless group(m)"),
        CheckSpec::new(
            "absent_with_by",
            Regex::new(r"absent\s*\([^)]+\)\s*by\s*\(").unwrap(),
            Severity::Error,
            |_| {
                "absent() does not support by(): it returns a single-element vector with \
                 fixed labels"
                    .to_string()
            },
        )
        .with_recommendation(
            "Detect per label with present_over_time: count(present_over_time(m[5m])) by (label)",
        ),
        CheckSpec::new(
            "info_metric_missing_group",
            Regex::new(r"\*\s*on\s*\([^)]+\)\s*([a-zA-Z_]+_info)\b").unwrap(),
            Severity::Warning,
            |caps| {
                format!(
                    "Join with info metric {} is missing group_left(), so Prometheus rejects \
                     the many-to-one match",
                    &caps[1]
                )
            },
        )
        .with_recommendation(
            "Add group_left(labels): metric * on(job, instance) group_left(version) info_metric, \
             or use info() (3.0+ experimental)",
        ),
        CheckSpec::new(
            "on_empty_labels",
            Regex::new(r"\bon\s*\(\s*\)").unwrap(),
            Severity::Info,
            |_| "on() with no labels matches all series into a single group".to_string(),
        )
        .with_recommendation("Specify labels: on(job, instance)"),
        CheckSpec::new(
            "division_by_zero_risk",
            Regex::new(r"/\s*(?:rate|increase)\s*\([^)]*(?:_count|_total)[^)]*\)").unwrap(),
            Severity::Info,
            |_| {
                "Division by rate(counter) yields NaN when the denominator is 0 (no traffic)"
                    .to_string()
            },
        )
        .with_recommendation("Add \"or vector(0)\" to the denominator, or filter with \"> 0\""),
        CheckSpec::new(
            "multiple_or_conditions",
            Regex::new(r"(?:.*\bor\b.*){2,}").unwrap(),
            Severity::Info,
            |_| "Multiple or conditions can often be folded into one regex alternation".to_string(),
        )
        .with_recommendation(
            "Use a regex matcher =~\"val1|val2|val3\" for values of the same label",
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Check;

    fn fired(query: &str) -> Vec<&'static str> {
        BEST_PRACTICE_SPECS
            .iter()
            .filter(|spec| !spec.run(query).is_empty())
            .map(|spec| spec.name)
            .collect()
    }

    #[test]
    fn test_averaging_quantiles() {
        assert_eq!(
            fired(r#"avg(http_duration_seconds{quantile="0.99"})"#),
            vec!["averaging_quantiles"]
        );
        assert!(fired(r#"max(http_duration_seconds{quantile="0.99"})"#).is_empty());
    }

    #[test]
    fn test_absent_rules() {
        assert_eq!(fired("absent(sum(up))"), vec!["absent_with_aggregation"]);
        assert_eq!(fired("absent(up{job=\"a\"}) by (job)"), vec!["absent_with_by"]);
        assert!(fired("absent(up{job=\"a\"})").is_empty());
    }

    #[test]
    fn test_info_metric_join() {
        assert_eq!(
            fired("up * on(job, instance) target_info"),
            vec!["info_metric_missing_group"]
        );
        assert!(fired("up * on(job, instance) group_left(version) target_info").is_empty());
    }

    #[test]
    fn test_or_chains() {
        assert!(fired("a or b").is_empty());
        assert_eq!(fired("a or b or c"), vec!["multiple_or_conditions"]);
        // each line is considered on its own
        assert!(fired("a or b\nor c").is_empty());
    }

    #[test]
    fn test_misc_rules() {
        assert_eq!(fired("holt_winters(x[1h], 0.5, 0.5)"), vec!["deprecated_function"]);
        assert_eq!(fired("changes(x[1h])"), vec!["changes_resets_limitation"]);
        assert_eq!(fired("a * on() b"), vec!["on_empty_labels"]);
        assert_eq!(
            fired("rate(errors_total[5m]) / rate(requests_total[5m])"),
            vec!["division_by_zero_risk"]
        );
    }
}
