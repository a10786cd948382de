//! Checks driven by metric names and the type their name implies

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::{blank_string_literals, strip_strings_and_selectors};
use crate::types::Finding;
use crate::vocabulary::{find_metrics, is_counter_name, is_function, is_gauge_name};

static BARE_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z_:][a-zA-Z0-9_:]*\s*\{\s*\}").unwrap());
static REGEX_MATCHER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([a-zA-Z_][a-zA-Z0-9_]*)\s*=~\s*"([^"]+)""#).unwrap());
static SIMPLE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_\-]+$").unwrap());
static COUNTER_METRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-zA-Z_:][a-zA-Z0-9_:]*(?:_total|_count|_sum|_bucket))\b").unwrap()
});
static RATE_FAMILY_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:rate|irate|increase|delta|idelta)\s*\(").unwrap());
static HISTOGRAM_QUANTILE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"histogram_quantile\s*\(").unwrap());
static HISTOGRAM_HELPER_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"histogram_(?:avg|stddev|stdvar|count|sum|fraction)\s*\(").unwrap()
});
static RATE_FAMILY_METRIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(rate|irate|increase|delta|idelta)\s*\(\s*([a-zA-Z_:][a-zA-Z0-9_:]*)").unwrap()
});
static QUANTILE_SELECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\{[^}]*quantile\s*=").unwrap());
static DIMENSIONAL_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b[a-zA-Z_]+_(?:GET|POST|PUT|DELETE|PATCH)_[a-zA-Z_]+",
        r"|\b[a-zA-Z_]+_\d+_[a-zA-Z_]+",
    ))
    .unwrap()
});

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Byte offsets where `metric` occurs as a whole-word prefix
fn occurrences<'a>(query: &'a str, metric: &'a str) -> impl Iterator<Item = usize> + 'a {
    query
        .match_indices(metric)
        .map(|(start, _)| start)
        .filter(move |&start| !query[..start].chars().next_back().is_some_and(is_word_char))
}

/// True if some occurrence of `metric` is selected with a non-empty `{...}`
fn has_label_filter(query: &str, metric: &str) -> bool {
    occurrences(query, metric).any(|start| {
        let rest = query[start + metric.len()..].trim_start();
        rest.strip_prefix('{')
            .and_then(|inner| inner.find('}').map(|end| &inner[..end]))
            .is_some_and(|matchers| !matchers.trim().is_empty())
    })
}

/// True if `call` opens a call whose argument text reaches `metric`
/// without closing a parenthesis first
pub(super) fn called_within(query: &str, call: &Regex, metric: &str) -> bool {
    query.match_indices(metric).any(|(start, _)| {
        let before = &query[..start];
        let segment = before.rfind(')').map_or(before, |close| &before[close + 1..]);
        call.is_match(segment)
    })
}

/// True if `<base>_sum` and `<base>_count` appear together on one line
fn is_sum_count_ratio(query: &str, metric: &str) -> bool {
    let Some((base, _)) = metric.rsplit_once('_') else {
        return false;
    };
    let sum = format!("{base}_sum");
    let count = format!("{base}_count");
    let appears_before = |line: &str, first: &str, second: &str| {
        line.find(first)
            .is_some_and(|start| line[start + first.len()..].contains(second))
    };
    query
        .lines()
        .any(|line| appears_before(line, &sum, &count) || appears_before(line, &count, &sum))
}

/// Metrics selected without any label filter, and bare `metric{}` selectors
pub fn check_high_cardinality(query: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    if BARE_SELECTOR.is_match(query) {
        findings.push(
            Finding::warning(
                "high_cardinality",
                "Empty label matcher {} may match many series",
            )
            .with_recommendation("Add {job=\"...\", instance=\"...\"}"),
        );
    }
    for metric in find_metrics(query) {
        if !has_label_filter(query, &metric) {
            findings.push(
                Finding::warning(
                    "high_cardinality",
                    format!("\"{metric}\" used without label filters"),
                )
                .with_recommendation(format!("{metric}{{job=\"...\", instance=\"...\"}}")),
            );
        }
    }
    findings
}

/// Regex matchers that could be exact matches, or that end in a wildcard
pub fn check_regex_overuse(query: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    for caps in REGEX_MATCHER.captures_iter(query) {
        let (label, pattern) = (&caps[1], &caps[2]);
        if SIMPLE_VALUE.is_match(pattern) {
            findings.push(
                Finding::info(
                    "regex_to_exact",
                    format!("{label}=~\"{pattern}\" can be an exact match (faster index lookup)"),
                )
                .with_recommendation(format!("{label}=\"{pattern}\"")),
            );
        }
        if pattern.ends_with(".*") {
            findings.push(
                Finding::info(
                    "regex_optimization",
                    format!("Wildcard suffix in \"{pattern}\" defeats index optimization"),
                )
                .with_recommendation("Use more specific label values or anchor: ^prefix.*"),
            );
        }
    }
    findings
}

/// Counters read raw instead of through rate() or increase()
///
/// Inputs of histogram functions and `_sum`/`_count` ratios are exempt.
pub fn check_missing_rate(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    COUNTER_METRIC
        .captures_iter(&blanked)
        .map(|caps| caps[1].to_string())
        .filter(|metric| !is_function(metric))
        .filter(|metric| {
            let exempt = called_within(&blanked, &RATE_FAMILY_CALL, metric)
                || called_within(&blanked, &HISTOGRAM_QUANTILE_CALL, metric)
                || called_within(&blanked, &HISTOGRAM_HELPER_CALL, metric)
                || ((metric.ends_with("_sum") || metric.ends_with("_count"))
                    && is_sum_count_ratio(&blanked, metric));
            !exempt
        })
        .map(|metric| {
            Finding::warning(
                "missing_rate",
                format!(
                    "Counter \"{metric}\" without rate()/increase(): the raw value only ever grows"
                ),
            )
            .with_recommendation(format!("rate({metric}[5m])"))
        })
        .collect()
}

/// rate() and friends applied to something named like a gauge
pub fn check_rate_on_gauges(query: &str) -> Vec<Finding> {
    RATE_FAMILY_METRIC
        .captures_iter(query)
        .filter(|caps| is_gauge_name(&caps[2]) && !is_counter_name(&caps[2]))
        .map(|caps| {
            let (func, metric) = (&caps[1], &caps[2]);
            Finding::warning(
                "rate_on_gauge",
                format!(
                    "{func}() on gauge \"{metric}\": gauges hold current state, not cumulative totals"
                ),
            )
            .with_recommendation(format!(
                "avg_over_time({metric}[5m]) for smoothing, or use the value directly"
            ))
        })
        .collect()
}

/// Label values such as verbs or status codes baked into metric names
pub fn check_dimensional_names(query: &str) -> Vec<Finding> {
    let names = strip_strings_and_selectors(query);
    if !DIMENSIONAL_NAME.is_match(&names) {
        return Vec::new();
    }
    vec![
        Finding::info(
            "dimensional_metric_name",
            "Dimensions embedded in the metric name reduce queryability and multiply series",
        )
        .with_recommendation("Use labels: http_requests_total{method=\"GET\", status=\"200\"}"),
    ]
}

/// True if some occurrence of `metric` is selected with a `quantile=` matcher
fn is_summary_selector(query: &str, metric: &str) -> bool {
    query
        .match_indices(metric)
        .any(|(start, _)| QUANTILE_SELECTOR.is_match(&query[start + metric.len()..]))
}

/// Metric types a name suggests; one name may suggest several
fn inferred_types(query: &str, metric: &str) -> Vec<&'static str> {
    let mut types = Vec::new();
    if is_counter_name(metric) {
        types.push("counter");
    }
    if is_gauge_name(metric) {
        types.push("gauge");
    }
    if is_summary_selector(query, metric) {
        types.push("summary");
    }
    types
}

/// Arithmetic across series whose names suggest different metric types
pub fn check_mixed_types(query: &str) -> Vec<Finding> {
    let has_quantile = query.contains("histogram_quantile");
    let is_classic_histogram = has_quantile && query.contains("_bucket");

    let mut types: BTreeSet<&'static str> = find_metrics(query)
        .iter()
        .filter(|metric| !(metric.ends_with("_bucket") && is_classic_histogram))
        .filter(|metric| !metric.ends_with("_info"))
        .flat_map(|metric| inferred_types(query, metric))
        .collect();
    if has_quantile && !is_classic_histogram {
        types.insert("histogram");
    }

    let operators = strip_strings_and_selectors(query);
    let has_arithmetic = operators.contains(['+', '-', '*', '/']);
    if types.len() < 2 || !has_arithmetic {
        return Vec::new();
    }

    let listed: Vec<&str> = types.into_iter().collect();
    vec![
        Finding::warning(
            "mixed_metric_types",
            format!(
                "Mixed types ({}) in arithmetic: different metric types have incompatible semantics",
                listed.join(", ")
            ),
        )
        .with_recommendation("Separate into distinct queries per metric type"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.kind.as_str()).collect()
    }

    #[test]
    fn test_high_cardinality() {
        assert_eq!(kinds(&check_high_cardinality("up")), vec!["high_cardinality"]);
        assert!(check_high_cardinality(r#"up{job="api"}"#).is_empty());
        // bare selector plus the unfiltered metric itself
        assert_eq!(check_high_cardinality("up{}").len(), 2);
        assert!(check_high_cardinality(r#"rate(http_requests_total{job="api"}[5m])"#).is_empty());
    }

    #[test]
    fn test_label_filter_needs_whole_name() {
        assert!(!has_label_filter(r#"myup{job="a"} + up"#, "up"));
        assert!(has_label_filter(r#"myup + up {job="a"}"#, "up"));
    }

    #[test]
    fn test_regex_overuse() {
        let findings = check_regex_overuse(r#"up{job=~"api"}"#);
        assert_eq!(kinds(&findings), vec!["regex_to_exact"]);
        assert_eq!(findings[0].recommendation.as_deref(), Some(r#"job="api""#));

        let findings = check_regex_overuse(r#"up{job=~"api.*"}"#);
        assert_eq!(kinds(&findings), vec!["regex_optimization"]);

        assert!(check_regex_overuse(r#"up{job=~"api|web"}"#).is_empty());
    }

    #[test]
    fn test_missing_rate() {
        assert_eq!(kinds(&check_missing_rate("http_requests_total")), vec!["missing_rate"]);
        assert!(check_missing_rate("rate(http_requests_total[5m])").is_empty());
        assert!(check_missing_rate("sum(increase(http_requests_total[1h]))").is_empty());
        assert!(check_missing_rate("histogram_quantile(0.9, d_bucket)").is_empty());
        assert!(check_missing_rate("histogram_count(d)").is_empty());
    }

    #[test]
    fn test_sum_count_ratio_is_exempt() {
        let query = "request_duration_seconds_sum / request_duration_seconds_count";
        assert!(check_missing_rate(query).is_empty());
        // a lone _sum is still a raw counter
        assert_eq!(check_missing_rate("request_duration_seconds_sum").len(), 1);
    }

    #[test]
    fn test_counter_names_inside_strings_are_ignored() {
        assert!(check_missing_rate(r#"up{name="requests_total"}"#).is_empty());
    }

    #[test]
    fn test_called_within_stops_at_closing_paren() {
        assert!(called_within("rate(x_total[5m])", &RATE_FAMILY_CALL, "x_total"));
        assert!(!called_within("rate(y[5m]) + x_total", &RATE_FAMILY_CALL, "x_total"));
    }

    #[test]
    fn test_rate_on_gauges() {
        let findings = check_rate_on_gauges("rate(node_memory_usage_bytes[5m])");
        assert_eq!(kinds(&findings), vec!["rate_on_gauge"]);
        assert!(findings[0].message.starts_with("rate()"));

        let findings = check_rate_on_gauges("irate(node_memory_usage_bytes[5m])");
        assert!(findings[0].message.starts_with("irate()"));

        assert!(check_rate_on_gauges("rate(node_network_receive_bytes_total[5m])").is_empty());
        assert!(check_rate_on_gauges("rate(http_requests_total[5m])").is_empty());
    }

    #[test]
    fn test_dimensional_names() {
        assert_eq!(
            kinds(&check_dimensional_names("http_GET_requests_total")),
            vec!["dimensional_metric_name"]
        );
        assert_eq!(check_dimensional_names("http_responses_500_total").len(), 1);
        assert!(check_dimensional_names("http_requests_total").is_empty());
        assert!(check_dimensional_names(r#"http_requests_total{path="/v1_200_x"}"#).is_empty());
    }

    #[test]
    fn test_mixed_types() {
        let findings = check_mixed_types("http_requests_total / node_memory_usage_bytes");
        assert_eq!(kinds(&findings), vec!["mixed_metric_types"]);
        assert!(findings[0].message.contains("(counter, gauge)"));

        assert!(check_mixed_types("a_total / b_total").is_empty());
        assert!(check_mixed_types("http_requests_total node_memory_usage_bytes").is_empty());
    }

    #[test]
    fn test_mixed_types_skips_info_and_classic_buckets() {
        assert!(check_mixed_types("up_bytes * on(job) group_left(version) build_info").is_empty());
        assert!(
            check_mixed_types("histogram_quantile(0.9, rate(d_bucket[5m])) / free_bytes").is_empty()
        );
    }

    #[test]
    fn test_mixed_types_single_name_with_two_tags() {
        // "_bytes" reads as a gauge and "_total" as a counter, so one name
        // on its own is reported as mixed
        let findings = check_mixed_types("rate(node_network_receive_bytes_total[5m]) * 8");
        assert_eq!(kinds(&findings), vec!["mixed_metric_types"]);
    }
}
