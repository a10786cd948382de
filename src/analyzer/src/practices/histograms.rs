//! Classic and native histogram checks
//!
//! A query over `_bucket` series is treated as a classic histogram; a
//! `histogram_quantile` call without any bucket series is read as a native
//! histogram query.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::blank_string_literals;
use crate::types::Finding;

static RATE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brate\s*\(").unwrap());
static GROUPED_BY_LE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bby\s*\([^)]*\ble\b").unwrap());
static NATIVE_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(histogram_avg|histogram_stddev|histogram_stdvar)\s*\(").unwrap());
static NATIVE_FUNCTION_OVER_RATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(histogram_avg|histogram_stddev|histogram_stdvar)\s*\(\s*rate\s*\(").unwrap()
});
static HELPER_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bhistogram_(?:count|sum)\s*\(").unwrap());
static HELPER_OVER_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bhistogram_(?:count|sum)\s*\(\s*rate\s*\(").unwrap());

struct HistogramQuery {
    text: String,
}

impl HistogramQuery {
    fn new(query: &str) -> Self {
        Self {
            text: blank_string_literals(query),
        }
    }

    fn has_quantile(&self) -> bool {
        self.text.contains("histogram_quantile")
    }

    fn has_buckets(&self) -> bool {
        self.text.contains("_bucket")
    }

    fn is_classic(&self) -> bool {
        self.has_quantile() && self.has_buckets()
    }

    fn is_native(&self) -> bool {
        self.has_quantile() && !self.has_buckets()
    }
}

/// histogram_quantile over classic buckets needs rate() and `le` in by()
pub fn check_histogram_usage(query: &str) -> Vec<Finding> {
    let histogram = HistogramQuery::new(query);
    if !histogram.is_classic() {
        return Vec::new();
    }

    let mut findings = Vec::new();
    if !RATE_CALL.is_match(&histogram.text) {
        findings.push(
            Finding::warning(
                "histogram_missing_rate",
                "histogram_quantile() on raw buckets: rate() handles counter resets per series \
                 before aggregation",
            )
            .with_recommendation("histogram_quantile(0.95, sum by (le) (rate(m_bucket[5m])))"),
        );
    }
    if !GROUPED_BY_LE.is_match(&histogram.text) {
        findings.push(
            Finding::warning(
                "histogram_missing_le",
                "Classic histograms need \"le\" in by(): without it, bucket boundaries are lost \
                 and percentiles come out wrong",
            )
            .with_recommendation("sum by (job, le) (...)"),
        );
    }
    findings
}

/// Native histogram functions expect per-second input and no `le` grouping
pub fn check_native_histograms(query: &str) -> Vec<Finding> {
    let histogram = HistogramQuery::new(query);
    let text = histogram.text.as_str();
    let mut findings = Vec::new();

    let over_rate: HashSet<&str> = NATIVE_FUNCTION_OVER_RATE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    for caps in NATIVE_FUNCTION.captures_iter(text) {
        let func = &caps[1];
        if over_rate.contains(func) {
            continue;
        }
        findings.push(
            Finding::warning(
                "native_histogram_missing_rate",
                format!(
                    "{func}() needs rate() input: without it, you get cumulative counts instead \
                     of per-second rates"
                ),
            )
            .with_recommendation(format!("{func}(rate(histogram_metric[5m]))")),
        );
    }

    if histogram.is_native() && GROUPED_BY_LE.is_match(text) {
        findings.push(
            Finding::info(
                "native_histogram_unnecessary_le",
                "Native histograms do not need \"le\" in aggregation: \"le\" is only for classic \
                 histograms with explicit bucket boundaries",
            )
            .with_recommendation("Simplify: sum by (job) (rate(metric[5m]))"),
        );
    }

    if HELPER_FUNCTION.is_match(text) && !HELPER_OVER_RATE.is_match(text) {
        findings.push(
            Finding::info(
                "histogram_helper_without_rate",
                "histogram_count/sum typically need rate(): otherwise they return the cumulative \
                 total, not a per-second rate",
            )
            .with_recommendation("histogram_count(rate(metric[5m]))"),
        );
    }

    findings
}
