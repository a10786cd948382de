//! The PromQL vocabulary: function names, keywords and naming conventions
//!
//! The vocabulary is built once on first use and never mutated, so it can be
//! read from any number of threads without coordination.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::normalize::{identifiers, strip_strings_and_selectors};

/// Every function and aggregation operator name the analyzer recognizes
pub const FUNCTIONS: &[&str] = &[
    // aggregation operators
    "sum",
    "min",
    "max",
    "avg",
    "group",
    "stddev",
    "stdvar",
    "count",
    "count_values",
    "bottomk",
    "topk",
    "quantile",
    "limitk",
    "limit_ratio",
    // rates and deltas
    "rate",
    "irate",
    "increase",
    "delta",
    "idelta",
    "deriv",
    "resets",
    "changes",
    // time
    "timestamp",
    "time",
    "minute",
    "hour",
    "day_of_month",
    "day_of_week",
    "day_of_year",
    "days_in_month",
    "month",
    "year",
    // math
    "abs",
    "ceil",
    "floor",
    "round",
    "sqrt",
    "exp",
    "ln",
    "log2",
    "log10",
    "sin",
    "cos",
    "tan",
    "asin",
    "acos",
    "atan",
    "sinh",
    "cosh",
    "tanh",
    "asinh",
    "acosh",
    "atanh",
    "deg",
    "rad",
    "sgn",
    "clamp",
    "clamp_max",
    "clamp_min",
    // histograms
    "histogram_quantile",
    "histogram_count",
    "histogram_sum",
    "histogram_fraction",
    "histogram_avg",
    "histogram_stddev",
    "histogram_stdvar",
    // labels
    "label_replace",
    "label_join",
    // over time
    "avg_over_time",
    "min_over_time",
    "max_over_time",
    "sum_over_time",
    "count_over_time",
    "quantile_over_time",
    "stddev_over_time",
    "stdvar_over_time",
    "last_over_time",
    "present_over_time",
    "mad_over_time",
    "first_over_time",
    "ts_of_max_over_time",
    "ts_of_min_over_time",
    "ts_of_last_over_time",
    "ts_of_first_over_time",
    // forecasting
    "predict_linear",
    "holt_winters",
    "double_exponential_smoothing",
    // sorting
    "sort",
    "sort_desc",
    "sort_by_label",
    "sort_by_label_desc",
    // misc
    "step",
    "absent",
    "absent_over_time",
    "scalar",
    "vector",
    "info",
    "pi",
    "start",
    "end",
];

/// Binary operators, modifiers and literals that look like identifiers
pub const KEYWORDS: &[&str] = &[
    "by",
    "without",
    "and",
    "or",
    "unless",
    "on",
    "ignoring",
    "group_left",
    "group_right",
    "bool",
    "offset",
    "inf",
    "nan",
];

/// Name suffixes that mark a monotonically increasing series
pub const COUNTER_SUFFIXES: &[&str] = &["_total", "_count", "_sum", "_bucket"];

/// Name fragments that mark a point-in-time value
pub const GAUGE_PATTERNS: &[&str] = &[
    "_bytes",
    "_ratio",
    "_usage",
    "_percent",
    "_gauge",
    "_celsius",
    "_fahrenheit",
    "_temperature",
    "_info",
    "_size",
    "_current",
    "_limit",
    "_available",
    "_free",
    "_used",
    "_utilization",
    "_capacity",
    "_level",
];

static FUNCTION_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FUNCTIONS.iter().copied().collect());

static RESERVED: Lazy<HashSet<&'static str>> =
    Lazy::new(|| FUNCTIONS.iter().chain(KEYWORDS.iter()).copied().collect());

/// True if `name` is a known function (case-insensitive)
pub fn is_function(name: &str) -> bool {
    FUNCTION_SET.contains(name.to_ascii_lowercase().as_str())
}

/// True if `name` is a function or keyword (case-insensitive)
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(name.to_ascii_lowercase().as_str())
}

/// True if the name ends with a counter suffix
pub fn is_counter_name(name: &str) -> bool {
    COUNTER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// True if the name contains a gauge fragment anywhere
pub fn is_gauge_name(name: &str) -> bool {
    GAUGE_PATTERNS.iter().any(|pattern| name.contains(pattern))
}

/// Metric names referenced by a query, in order of appearance
///
/// A metric is a bare identifier outside strings, selectors and grouping
/// clauses that is neither applied like a function nor reserved.
pub fn find_metrics(query: &str) -> Vec<String> {
    let cleaned = strip_strings_and_selectors(query);
    identifiers(&cleaned)
        .into_iter()
        .filter(|ident| !ident.is_applied() && !is_reserved(ident.text))
        .map(|ident| ident.text.to_string())
        .collect()
}
