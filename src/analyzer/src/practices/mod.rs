//! Best-practice analysis
//!
//! [`check`] runs the declarative rule table and then every heuristic in a
//! fixed order, pooling what they find. Findings are bucketed by severity:
//! errors and warnings are issues, info findings about cheaper matchers are
//! optimizations, and every other info finding is a suggestion.

mod aggregation;
mod histograms;
mod metrics;
mod ranges;
mod rules;

use crate::normalize::blank_string_literals;
use crate::rule::{Check, FnCheck, run_checks};
use crate::types::{BestPracticeResult, BestPracticeStatus, Finding, Severity, Summary};

pub use aggregation::{
    check_recording_opportunity, check_unbounded_aggregations, check_vector_matching,
};
pub use histograms::{check_histogram_usage, check_native_histograms};
pub use metrics::{
    check_dimensional_names, check_high_cardinality, check_missing_rate, check_mixed_types,
    check_rate_on_gauges, check_regex_overuse,
};
pub use ranges::{
    check_irate_ranges, check_predict_ranges, check_rate_ranges, check_subquery_ranges,
};

use rules::BEST_PRACTICE_SPECS;

static CHECKS: [FnCheck; 15] = [
    FnCheck {
        name: "high_cardinality",
        run: check_high_cardinality,
    },
    FnCheck {
        name: "regex_overuse",
        run: check_regex_overuse,
    },
    FnCheck {
        name: "missing_rate",
        run: check_missing_rate,
    },
    FnCheck {
        name: "rate_on_gauges",
        run: check_rate_on_gauges,
    },
    FnCheck {
        name: "subquery_ranges",
        run: check_subquery_ranges,
    },
    FnCheck {
        name: "irate_ranges",
        run: check_irate_ranges,
    },
    FnCheck {
        name: "rate_ranges",
        run: check_rate_ranges,
    },
    FnCheck {
        name: "unbounded_aggregations",
        run: check_unbounded_aggregations,
    },
    FnCheck {
        name: "recording_opportunity",
        run: check_recording_opportunity,
    },
    FnCheck {
        name: "histogram_usage",
        run: check_histogram_usage,
    },
    FnCheck {
        name: "predict_ranges",
        run: check_predict_ranges,
    },
    FnCheck {
        name: "dimensional_names",
        run: check_dimensional_names,
    },
    FnCheck {
        name: "vector_matching",
        run: check_vector_matching,
    },
    FnCheck {
        name: "native_histograms",
        run: check_native_histograms,
    },
    FnCheck {
        name: "mixed_types",
        run: check_mixed_types,
    },
];

fn is_optimization(finding: &Finding) -> bool {
    finding.severity == Severity::Info
        && (finding.kind.ends_with("_to_exact") || finding.kind.ends_with("_optimization"))
}

/// Analyze a query for performance and correctness anti-patterns
///
/// An empty (or all-whitespace) query yields [`BestPracticeStatus::NoQuery`]
/// without running any check.
pub fn check(query: &str) -> BestPracticeResult {
    let query = query.trim();
    if query.is_empty() {
        return BestPracticeResult {
            status: BestPracticeStatus::NoQuery,
            query: String::new(),
            issues: Vec::new(),
            suggestions: Vec::new(),
            optimizations: Vec::new(),
            summary: Summary::default(),
        };
    }

    let blanked = blank_string_literals(query);
    let mut findings = run_checks(
        &blanked,
        BEST_PRACTICE_SPECS.iter().map(|spec| spec as &dyn Check),
    );
    findings.extend(run_checks(query, CHECKS.iter().map(|check| check as &dyn Check)));

    let mut issues = Vec::new();
    let mut suggestions = Vec::new();
    let mut optimizations = Vec::new();
    for finding in findings {
        if !finding.is_info() {
            issues.push(finding);
        } else if is_optimization(&finding) {
            optimizations.push(finding);
        } else {
            suggestions.push(finding);
        }
    }

    let summary = Summary {
        errors: issues.iter().filter(|f| f.is_error()).count(),
        warnings: issues.iter().filter(|f| f.is_warning()).count(),
        suggestions: suggestions.len(),
        optimizations: optimizations.len(),
    };
    let status = if summary.errors > 0 {
        BestPracticeStatus::Error
    } else if summary.warnings > 0 {
        BestPracticeStatus::Warning
    } else if summary.suggestions > 0 || summary.optimizations > 0 {
        BestPracticeStatus::CanBeImproved
    } else {
        BestPracticeStatus::Optimized
    };

    tracing::debug!(
        %status,
        errors = summary.errors,
        warnings = summary.warnings,
        suggestions = summary.suggestions,
        optimizations = summary.optimizations,
        "best-practice check finished"
    );

    BestPracticeResult {
        status,
        query: query.to_string(),
        issues,
        suggestions,
        optimizations,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_runs_nothing() {
        let result = check("   \n");
        assert_eq!(result.status, BestPracticeStatus::NoQuery);
        assert_eq!(result.query, "");
        assert_eq!(result.findings().count(), 0);
        assert_eq!(result.summary, Summary::default());
    }

    #[test]
    fn test_optimized_query() {
        let result = check(r#"sum by (job) (rate(http_requests_total{job="api"}[5m]))"#);
        assert_eq!(result.status, BestPracticeStatus::Optimized);
        assert_eq!(result.findings().count(), 0);
    }

    #[test]
    fn test_missing_rate() {
        let result = check("http_requests_total");
        assert!(result.has("missing_rate"));
        assert_eq!(result.status, BestPracticeStatus::Warning);

        assert!(!check("rate(http_requests_total[5m])").has("missing_rate"));
    }

    #[test]
    fn test_rate_on_gauge() {
        assert!(check("rate(node_memory_usage_bytes[5m])").has("rate_on_gauge"));
    }

    #[test]
    fn test_classic_histograms() {
        let result = check("histogram_quantile(0.95, sum(rate(d_bucket[5m])) by (le))");
        assert!(!result.has("histogram_missing_rate"));
        assert!(!result.has("histogram_missing_le"));

        let result = check("histogram_quantile(0.95, d_bucket)");
        assert!(result.has("histogram_missing_rate"));
        assert!(result.has("histogram_missing_le"));
    }

    #[test]
    fn test_buckets_are_partitioned() {
        let result = check(r#"sum by (job) (rate(http_requests_total{job=~"api"}[1m]))"#);
        assert_eq!(result.status, BestPracticeStatus::Warning);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, "rate_short_range");
        assert_eq!(result.optimizations.len(), 1);
        assert_eq!(result.optimizations[0].kind, "regex_to_exact");
        assert!(result.suggestions.is_empty());
        assert_eq!(
            result.summary,
            Summary {
                errors: 0,
                warnings: 1,
                suggestions: 0,
                optimizations: 1,
            }
        );
    }

    #[test]
    fn test_suggestions_only_can_be_improved() {
        let result = check(r#"sum(rate(http_requests_total{job="api"}[5m]))"#);
        assert_eq!(result.status, BestPracticeStatus::CanBeImproved);
        assert_eq!(result.suggestions.len(), 1);
        assert_eq!(result.suggestions[0].kind, "missing_aggregation_clause");
    }

    #[test]
    fn test_errors_take_precedence() {
        let result = check(r#"absent(up{job="a"}) by (job)"#);
        assert_eq!(result.status, BestPracticeStatus::Error);
        assert!(result.summary.errors >= 1);
    }

    #[test]
    fn test_rule_table_runs_before_heuristics() {
        let result = check(r#"holt_winters(node_memory_usage_bytes{job="a"}[1h], 0.5, 0.5)"#);
        assert_eq!(result.issues[0].kind, "deprecated_function");
    }

    #[test]
    fn test_rules_do_not_look_inside_strings() {
        let result = check(r#"up{job="a or b or c"}"#);
        assert!(!result.has("multiple_or_conditions"));
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(check("  up{job=\"a\"}  ").query, r#"up{job="a"}"#);
    }
}
