//! PromQL syntax validation
//!
//! [`validate`] runs a fixed set of independent checks over the query and
//! sorts the findings into errors and warnings. The checks are:
//!
//! - a declarative rule table (missing range vectors, misplaced `offset`,
//!   doubled operators)
//! - delimiter balance
//! - function-name recognition with typo suggestions
//! - range and subquery duration grammar
//! - selector checks (empty matchers, UTF-8 quoted names), which are always
//!   reported as warnings and never make a query invalid

use once_cell::sync::Lazy;
use regex::Regex;

use crate::delimiters::check_delimiters;
use crate::duration::is_duration;
use crate::normalize::blank_string_literals;
use crate::rule::{Check, CheckSpec, FnCheck, run_checks};
use crate::suggest::suggest_functions;
use crate::types::{Finding, Severity, ValidationResult, ValidationStatus};
use crate::vocabulary::is_reserved;

static METRIC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z_:][a-zA-Z0-9_:]*$").unwrap());
static FUNCTION_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z_][a-z0-9_]*)\s*\(").unwrap());
static RANGE_CONTENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]").unwrap());
static EMPTY_MATCHER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\s*\}").unwrap());
static UTF8_METRIC: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\{\s*"([^"]+)""#).unwrap());
static DOTTED_NAME_IN_SELECTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\s*([a-zA-Z_][a-zA-Z0-9_]*\.[a-zA-Z0-9_.]+)\s*[=!<>~]").unwrap()
});

static SYNTAX_SPECS: Lazy<Vec<CheckSpec>> = Lazy::new(|| {
    vec![
        CheckSpec::new(
            "missing_range_vector",
            Regex::new(
                r"\b(rate|irate|increase|delta|idelta)\s*\(\s*[a-zA-Z_:][a-zA-Z0-9_:]*\s*(?:\{[^}]*\})?\s*\)",
            )
            .unwrap(),
            Severity::Error,
            |caps| format!("{}() requires a range vector [duration]", &caps[1]),
        )
        .with_recommendation("Add [5m] or an appropriate range after the metric selector"),
        CheckSpec::new(
            "misplaced_offset",
            Regex::new(r"(?i)\boffset\s+\d+[smhdwy]\s*\[").unwrap(),
            Severity::Error,
            |_| "offset must come after the range vector, not before".to_string(),
        )
        .with_recommendation("Move offset after the range: metric[5m] offset 1h"),
        CheckSpec::new(
            "double_operator",
            Regex::new(r"[+\-*/]{2,}").unwrap(),
            Severity::Warning,
            |caps| format!("Consecutive operators '{}', possible typo", &caps[0]),
        ),
    ]
});

static SYNTAX_CHECKS: [FnCheck; 3] = [
    FnCheck {
        name: "delimiters",
        run: check_delimiters,
    },
    FnCheck {
        name: "functions",
        run: check_functions,
    },
    FnCheck {
        name: "time_ranges",
        run: check_time_ranges,
    },
];

/// Character offset of a byte offset
fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

/// Flag every called name that is not a known function or keyword
///
/// String literals are blanked first, so a parenthesis inside a label value
/// is never mistaken for a call.
pub fn check_functions(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    FUNCTION_CALL
        .captures_iter(&blanked)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            if is_reserved(name.as_str()) {
                return None;
            }
            let suggestions = suggest_functions(name.as_str());
            let mut message = format!("Unknown function: {}", name.as_str());
            if !suggestions.is_empty() {
                message.push_str(&format!(". Did you mean: {}?", suggestions.join(", ")));
            }
            Some(
                Finding::error("unknown_function", message)
                    .at(char_offset(&blanked, name.start())),
            )
        })
        .collect()
}

/// Validate the duration grammar of every `[range]` and `[range:step]`
pub fn check_time_ranges(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    RANGE_CONTENT
        .captures_iter(&blanked)
        .flat_map(|caps| validate_range(caps[1].trim()))
        .collect()
}

fn validate_range(content: &str) -> Vec<Finding> {
    let parts: Vec<&str> = content.split(':').collect();
    match parts.as_slice() {
        [single] if !is_duration(single) => {
            vec![Finding::error("invalid_duration", format!("Invalid duration: [{content}]"))]
        }
        parts if parts.len() > 2 => {
            vec![Finding::error("invalid_subquery", format!("Invalid subquery: [{content}]"))]
        }
        parts => parts
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty() && !is_duration(part))
            .map(|part| Finding::error("invalid_duration", format!("Invalid duration: {part}")))
            .collect(),
    }
}

/// Selector-level problems: empty matchers and UTF-8 metric name syntax
pub fn check_selectors(query: &str) -> Vec<Finding> {
    let blanked = blank_string_literals(query);
    let mut findings = Vec::new();

    if EMPTY_MATCHER.is_match(&blanked) {
        findings.push(Finding::warning(
            "empty_label_matcher",
            "Empty label matcher {} may match many series",
        ));
    }

    for caps in UTF8_METRIC.captures_iter(query) {
        let name = &caps[1];
        if METRIC_NAME.is_match(name) {
            findings.push(Finding::info(
                "utf8_metric_unnecessary_quoting",
                format!("\"{name}\" is valid in the classic format, quoting is unnecessary"),
            ));
        } else if name.trim().is_empty() || name.contains('\0') {
            findings.push(Finding::error(
                "invalid_utf8_metric",
                format!("Invalid UTF-8 metric name: \"{}\"", name.escape_debug()),
            ));
        }
    }

    for caps in DOTTED_NAME_IN_SELECTOR.captures_iter(&blanked) {
        let name = &caps[1];
        findings.push(
            Finding::warning(
                "possible_utf8_syntax_error",
                format!("\"{name}\" contains dots, which require UTF-8 quoting"),
            )
            .with_recommendation(format!("{{\"{name}\"}}")),
        );
    }

    findings
}

/// Validate the syntax of a PromQL query
///
/// Surrounding whitespace is ignored. An empty query is rejected without
/// running any check.
pub fn validate(query: &str) -> ValidationResult {
    let query = query.trim();
    if query.is_empty() {
        tracing::debug!("empty query, skipping syntax checks");
        return ValidationResult {
            status: ValidationStatus::Error,
            query: String::new(),
            errors: vec![Finding::error("empty_query", "Query is empty")],
            warnings: Vec::new(),
            valid: false,
        };
    }

    let blanked = blank_string_literals(query);
    let mut findings = run_checks(&blanked, SYNTAX_SPECS.iter().map(|spec| spec as &dyn Check));
    findings.extend(run_checks(
        query,
        SYNTAX_CHECKS.iter().map(|check| check as &dyn Check),
    ));

    let (errors, rest): (Vec<Finding>, Vec<Finding>) =
        findings.into_iter().partition(Finding::is_error);
    let mut warnings: Vec<Finding> = rest.into_iter().filter(Finding::is_warning).collect();
    warnings.extend(check_selectors(query));

    let status = if !errors.is_empty() {
        ValidationStatus::Error
    } else if !warnings.is_empty() {
        ValidationStatus::Warning
    } else {
        ValidationStatus::Valid
    };
    tracing::debug!(
        %status,
        errors = errors.len(),
        warnings = warnings.len(),
        "syntax validation finished"
    );

    ValidationResult {
        status,
        query: query.to_string(),
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.kind.as_str()).collect()
    }

    #[test]
    fn test_missing_range_vector() {
        let result = validate("rate(foo_total)");
        assert_eq!(result.status, ValidationStatus::Error);
        assert!(!result.valid);
        assert!(result.find("missing_range_vector").is_some());

        let result = validate(r#"increase(foo_total{job="api"})"#);
        assert!(result.find("missing_range_vector").is_some());
    }

    #[test]
    fn test_valid_aggregation() {
        let result = validate("sum(rate(foo_total[5m])) by (job)");
        assert!(result.valid);
        assert_eq!(result.status, ValidationStatus::Valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_misplaced_offset() {
        let result = validate("rate(foo_total offset 1h [5m])");
        assert!(result.find("misplaced_offset").is_some());
        assert!(!result.valid);
    }

    #[test]
    fn test_double_operator_is_a_warning() {
        let result = validate("foo_total ++ bar_total");
        assert!(result.valid);
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(kinds(&result.warnings), vec!["double_operator"]);
    }

    #[test]
    fn test_operators_inside_label_values_are_ignored() {
        let result = validate(r#"up{path="/api//v1"}"#);
        assert_eq!(result.status, ValidationStatus::Valid);
    }

    #[test]
    fn test_unknown_function_with_suggestion() {
        let findings = check_functions("rat(foo[5m])");
        assert_eq!(kinds(&findings), vec!["unknown_function"]);
        assert!(findings[0].message.contains("rate"));
        assert_eq!(findings[0].position, Some(0));
    }

    #[test]
    fn test_keywords_are_not_functions() {
        assert!(check_functions("sum by (job) (a) / on(job) group_left(x) b").is_empty());
        assert!(check_functions("a > bool(1)").is_empty());
    }

    #[test]
    fn test_parentheses_inside_strings_are_not_calls() {
        assert!(check_functions(r#"label_replace(up, "dst", "$1", "src", "foo(.*)")"#).is_empty());
    }

    #[test]
    fn test_time_ranges() {
        assert!(check_time_ranges("rate(x[5m])").is_empty());
        assert!(check_time_ranges("rate(x[1h30m])").is_empty());
        assert!(check_time_ranges("max_over_time(rate(x[5m])[1h:1m])").is_empty());
        assert!(check_time_ranges("max_over_time(rate(x[5m])[1h:])").is_empty());

        assert_eq!(kinds(&check_time_ranges("rate(x[5])")), vec!["invalid_duration"]);
        assert_eq!(kinds(&check_time_ranges("rate(x[])")), vec!["invalid_duration"]);
        assert_eq!(kinds(&check_time_ranges("x[1h:5x]")), vec!["invalid_duration"]);
        assert_eq!(kinds(&check_time_ranges("x[1h:1m:1s]")), vec!["invalid_subquery"]);
    }

    #[test]
    fn test_brackets_inside_regex_values_are_ignored() {
        assert!(check_time_ranges(r#"up{pod=~"web-[a-z]+"}"#).is_empty());
    }

    #[test]
    fn test_selector_checks() {
        assert_eq!(kinds(&check_selectors("up{}")), vec!["empty_label_matcher"]);
        assert_eq!(
            kinds(&check_selectors(r#"{"http_requests_total"}"#)),
            vec!["utf8_metric_unnecessary_quoting"]
        );
        assert!(check_selectors(r#"{"http.server.duration"}"#).is_empty());
        assert_eq!(kinds(&check_selectors(r#"{"   "}"#)), vec!["invalid_utf8_metric"]);
        assert_eq!(
            kinds(&check_selectors(r#"{http.server.duration="x"}"#)),
            vec!["possible_utf8_syntax_error"]
        );
    }

    #[test]
    fn test_selector_findings_never_invalidate() {
        let result = validate(r#"{"   "}"#);
        assert!(result.valid);
        assert_eq!(result.status, ValidationStatus::Warning);
        assert_eq!(kinds(&result.warnings), vec!["invalid_utf8_metric"]);
        assert_eq!(result.warnings[0].severity, Severity::Error);
    }

    #[test]
    fn test_empty_query() {
        for query in ["", "   ", "\n\t"] {
            let result = validate(query);
            assert_eq!(result.status, ValidationStatus::Error);
            assert_eq!(kinds(&result.errors), vec!["empty_query"]);
            assert!(result.warnings.is_empty());
            assert!(!result.valid);
        }
    }

    #[test]
    fn test_query_is_trimmed() {
        assert_eq!(validate("  up  ").query, "up");
    }
}
