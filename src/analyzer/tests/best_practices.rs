use analyzer::{BestPracticeStatus, Severity, check};

#[test]
fn test_raw_counter_needs_rate() {
    assert!(check("http_requests_total").has("missing_rate"));
    assert!(!check("rate(http_requests_total[5m])").has("missing_rate"));
}

#[test]
fn test_rate_over_gauge() {
    let result = check("rate(node_memory_usage_bytes[5m])");
    assert!(result.has("rate_on_gauge"));
    assert_eq!(result.status, BestPracticeStatus::Warning);
}

#[test]
fn test_classic_histogram_quantile() {
    let good = check("histogram_quantile(0.95, sum(rate(d_bucket[5m])) by (le))");
    assert!(!good.findings().any(|f| f.kind.starts_with("histogram_")));

    let raw = check("histogram_quantile(0.95, d_bucket)");
    assert!(raw.has("histogram_missing_rate"));
    assert!(raw.has("histogram_missing_le"));
}

#[test]
fn test_empty_query() {
    let result = check("");
    assert_eq!(result.status, BestPracticeStatus::NoQuery);
    assert_eq!(result.findings().count(), 0);
    assert_eq!(result.summary.errors + result.summary.warnings, 0);
}

#[test]
fn test_findings_land_in_their_buckets() {
    let query =
        r#"sum(rate(http_requests_total{job=~"api.*"}[30s])) / rate(node_memory_usage_bytes[5m])"#;
    let result = check(query);

    assert!(result.issues.iter().all(|f| f.severity != Severity::Info));
    assert!(result.suggestions.iter().all(|f| f.severity == Severity::Info));
    assert!(
        result
            .optimizations
            .iter()
            .all(|f| f.kind.ends_with("_to_exact") || f.kind.ends_with("_optimization"))
    );
    assert_eq!(result.summary.errors, result.issues.iter().filter(|f| f.is_error()).count());
    assert_eq!(result.summary.warnings, result.issues.iter().filter(|f| f.is_warning()).count());
    assert_eq!(result.summary.suggestions, result.suggestions.len());
    assert_eq!(result.summary.optimizations, result.optimizations.len());

    assert!(result.has("rate_short_range"));
    assert!(result.has("regex_optimization"));
    assert!(result.has("rate_on_gauge"));
}

#[test]
fn test_mixed_types_report_sorted_tags() {
    let result =
        check(r#"rate(http_requests_total{job="a"}[5m]) / node_memory_usage_bytes{job="a"}"#);
    let finding = result
        .findings()
        .find(|f| f.kind == "mixed_metric_types")
        .expect("mixed types reported");
    assert!(finding.message.contains("(counter, gauge)"));
}

#[test]
fn test_check_is_repeatable() {
    let query = r#"sum(rate(x_total{job=~"a"}[1m])) or b or c"#;
    assert_eq!(check(query), check(query));
}

#[test]
fn test_json_shape() {
    let value =
        serde_json::to_value(check(r#"sum(rate(http_requests_total{job="api"}[5m]))"#)).unwrap();
    assert_eq!(value["status"], "CAN_BE_IMPROVED");
    assert_eq!(value["summary"]["suggestions"], 1);
    assert_eq!(value["summary"]["errors"], 0);
    assert!(value["issues"].as_array().unwrap().is_empty());

    let suggestion = &value["suggestions"][0];
    assert_eq!(suggestion["type"], "missing_aggregation_clause");
    assert_eq!(suggestion["severity"], "info");
    assert!(suggestion["recommendation"].is_string());
    assert!(suggestion.get("position").is_none());

    let empty = serde_json::to_value(check("")).unwrap();
    assert_eq!(empty["status"], "NO_QUERY");
}
