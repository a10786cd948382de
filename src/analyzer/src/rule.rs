//! The check contract shared by every rule
//!
//! A check is anything that turns a query into findings. Declarative rules
//! ([`CheckSpec`]) and hand-written heuristics ([`FnCheck`]) implement the same
//! [`Check`] trait, so the orchestrators never need to tell them apart.

use regex::{Captures, Regex};

use crate::types::{Finding, Severity};

/// A pure `query -> findings` rule
pub trait Check: Send + Sync {
    /// Stable identifier, used in logs
    fn name(&self) -> &'static str;

    /// Scan the query and return every finding; never fails
    fn run(&self, query: &str) -> Vec<Finding>;
}

/// Builds a finding message from a pattern match
pub type MessageFn = fn(&Captures<'_>) -> String;

/// A declarative rule: one finding per pattern match
///
/// The pattern is compiled once when the rule table is first used; the
/// message function only reads the match it is handed.
pub struct CheckSpec {
    pub name: &'static str,
    pub pattern: Regex,
    pub severity: Severity,
    pub message: MessageFn,
    pub recommendation: Option<&'static str>,
}

impl CheckSpec {
    pub fn new(name: &'static str, pattern: Regex, severity: Severity, message: MessageFn) -> Self {
        Self {
            name,
            pattern,
            severity,
            message,
            recommendation: None,
        }
    }

    pub fn with_recommendation(mut self, recommendation: &'static str) -> Self {
        self.recommendation = Some(recommendation);
        self
    }
}

impl Check for CheckSpec {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, query: &str) -> Vec<Finding> {
        self.pattern
            .captures_iter(query)
            .map(|caps| {
                let finding = Finding::new(self.name, self.severity, (self.message)(&caps));
                match self.recommendation {
                    Some(recommendation) => finding.with_recommendation(recommendation),
                    None => finding,
                }
            })
            .collect()
    }
}

/// A hand-written heuristic wrapped as a [`Check`]
pub struct FnCheck {
    pub name: &'static str,
    pub run: fn(&str) -> Vec<Finding>,
}

impl Check for FnCheck {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, query: &str) -> Vec<Finding> {
        (self.run)(query)
    }
}

/// Run every check in order and pool the findings
pub fn run_checks<'a>(
    query: &str,
    checks: impl IntoIterator<Item = &'a dyn Check>,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for check in checks {
        let found = check.run(query);
        tracing::trace!(check = check.name(), findings = found.len(), "check finished");
        findings.extend(found);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doubled(_: &str) -> Vec<Finding> {
        vec![Finding::info("one", "first"), Finding::info("two", "second")]
    }

    #[test]
    fn test_spec_emits_one_finding_per_match() {
        let spec = CheckSpec::new(
            "shouting",
            Regex::new(r"\b([A-Z]{2,})\b").unwrap(),
            Severity::Warning,
            |caps| format!("{} is shouting", &caps[1]),
        )
        .with_recommendation("use lower case");

        let findings = spec.run("sum(FOO) + BAR");
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].kind, "shouting");
        assert_eq!(findings[0].message, "FOO is shouting");
        assert_eq!(findings[1].message, "BAR is shouting");
        assert_eq!(findings[0].recommendation.as_deref(), Some("use lower case"));
        assert!(spec.run("sum(foo)").is_empty());
    }

    #[test]
    fn test_run_checks_preserves_order() {
        let spec = CheckSpec::new("any", Regex::new("x").unwrap(), Severity::Error, |_| {
            "x found".to_string()
        });
        let custom = FnCheck {
            name: "doubled",
            run: doubled,
        };
        let checks: [&dyn Check; 2] = [&spec, &custom];

        let findings = run_checks("x", checks);
        let kinds: Vec<&str> = findings.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["any", "one", "two"]);
        assert_eq!(findings[0].recommendation, None);
    }
}
