//! Static analysis for PromQL queries
//!
//! This crate inspects PromQL (Prometheus Query Language) text for syntax
//! errors and for performance or correctness anti-patterns, without ever
//! executing the query against a metrics backend.
//!
//! # Architecture
//!
//! There is no parser and no AST. Every check is a pure function over the
//! query text, built from compiled patterns and small character scans:
//!
//! ```text
//! query → trim → checks (rule tables + heuristics) → findings → bucketed result
//! ```
//!
//! # Modules
//!
//! - [`normalize`] - blanking of string literals, selectors and grouping clauses
//! - [`vocabulary`] - recognized functions and keywords, metric discovery
//! - [`suggest`] - edit distance and typo suggestions
//! - [`duration`] - duration units and grammar
//! - [`delimiters`] - bracket, brace, parenthesis and string balance
//! - [`rule`] - the [`Check`] contract and declarative rules
//! - [`syntax`] - the syntax validator
//! - [`practices`] - the best-practice engine
//! - [`types`] - findings and result records
//!
//! # Example
//!
//! ```
//! use analyzer::{BestPracticeStatus, ValidationStatus};
//!
//! let result = analyzer::validate("sum(rate(http_requests_total[5m])) by (job)");
//! assert_eq!(result.status, ValidationStatus::Valid);
//!
//! let result = analyzer::check("http_requests_total");
//! assert_eq!(result.status, BestPracticeStatus::Warning);
//! assert!(result.has("missing_rate"));
//! ```

pub mod delimiters;
pub mod duration;
pub mod error;
pub mod normalize;
pub mod practices;
pub mod rule;
pub mod suggest;
pub mod syntax;
pub mod types;
pub mod vocabulary;

pub use delimiters::check_delimiters;
pub use duration::to_seconds;
pub use error::AnalyzerError;
pub use normalize::strip_strings_and_selectors;
pub use practices::check;
pub use rule::Check;
pub use suggest::{levenshtein, suggest_functions};
pub use syntax::validate;
pub use types::{
    BestPracticeResult, BestPracticeStatus, Finding, Severity, Summary, ValidationResult,
    ValidationStatus,
};
pub use vocabulary::find_metrics;
