//! Analyzer error types
//!
//! Analysis itself never fails: every problem found in a query is reported
//! as a [`Finding`](crate::types::Finding). These errors only cover the
//! conversions at the library boundary.

/// Errors raised when converting user-supplied text into analyzer types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyzerError {
    /// The text does not name a severity level
    #[error("Unknown severity '{0}', expected one of: error, warning, info")]
    UnknownSeverity(String),
}
