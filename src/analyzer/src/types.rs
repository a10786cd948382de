//! Finding and result types produced by the analyzer
//!
//! Every type here is a plain value record: created fresh per call and
//! serialized by the caller. The JSON field names are part of the output
//! contract.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::AnalyzerError;

/// How serious a finding is
///
/// Ordered so that `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Style or optimization opportunity
    Info,
    /// Likely wrong or surprising result, but not a parse failure
    Warning,
    /// The query cannot be trusted to parse or evaluate sanely
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for Severity {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(Self::Info),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(AnalyzerError::UnknownSeverity(s.to_string())),
        }
    }
}

/// A single problem or suggestion found in a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Machine-readable rule identifier, e.g. `missing_rate`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable explanation
    pub message: String,
    pub severity: Severity,
    /// Suggested rewrite or remedy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// Character offset into the (trimmed) query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl Finding {
    pub fn new(kind: &str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
            severity,
            recommendation: None,
            position: None,
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Error, message)
    }

    pub fn warning(kind: &str, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Warning, message)
    }

    pub fn info(kind: &str, message: impl Into<String>) -> Self {
        Self::new(kind, Severity::Info, message)
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn at(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn is_info(&self) -> bool {
        self.severity == Severity::Info
    }
}

/// Overall verdict of [`validate`](crate::validate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Error,
    Warning,
    Valid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::Valid => write!(f, "VALID"),
        }
    }
}

/// Output of the syntax validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub query: String,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    /// True when `errors` is empty; selector warnings never change it
    pub valid: bool,
}

impl ValidationResult {
    /// Look up the first finding of the given type in either bucket
    pub fn find(&self, kind: &str) -> Option<&Finding> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .find(|finding| finding.kind == kind)
    }
}

/// Overall verdict of [`check`](crate::check)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BestPracticeStatus {
    Error,
    Warning,
    CanBeImproved,
    Optimized,
    /// The query was empty; nothing was checked
    NoQuery,
}

impl fmt::Display for BestPracticeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "ERROR"),
            Self::Warning => write!(f, "WARNING"),
            Self::CanBeImproved => write!(f, "CAN_BE_IMPROVED"),
            Self::Optimized => write!(f, "OPTIMIZED"),
            Self::NoQuery => write!(f, "NO_QUERY"),
        }
    }
}

/// Finding counts per output bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub optimizations: usize,
}

/// Output of the best-practice engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestPracticeResult {
    pub status: BestPracticeStatus,
    pub query: String,
    /// Error and warning findings
    pub issues: Vec<Finding>,
    /// Informational findings that are not index optimizations
    pub suggestions: Vec<Finding>,
    /// Informational findings about exact-match or wildcard index usage
    pub optimizations: Vec<Finding>,
    pub summary: Summary,
}

impl BestPracticeResult {
    /// Iterate over every finding regardless of bucket
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.issues
            .iter()
            .chain(self.suggestions.iter())
            .chain(self.optimizations.iter())
    }

    /// True if any finding of the given type was produced
    pub fn has(&self, kind: &str) -> bool {
        self.findings().any(|finding| finding.kind == kind)
    }

    /// True if no finding is at least as severe as `threshold`
    ///
    /// With [`Severity::Error`] this is `summary.errors == 0`.
    pub fn passes(&self, threshold: Severity) -> bool {
        !self.findings().any(|finding| finding.severity >= threshold)
    }
}
