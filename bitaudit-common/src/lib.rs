//! Common types and utilities shared across Bitaudit crates.
//!
//! This crate defines the shared error taxonomy, the backend/format enums
//! that cross crate boundaries, and the [`observability`] helpers used by
//! binaries and integration tests. It is intentionally lightweight so that
//! every other crate can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`AuditError`] and [`Result`]: shared error handling
//! - [`VerifyBackend`]: which verification capability checks a fact
//! - [`ReportFormat`]: encoding of the final audit report
//! - [`observability`]: centralised tracing/logging initialisation
use serde::{Deserialize, Serialize};

pub mod observability;

/// Which verification capability a fact is checked against.
///
/// The backend is a per-call parameter, never global state; the two
/// backends produce independently valid outcomes and are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyBackend {
    /// General text-generation model with a fact-checking instruction.
    Primary,
    /// Web-grounded model scoring location-specific correctness from 1 to 5.
    Grounded,
}

impl std::str::FromStr for VerifyBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "grounded" => Ok(Self::Grounded),
            other => Err(format!("unknown verify backend: {other}")),
        }
    }
}

impl std::fmt::Display for VerifyBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Grounded => write!(f, "grounded"),
        }
    }
}

/// Encoding of the final audit report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

/// Error types used across the Bitaudit system.
#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    /// An LLM provider failed to complete a requested generation.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input document could not be repaired into valid JSON.
    #[error("Repair error: {0}")]
    Repair(String),

    /// The final report could not be rendered.
    #[error("Report error: {0}")]
    Report(String),

    /// Filesystem or report-writing failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenient alias for results that use [`AuditError`].
pub type Result<T> = std::result::Result<T, AuditError>;
