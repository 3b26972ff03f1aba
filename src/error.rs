//! Error types for rulewatch.
//!
//! All errors are strongly typed using thiserror. This enables pattern
//! matching on specific failure conditions and keeps the query-service
//! contract separate from the crate's own validation and dispatch faults.

use thiserror::Error;

use crate::service::QueryError;

/// Validation errors raised while constructing a rule set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Rule keys must contain at least one non-whitespace character.
    #[error("Rule key cannot be empty")]
    EmptyRuleKey,

    /// Query expressions must contain at least one non-whitespace character.
    #[error("Rule '{key}' has an empty query expression")]
    EmptyQueryExpression {
        /// The offending rule key.
        key: String,
    },

    /// Rule keys are unique across the whole rule set, including across
    /// groups in the grouped definition format.
    #[error("Duplicate rule key: '{key}'")]
    DuplicateRuleKey {
        /// The repeated rule key.
        key: String,
    },

    /// A rule definition document could not be parsed.
    #[error("Invalid rule definition: {reason}")]
    InvalidRuleDefinition {
        /// Parser diagnostic.
        reason: String,
    },
}

/// Execution errors raised by the dispatch subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A dispatch channel closed while the watcher still needed it.
    #[error("Dispatch channel disconnected: {path}")]
    Disconnected {
        /// Which channel disconnected.
        path: String,
    },
}

/// Top-level error type for rulewatch.
///
/// This enum encompasses all possible errors that can occur when
/// constructing or using a [`crate::RuleWatcher`].
#[derive(Debug, Error)]
pub enum WatchError {
    /// Rule set validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The media-query service refused an expression. The watcher never
    /// validates expressions itself; these surface straight from the
    /// capability.
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Dispatch-side fault.
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
}

impl WatchError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this error originated in the media-query service.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

/// Result type alias for rulewatch operations.
pub type WatchResult<T> = Result<T, WatchError>;
