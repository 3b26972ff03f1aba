//! The media-query capability contract.
//!
//! The watcher never evaluates query expressions itself; it consumes a
//! [`MediaQueryService`] supplied at construction time. Any backend with
//! equivalent semantics satisfies the trait: a platform media-query
//! evaluator, a compositor bridge, or the in-crate
//! [`SimulatedQueryService`].

/// Simulated in-memory backend.
pub mod simulated;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use simulated::SimulatedQueryService;

/// Errors raised by a media-query service.
///
/// rulewatch never constructs these for its own logic; they surface
/// unmodified from the backend, per its contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The backend could not parse the expression.
    #[error("Invalid query expression '{expression}': {reason}")]
    InvalidExpression {
        /// The expression as handed to the backend.
        expression: String,
        /// Backend diagnostic.
        reason: String,
    },

    /// The backend parsed the expression but cannot watch it.
    #[error("Unsupported query expression '{expression}'")]
    Unsupported {
        /// The expression as handed to the backend.
        expression: String,
    },

    /// Backend failure unrelated to any particular expression.
    #[error("Query backend error: {message}")]
    Backend {
        /// Backend diagnostic.
        message: String,
    },
}

/// A change notification for a single watched expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryChange {
    /// The new match result.
    pub matches: bool,
    /// When the backend observed the change.
    pub at: DateTime<Utc>,
}

impl QueryChange {
    /// A change observed now.
    #[must_use]
    pub fn now(matches: bool) -> Self {
        Self {
            matches,
            at: Utc::now(),
        }
    }
}

/// Callback a service invokes when a watched expression's match result
/// changes.
pub type ChangeSink = Box<dyn Fn(QueryChange) + Send + Sync>;

/// The environment's media-query-matching capability.
///
/// Implementations own matching semantics entirely. The two operations
/// mirror the platform contract: a synchronous snapshot of the current
/// result, and a change subscription that stays registered for the life of
/// the backend.
pub trait MediaQueryService: Send + Sync {
    /// Current match result for `expression`.
    ///
    /// # Errors
    /// Whatever [`QueryError`] the backend raises for an expression it
    /// cannot evaluate.
    fn evaluate(&self, expression: &str) -> Result<bool, QueryError>;

    /// Registers `sink` to be invoked whenever the match result of
    /// `expression` changes.
    ///
    /// Sinks must not block: watchers hand in non-blocking enqueue closures
    /// and expect the backend's notification path to stay cheap.
    ///
    /// # Errors
    /// Whatever [`QueryError`] the backend raises for an expression it
    /// cannot watch.
    fn subscribe(&self, expression: &str, sink: ChangeSink) -> Result<(), QueryError>;
}
