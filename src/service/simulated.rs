//! Simulated media-query backend.
//!
//! A thread-safe in-memory implementation of [`MediaQueryService`] with
//! manually driven match state. It is intended for embedded usage, tests,
//! and as a reference implementation of the service contract. It implements
//! no matching semantics: every expression's result is whatever the caller
//! last recorded for it, and unknown expressions never match.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ChangeSink, MediaQueryService, QueryChange, QueryError};

#[derive(Default)]
struct SimulatedState {
    matches: HashMap<String, bool>,
    rejected: HashMap<String, String>,
    sinks: HashMap<String, Vec<ChangeSink>>,
}

/// In-memory media-query service with manually driven match state.
///
/// Sinks run under the internal lock; they must not call back into the
/// service.
#[derive(Default)]
pub struct SimulatedQueryService {
    state: Mutex<SimulatedState>,
}

impl SimulatedQueryService {
    /// Creates an empty service: no expression matches, none are rejected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SimulatedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the current match result for `expression` without notifying
    /// subscribers. Use this to stage state before a watcher evaluates it.
    pub fn set_matches(&self, expression: impl Into<String>, matches: bool) {
        self.lock().matches.insert(expression.into(), matches);
    }

    /// Marks `expression` as invalid: evaluate and subscribe calls for it
    /// fail with [`QueryError::InvalidExpression`] carrying `reason`.
    pub fn reject(&self, expression: impl Into<String>, reason: impl Into<String>) {
        self.lock().rejected.insert(expression.into(), reason.into());
    }

    /// Updates `expression`'s match result and notifies its subscribers.
    ///
    /// Returns the number of sinks notified.
    pub fn emit(&self, expression: &str, matches: bool) -> usize {
        let mut state = self.lock();
        state.matches.insert(expression.to_string(), matches);

        let change = QueryChange::now(matches);
        match state.sinks.get(expression) {
            Some(sinks) => {
                for sink in sinks {
                    sink(change);
                }
                sinks.len()
            }
            None => 0,
        }
    }

    /// Number of sinks registered for `expression`.
    #[must_use]
    pub fn subscriber_count(&self, expression: &str) -> usize {
        self.lock().sinks.get(expression).map_or(0, Vec::len)
    }

    fn check_rejected(state: &SimulatedState, expression: &str) -> Result<(), QueryError> {
        match state.rejected.get(expression) {
            Some(reason) => Err(QueryError::InvalidExpression {
                expression: expression.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl MediaQueryService for SimulatedQueryService {
    fn evaluate(&self, expression: &str) -> Result<bool, QueryError> {
        let state = self.lock();
        Self::check_rejected(&state, expression)?;
        Ok(state.matches.get(expression).copied().unwrap_or(false))
    }

    fn subscribe(&self, expression: &str, sink: ChangeSink) -> Result<(), QueryError> {
        let mut state = self.lock();
        Self::check_rejected(&state, expression)?;
        state
            .sinks
            .entry(expression.to_string())
            .or_default()
            .push(sink);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn unknown_expressions_never_match() {
        let service = SimulatedQueryService::new();
        assert_eq!(service.evaluate("(min-width:576px)"), Ok(false));
    }

    #[test]
    fn set_matches_is_silent() {
        let service = SimulatedQueryService::new();
        let (tx, rx) = mpsc::channel();
        service
            .subscribe(
                "(min-width:576px)",
                Box::new(move |change| {
                    let _ = tx.send(change.matches);
                }),
            )
            .unwrap();

        service.set_matches("(min-width:576px)", true);
        assert_eq!(service.evaluate("(min-width:576px)"), Ok(true));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_notifies_every_sink() {
        let service = SimulatedQueryService::new();
        let (tx, rx) = mpsc::channel();
        for _ in 0..2 {
            let tx = tx.clone();
            service
                .subscribe(
                    "(max-width:575px)",
                    Box::new(move |change| {
                        let _ = tx.send(change.matches);
                    }),
                )
                .unwrap();
        }

        assert_eq!(service.emit("(max-width:575px)", true), 2);
        assert_eq!(rx.try_recv(), Ok(true));
        assert_eq!(rx.try_recv(), Ok(true));
        assert_eq!(service.evaluate("(max-width:575px)"), Ok(true));
    }

    #[test]
    fn rejected_expressions_fail_both_operations() {
        let service = SimulatedQueryService::new();
        service.reject("(max-width:)", "missing value");

        let err = service.evaluate("(max-width:)").unwrap_err();
        assert!(matches!(err, QueryError::InvalidExpression { .. }));

        let err = service
            .subscribe("(max-width:)", Box::new(|_| {}))
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidExpression { .. }));
        assert_eq!(service.subscriber_count("(max-width:)"), 0);
    }
}
