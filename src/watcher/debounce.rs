//! Debounce timer for listener notification.
//!
//! Coalesce-to-latest semantics: every poke pushes the deadline out by the
//! window, and the owner fires exactly once when a full window elapses with
//! no further pokes. Dropping the timer (with its listener entry) cancels a
//! pending invocation.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct Debounce {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arms, or re-arms, the timer at `now + window`.
    pub(crate) fn poke(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Remaining time until due, if armed. Zero when overdue.
    pub(crate) fn due_in(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Disarms and reports true if the timer was armed and due.
    pub(crate) fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
