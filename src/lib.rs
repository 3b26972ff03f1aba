//! # rulewatch - debounced media-query rule watching
//!
//! rulewatch subscribes to a set of named media-query rules through an
//! injected query service and notifies registered listeners, debounced,
//! whenever the aggregate match state changes.
//!
//! ## Core Concepts
//!
//! - **RuleSet**: named query expressions, immutable after construction
//! - **MediaQueryService**: the environment's query-matching capability,
//!   injected so any backend (or test double) can stand in
//! - **MatchState**: per-listener mapping of rule key to current match
//!   result; callbacks receive snapshots
//! - **ListenerGuard**: unlisten handle returned by `listen`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rulewatch::{MediaQueryService, RuleSet, RuleWatcher, SimulatedQueryService};
//!
//! let rules = RuleSet::from_pairs([
//!     ("small", "(max-width:575px)"),
//!     ("large", "(min-width:576px)"),
//! ])?;
//!
//! let service = Arc::new(SimulatedQueryService::new());
//! service.set_matches("(max-width:575px)", true);
//!
//! let watcher = RuleWatcher::new(
//!     rules,
//!     Some(Arc::clone(&service) as Arc<dyn MediaQueryService>),
//! )?;
//!
//! let guard = watcher.listen(
//!     |state, _rules| {
//!         if state.is_match("small") {
//!             // compact layout
//!         }
//!     },
//!     true,
//! )?;
//!
//! // ... later
//! guard.unlisten();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod rules;
pub mod service;
pub mod state;
pub mod watcher;

// Re-export primary types at crate root for convenience
pub use error::{ExecutionError, ValidationError, WatchError, WatchResult};
pub use rules::RuleSet;
pub use service::{
    ChangeSink, MediaQueryService, QueryChange, QueryError, SimulatedQueryService,
};
pub use state::MatchState;
pub use watcher::{ListenerCallback, ListenerGuard, ListenerId, RuleWatcher, RuleWatcherConfig};
