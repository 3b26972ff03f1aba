//! Listener registration handles.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dispatcher::ControlMsg;

/// Unique identifier for a listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Creates a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle for a registered listener.
///
/// Dropping the guard performs a best-effort unlisten.
#[derive(Debug)]
pub struct ListenerGuard {
    listener_id: ListenerId,
    control_tx: Option<Sender<ControlMsg>>,
    unlistened: AtomicBool,
}

impl ListenerGuard {
    pub(crate) fn new(listener_id: ListenerId, control_tx: Sender<ControlMsg>) -> Self {
        Self {
            listener_id,
            control_tx: Some(control_tx),
            unlistened: AtomicBool::new(false),
        }
    }

    /// Guard handed out by an inert watcher: nothing was registered, so
    /// unlisten has nothing to remove.
    pub(crate) fn inert(listener_id: ListenerId) -> Self {
        Self {
            listener_id,
            control_tx: None,
            unlistened: AtomicBool::new(true),
        }
    }

    /// The registration id backing this guard.
    #[must_use]
    pub const fn listener_id(&self) -> ListenerId {
        self.listener_id
    }

    /// Deregisters the listener.
    ///
    /// Non-blocking and idempotent. Once the dispatch worker removes the
    /// registration, its debounce state goes with it, so a pending deferred
    /// invocation is cancelled rather than delivered.
    pub fn unlisten(&self) {
        if self.unlistened.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(control_tx) = &self.control_tx {
            let _ = control_tx.try_send(ControlMsg::Unlisten {
                listener_id: self.listener_id,
            });
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        // Best-effort: do not block on shutdown.
        self.unlisten();
    }
}
