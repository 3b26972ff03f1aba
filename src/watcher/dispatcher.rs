//! Rule watcher and dispatch worker.
//!
//! The watcher registers one change subscription per rule with the
//! media-query service and owns a dedicated worker thread that fans change
//! events out to registered listeners. Subscription sinks enqueue events
//! using a bounded channel and never block the service's notification path.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, never, select, Receiver, Sender, TrySendError};
use tracing::{trace, warn};

use crate::error::{ExecutionError, WatchError, WatchResult};
use crate::rules::RuleSet;
use crate::service::{MediaQueryService, QueryChange};
use crate::state::MatchState;

use super::debounce::Debounce;
use super::listener::{ListenerGuard, ListenerId};

/// Listener callback: receives a match-state snapshot and the rule set.
pub type ListenerCallback = Box<dyn FnMut(MatchState, &RuleSet) + Send>;

#[allow(missing_docs)]
#[derive(Debug, Clone)]
pub struct RuleWatcherConfig {
    /// Per-listener quiescence window; change bursts inside the window
    /// collapse into one callback carrying the latest state.
    pub debounce_window: Duration,
    /// Max queued change events before drops apply.
    pub change_queue_capacity: usize,
    /// Max queued control messages (listen/unlisten).
    pub control_queue_capacity: usize,
}

impl Default for RuleWatcherConfig {
    fn default() -> Self {
        Self {
            debounce_window: Duration::from_millis(1),
            change_queue_capacity: 1024,
            control_queue_capacity: 256,
        }
    }
}

pub(crate) enum ControlMsg {
    Listen {
        listener_id: ListenerId,
        state: MatchState,
        callback: ListenerCallback,
        reply: Sender<()>,
    },
    Unlisten {
        listener_id: ListenerId,
    },
}

#[derive(Debug, Clone)]
struct ChangeEvent {
    key: String,
    matches: bool,
    at: DateTime<Utc>,
}

struct ListenerEntry {
    state: MatchState,
    callback: ListenerCallback,
    debounce: Debounce,
}

/// Watches a rule set through a media-query service and notifies listeners,
/// debounced, whenever the aggregate match state changes.
///
/// The dispatch worker exits once the watcher and every [`ListenerGuard`]
/// it handed out have been dropped.
pub struct RuleWatcher {
    rules: Arc<RuleSet>,
    inner: Option<WatcherInner>,
}

struct WatcherInner {
    service: Arc<dyn MediaQueryService>,
    control_tx: Sender<ControlMsg>,
    dropped_changes: Arc<AtomicU64>,
}

impl RuleWatcher {
    /// Creates a watcher with default configuration.
    ///
    /// `service` is the environment's media-query capability. Passing
    /// `None` means the capability is unavailable; this is not fatal. The
    /// watcher logs a warning once and degrades to an inert object: the
    /// rule set stays inspectable and [`RuleWatcher::listen`] still hands
    /// out working guards, but nothing ever notifies.
    ///
    /// # Errors
    /// Propagates the service's error when a rule subscription is refused,
    /// for example an invalid query expression. Expressions are never
    /// validated locally.
    pub fn new(rules: RuleSet, service: Option<Arc<dyn MediaQueryService>>) -> WatchResult<Self> {
        Self::with_config(rules, service, RuleWatcherConfig::default())
    }

    /// Creates a watcher with explicit configuration.
    ///
    /// # Errors
    /// Same contract as [`RuleWatcher::new`].
    pub fn with_config(
        rules: RuleSet,
        service: Option<Arc<dyn MediaQueryService>>,
        cfg: RuleWatcherConfig,
    ) -> WatchResult<Self> {
        let rules = Arc::new(rules);

        let Some(service) = service else {
            warn!("media-query service unavailable; watcher is inert");
            return Ok(Self { rules, inner: None });
        };

        let (control_tx, control_rx) = bounded::<ControlMsg>(cfg.control_queue_capacity.max(1));
        let (change_tx, change_rx) = bounded::<ChangeEvent>(cfg.change_queue_capacity.max(1));

        let dropped_changes = Arc::new(AtomicU64::new(0));

        let worker_rules = Arc::clone(&rules);
        let window = cfg.debounce_window;
        thread::Builder::new()
            .name("rulewatch-dispatch".to_string())
            .spawn(move || worker_loop(&worker_rules, window, control_rx, change_rx))
            .expect("failed to spawn rulewatch dispatch worker");

        for (key, expression) in rules.iter() {
            // Bind the key so the event can report which rule changed.
            let key = key.to_string();
            let tx = change_tx.clone();
            let dropped = Arc::clone(&dropped_changes);
            service.subscribe(
                expression,
                Box::new(move |change: QueryChange| {
                    let event = ChangeEvent {
                        key: key.clone(),
                        matches: change.matches,
                        at: change.at,
                    };
                    match tx.try_send(event) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }),
            )?;
        }

        Ok(Self {
            rules,
            inner: Some(WatcherInner {
                service,
                control_tx,
                dropped_changes,
            }),
        })
    }

    /// The rule set this watcher was built from.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// False when the watcher was constructed without a capability and is
    /// inert.
    #[must_use]
    pub const fn is_watching(&self) -> bool {
        self.inner.is_some()
    }

    /// Change events dropped because the dispatch queue was full.
    #[must_use]
    pub fn dropped_changes(&self) -> u64 {
        self.inner
            .as_ref()
            .map_or(0, |inner| inner.dropped_changes.load(Ordering::Relaxed))
    }

    /// Registers a listener.
    ///
    /// Evaluates the current match state of every rule synchronously. When
    /// `immediate` is set, the callback is invoked once with that snapshot
    /// before this call returns. The registration is acknowledged by the
    /// dispatch worker before the guard is handed back, so events observed
    /// afterwards reach the new listener.
    ///
    /// Each listener owns its own [`MatchState`]; callbacks always receive
    /// a snapshot, never a shared live object.
    ///
    /// On an inert watcher nothing is evaluated or registered: the
    /// immediate callback is skipped and the returned guard is a no-op.
    ///
    /// # Errors
    /// Propagates the service's error when a rule evaluation is refused,
    /// and [`ExecutionError::Disconnected`] if the dispatch worker is gone.
    pub fn listen<F>(&self, callback: F, immediate: bool) -> WatchResult<ListenerGuard>
    where
        F: FnMut(MatchState, &RuleSet) + Send + 'static,
    {
        let listener_id = ListenerId::new();

        let Some(inner) = &self.inner else {
            return Ok(ListenerGuard::inert(listener_id));
        };

        let mut callback = Box::new(callback) as ListenerCallback;

        let mut state = MatchState::unmatched(&self.rules);
        for (key, expression) in self.rules.iter() {
            state.set(key, inner.service.evaluate(expression)?);
        }

        if immediate {
            callback(state.clone(), &self.rules);
        }

        let disconnected = || {
            WatchError::Execution(ExecutionError::Disconnected {
                path: "watcher_control".to_string(),
            })
        };

        let (reply_tx, reply_rx) = bounded::<()>(1);
        inner
            .control_tx
            .send(ControlMsg::Listen {
                listener_id,
                state,
                callback,
                reply: reply_tx,
            })
            .map_err(|_| disconnected())?;

        // Wait for the worker's ack so the registration is live before the
        // guard is returned.
        reply_rx.recv().map_err(|_| disconnected())?;

        Ok(ListenerGuard::new(listener_id, inner.control_tx.clone()))
    }
}

impl fmt::Debug for RuleWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleWatcher")
            .field("rules", &self.rules)
            .field("watching", &self.inner.is_some())
            .finish_non_exhaustive()
    }
}

/// Select timeout when no debounce is armed.
const IDLE_TICK: Duration = Duration::from_millis(50);

fn worker_loop(
    rules: &RuleSet,
    window: Duration,
    control_rx: Receiver<ControlMsg>,
    mut change_rx: Receiver<ChangeEvent>,
) {
    let mut listeners: HashMap<ListenerId, ListenerEntry> = HashMap::new();

    loop {
        let now = Instant::now();
        let timeout = listeners
            .values()
            .filter_map(|entry| entry.debounce.due_in(now))
            .min()
            .unwrap_or(IDLE_TICK);

        let mut changes_closed = false;

        select! {
            recv(control_rx) -> msg => {
                match msg {
                    Ok(ControlMsg::Listen { listener_id, state, callback, reply }) => {
                        listeners.insert(listener_id, ListenerEntry {
                            state,
                            callback,
                            debounce: Debounce::new(window),
                        });
                        let _ = reply.send(());
                    }
                    Ok(ControlMsg::Unlisten { listener_id }) => {
                        // The entry's armed debounce goes with it: no
                        // callback fires after removal.
                        listeners.remove(&listener_id);
                    }
                    Err(_) => {
                        // Watcher and every guard are gone.
                        break;
                    }
                }
            }
            recv(change_rx) -> msg => {
                match msg {
                    Ok(event) => on_change(&mut listeners, &event, Instant::now()),
                    Err(_) => changes_closed = true,
                }
            }
            default(timeout) => {}
        }

        if changes_closed {
            // The service dropped its sinks. Keep serving control traffic
            // for the remaining guards without spinning on a closed channel.
            change_rx = never();
        }

        flush_due(&mut listeners, rules, Instant::now());
    }
}

fn on_change(
    listeners: &mut HashMap<ListenerId, ListenerEntry>,
    event: &ChangeEvent,
    now: Instant,
) {
    trace!(key = %event.key, matches = event.matches, at = %event.at, "rule changed");

    for entry in listeners.values_mut() {
        // `set` refuses keys outside the listener's rule set.
        if entry.state.set(&event.key, event.matches) {
            entry.debounce.poke(now);
        }
    }
}

fn flush_due(
    listeners: &mut HashMap<ListenerId, ListenerEntry>,
    rules: &RuleSet,
    now: Instant,
) {
    for entry in listeners.values_mut() {
        if entry.debounce.fire_if_due(now) {
            (entry.callback)(entry.state.clone(), rules);
        }
    }
}
