//! Debounced reconciliation of external file changes.
//!
//! Per tab the reconciler is Idle, EventPending (debounce timer running) or
//! PromptShown. It only decides *when* something should happen; the session
//! does the file checks and prompting.
//!
//! All methods take the current instant so timing is driven by the caller.

use crate::app::types::TabKey;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Classified outcome of a fired debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Changed,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    EventPending,
    PromptShown,
}

/// What happened to an incoming event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDecision {
    /// Arrived too soon after our own save
    Suppressed,
    /// A timer is already running for the tab
    AlreadyPending,
    /// A new timer was started
    Scheduled,
}

#[derive(Debug)]
pub struct Reconciler {
    suppress_window: Duration,
    debounce: Duration,
    last_save: HashMap<TabKey, Instant>,
    /// Tab -> deadline of its one pending timer
    timers: HashMap<TabKey, Instant>,
    pending_reload: HashMap<TabKey, ChangeKind>,
    prompting: HashSet<TabKey>,
}

impl Reconciler {
    pub fn new(suppress_window: Duration, debounce: Duration) -> Self {
        Self {
            suppress_window,
            debounce,
            last_save: HashMap::new(),
            timers: HashMap::new(),
            pending_reload: HashMap::new(),
            prompting: HashSet::new(),
        }
    }

    /// Record that the session itself wrote the tab's file at `now`
    pub fn record_save(&mut self, key: TabKey, now: Instant) {
        self.last_save.insert(key, now);
    }

    /// Handle a raw file event for `key`
    pub fn on_event(&mut self, key: TabKey, now: Instant) -> EventDecision {
        if let Some(saved_at) = self.last_save.get(&key) {
            if now.saturating_duration_since(*saved_at) < self.suppress_window {
                tracing::debug!("Suppressing file event for tab {:?}: own save", key);
                return EventDecision::Suppressed;
            }
        }
        if self.timers.contains_key(&key) {
            tracing::debug!("Debounce timer already pending for tab {:?}", key);
            return EventDecision::AlreadyPending;
        }
        self.timers.insert(key, now + self.debounce);
        tracing::debug!("Debounce timer started for tab {:?}", key);
        EventDecision::Scheduled
    }

    /// Remove and return the tabs whose timers are due at `now`.
    ///
    /// A timer clears itself before the caller evaluates it, so a new event
    /// arriving during evaluation starts a fresh timer.
    pub fn take_due(&mut self, now: Instant) -> Vec<TabKey> {
        let mut due: Vec<(Instant, TabKey)> = self
            .timers
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, *key))
            .collect();
        due.sort();
        for (_, key) in &due {
            self.timers.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }

    /// Earliest pending deadline, for the shell's poll timeout
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().min().copied()
    }

    /// Defer a classified change until the tab becomes active
    pub fn queue_reload(&mut self, key: TabKey, kind: ChangeKind) {
        self.pending_reload.insert(key, kind);
    }

    pub fn take_pending_reload(&mut self, key: TabKey) -> Option<ChangeKind> {
        self.pending_reload.remove(&key)
    }

    pub fn pending_reload(&self, key: TabKey) -> Option<ChangeKind> {
        self.pending_reload.get(&key).copied()
    }

    pub fn begin_prompt(&mut self, key: TabKey) {
        self.prompting.insert(key);
    }

    pub fn end_prompt(&mut self, key: TabKey) {
        self.prompting.remove(&key);
    }

    pub fn state(&self, key: TabKey) -> ReconcileState {
        if self.prompting.contains(&key) {
            ReconcileState::PromptShown
        } else if self.timers.contains_key(&key) {
            ReconcileState::EventPending
        } else {
            ReconcileState::Idle
        }
    }

    /// Drop all state for a closed tab
    pub fn forget(&mut self, key: TabKey) {
        self.last_save.remove(&key);
        self.timers.remove(&key);
        self.pending_reload.remove(&key);
        self.prompting.remove(&key);
    }

    pub fn clear(&mut self) {
        self.last_save.clear();
        self.timers.clear();
        self.pending_reload.clear();
        self.prompting.clear();
    }
}
