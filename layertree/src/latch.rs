//! Fire-once completion latch keyed by pending identifiers.
//!
//! A [`CompletionLatch`] holds a multiset of pending keys and a completion
//! action. A key registered twice must be completed twice. Removing the last
//! outstanding entry runs the action exactly once. Removal, the emptiness
//! test and the fired flag share one critical section, so two completions
//! racing on different threads cannot both see a non-empty set and skip the
//! action, nor both run it.

use std::collections::HashMap;

use parking_lot::Mutex;

type Action = Box<dyn FnOnce() + Send>;

struct LatchState {
    /// Outstanding registrations per key; keys are removed at zero.
    pending: HashMap<String, usize>,
    action: Option<Action>,
}

impl LatchState {
    fn outstanding(&self) -> usize {
        self.pending.values().sum()
    }
}

/// Outcome of [`CompletionLatch::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// One entry for the key was removed; this many entries are still pending.
    Pending(usize),
    /// The key was the last one; the action ran.
    Fired,
    /// The key had no outstanding entry, or the action already ran.
    Ignored,
}

pub struct CompletionLatch {
    state: Mutex<LatchState>,
}

impl std::fmt::Debug for CompletionLatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CompletionLatch")
            .field("pending", &state.outstanding())
            .field("fired", &state.action.is_none())
            .finish()
    }
}

impl CompletionLatch {
    pub fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            state: Mutex::new(LatchState {
                pending: HashMap::new(),
                action: Some(Box::new(action)),
            }),
        }
    }

    /// Adds one pending entry for `key`.
    ///
    /// Returns the number of entries now outstanding for that key.
    pub fn register(&self, key: impl Into<String>) -> usize {
        let mut state = self.state.lock();
        let count = state.pending.entry(key.into()).or_insert(0);
        *count += 1;
        *count
    }

    /// Marks a key as done, running the action if it was the last one.
    pub fn complete(&self, key: &str) -> Completion {
        let action = {
            let mut state = self.state.lock();
            let Some(count) = state.pending.get_mut(key) else {
                return Completion::Ignored;
            };
            *count -= 1;
            if *count == 0 {
                state.pending.remove(key);
            }
            let remaining = state.outstanding();
            if remaining > 0 {
                return Completion::Pending(remaining);
            }
            state.action.take()
        };

        match action {
            Some(action) => {
                action();
                Completion::Fired
            }
            None => Completion::Ignored,
        }
    }

    /// Runs the action now if nothing is pending and it has not run yet.
    ///
    /// Returns true if this call ran the action.
    pub fn arm(&self) -> bool {
        let action = {
            let mut state = self.state.lock();
            if !state.pending.is_empty() {
                return false;
            }
            state.action.take()
        };
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    /// Number of outstanding entries, counting repeated keys.
    pub fn pending_count(&self) -> usize {
        self.state.lock().outstanding()
    }

    /// Pending keys in sorted order, repeated once per outstanding entry.
    pub fn pending(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keys: Vec<String> = state
            .pending
            .iter()
            .flat_map(|(key, &count)| std::iter::repeat(key.clone()).take(count))
            .collect();
        keys.sort();
        keys
    }

    pub fn has_fired(&self) -> bool {
        self.state.lock().action.is_none()
    }
}
