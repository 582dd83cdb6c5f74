//! Coalescing debounce queue on a millisecond clock.
//!
//! Every task has a key; scheduling a task replaces the pending task with the
//! same key, so a burst of events collapses into the last one. The clock is
//! supplied by the caller, which keeps the queue deterministic under test.

use crate::dom::StructuralPath;
use indexmap::IndexMap;

/// Deferred work produced by page events
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Record the window scroll position
    WindowScroll { scroll_y: f64 },

    /// Record a container scroll position
    ElementScroll { path: StructuralPath, scroll_top: f64 },

    /// Push the current page and rescan after a mutation or submit
    BoundaryCheck,
}

/// Coalescing key: one pending task per key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    WindowScroll,
    ElementScroll(StructuralPath),
    BoundaryCheck,
}

impl Task {
    pub fn key(&self) -> TaskKey {
        match self {
            Task::WindowScroll { .. } => TaskKey::WindowScroll,
            Task::ElementScroll { path, .. } => TaskKey::ElementScroll(path.clone()),
            Task::BoundaryCheck => TaskKey::BoundaryCheck,
        }
    }
}

#[derive(Debug, Clone)]
struct Pending {
    task: Task,
    due_at: u64,
    seq: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    pending: IndexMap<TaskKey, Pending>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to run `delay_ms` after `now`, cancelling any pending task
    /// with the same key
    pub fn schedule(&mut self, task: Task, now: u64, delay_ms: u64) {
        let key = task.key();
        let due_at = now.saturating_add(delay_ms);
        self.seq += 1;
        if self.pending.contains_key(&key) {
            log::debug!("Rescheduling {:?} for {}", key, due_at);
        }
        self.pending.insert(key, Pending { task, due_at, seq: self.seq });
    }

    /// Remove and return every task due at `now`, earliest first
    pub fn take_due(&mut self, now: u64) -> Vec<Task> {
        let mut due: Vec<Pending> = Vec::new();
        self.pending.retain(|_, pending| {
            if pending.due_at <= now {
                due.push(pending.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|pending| (pending.due_at, pending.seq));
        due.into_iter().map(|pending| pending.task).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
