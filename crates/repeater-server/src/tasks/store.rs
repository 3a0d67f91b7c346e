//! Task storage with expiry.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use super::model::SearchTask;

/// In-place mutation applied to a stored task.
pub type TaskChange<'a> = Box<dyn FnOnce(&mut SearchTask) + Send + 'a>;

/// Where search tasks live between submission and expiry.
pub trait TaskStore: Send + Sync {
    fn insert(&self, task: SearchTask);

    /// A live task, or `None` if it never existed or has expired.
    fn get(&self, id: &Uuid) -> Option<SearchTask>;

    /// Apply `change` to a live task. Returns false if the task is gone.
    fn update(&self, id: &Uuid, change: TaskChange<'_>) -> bool;

    /// Drop expired tasks and enforce the capacity limit. Returns how many were removed.
    fn prune(&self) -> usize;

    /// Tasks still queued or processing.
    fn active_count(&self) -> usize;
}

struct StoredTask {
    task: SearchTask,
    written_at: Instant,
}

/// Process-local store. Every write refreshes the task's expiry.
pub struct MemoryTaskStore {
    tasks: DashMap<Uuid, StoredTask>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryTaskStore {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            tasks: DashMap::new(),
            ttl,
            max_entries,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn is_expired(&self, stored: &StoredTask, now: Instant) -> bool {
        now.duration_since(stored.written_at) > self.ttl
    }

    /// Drop the entry if it is still expired as of `now`. A write that landed
    /// after the caller saw it expire keeps the entry alive.
    fn evict_if_expired(&self, id: &Uuid, now: Instant) -> bool {
        self.tasks
            .remove_if(id, |_, stored| self.is_expired(stored, now))
            .is_some()
    }
}

impl TaskStore for MemoryTaskStore {
    fn insert(&self, task: SearchTask) {
        self.tasks.insert(
            task.id,
            StoredTask {
                task,
                written_at: Instant::now(),
            },
        );
    }

    fn get(&self, id: &Uuid) -> Option<SearchTask> {
        let now = Instant::now();
        {
            let stored = self.tasks.get(id)?;
            if !self.is_expired(&stored, now) {
                return Some(stored.task.clone());
            }
        }
        self.evict_if_expired(id, now);
        None
    }

    fn update(&self, id: &Uuid, change: TaskChange<'_>) -> bool {
        let now = Instant::now();
        let Some(mut stored) = self.tasks.get_mut(id) else {
            return false;
        };
        if self.is_expired(&stored, now) {
            drop(stored);
            self.evict_if_expired(id, now);
            return false;
        }
        change(&mut stored.task);
        stored.written_at = now;
        true
    }

    fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.tasks.len();
        self.tasks.retain(|_, stored| !self.is_expired(stored, now));

        if self.tasks.len() > self.max_entries {
            // Finished tasks go first, oldest first within each group.
            let mut candidates: Vec<(bool, Instant, Uuid)> = self
                .tasks
                .iter()
                .map(|entry| {
                    let stored = entry.value();
                    (!stored.task.status.is_terminal(), stored.written_at, *entry.key())
                })
                .collect();
            candidates.sort();
            for (_, _, id) in candidates {
                if self.tasks.len() <= self.max_entries {
                    break;
                }
                self.tasks.remove(&id);
            }
        }

        before.saturating_sub(self.tasks.len())
    }

    fn active_count(&self) -> usize {
        let now = Instant::now();
        self.tasks
            .iter()
            .filter(|entry| {
                !entry.value().task.status.is_terminal() && !self.is_expired(entry.value(), now)
            })
            .count()
    }
}
