//! The task store: the ordered task list for one user, its search text, and
//! the save/load round-trip through a [`KeyValueBackend`].
//!
//! Every successful mutation rewrites the whole list under [`TASKS_KEY`] and
//! then notifies subscribers. Persistence failures never reach the caller;
//! they are logged and the in-memory list stays authoritative. If the saved
//! slot exists but cannot be read, saving is switched off for the life of the
//! store so the unread data is never replaced.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::io::backend::{BackendError, KeyValueBackend};
use crate::io::codec::{decode_tasks, encode_tasks};
use crate::model::task::{Priority, Task};
use crate::ops::search::{filter_tasks, filtered_indices};

/// The one slot the store reads and writes
pub const TASKS_KEY: &str = "SavedTasks";

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid position {position}: only {len} task(s) shown")]
    InvalidPosition { position: usize, len: usize },
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("id prefix '{prefix}' matches {matches} tasks")]
    AmbiguousId { prefix: String, matches: usize },
    #[error("could not encode tasks: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not decode saved tasks: {0}")]
    Decode(#[source] serde_json::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// What changed, passed to subscribers along with the full task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(Uuid),
    Toggled(Uuid),
    Deleted(Vec<Uuid>),
    SearchChanged,
}

/// Handle returned by [`TaskStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Change, &[Task])>;

pub struct TaskStore<B: KeyValueBackend> {
    backend: B,
    tasks: Vec<Task>,
    search_text: String,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    /// Cleared when the saved slot could not be read
    can_save: bool,
}

impl<B: KeyValueBackend> std::fmt::Debug for TaskStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskStore")
            .field("tasks", &self.tasks)
            .field("search_text", &self.search_text)
            .field("listeners", &self.listeners.len())
            .field("can_save", &self.can_save)
            .finish()
    }
}

impl<B: KeyValueBackend> TaskStore<B> {
    /// Create a store over `backend`, restoring any saved tasks.
    ///
    /// Missing or malformed saved data leaves the store empty. So does a
    /// slot that exists but can't be read, and then nothing is saved.
    pub fn open(backend: B) -> Self {
        let mut store = TaskStore {
            backend,
            tasks: Vec::new(),
            search_text: String::new(),
            listeners: Vec::new(),
            next_subscription: 0,
            can_save: true,
        };
        store.load();
        store
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks whose title contains `search_text` (case-insensitive), in
    /// insertion order. Empty text returns every task.
    pub fn filtered_tasks(&self, search_text: &str) -> Vec<&Task> {
        filter_tasks(&self.tasks, search_text)
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    /// The filtered view for the current search text
    pub fn visible_tasks(&self) -> Vec<&Task> {
        self.filtered_tasks(&self.search_text)
    }

    /// Resolve a full id or an unambiguous prefix of one.
    ///
    /// Hyphens are ignored and hex digits compare case-insensitively, so both
    /// `1A2B3C4D` and the hyphenated UUID form work.
    pub fn find_by_prefix(&self, prefix: &str) -> Result<&Task, StoreError> {
        let needle: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if needle.is_empty() {
            return Err(StoreError::NotFound(prefix.to_string()));
        }
        let mut found = self
            .tasks
            .iter()
            .filter(|t| t.id.simple().to_string().starts_with(&needle));
        match (found.next(), found.count()) {
            (None, _) => Err(StoreError::NotFound(prefix.to_string())),
            (Some(task), 0) => Ok(task),
            (Some(_), rest) => Err(StoreError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: rest + 1,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new task and persist. The title is not validated here.
    pub fn add_task(
        &mut self,
        title: impl Into<String>,
        priority: Priority,
        category: impl Into<String>,
    ) -> &Task {
        let task = Task::new(title, priority, category);
        let id = task.id;
        self.tasks.push(task);
        self.save();
        self.notify(&Change::Added(id));
        let last = self.tasks.len() - 1;
        &self.tasks[last]
    }

    /// Flip completion of the task with `id`.
    ///
    /// Returns `false` without saving or notifying if no task has that id.
    pub fn toggle_complete(&mut self, id: Uuid) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        task.is_completed = !task.is_completed;
        self.save();
        self.notify(&Change::Toggled(id));
        true
    }

    /// Delete tasks by position in the filtered view for `search_text`.
    ///
    /// All positions are checked before anything is removed; one bad
    /// position rejects the whole batch. Duplicates count once. Returns the
    /// removed tasks in display order.
    pub fn delete_tasks(
        &mut self,
        positions: &[usize],
        search_text: &str,
    ) -> Result<Vec<Task>, StoreError> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        let shown = filtered_indices(&self.tasks, search_text);
        let mut targets = BTreeSet::new();
        for &position in positions {
            let index = shown.get(position).ok_or(StoreError::InvalidPosition {
                position,
                len: shown.len(),
            })?;
            targets.insert(*index);
        }

        // Remove back to front so earlier indices stay valid
        let mut removed: Vec<Task> = targets
            .iter()
            .rev()
            .map(|&index| self.tasks.remove(index))
            .collect();
        removed.reverse();

        self.save();
        self.notify(&Change::Deleted(removed.iter().map(|t| t.id).collect()));
        Ok(removed)
    }

    /// Delete tasks by position in the current visible view
    pub fn delete_visible(&mut self, positions: &[usize]) -> Result<Vec<Task>, StoreError> {
        let search_text = self.search_text.clone();
        self.delete_tasks(positions, &search_text)
    }

    /// Change the search text. Subscribers are told only if it differs.
    pub fn set_search_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.search_text {
            return;
        }
        self.search_text = text;
        self.notify(&Change::SearchChanged);
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Register a callback run after every change, with the full task list.
    pub fn subscribe(&mut self, listener: impl FnMut(&Change, &[Task]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: &Change) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(change, &self.tasks);
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Give back the backend, e.g. to reopen a store over it
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Whether mutations are being written to the backend
    pub fn can_save(&self) -> bool {
        self.can_save
    }

    fn save(&mut self) {
        if !self.can_save {
            log::warn!("not saving: saved tasks could not be read when the store opened");
            return;
        }
        if let Err(e) = self.try_save() {
            log::warn!("could not save tasks: {}", e);
        }
    }

    fn try_save(&mut self) -> Result<(), StoreError> {
        let bytes = encode_tasks(&self.tasks).map_err(StoreError::Encode)?;
        self.backend.set(TASKS_KEY, &bytes)?;
        log::debug!("saved {} task(s)", self.tasks.len());
        Ok(())
    }

    fn load(&mut self) {
        match self.try_load() {
            Ok(Some(tasks)) => {
                log::debug!("loaded {} task(s)", tasks.len());
                self.tasks = tasks;
            }
            Ok(None) => log::debug!("no saved tasks"),
            Err(StoreError::Backend(e @ BackendError::Read { .. })) => {
                log::warn!("{}; changes will not be saved", e);
                self.can_save = false;
            }
            Err(e) => log::warn!("ignoring saved tasks: {}", e),
        }
    }

    fn try_load(&self) -> Result<Option<Vec<Task>>, StoreError> {
        match self.backend.get(TASKS_KEY)? {
            Some(bytes) => decode_tasks(&bytes).map(Some).map_err(StoreError::Decode),
            None => Ok(None),
        }
    }
}
