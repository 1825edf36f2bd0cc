//! The task store and the ports it talks through.
//!
//! [`TaskStore`] owns the collection for the session. After every successful
//! mutation it serializes the whole collection into one named slot of a
//! [`TaskStorage`] backend; there are no partial writes. Reads never go back
//! to storage once the store is open.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::config::StoreConfig;
use crate::display::sort_tasks;
use crate::error::{PersistedStateCorrupt, StorageError, StoreError};
use crate::schema::validate_task;
use crate::task::{Task, TaskInput, TaskUpdate};

/// A key-value slot store, e.g. browser local storage.
pub trait TaskStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, contents: &str) -> Result<(), StorageError>;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// In-memory storage. Clones share the same slots, so a caller can keep a
/// handle and inspect what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Rc<RefCell<HashMap<String, String>>>,
    reject_writes: Rc<RefCell<bool>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(key: impl Into<String>, contents: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.slots.borrow_mut().insert(key.into(), contents.into());
        storage
    }

    pub fn slot(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    /// Makes every subsequent write fail, as a full or disabled backend would.
    pub fn reject_writes(&self, reject: bool) {
        *self.reject_writes.borrow_mut() = reject;
    }
}

impl TaskStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slot(key))
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StorageError> {
        if *self.reject_writes.borrow() {
            return Err(StorageError::Write {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.slots
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}

/// Decodes slot contents entry by entry.
///
/// Returns every task that validated plus a report of what was skipped. An
/// entry that repeats an id already seen is skipped too; the first one wins.
pub fn decode_slot(contents: &str) -> (Vec<Task>, Vec<PersistedStateCorrupt>) {
    if contents.trim().is_empty() {
        return (Vec::new(), Vec::new());
    }

    match serde_json::from_str::<Value>(contents) {
        Ok(Value::Array(entries)) => validate_entries(entries),
        Ok(_) => (Vec::new(), vec![PersistedStateCorrupt::NotASequence]),
        Err(err) => (Vec::new(), vec![PersistedStateCorrupt::Unparsable(err)]),
    }
}

/// Puts a configured seed through the same checks as stored entries.
///
/// Seed tasks can be built in code or deserialized straight into [`Task`],
/// so nothing else has enforced titles, timestamps or id uniqueness on them.
pub fn validate_seed(seed: &[Task]) -> (Vec<Task>, Vec<PersistedStateCorrupt>) {
    match seed.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>() {
        Ok(entries) => validate_entries(entries),
        Err(err) => (Vec::new(), vec![PersistedStateCorrupt::Unparsable(err)]),
    }
}

fn validate_entries(entries: Vec<Value>) -> (Vec<Task>, Vec<PersistedStateCorrupt>) {
    let mut tasks = Vec::with_capacity(entries.len());
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        match validate_task(entry) {
            Ok(task) if !seen.insert(task.id) => {
                problems.push(PersistedStateCorrupt::DuplicateId { index, id: task.id });
            }
            Ok(task) => tasks.push(task),
            Err(source) => problems.push(PersistedStateCorrupt::InvalidEntry { index, source }),
        }
    }

    (tasks, problems)
}

pub fn encode_slot(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

pub struct TaskStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    storage_key: String,
    tasks: Vec<Task>,
}

impl<S: TaskStorage> TaskStore<S> {
    pub fn open(storage: S, config: StoreConfig) -> Self {
        Self::open_with_clock(storage, SystemClock, config)
    }
}

impl<S: TaskStorage, C: Clock> TaskStore<S, C> {
    /// Loads the slot named in `config`, falling back to the configured seed
    /// when nothing valid is found, and mirrors the result back to storage.
    ///
    /// When the slot can't be read at all nothing is written back, so a
    /// backend that recovers later still holds its own collection.
    pub fn open_with_clock(storage: S, clock: C, config: StoreConfig) -> Self {
        let StoreConfig { storage_key, seed } = config;

        let (contents, readable) = match storage.read(&storage_key) {
            Ok(contents) => (contents.unwrap_or_default(), true),
            Err(err) => {
                tracing::warn!(key = %storage_key, error = %err, "failed to read task slot");
                (String::new(), false)
            }
        };

        let (mut tasks, problems) = decode_slot(&contents);
        for problem in &problems {
            tracing::warn!(key = %storage_key, error = %problem, "skipping persisted task data");
        }
        if tasks.is_empty() {
            let (seeded, rejected) = validate_seed(&seed);
            for problem in &rejected {
                tracing::warn!(key = %storage_key, error = %problem, "skipping seed task");
            }
            tracing::debug!(key = %storage_key, seeded = seeded.len(), "no stored tasks, using seed");
            tasks = seeded;
        } else {
            tracing::debug!(key = %storage_key, loaded = tasks.len(), "loaded tasks");
        }

        let mut store = Self {
            storage,
            clock,
            storage_key,
            tasks,
        };
        if readable {
            store.persist();
        }
        store
    }

    pub fn add(&mut self, input: TaskInput) -> Result<Task, StoreError> {
        let input = input.normalized()?;
        let last_id = self.tasks.iter().map(|task| task.id).max().unwrap_or(0);
        let id = last_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;

        let task = Task::from_input(id, input, self.clock.now());
        self.tasks.push(task.clone());
        tracing::debug!(id, title = %task.title, "task added");
        self.persist();
        Ok(task)
    }

    /// Merges `update` onto task `id`.
    ///
    /// An update with no fields set leaves the task, its `updated_at`, and the
    /// slot untouched.
    pub fn edit(&mut self, id: u32, update: TaskUpdate) -> Result<Task, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let update = update.normalized()?;
        if update.is_empty() {
            return Ok(self.tasks[index].clone());
        }

        let now = self.clock.now();
        let task = &mut self.tasks[index];
        task.apply(update, now);
        let task = task.clone();
        tracing::debug!(id, status = %task.status, "task updated");
        self.persist();
        Ok(task)
    }

    /// Removes task `id`. Returns `false` when no such task exists.
    pub fn remove(&mut self, id: u32) -> bool {
        let Some(index) = self.position(id) else {
            tracing::debug!(id, "remove of unknown task ignored");
            return false;
        };
        self.tasks.remove(index);
        tracing::debug!(id, "task removed");
        self.persist();
        true
    }

    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    /// The collection in display order.
    pub fn sorted(&self) -> Vec<Task> {
        sort_tasks(&self.tasks)
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn position(&self, id: u32) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    // Fire-and-forget: a failed write is logged and the in-memory state stands.
    fn persist(&mut self) {
        let contents = match encode_slot(&self.tasks) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize tasks");
                return;
            }
        };
        if let Err(err) = self.storage.write(&self.storage_key, &contents) {
            tracing::warn!(key = %self.storage_key, error = %err, "failed to persist tasks");
        }
    }
}
