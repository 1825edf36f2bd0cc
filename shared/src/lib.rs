//! Task model, validation, display helpers and the persisted task store.

pub mod config;
pub mod display;
pub mod error;
pub mod schema;
pub mod store;
pub mod task;

pub use config::StoreConfig;
pub use error::{PersistedStateCorrupt, StorageError, StoreError, ValidationError};
pub use store::{Clock, MemoryStorage, SystemClock, TaskStorage, TaskStore};
pub use task::{Category, Priority, Status, Task, TaskInput, TaskUpdate};
