//! Background search tasks: records, storage and execution.

pub mod model;
pub mod store;
pub mod worker;

pub use model::{SearchTask, TaskStatus};
pub use store::{MemoryTaskStore, TaskChange, TaskStore};
pub use worker::{SearchRunner, SubmitError};
