//! Shared application state.

use std::sync::Arc;

use crate::tasks::{SearchRunner, TaskStore};

pub struct AppState {
    runner: SearchRunner,
}

impl AppState {
    pub fn new(runner: SearchRunner) -> Self {
        Self { runner }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        self.runner.store()
    }

    pub fn runner(&self) -> &SearchRunner {
        &self.runner
    }
}
