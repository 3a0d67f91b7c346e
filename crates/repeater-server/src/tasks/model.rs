//! Background search task records.

use chrono::{DateTime, Utc};
use repeater_core::SearchResult;
use repeater_search::{ProgressUpdate, SearchRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }
}

/// A search submitted to the service and everything known about it so far.
///
/// Once a task reaches `done` or `error` every further transition is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTask {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: SearchRequest,
    pub status: TaskStatus,
    pub progress_message: String,
    pub progress_percent: Option<u8>,
    pub result: Option<SearchResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SearchTask {
    pub fn queued(request: SearchRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request,
            status: TaskStatus::Queued,
            progress_message: "Queued".to_string(),
            progress_percent: None,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) {
        if self.status == TaskStatus::Queued {
            self.status = TaskStatus::Processing;
            self.progress_message = "Starting search...".to_string();
            self.touch();
        }
    }

    pub fn record_progress(&mut self, update: ProgressUpdate) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Processing;
        self.progress_message = update.message;
        if update.percent.is_some() {
            self.progress_percent = update.percent;
        }
        self.touch();
    }

    /// Store the outcome. A result carrying an error fails the task but keeps
    /// whatever route information the search got before failing.
    pub fn finish(&mut self, result: SearchResult) {
        if self.status.is_terminal() {
            return;
        }
        match result.error.clone() {
            Some(error) => {
                self.status = TaskStatus::Error;
                self.progress_message = "Search failed".to_string();
                self.error = Some(error);
            }
            None => {
                self.status = TaskStatus::Done;
                self.progress_message = format!("Found {} repeaters", result.repeaters.len());
                self.progress_percent = Some(100);
            }
        }
        self.result = Some(result);
        self.touch();
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = TaskStatus::Error;
        self.progress_message = "Search failed".to_string();
        self.error = Some(error.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
