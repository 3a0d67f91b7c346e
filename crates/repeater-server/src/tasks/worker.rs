//! Runs submitted searches in the background.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use repeater_search::{ProgressSink, ProgressUpdate, SearchPipeline, SearchRequest};
use thiserror::Error;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::model::SearchTask;
use super::store::TaskStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Invalid(String),
    #[error("Too many searches in progress; try again shortly.")]
    Busy,
}

/// How often a queued task's expiry is refreshed while it waits for a slot.
const DEFAULT_QUEUE_KEEPALIVE: Duration = Duration::from_secs(60);

/// Accepts search requests and executes them with bounded concurrency.
#[derive(Clone)]
pub struct SearchRunner {
    store: Arc<dyn TaskStore>,
    pipeline: SearchPipeline,
    permits: Arc<Semaphore>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    queue_keepalive: Duration,
}

impl SearchRunner {
    /// At most `max_concurrent` searches run at once; up to four times that
    /// many may be unfinished before submissions are refused.
    pub fn new(store: Arc<dyn TaskStore>, pipeline: SearchPipeline, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            store,
            pipeline,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            pending: Arc::new(AtomicUsize::new(0)),
            max_pending: max_concurrent.saturating_mul(4),
            queue_keepalive: DEFAULT_QUEUE_KEEPALIVE,
        }
    }

    /// Refresh interval for queued tasks. Must be shorter than the store's TTL.
    pub fn with_queue_keepalive(mut self, every: Duration) -> Self {
        self.queue_keepalive = every.max(Duration::from_millis(1));
        self
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Validate and enqueue a search, returning the new task id immediately.
    pub fn submit(&self, request: SearchRequest) -> Result<Uuid, SubmitError> {
        request
            .validate()
            .map_err(|err| SubmitError::Invalid(err.to_string()))?;

        let Some(slot) = self.reserve_slot() else {
            tracing::warn!("Rejecting search: {} searches already pending", self.max_pending);
            return Err(SubmitError::Busy);
        };

        let task = SearchTask::queued(request.clone());
        let id = task.id;
        self.store.insert(task);
        tracing::info!(
            "Queued search {}: '{}' -> '{}'",
            id,
            request.origin,
            request.destination
        );

        let store = self.store.clone();
        let worker = tokio::spawn(run_search(
            self.store.clone(),
            self.pipeline.clone(),
            self.permits.clone(),
            self.queue_keepalive,
            id,
            request,
        ));
        tokio::spawn(async move {
            let _slot = slot;
            match worker.await {
                Ok(()) => {}
                Err(err) if err.is_panic() => {
                    let message = panic_message(err.into_panic());
                    tracing::error!("Search {} panicked: {}", id, message);
                    let error = format!("Internal Server Error: {message}");
                    store.update(&id, Box::new(move |task: &mut SearchTask| task.fail(error)));
                }
                Err(err) => {
                    tracing::warn!("Search {} was cancelled: {}", id, err);
                    store.update(&id, Box::new(|task: &mut SearchTask| task.fail("Search was cancelled")));
                }
            }
        });

        Ok(id)
    }

    fn reserve_slot(&self) -> Option<PendingSlot> {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_pending).then_some(n + 1)
            })
            .ok()?;
        Some(PendingSlot(self.pending.clone()))
    }
}

/// One unfinished search counted against the pending limit.
struct PendingSlot(Arc<AtomicUsize>);

impl Drop for PendingSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn run_search(
    store: Arc<dyn TaskStore>,
    pipeline: SearchPipeline,
    permits: Arc<Semaphore>,
    queue_keepalive: Duration,
    id: Uuid,
    request: SearchRequest,
) {
    let acquire = permits.acquire_owned();
    tokio::pin!(acquire);
    let mut keepalive = tokio::time::interval(queue_keepalive);
    keepalive.tick().await;

    let acquired = loop {
        tokio::select! {
            acquired = &mut acquire => break acquired,
            _ = keepalive.tick() => {
                if !store.update(&id, Box::new(|_: &mut SearchTask| {})) {
                    tracing::debug!("Search {} expired while queued", id);
                    return;
                }
            }
        }
    };
    let _permit = match acquired {
        Ok(permit) => permit,
        Err(_) => {
            store.update(
                &id,
                Box::new(|task: &mut SearchTask| task.fail("Search worker pool is closed")),
            );
            return;
        }
    };

    if !store.update(&id, Box::new(|task: &mut SearchTask| task.start())) {
        tracing::debug!("Search {} expired before it started", id);
        return;
    }

    let progress = TaskProgress {
        store: store.clone(),
        id,
    };
    let result = pipeline.find_repeaters_along_route(&request, &progress).await;

    match &result.error {
        Some(error) => tracing::info!("Search {} failed: {}", id, error),
        None => tracing::info!(
            "Search {} done: {} repeaters from {} samples",
            id,
            result.repeaters.len(),
            result.sample_count
        ),
    }
    store.update(&id, Box::new(move |task: &mut SearchTask| task.finish(result)));
}

/// Writes pipeline progress into the task record.
struct TaskProgress {
    store: Arc<dyn TaskStore>,
    id: Uuid,
}

impl ProgressSink for TaskProgress {
    fn report(&self, update: ProgressUpdate) {
        self.store.update(
            &self.id,
            Box::new(move |task: &mut SearchTask| task.record_progress(update)),
        );
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "search worker panicked".to_string()
    }
}
