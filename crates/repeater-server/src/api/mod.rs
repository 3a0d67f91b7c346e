//! REST API.

pub mod error;
pub mod searches;


use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::state::AppState;

/// Create the API router.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/v1/searches", post(searches::create_search))
        .route("/v1/searches/:task_id", get(searches::get_search))
}
