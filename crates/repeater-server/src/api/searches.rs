//! Search submission and status endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use repeater_core::{Band, DEFAULT_SAMPLE_INTERVAL_MI};
use repeater_search::{SearchRequest, DEFAULT_SEARCH_RADIUS_MI};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::state::AppState;
use crate::tasks::{SearchTask, TaskStatus};

#[derive(Debug, Deserialize)]
pub struct CreateSearchBody {
    pub origin: String,
    pub destination: String,
    pub search_radius_mi: Option<f64>,
    pub sample_interval_mi: Option<f64>,
    /// Band labels such as `"2m"` or `"70cm"`.
    pub bands: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct CreateSearchResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
}

impl CreateSearchBody {
    fn into_request(self) -> Result<SearchRequest, ApiError> {
        let bands = self
            .bands
            .map(|labels| {
                labels
                    .iter()
                    .map(|label| label.parse::<Band>())
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;

        Ok(SearchRequest {
            origin: self.origin,
            destination: self.destination,
            search_radius_mi: self.search_radius_mi.unwrap_or(DEFAULT_SEARCH_RADIUS_MI),
            sample_interval_mi: self
                .sample_interval_mi
                .unwrap_or(DEFAULT_SAMPLE_INTERVAL_MI),
            bands,
        })
    }
}

/// POST /v1/searches
pub async fn create_search(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateSearchBody>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateSearchResponse>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let request = body.into_request()?;
    let task_id = state.runner().submit(request)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(CreateSearchResponse {
            task_id,
            status: TaskStatus::Queued,
        }),
    ))
}

/// GET /v1/searches/:task_id
pub async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> Result<Json<SearchTask>, ApiError> {
    let id = Uuid::parse_str(&task_id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid task id: {task_id}")))?;
    state
        .store()
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Task {id} not found or expired")))
}
