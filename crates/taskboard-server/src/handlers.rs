//! HTTP handlers for chat and direct board routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use taskboard_core::board::Move;
use taskboard_core::errors::GatewayError;
use taskboard_core::messages::ChatMessage;
use taskboard_core::{NewTask, Status, Task, TaskId};
use taskboard_engine::{BoardError, ChatReply, EngineError, MoveOutcome, Placement};
use taskboard_store::StoreError;

use crate::server::AppState;

/// Error payload: `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Gateway(GatewayError),
    Board(BoardError),
    Store(StoreError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Gateway(e) => (
                StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                e.user_message(),
            ),
            Self::Board(BoardError::NotFound(id)) => (StatusCode::NOT_FOUND, format!("Task {id} not found")),
            Self::Board(BoardError::Invalid(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Board(BoardError::SaveFailed { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save task order".into())
            }
            Self::Board(BoardError::Store(e)) | Self::Store(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = ?self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %message, "request rejected");
        }
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Gateway(g) => Self::Gateway(g),
            EngineError::Store(s) => Self::Store(s),
        }
    }
}

impl From<BoardError> for ApiError {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(req) = body?;
    let reply = state.interpreter.handle(req.messages).await?;
    Ok(Json(reply))
}

/// OPTIONS /chat
pub async fn chat_options() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<Status>,
}

/// GET /tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.board.repo().list(query.status).map_err(ApiError::Store)?;
    Ok(Json(tasks))
}

/// POST /tasks
pub async fn add_task(
    State(state): State<AppState>,
    body: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(new) = body?;
    let task = state.board.add_task(new)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.board.delete_task(&TaskId::from_raw(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /tasks/move
pub async fn move_task(
    State(state): State<AppState>,
    body: Result<Json<Move>, JsonRejection>,
) -> Result<Json<MoveOutcome>, ApiError> {
    let Json(mv) = body?;
    let outcome = state.board.move_task(&mv).await?;
    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct SaveAllRequest {
    pub tasks: Vec<Placement>,
}

/// PUT /tasks
pub async fn save_all(
    State(state): State<AppState>,
    body: Result<Json<SaveAllRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = body?;
    state.board.save_all(&req.tasks).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<u64>,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.board.repo().count() {
        Ok(n) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                tasks: Some(n),
            }),
        ),
        Err(e) => {
            error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    tasks: None,
                }),
            )
        }
    }
}
