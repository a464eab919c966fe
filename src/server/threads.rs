//! Thread-proxy routes: threads, messages, and runs on the upstream API.
//!
//! Responses are trimmed DTOs — clients get the id/timestamp/content subset,
//! not the upstream's full objects.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use serde::{Deserialize, Serialize};

use crate::llm::{AssistantsApi, MessageRole, Run, ThreadMessage};

use super::{error_json, upstream_error};

/// Shared state for the thread routes.
#[derive(Clone)]
pub struct ThreadRouteState {
    pub api: Arc<dyn AssistantsApi>,
    /// Assistant used for runs created through the proxy.
    pub assistant_id: String,
}

/// Message DTO returned to clients.
#[derive(Debug, Serialize)]
struct MessageDto {
    id: String,
    created_at: i64,
    content: Vec<crate::llm::MessageContent>,
    role: MessageRole,
}

impl From<ThreadMessage> for MessageDto {
    fn from(message: ThreadMessage) -> Self {
        Self {
            id: message.id,
            created_at: message.created_at,
            content: message.content,
            role: message.role,
        }
    }
}

/// Run DTO returned to clients.
#[derive(Debug, Serialize)]
struct RunDto {
    id: String,
    created_at: i64,
    thread_id: String,
    status: crate::llm::RunStatus,
}

impl From<Run> for RunDto {
    fn from(run: Run) -> Self {
        Self {
            id: run.id,
            created_at: run.created_at,
            thread_id: run.thread_id,
            status: run.status,
        }
    }
}

/// POST /threads
async fn create_thread(State(state): State<ThreadRouteState>) -> Response {
    match state.api.create_thread().await {
        Ok(thread) => axum::Json(thread).into_response(),
        Err(e) => upstream_error(&e, "creating thread"),
    }
}

/// GET /threads — collection fetch is not supported.
async fn list_threads() -> Response {
    error_json(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// GET /threads/:id
async fn get_thread(State(state): State<ThreadRouteState>, Path(id): Path<String>) -> Response {
    match state.api.get_thread(&id).await {
        Ok(thread) => axum::Json(thread).into_response(),
        Err(e) => upstream_error(&e, "retrieving thread"),
    }
}

/// GET /threads/:id/messages
async fn list_messages(State(state): State<ThreadRouteState>, Path(id): Path<String>) -> Response {
    match state.api.list_messages(&id).await {
        Ok(messages) => {
            let dtos: Vec<MessageDto> = messages.into_iter().map(MessageDto::from).collect();
            axum::Json(dtos).into_response()
        }
        Err(e) => upstream_error(&e, "getting messages"),
    }
}

#[derive(Debug, Deserialize)]
struct CreateMessageRequest {
    content: String,
}

/// POST /threads/:id/messages — always posted as the user role.
async fn create_message(
    State(state): State<ThreadRouteState>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<CreateMessageRequest>,
) -> Response {
    match state
        .api
        .create_message(&id, MessageRole::User, &request.content)
        .await
    {
        Ok(message) => axum::Json(MessageDto::from(message)).into_response(),
        Err(e) => upstream_error(&e, "creating message"),
    }
}

/// POST /threads/:id/runs
async fn create_run(State(state): State<ThreadRouteState>, Path(id): Path<String>) -> Response {
    match state.api.create_run(&id, &state.assistant_id).await {
        Ok(run) => axum::Json(RunDto::from(run)).into_response(),
        Err(e) => upstream_error(&e, "creating run"),
    }
}

/// GET /threads/:id/runs/:run_id
async fn get_run(
    State(state): State<ThreadRouteState>,
    Path((id, run_id)): Path<(String, String)>,
) -> Response {
    match state.api.get_run(&id, &run_id).await {
        Ok(run) => axum::Json(RunDto::from(run)).into_response(),
        Err(e) => upstream_error(&e, "getting run"),
    }
}

/// DELETE /threads/:id/runs/:run_id — cancel an in-flight run.
async fn cancel_run(
    State(state): State<ThreadRouteState>,
    Path((id, run_id)): Path<(String, String)>,
) -> Response {
    match state.api.cancel_run(&id, &run_id).await {
        Ok(()) => {
            tracing::debug!(run_id, "Canceled run");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => match e.upstream_status() {
            Some(404) => error_json(StatusCode::NOT_FOUND, "Run not found"),
            Some(400) => error_json(StatusCode::BAD_REQUEST, "Run already canceled"),
            _ => upstream_error(&e, "canceling run"),
        },
    }
}

/// Build the thread-proxy router.
pub fn threads_routes(state: ThreadRouteState) -> Router {
    Router::new()
        .route("/", post(create_thread))
        .route("/", get(list_threads))
        .route("/{id}", get(get_thread))
        .route("/{id}/messages", get(list_messages))
        .route("/{id}/messages", post(create_message))
        .route("/{id}/runs", post(create_run))
        .route("/{id}/runs/{run_id}", get(get_run))
        .route("/{id}/runs/{run_id}", delete(cancel_run))
        .with_state(state)
}
