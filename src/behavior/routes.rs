//! Behavior-log endpoint: bearer-authenticated event logging with AI analysis.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::llm::{AssistantsApi, CompletionRequest};
use crate::server::error_json;

use super::model::{
    BEHAVIOR_SYSTEM_PROMPT, BehaviorAnalysis, BehaviorLogEntry, BehaviorLogRequest,
    BehaviorLogStore, ChildProfileStore, build_analysis_prompt,
};

/// Shared state for the behavior routes.
#[derive(Clone)]
pub struct BehaviorRouteState {
    pub api: Arc<dyn AssistantsApi>,
    pub children: Arc<dyn ChildProfileStore>,
    pub log: Arc<dyn BehaviorLogStore>,
    /// Chat-completion model used for analysis.
    pub model: String,
    /// Expected bearer token; `None` disables auth (local testing).
    pub auth_token: Option<String>,
}

/// Check the Authorization header against the configured token.
///
/// Returns the authenticated parent id, or a 403 response.
fn authenticate(state: &BehaviorRouteState, headers: &HeaderMap) -> Result<String, Response> {
    let Some(expected) = state.auth_token.as_deref() else {
        return Ok("test_parent_id".to_string());
    };
    let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return Err(error_json(
            StatusCode::FORBIDDEN,
            "Unauthorized: No authorization token.",
        ));
    };
    if bearer != expected {
        return Err(error_json(StatusCode::FORBIDDEN, "Unauthorized: Invalid token."));
    }
    Ok(format!("parent_{bearer}"))
}

/// GET / — service info.
async fn service_info() -> Response {
    axum::Json(json!({
        "message": "Log Behavior API is running",
        "endpoints": {
            "POST /": "Log a behavior event (requires authentication)",
        }
    }))
    .into_response()
}

/// POST / — log a behavior event and return the AI analysis.
async fn log_behavior(
    State(state): State<BehaviorRouteState>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<BehaviorLogRequest>,
) -> Response {
    let parent_id = match authenticate(&state, &headers) {
        Ok(parent_id) => parent_id,
        Err(response) => return response,
    };

    let (Some(child_id), Some(parent_emotion), Some(event_description), Some(context_tags)) = (
        request.child_id,
        request.parent_emotion,
        request.event_description,
        request.context_tags,
    ) else {
        return error_json(StatusCode::BAD_REQUEST, "Missing required fields.");
    };

    let profile = match state.children.get(&child_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Child profile not found."),
        Err(e) => {
            tracing::error!("Error during logging behavior: {}", e);
            return error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.",
            );
        }
    };

    let prompt = build_analysis_prompt(&profile, &parent_emotion, &event_description, &context_tags);
    let completion = CompletionRequest::new(&state.model, BEHAVIOR_SYSTEM_PROMPT, prompt)
        .with_json_response();

    let raw = match state.api.complete(completion).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error during logging behavior: {}", e);
            return error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.",
            );
        }
    };

    let analysis: BehaviorAnalysis = match serde_json::from_str(&raw) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::error!("Analysis response was not valid JSON: {}", e);
            return error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred.",
            );
        }
    };

    let entry = BehaviorLogEntry {
        id: Uuid::new_v4(),
        parent_id,
        child_id,
        timestamp: Utc::now(),
        parent_emotion,
        event_description,
        context_tags,
        analysis: analysis.clone(),
    };
    if let Err(e) = state.log.add(entry).await {
        tracing::error!("Error during logging behavior: {}", e);
        return error_json(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal server error occurred.",
        );
    }

    axum::Json(analysis).into_response()
}

/// Build the behavior-log router.
pub fn behavior_routes(state: BehaviorRouteState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/", post(log_behavior))
        .with_state(state)
}
