//! HTTP surface: thread proxy, activity plans, behavior log.

pub mod threads;

pub use threads::{ThreadRouteState, threads_routes};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::IntoMakeService;
use axum::{Router, ServiceExt, extract::Request};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePath;

use crate::behavior::{BehaviorRouteState, behavior_routes};
use crate::error::LlmError;
use crate::routines::{RoutineRouteState, routine_routes};

/// JSON error body, `{"error": message}`.
pub fn error_json(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}

/// Map an upstream API error onto our response taxonomy.
///
/// Upstream 404/400 pass through (missing thread/run); everything else is a
/// 500 carrying the error text.
pub fn upstream_error(e: &LlmError, operation: &str) -> Response {
    tracing::error!("Error in {}: {}", operation, e);
    match e.upstream_status() {
        Some(404) => error_json(StatusCode::NOT_FOUND, &e.to_string()),
        Some(400) => error_json(StatusCode::BAD_REQUEST, &e.to_string()),
        _ => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// Assemble the full application router.
pub fn app_router(
    threads: ThreadRouteState,
    routines: RoutineRouteState,
    behavior: BehaviorRouteState,
) -> IntoMakeService<NormalizePath<Router>> {
    let router = Router::new()
        .nest("/threads", threads_routes(threads))
        .nest("/activity_plan", routine_routes(routines))
        .nest("/log_behavior", behavior_routes(behavior))
        .layer(CorsLayer::permissive());
    // Trailing-slash tolerance must be applied before routing, so the
    // normalization wraps the router rather than being a router layer.
    ServiceExt::<Request>::into_make_service(NormalizePath::trim_trailing_slash(router))
}
