//! REST endpoints for activity plans and weekly routines.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::llm::{AssistantsApi, CompletionRequest};
use crate::server::error_json;

use super::model::{
    Activity, DayOfWeek, Routine, generate_routine_id, is_valid_time,
};
use super::prompts::{
    ChildPreferences, activity_plan_prompt, activity_plan_user_prompt, parse_weekly_activities,
    weekly_routine_prompt, weekly_routine_user_prompt,
};
use super::repo::RoutineRepository;

/// Shared state for the routine routes.
#[derive(Clone)]
pub struct RoutineRouteState {
    pub repo: Arc<dyn RoutineRepository>,
    pub api: Arc<dyn AssistantsApi>,
    /// Chat-completion model used for generation.
    pub model: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationRequest {
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    child_name: Option<String>,
    #[serde(default)]
    age: Option<u32>,
    #[serde(default)]
    preferences: Option<ChildPreferences>,
    #[serde(default)]
    additional_info: Option<String>,
}

impl GenerationRequest {
    /// The goal, if present and non-blank.
    fn goal(&self) -> Option<&str> {
        self.goal.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }
}

fn validate_generation(request: &GenerationRequest) -> Result<(), Response> {
    if request.goal().is_none() {
        return Err(error_json(
            StatusCode::BAD_REQUEST,
            "Goal is required and must be a non-empty string",
        ));
    }
    if let Some(age) = request.age
        && age > 18
    {
        return Err(error_json(
            StatusCode::BAD_REQUEST,
            "Age must be a number between 0 and 18",
        ));
    }
    Ok(())
}

/// POST / — generate a free-form activity plan.
async fn create_activity_plan(
    State(state): State<RoutineRouteState>,
    axum::Json(request): axum::Json<GenerationRequest>,
) -> Response {
    if let Err(response) = validate_generation(&request) {
        return response;
    }
    let goal = request.goal().unwrap_or_default().to_string();
    tracing::info!(%goal, child = ?request.child_name, "Creating activity plan");

    let completion = CompletionRequest::new(
        &state.model,
        activity_plan_prompt(
            &goal,
            request.child_name.as_deref(),
            request.age,
            request.preferences.as_ref(),
            request.additional_info.as_deref(),
        ),
        activity_plan_user_prompt(&goal, request.child_name.as_deref()),
    )
    .with_max_tokens(2000)
    .with_temperature(0.7);

    match state.api.complete(completion).await {
        Ok(plan) => axum::Json(json!({
            "childName": request.child_name,
            "age": request.age,
            "goal": goal,
            "preferences": request.preferences,
            "additionalInfo": request.additional_info,
            "activityPlan": plan,
            "createdAt": Utc::now(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Error creating activity plan: {}", e);
            error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// POST /routine — generate a weekly routine via the model.
async fn create_ai_routine(
    State(state): State<RoutineRouteState>,
    axum::Json(request): axum::Json<GenerationRequest>,
) -> Response {
    let Some(goal) = request.goal().map(str::to_string) else {
        return error_json(
            StatusCode::BAD_REQUEST,
            "Goal is required and must be a non-empty string",
        );
    };
    tracing::info!(%goal, child = ?request.child_name, "Creating AI-generated weekly routine");

    let completion = CompletionRequest::new(
        &state.model,
        weekly_routine_prompt(
            &goal,
            request.child_name.as_deref(),
            request.age,
            request.preferences.as_ref(),
            request.additional_info.as_deref(),
        ),
        weekly_routine_user_prompt(&goal, request.child_name.as_deref()),
    )
    .with_max_tokens(1500)
    .with_temperature(0.7);

    let raw = match state.api.complete(completion).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error creating AI-generated routine: {}", e);
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    let activities = match parse_weekly_activities(&raw) {
        Ok(activities) => activities,
        Err(e) => {
            tracing::error!("Failed to parse AI response: {}", e);
            return error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate routine structure",
            );
        }
    };

    let routine = Routine {
        id: generate_routine_id(),
        child_name: request.child_name.clone().unwrap_or_else(|| "Child".to_string()),
        goal,
        activities,
        week_start_date: Utc::now().date_naive(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        generated_by_ai: true,
    };

    if let Err(e) = state.repo.insert(routine.clone()).await {
        tracing::error!("Error storing routine: {}", e);
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }
    tracing::info!(routine_id = %routine.id, count = routine.activities.len(), "Created AI-generated routine");
    (StatusCode::CREATED, axum::Json(routine)).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualActivity {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    day_of_week: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    materials: Option<Vec<String>>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManualRoutineRequest {
    #[serde(default)]
    child_name: Option<String>,
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    activities: Vec<ManualActivity>,
    #[serde(default)]
    week_start_date: Option<String>,
}

/// Validate and convert the manual activities, reporting the first offender
/// by its 1-based position.
fn build_manual_activities(raw: &[ManualActivity]) -> Result<Vec<Activity>, Response> {
    let mut activities = Vec::with_capacity(raw.len());
    for (i, activity) in raw.iter().enumerate() {
        let position = i + 1;
        let Some(name) = activity.name.as_deref().filter(|n| !n.is_empty()) else {
            return Err(error_json(
                StatusCode::BAD_REQUEST,
                &format!("Activity {position}: name is required and must be a string"),
            ));
        };
        let day = activity
            .day_of_week
            .as_deref()
            .and_then(|d| d.parse::<DayOfWeek>().ok())
            .ok_or_else(|| {
                error_json(
                    StatusCode::BAD_REQUEST,
                    &format!("Activity {position}: dayOfWeek must be a valid day name"),
                )
            })?;
        if let Some(time) = activity.time.as_deref()
            && !is_valid_time(time)
        {
            return Err(error_json(
                StatusCode::BAD_REQUEST,
                &format!("Activity {position}: time must be in HH:MM format"),
            ));
        }
        activities.push(Activity {
            name: name.to_string(),
            day_of_week: day,
            time: activity.time.clone().unwrap_or_else(|| "09:00".to_string()),
            duration: activity
                .duration
                .clone()
                .unwrap_or_else(|| "15-20 minutes".to_string()),
            materials: activity.materials.clone().unwrap_or_default(),
            description: activity.description.clone().unwrap_or_default(),
            completed: false,
            completed_at: None,
        });
    }
    Ok(activities)
}

/// POST /routine/manual — create a routine from caller-provided activities.
async fn create_manual_routine(
    State(state): State<RoutineRouteState>,
    axum::Json(request): axum::Json<ManualRoutineRequest>,
) -> Response {
    if request.activities.is_empty() {
        return error_json(
            StatusCode::BAD_REQUEST,
            "Activities array is required and must not be empty",
        );
    }
    let activities = match build_manual_activities(&request.activities) {
        Ok(activities) => activities,
        Err(response) => return response,
    };
    let week_start_date = match &request.week_start_date {
        Some(raw) => match raw.parse() {
            Ok(date) => date,
            Err(_) => {
                return error_json(
                    StatusCode::BAD_REQUEST,
                    "Week start date must be a valid ISO date string",
                );
            }
        },
        None => Utc::now().date_naive(),
    };

    let routine = Routine {
        id: generate_routine_id(),
        child_name: request.child_name.unwrap_or_else(|| "Child".to_string()),
        goal: request
            .goal
            .unwrap_or_else(|| "General Development".to_string()),
        activities,
        week_start_date,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        generated_by_ai: false,
    };

    if let Err(e) = state.repo.insert(routine.clone()).await {
        tracing::error!("Error storing routine: {}", e);
        return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }
    tracing::info!(routine_id = %routine.id, "Created manual routine");
    (StatusCode::CREATED, axum::Json(routine)).into_response()
}

/// GET /routine/:id
async fn get_routine(
    State(state): State<RoutineRouteState>,
    Path(id): Path<String>,
) -> Response {
    match state.repo.get(&id).await {
        Ok(Some(routine)) => axum::Json(routine).into_response(),
        Ok(None) => error_json(StatusCode::NOT_FOUND, "Routine not found"),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRoutineRequest {
    #[serde(default)]
    activities: Option<Vec<Activity>>,
    #[serde(default)]
    week_start_date: Option<chrono::NaiveDate>,
}

/// PUT /routine/:id — replace activities and/or week start.
async fn update_routine(
    State(state): State<RoutineRouteState>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<UpdateRoutineRequest>,
) -> Response {
    let mut routine = match state.repo.get(&id).await {
        Ok(Some(routine)) => routine,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Routine not found"),
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    if let Some(activities) = request.activities {
        routine.activities = activities;
    }
    if let Some(week_start_date) = request.week_start_date {
        routine.week_start_date = week_start_date;
    }
    routine.updated_at = Utc::now();

    match state.repo.update(routine.clone()).await {
        Ok(()) => {
            tracing::info!(routine_id = %id, "Updated routine");
            axum::Json(routine).into_response()
        }
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteActivityRequest {
    #[serde(default)]
    activity_name: Option<String>,
    #[serde(default)]
    day_of_week: Option<String>,
}

/// POST /routine/:id/complete — mark one activity done by name + day.
async fn complete_activity(
    State(state): State<RoutineRouteState>,
    Path(id): Path<String>,
    axum::Json(request): axum::Json<CompleteActivityRequest>,
) -> Response {
    let (Some(name), Some(day_raw)) = (request.activity_name, request.day_of_week) else {
        return error_json(
            StatusCode::BAD_REQUEST,
            "Activity name and day of week are required",
        );
    };
    let Ok(day) = day_raw.parse::<DayOfWeek>() else {
        return error_json(
            StatusCode::BAD_REQUEST,
            "Activity name and day of week are required",
        );
    };

    let mut routine = match state.repo.get(&id).await {
        Ok(Some(routine)) => routine,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Routine not found"),
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    if !routine.complete_activity(&name, day) {
        return error_json(StatusCode::NOT_FOUND, "Activity not found in routine");
    }

    let completed = routine
        .activities
        .iter()
        .find(|a| a.name == name && a.day_of_week == day)
        .cloned();

    match state.repo.update(routine).await {
        Ok(()) => {
            tracing::info!(routine_id = %id, activity = %name, day = %day, "Marked activity as completed");
            axum::Json(json!({
                "message": "Activity marked as completed",
                "activity": completed,
            }))
            .into_response()
        }
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

/// GET /routine/:id/reminders — today's activities.
async fn get_reminders(
    State(state): State<RoutineRouteState>,
    Path(id): Path<String>,
) -> Response {
    let routine = match state.repo.get(&id).await {
        Ok(Some(routine)) => routine,
        Ok(None) => return error_json(StatusCode::NOT_FOUND, "Routine not found"),
        Err(e) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    };

    let today = DayOfWeek::today();
    let reminders = routine.reminders_for(today);
    tracing::debug!(routine_id = %id, day = %today, count = reminders.len(), "Retrieved daily reminders");
    axum::Json(json!({ "day": today, "reminders": reminders })).into_response()
}

/// Build the activity-plan router.
pub fn routine_routes(state: RoutineRouteState) -> Router {
    Router::new()
        .route("/", post(create_activity_plan))
        .route("/routine", post(create_ai_routine))
        .route("/routine/manual", post(create_manual_routine))
        .route("/routine/{id}", get(get_routine))
        .route("/routine/{id}", put(update_routine))
        .route("/routine/{id}/complete", post(complete_activity))
        .route("/routine/{id}/reminders", get(get_reminders))
        .with_state(state)
}
