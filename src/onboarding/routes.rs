//! REST endpoints for the onboarding wizard.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::blueprint::derivation::vision_suggestions;
use crate::error::{BlueprintError, Error, FlowError};
use crate::onboarding::model::DEFAULT_USER;

use super::flow::AdvanceOutcome;
use super::manager::OnboardingManager;
use super::model::HealthGoal;
use super::session::SessionPatch;

/// Shared state for onboarding routes.
#[derive(Clone)]
pub struct OnboardingRouteState {
    pub manager: Arc<OnboardingManager>,
}

/// Map a service error to an HTTP response.
fn error_response(err: Error) -> Response {
    let status = match &err {
        Error::Flow(FlowError::ScreenOutOfRange { .. }) => StatusCode::BAD_REQUEST,
        Error::Flow(FlowError::AlreadyCompleted) => StatusCode::CONFLICT,
        Error::Flow(FlowError::GenerationInProgress) => StatusCode::CONFLICT,
        Error::Blueprint(BlueprintError::IncompleteSession { .. }) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Blueprint(_) | Error::Llm(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

/// GET /api/onboarding/status
///
/// Current screen, gating state, busy flag, and the session so far.
async fn get_status(State(state): State<OnboardingRouteState>) -> impl IntoResponse {
    Json(state.manager.status().await)
}

/// PUT /api/onboarding/answers
///
/// Write the current screen's answers into the session. Idempotent.
async fn put_answers(
    State(state): State<OnboardingRouteState>,
    Json(patch): Json<SessionPatch>,
) -> Response {
    match state.manager.apply_patch(patch).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/onboarding/advance
async fn post_advance(State(state): State<OnboardingRouteState>) -> Response {
    match state.manager.advance().await {
        Ok(outcome) => {
            let status = state.manager.status().await;
            let outcome = match outcome {
                AdvanceOutcome::Advanced(_) => "advanced",
                AdvanceOutcome::Rejected(_) => "rejected",
                AdvanceOutcome::Completed => "completed",
            };
            Json(json!({"outcome": outcome, "status": status})).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/onboarding/retreat
async fn post_retreat(State(state): State<OnboardingRouteState>) -> Response {
    match state.manager.retreat().await {
        Ok(_) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct SkipRequest {
    screen: u8,
}

/// POST /api/onboarding/skip
async fn post_skip(
    State(state): State<OnboardingRouteState>,
    Json(request): Json<SkipRequest>,
) -> Response {
    match state.manager.skip_to(request.screen).await {
        Ok(_) => Json(state.manager.status().await).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/onboarding/blueprint
///
/// Runs the one-shot generation call. Failure maps to an error status so
/// the client can show a retry affordance; the wizard does not move.
async fn post_blueprint(State(state): State<OnboardingRouteState>) -> Response {
    match state.manager.generate_blueprint().await {
        Ok(blueprint) => Json(blueprint).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct VisionQuery {
    goal: HealthGoal,
}

/// GET /api/onboarding/visions?goal=lose_weight
///
/// Canned success-vision prompts for the vision screen.
async fn get_visions(Query(query): Query<VisionQuery>) -> impl IntoResponse {
    Json(json!({"suggestions": vision_suggestions(query.goal)}))
}

/// GET /api/onboarding/profile
///
/// The saved user profile, or 404 if onboarding has not produced one yet.
async fn get_profile(State(state): State<OnboardingRouteState>) -> Response {
    match state.manager.db().load_profile(DEFAULT_USER).await {
        Ok(Some(profile)) => Json(profile).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "No profile exists yet"})),
        )
            .into_response(),
        Err(e) => error_response(e.into()),
    }
}

/// Build the onboarding REST routes.
pub fn onboarding_routes(state: OnboardingRouteState) -> Router {
    Router::new()
        .route("/api/onboarding/status", get(get_status))
        .route("/api/onboarding/answers", put(put_answers))
        .route("/api/onboarding/advance", post(post_advance))
        .route("/api/onboarding/retreat", post(post_retreat))
        .route("/api/onboarding/skip", post(post_skip))
        .route("/api/onboarding/blueprint", post(post_blueprint))
        .route("/api/onboarding/visions", get(get_visions))
        .route("/api/onboarding/profile", get(get_profile))
        .with_state(state)
}
