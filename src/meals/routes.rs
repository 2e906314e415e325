//! REST endpoints for meal logging and daily progress.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{DatabaseError, MealError};
use crate::onboarding::model::DEFAULT_USER;
use crate::store::Database;

use super::analyzer::MealAnalyzer;
use super::model::{MealInput, MealRecord, MealSource, NutritionEstimate};

/// Shared state for meal routes.
#[derive(Clone)]
pub struct MealRouteState {
    pub db: Arc<dyn Database>,
    pub analyzer: Arc<MealAnalyzer>,
}

fn meal_error_response(err: MealError) -> Response {
    let status = match &err {
        MealError::EmptyInput => StatusCode::BAD_REQUEST,
        MealError::PhotoFetch { .. } | MealError::Analysis(_) | MealError::InvalidResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

fn db_error_response(err: DatabaseError) -> Response {
    let status = match &err {
        DatabaseError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

/// POST /api/meals/analyze
///
/// Analyze a photo or voice transcript. Returns either an estimate or a
/// clarification question; the client answers and re-submits the same input
/// with `clarification_answer` set.
async fn post_analyze(
    State(state): State<MealRouteState>,
    Json(input): Json<MealInput>,
) -> Response {
    match state.analyzer.analyze(&input).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => meal_error_response(e),
    }
}

/// Body for logging a meal. Manual entries carry user-typed numbers;
/// photo/voice entries carry the accepted analysis.
#[derive(Debug, Deserialize)]
struct LogMealRequest {
    source: MealSource,
    description: String,
    nutrition: NutritionEstimate,
    #[serde(default)]
    coach_note: Option<String>,
}

/// POST /api/meals
async fn post_meal(
    State(state): State<MealRouteState>,
    Json(request): Json<LogMealRequest>,
) -> Response {
    if request.description.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "description must not be empty"})),
        )
            .into_response();
    }

    let mut record = MealRecord::new(
        request.source,
        request.description.trim(),
        request.nutrition,
    );
    if let Some(note) = request.coach_note.filter(|n| !n.trim().is_empty()) {
        record = record.with_coach_note(note);
    }

    match state.db.insert_meal(DEFAULT_USER, &record).await {
        Ok(()) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => db_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct DayQuery {
    /// UTC day, `YYYY-MM-DD`. Defaults to today.
    date: Option<NaiveDate>,
}

/// GET /api/meals?date=2026-08-05
async fn list_meals(
    State(state): State<MealRouteState>,
    Query(query): Query<DayQuery>,
) -> Response {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());
    match state.db.list_meals_for_day(DEFAULT_USER, day).await {
        Ok(meals) => Json(json!({"date": day, "meals": meals})).into_response(),
        Err(e) => db_error_response(e),
    }
}

/// GET /api/meals/summary?date=2026-08-05
///
/// The day's consumed totals next to the profile's targets, if a profile
/// with a blueprint exists.
async fn get_summary(
    State(state): State<MealRouteState>,
    Query(query): Query<DayQuery>,
) -> Response {
    let day = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let meals = match state.db.list_meals_for_day(DEFAULT_USER, day).await {
        Ok(meals) => meals,
        Err(e) => return db_error_response(e),
    };

    let consumed = meals
        .iter()
        .fold(NutritionEstimate::default(), |acc, m| acc.add(&m.nutrition));

    let targets = match state.db.load_profile(DEFAULT_USER).await {
        Ok(profile) => profile.and_then(|p| p.blueprint).map(|b| {
            json!({
                "calorie_target": b.calorie_target,
                "macros": b.macros,
            })
        }),
        Err(e) => return db_error_response(e),
    };

    Json(json!({
        "date": day,
        "meal_count": meals.len(),
        "consumed": consumed,
        "targets": targets,
    }))
    .into_response()
}

/// DELETE /api/meals/{id}
async fn delete_meal(State(state): State<MealRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.db.delete_meal(DEFAULT_USER, id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => db_error_response(e),
    }
}

/// Build the meal REST routes.
pub fn meal_routes(state: MealRouteState) -> Router {
    Router::new()
        .route("/api/meals/analyze", post(post_analyze))
        .route("/api/meals", post(post_meal).get(list_meals))
        .route("/api/meals/summary", get(get_summary))
        .route("/api/meals/{id}", delete(delete_meal))
        .with_state(state)
}
