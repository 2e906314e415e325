//! libSQL backend — async `Database` trait implementation.
//!
//! Profiles and onboarding snapshots are stored as JSON blobs keyed by user
//! id; meals are stored as columns. Supports local file and in-memory
//! databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::meals::model::{MealRecord, MealSource, NutritionEstimate};
use crate::onboarding::flow::OnboardingFlow;
use crate::onboarding::model::UserProfile;
use crate::store::migrations;
use crate::store::traits::Database;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn source_to_str(source: MealSource) -> &'static str {
    match source {
        MealSource::Photo => "photo",
        MealSource::Voice => "voice",
        MealSource::Manual => "manual",
    }
}

fn str_to_source(s: &str) -> MealSource {
    match s {
        "photo" => MealSource::Photo,
        "voice" => MealSource::Voice,
        _ => MealSource::Manual,
    }
}

/// Map a libsql row to a MealRecord.
///
/// Column order: 0:id, 1:logged_at, 2:source, 3:description, 4:calories,
/// 5:protein_g, 6:carbs_g, 7:fat_g, 8:coach_note
fn row_to_meal(row: &libsql::Row) -> Result<MealRecord, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("meal id column: {e}")))?;
    let logged_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("meal logged_at column: {e}")))?;
    let source_str: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("meal source column: {e}")))?;
    let description: String = row
        .get(3)
        .map_err(|e| DatabaseError::Query(format!("meal description column: {e}")))?;
    let calories: f64 = row
        .get(4)
        .map_err(|e| DatabaseError::Query(format!("meal calories column: {e}")))?;
    let protein_g: f64 = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("meal protein column: {e}")))?;
    let carbs_g: f64 = row
        .get(6)
        .map_err(|e| DatabaseError::Query(format!("meal carbs column: {e}")))?;
    let fat_g: f64 = row
        .get(7)
        .map_err(|e| DatabaseError::Query(format!("meal fat column: {e}")))?;
    let coach_note: Option<String> = row.get(8).ok();

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Query(format!("meal id '{id_str}' is not a UUID: {e}")))?;

    Ok(MealRecord {
        id,
        logged_at: parse_datetime(&logged_str),
        source: str_to_source(&source_str),
        description,
        nutrition: NutritionEstimate {
            calories,
            protein_g,
            carbs_g,
            fat_g,
        },
        coach_note: coach_note.filter(|n| !n.is_empty()),
    })
}

/// Upsert a JSON blob into a `(user_id, data, updated_at)` table.
async fn upsert_blob(
    conn: &Connection,
    table: &str,
    user_id: &str,
    data: &str,
) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO {table} (user_id, data, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at"
    );
    conn.execute(&sql, params![user_id, data, Utc::now().to_rfc3339()])
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to upsert into {table}: {e}")))?;
    Ok(())
}

async fn load_blob(
    conn: &Connection,
    table: &str,
    user_id: &str,
) -> Result<Option<String>, DatabaseError> {
    let sql = format!("SELECT data FROM {table} WHERE user_id = ?1");
    let mut rows = conn
        .query(&sql, params![user_id])
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to query {table}: {e}")))?;

    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Query(format!("Failed to read {table} row: {e}")))?;

    match row {
        Some(row) => {
            let data: String = row
                .get(0)
                .map_err(|e| DatabaseError::Query(format!("{table} data column: {e}")))?;
            Ok(Some(data))
        }
        None => Ok(None),
    }
}

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Profiles ────────────────────────────────────────────────────

    async fn save_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(profile)
            .map_err(|e| DatabaseError::Serialization(format!("profile: {e}")))?;
        upsert_blob(self.conn(), "profiles", user_id, &data).await
    }

    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError> {
        match load_blob(self.conn(), "profiles", user_id).await? {
            Some(data) => {
                let profile = serde_json::from_str(&data)
                    .map_err(|e| DatabaseError::Serialization(format!("profile: {e}")))?;
                Ok(Some(profile))
            }
            None => Ok(None),
        }
    }

    // ── Onboarding ──────────────────────────────────────────────────

    async fn save_onboarding(
        &self,
        user_id: &str,
        flow: &OnboardingFlow,
    ) -> Result<(), DatabaseError> {
        let data = serde_json::to_string(flow)
            .map_err(|e| DatabaseError::Serialization(format!("onboarding: {e}")))?;
        upsert_blob(self.conn(), "onboarding_sessions", user_id, &data).await
    }

    async fn load_onboarding(
        &self,
        user_id: &str,
    ) -> Result<Option<OnboardingFlow>, DatabaseError> {
        match load_blob(self.conn(), "onboarding_sessions", user_id).await? {
            Some(data) => {
                let flow = serde_json::from_str(&data)
                    .map_err(|e| DatabaseError::Serialization(format!("onboarding: {e}")))?;
                Ok(Some(flow))
            }
            None => Ok(None),
        }
    }

    async fn clear_onboarding(&self, user_id: &str) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "DELETE FROM onboarding_sessions WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to clear onboarding: {e}")))?;
        Ok(())
    }

    // ── Meals ───────────────────────────────────────────────────────

    async fn insert_meal(&self, user_id: &str, meal: &MealRecord) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO meals (id, user_id, logged_at, source, description,
                    calories, protein_g, carbs_g, fat_g, coach_note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    meal.id.to_string(),
                    user_id,
                    meal.logged_at.to_rfc3339(),
                    source_to_str(meal.source),
                    meal.description.clone(),
                    meal.nutrition.calories,
                    meal.nutrition.protein_g,
                    meal.nutrition.carbs_g,
                    meal.nutrition.fat_g,
                    meal.coach_note.clone(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to insert meal: {e}")))?;
        Ok(())
    }

    async fn get_meal(
        &self,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<MealRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, logged_at, source, description, calories, protein_g,
                        carbs_g, fat_g, coach_note
                 FROM meals WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to query meal: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to read meal row: {e}")))?;

        row.as_ref().map(row_to_meal).transpose()
    }

    async fn list_meals_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<MealRecord>, DatabaseError> {
        // logged_at is RFC 3339 UTC, so a textual prefix match selects the day.
        let prefix = format!("{}%", day.format("%Y-%m-%d"));
        let mut rows = self
            .conn()
            .query(
                "SELECT id, logged_at, source, description, calories, protein_g,
                        carbs_g, fat_g, coach_note
                 FROM meals
                 WHERE user_id = ?1 AND logged_at LIKE ?2
                 ORDER BY logged_at ASC",
                params![user_id, prefix],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to list meals: {e}")))?;

        let mut meals = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to read meal row: {e}")))?
        {
            meals.push(row_to_meal(&row)?);
        }
        Ok(meals)
    }

    async fn delete_meal(&self, user_id: &str, id: Uuid) -> Result<(), DatabaseError> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM meals WHERE id = ?1 AND user_id = ?2",
                params![id.to_string(), user_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("Failed to delete meal: {e}")))?;

        if affected == 0 {
            return Err(DatabaseError::NotFound {
                entity: "meal".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
