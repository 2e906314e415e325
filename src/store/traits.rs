//! Unified `Database` trait — single async interface for all persistence.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::meals::model::MealRecord;
use crate::onboarding::flow::OnboardingFlow;
use crate::onboarding::model::UserProfile;

/// Backend-agnostic database trait covering profiles, onboarding snapshots,
/// and meal logs.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Profiles ────────────────────────────────────────────────────

    /// Upsert the profile for a user. Idempotent; merge-by-id semantics.
    async fn save_profile(
        &self,
        user_id: &str,
        profile: &UserProfile,
    ) -> Result<(), DatabaseError>;

    /// Load a user's profile, if one has been saved.
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, DatabaseError>;

    // ── Onboarding ──────────────────────────────────────────────────

    /// Upsert the in-progress wizard snapshot (current screen + answers).
    async fn save_onboarding(
        &self,
        user_id: &str,
        flow: &OnboardingFlow,
    ) -> Result<(), DatabaseError>;

    /// Load the in-progress wizard snapshot, if any.
    async fn load_onboarding(&self, user_id: &str)
    -> Result<Option<OnboardingFlow>, DatabaseError>;

    /// Delete the wizard snapshot once onboarding completes.
    async fn clear_onboarding(&self, user_id: &str) -> Result<(), DatabaseError>;

    // ── Meals ───────────────────────────────────────────────────────

    /// Insert a meal record.
    async fn insert_meal(&self, user_id: &str, meal: &MealRecord) -> Result<(), DatabaseError>;

    /// Get a meal by id.
    async fn get_meal(&self, user_id: &str, id: Uuid)
    -> Result<Option<MealRecord>, DatabaseError>;

    /// List a user's meals logged on a given UTC day, oldest first.
    async fn list_meals_for_day(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Vec<MealRecord>, DatabaseError>;

    /// Delete a meal record.
    async fn delete_meal(&self, user_id: &str, id: Uuid) -> Result<(), DatabaseError>;
}
