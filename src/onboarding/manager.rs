//! OnboardingManager — coordinates the wizard flow, persistence, the splash
//! timer, and blueprint generation.
//!
//! Collaborators are injected (`Database`, `BlueprintGenerator`, `Clock`),
//! so tests substitute fakes and the splash auto-advance runs without real
//! time passing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::blueprint::derivation::build_profile;
use crate::blueprint::generator::BlueprintGenerator;
use crate::blueprint::model::Blueprint;
use crate::error::{Error, FlowError};
use crate::store::Database;

use super::flow::{AdvanceOutcome, OnboardingFlow};
use super::model::DEFAULT_USER;
use super::screens::Screen;
use super::session::{OnboardingSession, SessionPatch};

/// Time source for the splash auto-advance.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by tokio.
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Wizard status returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub screen: Screen,
    pub screen_index: u8,
    pub total_screens: u8,
    pub can_proceed: bool,
    /// True while a blueprint generation call is in flight.
    pub is_processing: bool,
    pub onboarding_completed: bool,
    pub session: OnboardingSession,
}

/// Coordinates the onboarding flow: session ownership, navigation,
/// persistence, and blueprint generation.
pub struct OnboardingManager {
    db: Arc<dyn Database>,
    generator: Arc<dyn BlueprintGenerator>,
    clock: Arc<dyn Clock>,
    splash_delay: Duration,
    flow: RwLock<OnboardingFlow>,
    completed: AtomicBool,
    processing: AtomicBool,
}

impl OnboardingManager {
    pub fn new(
        db: Arc<dyn Database>,
        generator: Arc<dyn BlueprintGenerator>,
        clock: Arc<dyn Clock>,
        splash_delay: Duration,
    ) -> Self {
        Self {
            db,
            generator,
            clock,
            splash_delay,
            flow: RwLock::new(OnboardingFlow::new()),
            completed: AtomicBool::new(false),
            processing: AtomicBool::new(false),
        }
    }

    /// Construct, resuming a persisted wizard snapshot if one exists and the
    /// profile is not already finished.
    pub async fn resume(
        db: Arc<dyn Database>,
        generator: Arc<dyn BlueprintGenerator>,
        clock: Arc<dyn Clock>,
        splash_delay: Duration,
    ) -> Self {
        let completed = match db.load_profile(DEFAULT_USER).await {
            Ok(Some(profile)) => profile.onboarding_completed,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("Failed to load profile on startup: {}", e);
                false
            }
        };

        let flow = if completed {
            OnboardingFlow::new()
        } else {
            match db.load_onboarding(DEFAULT_USER).await {
                Ok(Some(flow)) => {
                    tracing::info!(screen = %flow.current(), "Resuming onboarding");
                    flow
                }
                Ok(None) => OnboardingFlow::new(),
                Err(e) => {
                    tracing::warn!("Failed to load onboarding snapshot: {}", e);
                    OnboardingFlow::new()
                }
            }
        };

        let manager = Self::new(db, generator, clock, splash_delay);
        *manager.flow.write().await = flow;
        manager.completed.store(completed, Ordering::SeqCst);
        manager
    }

    /// Run the splash screen's timed self-advance.
    ///
    /// A one-shot timer event fed into the same state machine as user
    /// navigation. No-op unless the wizard is sitting on the splash screen.
    pub async fn run_splash_timer(&self) {
        if !self.flow.read().await.current().auto_advances() {
            return;
        }
        self.clock.sleep(self.splash_delay).await;

        let mut flow = self.flow.write().await;
        if flow.current().auto_advances() {
            flow.advance();
            tracing::debug!(screen = %flow.current(), "Splash auto-advanced");
        }
        drop(flow);
        self.persist_snapshot().await;
    }

    /// Whether onboarding is still active.
    pub fn is_active(&self) -> bool {
        !self.completed.load(Ordering::SeqCst)
    }

    /// The persistence collaborator (shared with the routes layer).
    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Current status for the client.
    pub async fn status(&self) -> OnboardingStatus {
        let flow = self.flow.read().await;
        OnboardingStatus {
            screen: flow.current(),
            screen_index: flow.current().index(),
            total_screens: Screen::TOTAL,
            can_proceed: flow.can_proceed(),
            is_processing: self.processing.load(Ordering::SeqCst),
            onboarding_completed: self.completed.load(Ordering::SeqCst),
            session: flow.session.clone(),
        }
    }

    /// Write the current screen's answers into the session.
    pub async fn apply_patch(&self, patch: SessionPatch) -> Result<(), Error> {
        if !self.is_active() {
            return Err(FlowError::AlreadyCompleted.into());
        }
        self.flow.write().await.session.apply(patch);
        self.persist_snapshot().await;
        Ok(())
    }

    /// Advance one screen if the current gate holds.
    ///
    /// Resolves the weight-goal branch: landing on a weight screen without a
    /// weight-related goal skips past the branch.
    pub async fn advance(&self) -> Result<AdvanceOutcome, Error> {
        if !self.is_active() {
            return Err(FlowError::AlreadyCompleted.into());
        }

        let outcome = {
            let mut flow = self.flow.write().await;
            let outcome = flow.advance();
            if let AdvanceOutcome::Advanced(screen) = outcome {
                if screen.in_weight_branch() && !flow.session.has_weight_goal() {
                    flow.skip_to(Screen::LearningStyle);
                    AdvanceOutcome::Advanced(Screen::LearningStyle)
                } else {
                    outcome
                }
            } else {
                outcome
            }
        };

        match outcome {
            AdvanceOutcome::Completed => self.finalize().await?,
            _ => self.persist_snapshot().await,
        }
        Ok(outcome)
    }

    /// Move one screen back. Always legal.
    pub async fn retreat(&self) -> Result<Screen, Error> {
        if !self.is_active() {
            return Err(FlowError::AlreadyCompleted.into());
        }
        let screen = self.flow.write().await.retreat();
        self.persist_snapshot().await;
        Ok(screen)
    }

    /// Jump to an arbitrary screen by 1-based index.
    pub async fn skip_to(&self, index: u8) -> Result<Screen, Error> {
        if !self.is_active() {
            return Err(FlowError::AlreadyCompleted.into());
        }
        let screen = Screen::from_index(index).ok_or(FlowError::ScreenOutOfRange {
            index,
            total: Screen::TOTAL,
        })?;
        self.flow.write().await.skip_to(screen);
        self.persist_snapshot().await;
        Ok(screen)
    }

    /// Generate the blueprint from the current session.
    ///
    /// One-shot remote call: the busy flag is set for its duration and
    /// cleared on both paths. On success the derived profile is saved and
    /// the wizard lands on the reveal screen; on failure the screen does not
    /// move and the error propagates so the client can offer retry.
    pub async fn generate_blueprint(&self) -> Result<Blueprint, Error> {
        if !self.is_active() {
            return Err(FlowError::AlreadyCompleted.into());
        }
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(FlowError::GenerationInProgress.into());
        }

        let session = self.flow.read().await.session.clone();
        let result = self.generator.generate(&session).await;
        self.processing.store(false, Ordering::SeqCst);

        let blueprint = match result {
            Ok(blueprint) => blueprint,
            Err(e) => {
                tracing::warn!("Blueprint generation failed: {}", e);
                return Err(e.into());
            }
        };

        // Persist the derived profile before moving the wizard forward, so a
        // crash between the two leaves the profile recoverable.
        let profile = build_profile(&session, Some(blueprint.clone()));
        self.db.save_profile(DEFAULT_USER, &profile).await?;

        {
            let mut flow = self.flow.write().await;
            flow.skip_to(Screen::BlueprintReveal);
        }
        self.persist_snapshot().await;

        tracing::info!(
            calorie_target = blueprint.calorie_target,
            "Blueprint generated"
        );
        Ok(blueprint)
    }

    /// Mark the profile complete and discard the session.
    async fn finalize(&self) -> Result<(), Error> {
        let session = self.flow.read().await.session.clone();

        let mut profile = match self.db.load_profile(DEFAULT_USER).await? {
            Some(profile) => profile,
            // Blueprint screen was skipped; persist the answers alone.
            None => build_profile(&session, None),
        };
        profile.onboarding_completed = true;
        profile.onboarding_completed_at = Some(Utc::now());
        self.db.save_profile(DEFAULT_USER, &profile).await?;
        self.db.clear_onboarding(DEFAULT_USER).await?;
        self.completed.store(true, Ordering::SeqCst);

        tracing::info!("Onboarding complete");
        Ok(())
    }

    /// Best-effort snapshot persistence; the wizard keeps working in memory
    /// if the write fails.
    async fn persist_snapshot(&self) {
        let flow = self.flow.read().await;
        if let Err(e) = self.db.save_onboarding(DEFAULT_USER, &flow).await {
            tracing::warn!("Failed to persist onboarding snapshot: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BlueprintError;
    use crate::blueprint::model::MacroTargets;
    use crate::onboarding::model::{
        ActivityLevel, BiologicalSex, EnergyPattern, ExerciseFrequency, HealthGoal,
        MealTimingPreference, PhysicalStats, WorkSchedule,
    };
    use crate::store::LibSqlBackend;

    /// Clock that returns immediately, so timed transitions are exercised
    /// without real time passing.
    struct InstantClock;

    #[async_trait]
    impl Clock for InstantClock {
        async fn sleep(&self, _duration: Duration) {}
    }

    /// Generator that derives numbers locally and never calls a model.
    struct StubGenerator {
        fail: bool,
    }

    #[async_trait]
    impl BlueprintGenerator for StubGenerator {
        async fn generate(
            &self,
            session: &OnboardingSession,
        ) -> Result<Blueprint, BlueprintError> {
            if self.fail {
                return Err(BlueprintError::InvalidResponse {
                    reason: "stub failure".to_string(),
                });
            }
            let (calorie_target, macros) =
                crate::blueprint::derivation::derive_targets(session)?;
            Ok(Blueprint {
                calorie_target,
                macros,
                timing_windows: vec![],
                advice: vec!["Eat breakfast within an hour of waking.".to_string()],
                supplements: vec![],
            })
        }
    }

    async fn manager(fail_generation: bool) -> OnboardingManager {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        OnboardingManager::new(
            db,
            Arc::new(StubGenerator {
                fail: fail_generation,
            }),
            Arc::new(InstantClock),
            Duration::from_secs(2),
        )
    }

    fn gating_answers() -> SessionPatch {
        SessionPatch {
            selected_goals: Some(vec![HealthGoal::LoseWeight, HealthGoal::BoostEnergy]),
            primary_goal: Some(HealthGoal::LoseWeight),
            success_vision: Some("keep up with my kids".to_string()),
            stats: Some(PhysicalStats {
                height_cm: Some(175.0),
                weight_kg: Some(70.0),
                age_years: Some(30),
                sex: Some(BiologicalSex::Male),
                ..Default::default()
            }),
            energy_pattern: Some(EnergyPattern::AfternoonPeak),
            exercise_frequency: Some(ExerciseFrequency::ThreeToFourPerWeek),
            activity_level: Some(ActivityLevel::ModeratelyActive),
            work_schedule: Some(WorkSchedule::Standard),
            meal_timing: Some(MealTimingPreference::ThreeMeals),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn splash_timer_advances_exactly_once() {
        let manager = manager(false).await;
        assert_eq!(manager.status().await.screen, Screen::Splash);

        manager.run_splash_timer().await;
        assert_eq!(manager.status().await.screen, Screen::Welcome);

        // A second firing while off the splash screen is a no-op.
        manager.run_splash_timer().await;
        assert_eq!(manager.status().await.screen, Screen::Welcome);
    }

    #[tokio::test]
    async fn advance_rejected_until_answers_arrive() {
        let manager = manager(false).await;
        manager.skip_to(Screen::GoalSelect.index()).await.unwrap();

        let outcome = manager.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Rejected(Screen::GoalSelect));

        manager.apply_patch(gating_answers()).await.unwrap();
        let outcome = manager.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Advanced(Screen::PrimaryGoal));
    }

    #[tokio::test]
    async fn weight_branch_skipped_without_weight_goal() {
        let manager = manager(false).await;
        let mut patch = gating_answers();
        patch.selected_goals = Some(vec![HealthGoal::EatHealthier, HealthGoal::SleepBetter]);
        patch.primary_goal = Some(HealthGoal::EatHealthier);
        manager.apply_patch(patch).await.unwrap();

        manager.skip_to(Screen::FoodPreferences.index()).await.unwrap();
        let outcome = manager.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Advanced(Screen::LearningStyle));
    }

    #[tokio::test]
    async fn weight_branch_kept_with_weight_goal() {
        let manager = manager(false).await;
        manager.apply_patch(gating_answers()).await.unwrap();

        manager.skip_to(Screen::FoodPreferences.index()).await.unwrap();
        let outcome = manager.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Advanced(Screen::WeightGoal));
    }

    #[tokio::test]
    async fn blueprint_failure_keeps_screen_and_clears_busy_flag() {
        let manager = manager(true).await;
        manager.apply_patch(gating_answers()).await.unwrap();
        manager
            .skip_to(Screen::GeneratingBlueprint.index())
            .await
            .unwrap();

        let result = manager.generate_blueprint().await;
        assert!(result.is_err());

        let status = manager.status().await;
        assert_eq!(status.screen, Screen::GeneratingBlueprint);
        assert!(!status.is_processing, "busy flag must clear on failure");

        // Retry is possible: the guard is not stuck.
        assert!(manager.generate_blueprint().await.is_err());
    }

    #[tokio::test]
    async fn blueprint_success_saves_profile_and_reveals() {
        let manager = manager(false).await;
        manager.apply_patch(gating_answers()).await.unwrap();
        manager
            .skip_to(Screen::GeneratingBlueprint.index())
            .await
            .unwrap();

        let blueprint = manager.generate_blueprint().await.unwrap();
        assert!(blueprint.calorie_target > 0);
        assert_ne!(
            blueprint.macros,
            MacroTargets {
                protein_g: 0,
                carbs_g: 0,
                fat_g: 0
            }
        );
        assert_eq!(manager.status().await.screen, Screen::BlueprintReveal);

        let profile = manager
            .db
            .load_profile(DEFAULT_USER)
            .await
            .unwrap()
            .expect("profile saved");
        assert_eq!(
            profile.blueprint.unwrap().calorie_target,
            blueprint.calorie_target
        );
        assert!(!profile.onboarding_completed, "finishes on the last screen");
    }

    #[tokio::test]
    async fn finishing_marks_profile_complete_and_discards_session() {
        let manager = manager(false).await;
        manager.apply_patch(gating_answers()).await.unwrap();
        manager
            .skip_to(Screen::GeneratingBlueprint.index())
            .await
            .unwrap();
        manager.generate_blueprint().await.unwrap();

        manager.skip_to(Screen::Finish.index()).await.unwrap();
        let outcome = manager.advance().await.unwrap();
        assert_eq!(outcome, AdvanceOutcome::Completed);
        assert!(!manager.is_active());

        let profile = manager
            .db
            .load_profile(DEFAULT_USER)
            .await
            .unwrap()
            .unwrap();
        assert!(profile.onboarding_completed);
        assert!(profile.onboarding_completed_at.is_some());
        assert!(
            manager
                .db
                .load_onboarding(DEFAULT_USER)
                .await
                .unwrap()
                .is_none(),
            "session snapshot discarded"
        );

        // Further navigation is rejected.
        assert!(manager.advance().await.is_err());
        assert!(manager.apply_patch(SessionPatch::default()).await.is_err());
    }

    #[tokio::test]
    async fn resume_restores_persisted_snapshot() {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        {
            let manager = OnboardingManager::new(
                Arc::clone(&db),
                Arc::new(StubGenerator { fail: false }),
                Arc::new(InstantClock),
                Duration::from_secs(2),
            );
            manager.apply_patch(gating_answers()).await.unwrap();
            manager.skip_to(Screen::Activity.index()).await.unwrap();
        }

        let resumed = OnboardingManager::resume(
            db,
            Arc::new(StubGenerator { fail: false }),
            Arc::new(InstantClock),
            Duration::from_secs(2),
        )
        .await;
        let status = resumed.status().await;
        assert_eq!(status.screen, Screen::Activity);
        assert_eq!(
            status.session.primary_goal,
            Some(HealthGoal::LoseWeight)
        );
    }

    #[tokio::test]
    async fn skip_to_rejects_out_of_range_index() {
        let manager = manager(false).await;
        assert!(manager.skip_to(0).await.is_err());
        assert!(manager.skip_to(Screen::TOTAL + 1).await.is_err());
        assert!(manager.skip_to(Screen::TOTAL).await.is_ok());
    }
}
