//! Onboarding system — the first-launch wizard.
//!
//! A fixed sequence of screens collects the user's goals, stats, and
//! preferences into an `OnboardingSession`. Each screen has a gating rule
//! that must hold before the wizard advances; the finished session is
//! derived into a `UserProfile` with nutrition targets.

pub mod flow;
pub mod manager;
pub mod model;
pub mod routes;
pub mod screens;
pub mod session;

pub use flow::{AdvanceOutcome, OnboardingFlow};
pub use manager::{Clock, OnboardingManager, OnboardingStatus, TokioClock};
pub use model::{HealthGoal, PhysicalStats, UserProfile};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use screens::Screen;
pub use session::{OnboardingSession, SessionPatch};
