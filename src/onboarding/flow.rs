//! The wizard flow controller — owns the session and decides whether a
//! transition is legal.
//!
//! Pure state: no I/O, no clocks. The async side (persistence, splash
//! timer, blueprint generation) lives in `OnboardingManager`.

use serde::{Deserialize, Serialize};

use super::screens::Screen;
use super::session::OnboardingSession;

/// Result of an `advance()` call.
///
/// A rejected advance is a normal outcome, not an error: the client polls
/// `can_proceed` to disable its continue button, and a rejected call leaves
/// the wizard exactly where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved forward to this screen.
    Advanced(Screen),
    /// The current screen's gate is unmet; position unchanged.
    Rejected(Screen),
    /// Advanced past the final screen; the wizard is done.
    Completed,
}

/// In-progress wizard: current screen plus every answer collected so far.
///
/// Serialized whole as the persistence snapshot, so a relaunched app resumes
/// mid-wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingFlow {
    current: Screen,
    pub session: OnboardingSession,
}

impl Default for OnboardingFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingFlow {
    /// Fresh wizard at the splash screen with an empty session.
    pub fn new() -> Self {
        Self {
            current: Screen::Splash,
            session: OnboardingSession::default(),
        }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    /// May the wizard advance past the current screen?
    pub fn can_proceed(&self) -> bool {
        self.current.can_proceed(&self.session)
    }

    /// Advance one screen if the current gate holds.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if !self.can_proceed() {
            return AdvanceOutcome::Rejected(self.current);
        }
        match self.current.next() {
            Some(next) => {
                self.current = next;
                AdvanceOutcome::Advanced(next)
            }
            None => AdvanceOutcome::Completed,
        }
    }

    /// Move one screen back. Always legal; saturates at the first screen.
    pub fn retreat(&mut self) -> Screen {
        if let Some(prev) = self.current.prev() {
            self.current = prev;
        }
        self.current
    }

    /// Jump to an arbitrary screen. Used for the weight-goal branch and for
    /// landing on the reveal screen after blueprint generation.
    pub fn skip_to(&mut self, screen: Screen) {
        self.current = screen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::model::HealthGoal;

    #[test]
    fn fresh_flow_starts_at_splash() {
        let flow = OnboardingFlow::new();
        assert_eq!(flow.current(), Screen::Splash);
        assert_eq!(flow.current().index(), 1);
    }

    #[test]
    fn retreat_saturates_at_first_screen() {
        let mut flow = OnboardingFlow::new();
        for _ in 0..5 {
            assert_eq!(flow.retreat(), Screen::Splash);
        }
        assert_eq!(flow.current().index(), 1);
    }

    #[test]
    fn rejected_advance_leaves_position_unchanged() {
        let mut flow = OnboardingFlow::new();
        flow.skip_to(Screen::GoalSelect);

        // Empty goal set: gate unmet.
        assert_eq!(flow.advance(), AdvanceOutcome::Rejected(Screen::GoalSelect));
        assert_eq!(flow.current(), Screen::GoalSelect);

        // Repeated rejection is idempotent.
        assert_eq!(flow.advance(), AdvanceOutcome::Rejected(Screen::GoalSelect));
        assert_eq!(flow.current(), Screen::GoalSelect);
    }

    #[test]
    fn one_goal_rejected_two_goals_advances_to_primary_goal() {
        let mut flow = OnboardingFlow::new();
        flow.skip_to(Screen::GoalSelect);

        flow.session.selected_goals = vec![HealthGoal::LoseWeight];
        assert_eq!(flow.advance(), AdvanceOutcome::Rejected(Screen::GoalSelect));

        flow.session.selected_goals.push(HealthGoal::BoostEnergy);
        assert_eq!(
            flow.advance(),
            AdvanceOutcome::Advanced(Screen::PrimaryGoal)
        );
        assert_eq!(flow.current().index(), 4);
    }

    #[test]
    fn unset_primary_goal_rejected_regardless_of_selection() {
        let mut flow = OnboardingFlow::new();
        flow.skip_to(Screen::PrimaryGoal);
        flow.session.selected_goals = vec![HealthGoal::LoseWeight, HealthGoal::SleepBetter];

        assert_eq!(
            flow.advance(),
            AdvanceOutcome::Rejected(Screen::PrimaryGoal)
        );

        flow.session.primary_goal = Some(HealthGoal::SleepBetter);
        assert_eq!(flow.advance(), AdvanceOutcome::Advanced(Screen::Vision));
    }

    #[test]
    fn advance_past_last_screen_completes() {
        let mut flow = OnboardingFlow::new();
        flow.skip_to(Screen::Finish);
        assert_eq!(flow.advance(), AdvanceOutcome::Completed);
        // Position stays on the last screen after completion.
        assert_eq!(flow.current(), Screen::Finish);
    }

    #[test]
    fn splash_advances_without_any_answers() {
        let mut flow = OnboardingFlow::new();
        assert!(flow.can_proceed());
        assert_eq!(flow.advance(), AdvanceOutcome::Advanced(Screen::Welcome));
    }

    #[test]
    fn flow_serde_roundtrip_preserves_position() {
        let mut flow = OnboardingFlow::new();
        flow.skip_to(Screen::Activity);
        flow.session.success_vision = "cook at home five nights a week".to_string();

        let json = serde_json::to_string(&flow).unwrap();
        let parsed: OnboardingFlow = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.current(), Screen::Activity);
        assert_eq!(parsed.session.success_vision, flow.session.success_vision);
    }
}
