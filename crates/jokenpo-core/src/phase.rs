//! Lifecycle phase resolution and control affordances.
//!
//! The backend never reports transition events, only flag-bearing
//! snapshots. [`resolve_phase`] collapses those flags into the closed
//! [`EffectivePhase`] set, and [`ControlPlan`] is the single table that
//! decides which controls each phase exposes.

use crate::protocol::GamePhase;

/// Client-derived lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectivePhase {
    /// Recognition pipeline stopped.
    Inactive,
    /// Waiting for the player to start a round.
    Ready,
    /// Countdown running; play is locked until it resolves.
    Countdown,
    /// Round resolved; the result is on display.
    Finished,
    /// The backend reported a phase this client does not recognize.
    Unknown,
}

/// Map raw snapshot flags to an [`EffectivePhase`].
///
/// Pure and total over exactly these two inputs. An unrecognized raw
/// phase resolves to [`EffectivePhase::Unknown`], never to `Ready`, so
/// play cannot be re-enabled during backend transition states.
pub fn resolve_phase(processing_active: bool, phase: GamePhase) -> EffectivePhase {
    if !processing_active {
        return EffectivePhase::Inactive;
    }
    match phase {
        GamePhase::WaitingStart => EffectivePhase::Ready,
        GamePhase::CountingDown => EffectivePhase::Countdown,
        GamePhase::RoundFinished => EffectivePhase::Finished,
        GamePhase::Unknown => EffectivePhase::Unknown,
    }
}

/// Interactivity of a single control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Hidden,
    Disabled,
    Enabled,
}

impl ControlState {
    /// True when the control should accept activation.
    pub fn is_enabled(self) -> bool {
        matches!(self, ControlState::Enabled)
    }

    /// True when the control occupies screen space at all.
    pub fn is_visible(self) -> bool {
        !matches!(self, ControlState::Hidden)
    }
}

/// Affordances for the five control surfaces in one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPlan {
    pub start_capture: ControlState,
    pub stop_capture: ControlState,
    pub play_round: ControlState,
    pub finish_round: ControlState,
    pub reset_scoreboard: ControlState,
}

impl ControlPlan {
    /// The affordance table. Start and stop are mutually exclusive; play
    /// is interactive only in `Ready`; finish only in `Finished`; reset
    /// is always offered.
    pub fn for_phase(phase: EffectivePhase) -> Self {
        use ControlState::{Disabled, Enabled, Hidden};
        match phase {
            EffectivePhase::Inactive => Self {
                start_capture: Enabled,
                stop_capture: Hidden,
                play_round: Disabled,
                finish_round: Hidden,
                reset_scoreboard: Enabled,
            },
            EffectivePhase::Ready => Self {
                start_capture: Hidden,
                stop_capture: Enabled,
                play_round: Enabled,
                finish_round: Hidden,
                reset_scoreboard: Enabled,
            },
            EffectivePhase::Countdown => Self {
                start_capture: Hidden,
                stop_capture: Enabled,
                play_round: Disabled,
                finish_round: Hidden,
                reset_scoreboard: Enabled,
            },
            EffectivePhase::Finished => Self {
                start_capture: Hidden,
                stop_capture: Enabled,
                play_round: Hidden,
                finish_round: Enabled,
                reset_scoreboard: Enabled,
            },
            EffectivePhase::Unknown => Self {
                start_capture: Hidden,
                stop_capture: Enabled,
                play_round: Hidden,
                finish_round: Hidden,
                reset_scoreboard: Enabled,
            },
        }
    }

    /// Affordances while the backend is unreachable: the `Inactive` row,
    /// which keeps play and finish non-interactive while still offering
    /// capture start and scoreboard reset.
    pub fn degraded() -> Self {
        Self::for_phase(EffectivePhase::Inactive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_processing_dominates_phase() {
        for phase in [
            GamePhase::WaitingStart,
            GamePhase::CountingDown,
            GamePhase::RoundFinished,
            GamePhase::Unknown,
        ] {
            assert_eq!(resolve_phase(false, phase), EffectivePhase::Inactive);
        }
    }

    #[test]
    fn active_phases_map_one_to_one() {
        assert_eq!(
            resolve_phase(true, GamePhase::WaitingStart),
            EffectivePhase::Ready
        );
        assert_eq!(
            resolve_phase(true, GamePhase::CountingDown),
            EffectivePhase::Countdown
        );
        assert_eq!(
            resolve_phase(true, GamePhase::RoundFinished),
            EffectivePhase::Finished
        );
    }

    #[test]
    fn unrecognized_phase_never_resolves_ready() {
        assert_eq!(
            resolve_phase(true, GamePhase::Unknown),
            EffectivePhase::Unknown
        );
    }

    #[test]
    fn play_is_interactive_only_when_ready() {
        for phase in [
            EffectivePhase::Inactive,
            EffectivePhase::Countdown,
            EffectivePhase::Finished,
            EffectivePhase::Unknown,
        ] {
            assert!(!ControlPlan::for_phase(phase).play_round.is_enabled());
        }
        assert!(
            ControlPlan::for_phase(EffectivePhase::Ready)
                .play_round
                .is_enabled()
        );
    }

    #[test]
    fn finish_is_shown_only_when_finished() {
        for phase in [
            EffectivePhase::Inactive,
            EffectivePhase::Ready,
            EffectivePhase::Countdown,
            EffectivePhase::Unknown,
        ] {
            assert_eq!(
                ControlPlan::for_phase(phase).finish_round,
                ControlState::Hidden
            );
        }
        assert_eq!(
            ControlPlan::for_phase(EffectivePhase::Finished).finish_round,
            ControlState::Enabled
        );
    }

    #[test]
    fn start_stop_are_mutually_exclusive() {
        for phase in [
            EffectivePhase::Inactive,
            EffectivePhase::Ready,
            EffectivePhase::Countdown,
            EffectivePhase::Finished,
            EffectivePhase::Unknown,
        ] {
            let plan = ControlPlan::for_phase(phase);
            assert_ne!(
                plan.start_capture.is_visible(),
                plan.stop_capture.is_visible()
            );
        }
    }

    #[test]
    fn degraded_matches_inactive() {
        assert_eq!(
            ControlPlan::degraded(),
            ControlPlan::for_phase(EffectivePhase::Inactive)
        );
    }
}
