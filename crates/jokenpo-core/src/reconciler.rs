//! Snapshot-to-view reconciliation.
//!
//! The reconciler is the only component that writes display state. Each
//! accepted snapshot is rendered in a fixed step order (camera status,
//! scoreboard, gesture icons, result banners, control affordances,
//! countdown text), diffing against the previously applied snapshot so
//! unchanged sections issue no writes. A monotonically increasing
//! sequence guard drops responses that arrive after a newer one has
//! already been applied, and the video stream source is re-issued only
//! when its logical key (camera active) changes.

use crate::phase::{ControlPlan, resolve_phase};
use crate::protocol::{FingerPose, RoundOutcome, Snapshot};
use crate::view::{Control, GameView, IconSlot, TextField, Tone};

/// Applies snapshots to a [`GameView`], guarding against stale data.
pub struct Reconciler {
    base_url: String,
    last_seq: Option<u64>,
    last_applied: Option<Snapshot>,
    /// Logical key of the video source: whether a stream is attached.
    stream_attached: bool,
    /// Bumped on each re-attach so the source URL cache-busts.
    stream_generation: u64,
}

impl Reconciler {
    /// `base_url` is the backend root used to build the stream source.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            last_seq: None,
            last_applied: None,
            stream_attached: false,
            stream_generation: 0,
        }
    }

    /// Render `snapshot` into `view`.
    ///
    /// Returns `false` when `seq` is not newer than the last applied
    /// sequence; the view is left untouched in that case.
    pub fn apply(&mut self, seq: u64, snapshot: &Snapshot, view: &mut impl GameView) -> bool {
        if self.is_stale(seq) {
            tracing::warn!(seq, "dropping stale snapshot");
            return false;
        }
        self.last_seq = Some(seq);

        let prev = self.last_applied.as_ref();
        if prev == Some(snapshot) {
            // Identical content: only the sequence guard advances.
            return true;
        }

        // 1. Camera status, two-entry table.
        if prev.is_none_or(|p| p.camera_active != snapshot.camera_active) {
            let (text, tone) = if snapshot.camera_active {
                ("active", Tone::Positive)
            } else {
                ("inactive", Tone::Negative)
            };
            view.set_text(TextField::CameraStatus, text);
            view.set_tone(TextField::CameraStatus, tone);
        }

        // 2. Scoreboard, duplicated verbatim onto the mini panel so the
        // two surfaces can never diverge.
        if prev.is_none_or(|p| {
            (p.player_score, p.ai_score, p.ties_score, p.rounds_played)
                != (
                    snapshot.player_score,
                    snapshot.ai_score,
                    snapshot.ties_score,
                    snapshot.rounds_played,
                )
        }) {
            let targets = [
                (
                    snapshot.player_score,
                    [TextField::PlayerScore, TextField::MiniPlayerScore],
                ),
                (
                    snapshot.ai_score,
                    [TextField::AiScore, TextField::MiniAiScore],
                ),
                (
                    snapshot.ties_score,
                    [TextField::TiesScore, TextField::MiniTiesScore],
                ),
                (
                    snapshot.rounds_played,
                    [TextField::RoundsPlayed, TextField::MiniRoundsPlayed],
                ),
            ];
            for (value, fields) in targets {
                let text = value.to_string();
                for field in fields {
                    view.set_text(field, &text);
                }
            }
        }

        // 3. Gesture icons and labels.
        if prev.is_none_or(|p| {
            (p.player_choice, p.ai_choice, p.detected_gesture)
                != (
                    snapshot.player_choice,
                    snapshot.ai_choice,
                    snapshot.detected_gesture,
                )
        }) {
            let slots = [
                (snapshot.player_choice, IconSlot::Player, TextField::PlayerGesture),
                (snapshot.ai_choice, IconSlot::Ai, TextField::AiGesture),
                (
                    snapshot.detected_gesture,
                    IconSlot::Detected,
                    TextField::DetectedGesture,
                ),
            ];
            for (gesture, slot, field) in slots {
                view.set_icon(slot, gesture);
                view.set_text(field, gesture.label());
            }
        }

        // 4. Result banners: exactly one category on the player banner,
        // polarity inverted on the opponent banner.
        if prev.is_none_or(|p| {
            (p.round_outcome, p.result_message.as_str())
                != (snapshot.round_outcome, snapshot.result_message.as_str())
        }) {
            // Backends that predate the outcome field, or that report a
            // category this client does not know, fall back to the
            // message sentinels.
            let outcome = match snapshot.round_outcome {
                Some(RoundOutcome::Unknown) | None => {
                    RoundOutcome::from_message(&snapshot.result_message)
                }
                Some(outcome) => outcome,
            };
            view.set_text(TextField::ResultBanner, &snapshot.result_message);
            view.set_tone(TextField::ResultBanner, outcome_tone(outcome));
            view.set_text(TextField::OpponentBanner, &snapshot.result_message);
            view.set_tone(TextField::OpponentBanner, outcome_tone(outcome.inverted()));
        }

        // 5. Control affordances from the resolved phase.
        if prev.is_none_or(|p| {
            (p.processing_active, p.game_phase) != (snapshot.processing_active, snapshot.game_phase)
        }) {
            let phase = resolve_phase(snapshot.processing_active, snapshot.game_phase);
            apply_plan(view, ControlPlan::for_phase(phase));
        }

        // 6. Countdown text, verbatim.
        if prev.is_none_or(|p| p.countdown_message != snapshot.countdown_message) {
            view.set_text(TextField::Countdown, &snapshot.countdown_message);
        }

        // Hand indicator and robotic-hand pose.
        if prev.is_none_or(|p| p.hand_detected != snapshot.hand_detected) {
            let (text, tone) = if snapshot.hand_detected {
                ("yes", Tone::Positive)
            } else {
                ("no", Tone::Negative)
            };
            view.set_text(TextField::HandStatus, text);
            view.set_tone(TextField::HandStatus, tone);
        }
        if prev.is_none_or(|p| p.fingers != snapshot.fingers) {
            let glyphs = snapshot
                .fingers
                .as_ref()
                .map(finger_glyphs)
                .unwrap_or_default();
            view.set_text(TextField::FingerPose, &glyphs);
        }

        // Raw document for the debug pane.
        let raw = serde_json::to_string_pretty(snapshot).unwrap_or_default();
        view.set_text(TextField::RawSnapshot, &raw);

        self.sync_stream(snapshot.camera_active, view);
        self.last_applied = Some(snapshot.clone());
        true
    }

    /// Render the degraded state after a failed poll.
    ///
    /// Subject to the same sequence guard as [`Reconciler::apply`]: a
    /// failure response that lost the race against a newer snapshot
    /// must not degrade an already-updated display. Clears the applied
    /// snapshot so the next good one re-renders every section.
    pub fn apply_degraded(&mut self, seq: u64, view: &mut impl GameView) -> bool {
        if self.is_stale(seq) {
            tracing::debug!(seq, "dropping stale failure");
            return false;
        }
        self.last_seq = Some(seq);
        self.last_applied = None;

        view.set_text(TextField::CameraStatus, "inactive");
        view.set_tone(TextField::CameraStatus, Tone::Negative);
        view.set_text(TextField::ResultBanner, "connection error");
        view.set_tone(TextField::ResultBanner, Tone::Negative);
        view.set_text(TextField::OpponentBanner, "");
        view.set_tone(TextField::OpponentBanner, Tone::Neutral);
        apply_plan(view, ControlPlan::degraded());
        if self.stream_attached {
            self.stream_attached = false;
            view.set_stream_source(None);
        }
        true
    }

    fn is_stale(&self, seq: u64) -> bool {
        self.last_seq.is_some_and(|last| seq <= last)
    }

    /// Re-issue the stream source only when the logical key flips.
    fn sync_stream(&mut self, active: bool, view: &mut impl GameView) {
        if active == self.stream_attached {
            return;
        }
        self.stream_attached = active;
        if active {
            self.stream_generation += 1;
            let url = format!("{}/video_feed?ts={}", self.base_url, self.stream_generation);
            view.set_stream_source(Some(&url));
        } else {
            view.set_stream_source(None);
        }
    }
}

fn apply_plan(view: &mut impl GameView, plan: ControlPlan) {
    view.set_control(Control::StartCapture, plan.start_capture);
    view.set_control(Control::StopCapture, plan.stop_capture);
    view.set_control(Control::PlayRound, plan.play_round);
    view.set_control(Control::FinishRound, plan.finish_round);
    view.set_control(Control::ResetScoreboard, plan.reset_scoreboard);
}

fn outcome_tone(outcome: RoundOutcome) -> Tone {
    match outcome {
        RoundOutcome::Won => Tone::Positive,
        RoundOutcome::Lost => Tone::Negative,
        RoundOutcome::Draw => Tone::Neutral,
        RoundOutcome::None | RoundOutcome::Unknown => Tone::Muted,
    }
}

fn finger_glyphs(pose: &FingerPose) -> String {
    pose.open_flags()
        .iter()
        .map(|open| if *open { '●' } else { '○' })
        .collect()
}
