use serde::{Deserialize, Serialize};
use std::fmt;

/// A rock-paper-scissors gesture as reported by the backend.
///
/// Any wire value outside the closed set decodes to [`Gesture::Undefined`],
/// so a backend running a newer detector never breaks the client.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gesture {
    Rock,
    Paper,
    Scissors,
    /// No hand in frame.
    #[default]
    None,
    /// Hand in frame but the pose matched no known gesture.
    #[serde(other)]
    Undefined,
}

impl Gesture {
    /// Human-readable label for UI display.
    pub fn label(self) -> &'static str {
        match self {
            Gesture::Rock => "Rock",
            Gesture::Paper => "Paper",
            Gesture::Scissors => "Scissors",
            Gesture::None => "None",
            Gesture::Undefined => "Undefined",
        }
    }

    /// Glyph for icon slots. Labels without a dedicated glyph share the
    /// unknown icon rather than rendering an empty element.
    pub fn icon(self) -> &'static str {
        match self {
            Gesture::Rock => "✊",
            Gesture::Paper => "✋",
            Gesture::Scissors => "✌",
            Gesture::None | Gesture::Undefined => "?",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw lifecycle phase embedded in each snapshot.
///
/// Only meaningful while `processing_active` is true. Missing or
/// unrecognized values decode to [`GamePhase::Unknown`] — never to a
/// phase that would re-enable play.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    WaitingStart,
    CountingDown,
    RoundFinished,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Round result relative to the player, as categorized by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoundOutcome {
    Won,
    Lost,
    Draw,
    /// No round resolved yet.
    None,
    #[serde(other)]
    Unknown,
}

impl RoundOutcome {
    /// Classify a free-form result message by its known sentinels.
    ///
    /// Fallback for backends that predate the `round_outcome` field.
    /// Both accented and unaccented spellings occur across backend
    /// versions, so both are matched.
    pub fn from_message(message: &str) -> Self {
        if message.contains("Você venceu") || message.contains("Voce venceu") {
            RoundOutcome::Won
        } else if message.contains("Robô venceu") || message.contains("Robo venceu") {
            RoundOutcome::Lost
        } else if message.contains("Empate") {
            RoundOutcome::Draw
        } else {
            RoundOutcome::None
        }
    }

    /// The same result seen from the opponent's side. Win and loss swap;
    /// draw and the empty outcomes are their own mirror.
    pub fn inverted(self) -> Self {
        match self {
            RoundOutcome::Won => RoundOutcome::Lost,
            RoundOutcome::Lost => RoundOutcome::Won,
            other => other,
        }
    }
}

/// Servo angles of the simulated robotic hand, one per finger.
/// 0 degrees is fully closed, 45 fully open.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FingerPose {
    #[serde(rename = "finger_thumb")]
    pub thumb: u8,
    #[serde(rename = "finger_index")]
    pub index: u8,
    #[serde(rename = "finger_middle")]
    pub middle: u8,
    #[serde(rename = "finger_ring")]
    pub ring: u8,
    #[serde(rename = "finger_pinky")]
    pub pinky: u8,
}

impl FingerPose {
    pub const OPEN_ANGLE: u8 = 45;

    /// Open/closed flags in thumb-to-pinky order.
    pub fn open_flags(&self) -> [bool; 5] {
        [
            self.thumb > 0,
            self.index > 0,
            self.middle > 0,
            self.ring > 0,
            self.pinky > 0,
        ]
    }

    /// Canonical pose for a gesture, as the robotic hand's servo driver
    /// shapes it.
    pub fn for_gesture(gesture: Gesture) -> Self {
        let open = Self::OPEN_ANGLE;
        match gesture {
            Gesture::Rock => Self::default(),
            Gesture::Paper => Self {
                thumb: open,
                index: open,
                middle: open,
                ring: open,
                pinky: open,
            },
            Gesture::Scissors => Self {
                index: open,
                middle: open,
                ..Self::default()
            },
            Gesture::None | Gesture::Undefined => Self::default(),
        }
    }
}

/// One authoritative state snapshot from the backend.
///
/// Replaced wholesale on each poll, never mutated in place. Every field
/// defaults so partial documents from older backends still decode; the
/// phase default is [`GamePhase::Unknown`], which keeps play controls
/// hidden rather than spuriously ready.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Snapshot {
    /// Backend capture device health.
    pub camera_active: bool,
    /// Whether the recognition pipeline is running.
    pub processing_active: bool,
    /// Whether a hand is currently recognized in-frame.
    pub hand_detected: bool,
    /// Live gesture recognized this instant (not yet committed to a round).
    pub detected_gesture: Gesture,
    /// Committed choices for the most recently resolved round.
    pub player_choice: Gesture,
    pub ai_choice: Gesture,
    pub player_score: u32,
    pub ai_score: u32,
    pub ties_score: u32,
    pub rounds_played: u32,
    pub game_phase: GamePhase,
    /// Backend-categorized result. Absent on older backends; the client
    /// then falls back to [`RoundOutcome::from_message`].
    pub round_outcome: Option<RoundOutcome>,
    /// Locale-bound human-readable text, projected verbatim.
    pub result_message: String,
    pub countdown_message: String,
    /// Simulated robotic-hand pose, when the backend reports one.
    pub fingers: Option<FingerPose>,
}

/// Acknowledgement document returned by every control endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandAck {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl CommandAck {
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            message: Some(message.into()),
        }
    }

    /// Ack for a rejected command (`status == "error"`).
    pub fn error(message: impl Into<String>) -> Self {
        Self::new("error", message)
    }

    /// True when the backend explicitly rejected the command.
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_snapshot_decodes() {
        let doc = r#"{
            "camera_active": true,
            "processing_active": true,
            "hand_detected": true,
            "detected_gesture": "Rock",
            "player_choice": "Paper",
            "ai_choice": "Scissors",
            "player_score": 2,
            "ai_score": 1,
            "ties_score": 3,
            "rounds_played": 6,
            "game_phase": "round_finished",
            "round_outcome": "won",
            "result_message": "Você venceu!",
            "countdown_message": "",
            "fingers": {"finger_thumb": 0, "finger_index": 45, "finger_middle": 45, "finger_ring": 0, "finger_pinky": 0}
        }"#;
        let snap: Snapshot = serde_json::from_str(doc).unwrap();
        assert!(snap.camera_active);
        assert_eq!(snap.detected_gesture, Gesture::Rock);
        assert_eq!(snap.game_phase, GamePhase::RoundFinished);
        assert_eq!(snap.round_outcome, Some(RoundOutcome::Won));
        assert_eq!(snap.fingers.unwrap().open_flags(), [false, true, true, false, false]);
    }

    #[test]
    fn partial_snapshot_uses_safe_defaults() {
        let snap: Snapshot = serde_json::from_str(r#"{"processing_active": true}"#).unwrap();
        assert_eq!(snap.game_phase, GamePhase::Unknown);
        assert_eq!(snap.detected_gesture, Gesture::None);
        assert_eq!(snap.round_outcome, None);
        assert_eq!(snap.player_score, 0);
    }

    #[test]
    fn unrecognized_wire_values_degrade() {
        let snap: Snapshot = serde_json::from_str(
            r#"{"detected_gesture": "Lizard", "game_phase": "calibrating"}"#,
        )
        .unwrap();
        assert_eq!(snap.detected_gesture, Gesture::Undefined);
        assert_eq!(snap.game_phase, GamePhase::Unknown);
        assert_eq!(snap.detected_gesture.icon(), "?");
    }

    #[test]
    fn message_classification() {
        assert_eq!(
            RoundOutcome::from_message("Você venceu!"),
            RoundOutcome::Won
        );
        assert_eq!(
            RoundOutcome::from_message("Voce venceu!"),
            RoundOutcome::Won
        );
        assert_eq!(
            RoundOutcome::from_message("Robô venceu!"),
            RoundOutcome::Lost
        );
        assert_eq!(RoundOutcome::from_message("Empate!"), RoundOutcome::Draw);
        assert_eq!(
            RoundOutcome::from_message("Aguardando..."),
            RoundOutcome::None
        );
    }

    #[test]
    fn outcome_inversion() {
        assert_eq!(RoundOutcome::Won.inverted(), RoundOutcome::Lost);
        assert_eq!(RoundOutcome::Lost.inverted(), RoundOutcome::Won);
        assert_eq!(RoundOutcome::Draw.inverted(), RoundOutcome::Draw);
        assert_eq!(RoundOutcome::None.inverted(), RoundOutcome::None);
    }

    #[test]
    fn ack_error_detection() {
        assert!(CommandAck::error("wrong phase").is_error());
        assert!(!CommandAck::new("started", "ok").is_error());
        assert!(!CommandAck::default().is_error());
    }
}
