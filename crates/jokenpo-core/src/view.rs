//! Display-surface abstraction.
//!
//! Every render target is addressed through the [`GameView`] capability
//! trait rather than a concrete widget handle. The reconciler only
//! writes through this trait, so front-ends (and tests) supply whatever
//! implementation suits them. [`ScreenModel`] is the plain in-memory
//! implementation the TUI draws from.

use std::collections::{HashMap, VecDeque};

use crate::phase::ControlState;
use crate::protocol::Gesture;

/// Every text surface the reconciler writes.
///
/// The `Mini*` fields are the secondary scoreboard panel; the reconciler
/// keeps them verbatim duplicates of their main counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    CameraStatus,
    PlayerScore,
    AiScore,
    TiesScore,
    RoundsPlayed,
    MiniPlayerScore,
    MiniAiScore,
    MiniTiesScore,
    MiniRoundsPlayed,
    PlayerGesture,
    AiGesture,
    DetectedGesture,
    HandStatus,
    FingerPose,
    ResultBanner,
    OpponentBanner,
    Countdown,
    RawSnapshot,
}

/// Colour/emphasis category for a text surface. Front-ends decide how
/// each renders; the reconciler only assigns the category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    #[default]
    Neutral,
    Muted,
}

/// Interactive surfaces (the control buttons of the display).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    StartCapture,
    StopCapture,
    PlayRound,
    FinishRound,
    ResetScoreboard,
}

impl Control {
    /// Human-readable label for UI display.
    pub fn label(self) -> &'static str {
        match self {
            Control::StartCapture => "Start capture",
            Control::StopCapture => "Stop capture",
            Control::PlayRound => "Play round",
            Control::FinishRound => "Finish round",
            Control::ResetScoreboard => "Reset scoreboard",
        }
    }
}

/// Icon slots holding a gesture glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconSlot {
    Player,
    Ai,
    Detected,
}

/// Capability object the reconciler renders through.
pub trait GameView {
    fn set_text(&mut self, field: TextField, text: &str);
    fn set_tone(&mut self, field: TextField, tone: Tone);
    fn set_icon(&mut self, slot: IconSlot, gesture: Gesture);
    fn set_control(&mut self, control: Control, state: ControlState);
    /// Point the live video element at `source`, or detach it with `None`.
    fn set_stream_source(&mut self, source: Option<&str>);
}

/// Semantic category for screen notes. The UI layer decides styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    System,
    Command,
    Error,
}

/// A local feedback line shown in the TUI log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub text: String,
    pub kind: NoteKind,
}

/// In-memory [`GameView`] implementation.
///
/// Unset text fields read as empty, icons as [`Gesture::None`], controls
/// as [`ControlState::Hidden`] until the first reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenModel {
    texts: HashMap<TextField, String>,
    tones: HashMap<TextField, Tone>,
    icons: HashMap<IconSlot, Gesture>,
    controls: HashMap<Control, ControlState>,
    stream_source: Option<String>,
    notes: VecDeque<Note>,
}

impl ScreenModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, field: TextField) -> &str {
        self.texts.get(&field).map_or("", String::as_str)
    }

    pub fn tone(&self, field: TextField) -> Tone {
        self.tones.get(&field).copied().unwrap_or_default()
    }

    pub fn icon(&self, slot: IconSlot) -> Gesture {
        self.icons.get(&slot).copied().unwrap_or_default()
    }

    pub fn control(&self, control: Control) -> ControlState {
        self.controls
            .get(&control)
            .copied()
            .unwrap_or(ControlState::Hidden)
    }

    pub fn stream_source(&self) -> Option<&str> {
        self.stream_source.as_deref()
    }

    /// Append a feedback note, keeping only the last 100 entries.
    pub fn push_note(&mut self, text: impl Into<String>, kind: NoteKind) {
        self.notes.push_back(Note {
            text: text.into(),
            kind,
        });
        if self.notes.len() > 100 {
            self.notes.pop_front();
        }
    }

    pub fn notes(&self) -> impl DoubleEndedIterator<Item = &Note> + ExactSizeIterator {
        self.notes.iter()
    }
}

impl GameView for ScreenModel {
    fn set_text(&mut self, field: TextField, text: &str) {
        self.texts.insert(field, text.to_string());
    }

    fn set_tone(&mut self, field: TextField, tone: Tone) {
        self.tones.insert(field, tone);
    }

    fn set_icon(&mut self, slot: IconSlot, gesture: Gesture) {
        self.icons.insert(slot, gesture);
    }

    fn set_control(&mut self, control: Control, state: ControlState) {
        self.controls.insert(control, state);
    }

    fn set_stream_source(&mut self, source: Option<&str>) {
        self.stream_source = source.map(str::to_string);
    }
}
