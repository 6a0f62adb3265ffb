//! Server-side game state: the simulated capture pipeline and round rules.
//!
//! This module is transport-agnostic — it knows nothing about HTTP or
//! serialization. The [`routes`](crate::routes) module wires it up to the
//! endpoint surface. Countdown and capture transitions are computed lazily
//! from stored [`Instant`]s on each access, so no background ticker runs.

use std::time::{Duration, Instant};

use jokenpo_core::protocol::{CommandAck, FingerPose, GamePhase, Gesture, RoundOutcome, Snapshot};

/// Countdown length between the play command and the capture.
pub const COUNTDOWN: Duration = Duration::from_secs(3);

/// Result message for a capture that matched no known gesture.
const UNCLEAR_CAPTURE: &str = "Mostre Pedra, Papel ou Tesoura claramente!";

const PLAYABLE: [Gesture; 3] = [Gesture::Rock, Gesture::Paper, Gesture::Scissors];

/// Where the current round stands.
#[derive(Debug, Clone, Copy)]
enum RoundPhase {
    /// Between rounds; play is accepted.
    Waiting,
    /// Countdown running since `started_at`; resolves when it expires.
    Counting { started_at: Instant },
    /// Result on display until the finish command.
    Finished,
}

/// The simulated Jokenpô table.
///
/// Mirrors the real machine's capture pipeline: capture start/stop, a three
/// second countdown, one gesture capture per round, and the accented
/// Portuguese result strings the display contract is built around.
pub struct GameTable {
    processing_active: bool,
    camera_active: bool,
    round: RoundPhase,
    /// Gesture the simulated player is holding during the countdown.
    pending_player: Gesture,
    player_choice: Gesture,
    ai_choice: Gesture,
    outcome: RoundOutcome,
    result_message: String,
    player_score: u32,
    ai_score: u32,
    ties_score: u32,
    rounds_played: u32,
    /// Scripted player gestures, cycled; empty means random.
    script: Vec<Gesture>,
    script_pos: usize,
}

impl GameTable {
    /// A fresh table. `script` fixes the simulated player's gestures for
    /// reproducible sessions; leave it empty for random play.
    pub fn new(script: Vec<Gesture>) -> Self {
        Self {
            processing_active: false,
            camera_active: false,
            round: RoundPhase::Waiting,
            pending_player: Gesture::None,
            player_choice: Gesture::None,
            ai_choice: Gesture::None,
            outcome: RoundOutcome::None,
            result_message: "Aguardando...".to_string(),
            player_score: 0,
            ai_score: 0,
            ties_score: 0,
            rounds_played: 0,
            script,
            script_pos: 0,
        }
    }

    /// Current state document, advancing any expired countdown first.
    pub fn snapshot(&mut self) -> Snapshot {
        self.tick();
        let detected = self.detected_now();
        Snapshot {
            camera_active: self.camera_active,
            processing_active: self.processing_active,
            hand_detected: self.processing_active && detected != Gesture::None,
            detected_gesture: detected,
            player_choice: self.player_choice,
            ai_choice: self.ai_choice,
            player_score: self.player_score,
            ai_score: self.ai_score,
            ties_score: self.ties_score,
            rounds_played: self.rounds_played,
            game_phase: self.phase(),
            round_outcome: Some(self.outcome),
            result_message: self.result_message.clone(),
            countdown_message: self.countdown_text(),
            fingers: Some(FingerPose::for_gesture(detected)),
        }
    }

    /// Start capture and processing.
    pub fn start(&mut self) -> CommandAck {
        self.processing_active = true;
        self.camera_active = true;
        tracing::info!("processing started");
        CommandAck::new("started", "Processamento da mão robótica iniciado.")
    }

    /// Stop capture and processing, cancelling any round in flight.
    pub fn stop(&mut self) -> CommandAck {
        self.processing_active = false;
        self.camera_active = false;
        self.clear_round();
        tracing::info!("processing stopped");
        CommandAck::new("stopped", "Processamento da mão robótica parado.")
    }

    /// Begin a round: sample the player's gesture and start the countdown.
    pub fn play(&mut self) -> CommandAck {
        self.tick();
        if !self.processing_active {
            return CommandAck::error("O processamento não está ativo.");
        }
        match self.round {
            RoundPhase::Waiting => {
                self.pending_player = self.next_player_gesture();
                self.player_choice = Gesture::None;
                self.ai_choice = Gesture::None;
                self.outcome = RoundOutcome::None;
                self.result_message = "Contando...".to_string();
                self.round = RoundPhase::Counting {
                    started_at: Instant::now(),
                };
                tracing::info!(gesture = %self.pending_player, "countdown started");
                CommandAck::new("counting_down", "Contagem regressiva iniciada.")
            }
            RoundPhase::Counting { .. } => CommandAck::error("Aguarde a rodada atual terminar."),
            RoundPhase::Finished => CommandAck::error("Finalize a rodada atual primeiro."),
        }
    }

    /// Dismiss a finished round and return to waiting.
    pub fn finish(&mut self) -> CommandAck {
        self.tick();
        if !matches!(self.round, RoundPhase::Finished) {
            return CommandAck::error("Nenhuma rodada para finalizar.");
        }
        self.clear_round();
        CommandAck::new("waiting_start", "Pronto para a próxima rodada.")
    }

    /// Zero the scoreboard and clear any round in flight.
    pub fn reset(&mut self) -> CommandAck {
        self.player_score = 0;
        self.ai_score = 0;
        self.ties_score = 0;
        self.rounds_played = 0;
        self.clear_round();
        tracing::info!("scoreboard reset");
        CommandAck::new("reset", "Placar zerado.")
    }

    /// Advance the lazy state machine: an expired countdown resolves the
    /// round.
    fn tick(&mut self) {
        if let RoundPhase::Counting { started_at } = self.round
            && started_at.elapsed() >= COUNTDOWN
        {
            self.resolve_round();
        }
    }

    fn resolve_round(&mut self) {
        let player = self.pending_player;
        let robot = random_gesture();
        let (outcome, message) = arbitrate(player, robot);
        self.player_choice = player;
        self.ai_choice = robot;
        self.outcome = outcome;
        self.result_message = message.to_string();
        match outcome {
            RoundOutcome::Won => {
                self.player_score += 1;
                self.rounds_played += 1;
            }
            RoundOutcome::Lost => {
                self.ai_score += 1;
                self.rounds_played += 1;
            }
            RoundOutcome::Draw => {
                self.ties_score += 1;
                self.rounds_played += 1;
            }
            // An uncategorized capture is replayed, not scored.
            RoundOutcome::None | RoundOutcome::Unknown => {}
        }
        self.round = RoundPhase::Finished;
        tracing::info!(player = %player, robot = %robot, result = %self.result_message, "round resolved");
    }

    fn clear_round(&mut self) {
        self.round = RoundPhase::Waiting;
        self.pending_player = Gesture::None;
        self.player_choice = Gesture::None;
        self.ai_choice = Gesture::None;
        self.outcome = RoundOutcome::None;
        self.result_message = "Aguardando...".to_string();
    }

    fn phase(&self) -> GamePhase {
        match self.round {
            RoundPhase::Waiting => GamePhase::WaitingStart,
            RoundPhase::Counting { .. } => GamePhase::CountingDown,
            RoundPhase::Finished => GamePhase::RoundFinished,
        }
    }

    /// What the camera "sees" right now.
    fn detected_now(&self) -> Gesture {
        if !self.processing_active {
            return Gesture::None;
        }
        match self.round {
            RoundPhase::Waiting => Gesture::None,
            RoundPhase::Counting { .. } => self.pending_player,
            RoundPhase::Finished => self.player_choice,
        }
    }

    fn countdown_text(&self) -> String {
        match self.round {
            RoundPhase::Waiting => String::new(),
            RoundPhase::Counting { started_at } => {
                let left = COUNTDOWN.saturating_sub(started_at.elapsed());
                let n = (left.as_secs() + 1).min(COUNTDOWN.as_secs());
                format!("Jogue em... {n}")
            }
            RoundPhase::Finished => "Jogada!".to_string(),
        }
    }

    fn next_player_gesture(&mut self) -> Gesture {
        if self.script.is_empty() {
            random_gesture()
        } else {
            let gesture = self.script[self.script_pos % self.script.len()];
            self.script_pos += 1;
            gesture
        }
    }

    /// Backdate a running countdown, for tests that must not sleep.
    #[cfg(test)]
    pub(crate) fn rewind_countdown(&mut self, by: Duration) {
        if let RoundPhase::Counting { started_at } = &mut self.round {
            *started_at -= by;
        }
    }
}

/// Parse a comma-separated gesture script such as
/// `rock,paper,scissors,undefined`.
pub fn parse_script(raw: &str) -> Result<Vec<Gesture>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| match token.to_ascii_lowercase().as_str() {
            "rock" => Ok(Gesture::Rock),
            "paper" => Ok(Gesture::Paper),
            "scissors" => Ok(Gesture::Scissors),
            "none" => Ok(Gesture::None),
            "undefined" => Ok(Gesture::Undefined),
            other => Err(format!("unknown gesture {other:?}")),
        })
        .collect()
}

/// Decide a round relative to the player.
fn arbitrate(player: Gesture, robot: Gesture) -> (RoundOutcome, &'static str) {
    if !PLAYABLE.contains(&player) {
        return (RoundOutcome::None, UNCLEAR_CAPTURE);
    }
    if player == robot {
        (RoundOutcome::Draw, "Empate!")
    } else if beats(player, robot) {
        (RoundOutcome::Won, "Você venceu!")
    } else {
        (RoundOutcome::Lost, "Robô venceu!")
    }
}

fn beats(a: Gesture, b: Gesture) -> bool {
    matches!(
        (a, b),
        (Gesture::Rock, Gesture::Scissors)
            | (Gesture::Scissors, Gesture::Paper)
            | (Gesture::Paper, Gesture::Rock)
    )
}

fn random_gesture() -> Gesture {
    use rand::RngExt;
    let mut rng = rand::rng();
    PLAYABLE[rng.random_range(0..PLAYABLE.len())]
}
