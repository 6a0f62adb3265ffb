//! Client controller.
//!
//! Owns the API handle, the poll scheduler, the command dispatcher, the
//! reconciler, and the screen model. Front-ends drive it from a select
//! loop: [`GameController::next_event`] pumps state changes into the
//! screen model, [`GameController::dispatch`] issues commands, and
//! [`GameController::screen`] is read whenever a frame is drawn.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::api::{ApiError, Command, HttpApi, StatusApi};
use crate::dispatcher::{CommandDispatcher, CommandReport};
use crate::poller::{PollEvent, Poller};
use jokenpo_core::protocol::Snapshot;
use jokenpo_core::reconciler::Reconciler;
use jokenpo_core::view::{NoteKind, ScreenModel};

/// Outcome of processing one controller event.
#[derive(Debug)]
pub enum ClientEvent {
    /// A snapshot passed the sequence guard and is on screen.
    Applied { seq: u64 },
    /// A response lost the race against a newer one and was dropped.
    StaleDropped { seq: u64 },
    /// A poll failed and the degraded state is on screen.
    Degraded { seq: u64, error: ApiError },
    /// A dispatched command finished.
    Command(CommandReport),
    /// The polling task stopped; no further events will arrive.
    Closed,
}

/// Everything a frontend needs to run the game display.
pub struct GameController<A> {
    base_url: String,
    poller: Poller,
    dispatcher: CommandDispatcher<A>,
    reports: mpsc::UnboundedReceiver<CommandReport>,
    reconciler: Reconciler,
    screen: ScreenModel,
    degraded: bool,
}

impl GameController<HttpApi> {
    /// Connect to the backend at `base_url` and start polling.
    pub fn connect(base_url: &str, poll_interval: Duration) -> Result<Self, ApiError> {
        let api = HttpApi::new(base_url)?;
        Ok(Self::with_api(api, base_url, poll_interval))
    }
}

impl<A: StatusApi> GameController<A> {
    /// Build a controller over any [`StatusApi`] implementation.
    ///
    /// `base_url` is only used to derive the video stream source.
    pub fn with_api(api: A, base_url: &str, poll_interval: Duration) -> Self {
        let api = Arc::new(api);
        let poller = Poller::spawn(api.clone(), poll_interval);
        let (dispatcher, reports) = CommandDispatcher::new(api, poller.resync_handle());
        let mut screen = ScreenModel::new();
        screen.push_note(format!("polling {base_url}"), NoteKind::System);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            poller,
            dispatcher,
            reports,
            reconciler: Reconciler::new(base_url),
            screen,
            degraded: false,
        }
    }

    /// The normalized backend root this controller polls.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current display state. Only [`next_event`](Self::next_event)
    /// mutates the reconciled surfaces.
    pub fn screen(&self) -> &ScreenModel {
        &self.screen
    }

    /// Mutable access for frontend-local feedback notes.
    pub fn screen_mut(&mut self) -> &mut ScreenModel {
        &mut self.screen
    }

    /// True while the display shows the degraded connection state.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Send a command in the background; its report arrives as a
    /// [`ClientEvent::Command`].
    pub fn dispatch(&self, command: Command) {
        self.dispatcher.dispatch(command);
    }

    /// Wait for the next poll result or command report and fold it into
    /// the screen model.
    pub async fn next_event(&mut self) -> ClientEvent {
        tokio::select! {
            poll = self.poller.next_event() => match poll {
                Some(PollEvent::Snapshot { seq, snapshot }) => self.on_snapshot(seq, snapshot),
                Some(PollEvent::Degraded { seq, error }) => self.on_degraded(seq, error),
                None => ClientEvent::Closed,
            },
            report = self.reports.recv() => match report {
                Some(report) => {
                    self.note_report(&report);
                    ClientEvent::Command(report)
                }
                None => ClientEvent::Closed,
            },
        }
    }

    fn on_snapshot(&mut self, seq: u64, snapshot: Snapshot) -> ClientEvent {
        if !self.reconciler.apply(seq, &snapshot, &mut self.screen) {
            return ClientEvent::StaleDropped { seq };
        }
        if self.degraded {
            self.degraded = false;
            self.screen.push_note("connection restored", NoteKind::System);
        }
        ClientEvent::Applied { seq }
    }

    fn on_degraded(&mut self, seq: u64, error: ApiError) -> ClientEvent {
        if !self.reconciler.apply_degraded(seq, &mut self.screen) {
            return ClientEvent::StaleDropped { seq };
        }
        // Note only the edge into the degraded state, not every failed
        // poll at ten per second.
        if !self.degraded {
            self.degraded = true;
            tracing::warn!(%error, "backend unreachable, display degraded");
            self.screen
                .push_note(format!("connection lost: {error}"), NoteKind::Error);
        }
        ClientEvent::Degraded { seq, error }
    }

    fn note_report(&mut self, report: &CommandReport) {
        match report {
            CommandReport::Accepted { command, message } => {
                let text = if message.is_empty() {
                    command.label().to_string()
                } else {
                    format!("{}: {message}", command.label())
                };
                self.screen.push_note(text, NoteKind::Command);
            }
            CommandReport::Rejected { command, message } => {
                self.screen
                    .push_note(format!("{} rejected: {message}", command.label()), NoteKind::Error);
            }
            CommandReport::Unreachable { command, error } => {
                self.screen
                    .push_note(format!("{} failed: {error}", command.label()), NoteKind::Error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jokenpo_core::phase::ControlState;
    use jokenpo_core::protocol::{CommandAck, GamePhase};
    use jokenpo_core::view::{Control, TextField, Tone};

    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use tokio::time::timeout;

    const TICK: Duration = Duration::from_millis(10);

    /// Shared state behind the mock backend routes.
    #[derive(Default)]
    struct TestBackend {
        fail: AtomicBool,
        snapshot: Mutex<Snapshot>,
    }

    impl TestBackend {
        fn edit(&self, f: impl FnOnce(&mut Snapshot)) {
            f(&mut self.snapshot.lock().unwrap());
        }
    }

    async fn status(State(backend): State<Arc<TestBackend>>) -> Response {
        if backend.fail.load(Ordering::SeqCst) {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        } else {
            Json(backend.snapshot.lock().unwrap().clone()).into_response()
        }
    }

    async fn start(State(backend): State<Arc<TestBackend>>) -> Json<CommandAck> {
        backend.edit(|snap| {
            snap.camera_active = true;
            snap.processing_active = true;
            snap.game_phase = GamePhase::WaitingStart;
        });
        Json(CommandAck::new("started", "processing started"))
    }

    async fn play(State(_): State<Arc<TestBackend>>) -> Json<CommandAck> {
        Json(CommandAck::error("wrong phase"))
    }

    async fn connect(backend: Arc<TestBackend>) -> GameController<HttpApi> {
        let router = Router::new()
            .route(crate::api::STATUS_PATH, get(status))
            .route(Command::StartCapture.path(), get(start))
            .route(Command::PlayRound.path(), get(play))
            .with_state(backend);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        GameController::connect(&format!("http://{addr}"), TICK).unwrap()
    }

    /// Pump events until `pred` passes, with a hard timeout.
    async fn drive_until(
        controller: &mut GameController<HttpApi>,
        mut pred: impl FnMut(&ClientEvent, &ScreenModel) -> bool,
    ) {
        timeout(Duration::from_secs(5), async {
            loop {
                let event = controller.next_event().await;
                if pred(&event, controller.screen()) {
                    break;
                }
            }
        })
        .await
        .expect("controller never reached the expected state");
    }

    #[tokio::test]
    async fn polls_and_renders_live_state() {
        let backend = Arc::new(TestBackend::default());
        backend.edit(|snap| {
            snap.camera_active = true;
            snap.processing_active = true;
            snap.game_phase = GamePhase::WaitingStart;
            snap.player_score = 2;
        });
        let mut controller = connect(backend.clone()).await;

        drive_until(&mut controller, |event, _| {
            matches!(event, ClientEvent::Applied { .. })
        })
        .await;
        assert_eq!(controller.screen().text(TextField::PlayerScore), "2");
        assert!(
            controller
                .screen()
                .control(Control::PlayRound)
                .is_enabled()
        );

        // A backend-side change shows up within a few poll cycles.
        backend.edit(|snap| snap.player_score = 7);
        drive_until(&mut controller, |_, screen| {
            screen.text(TextField::PlayerScore) == "7"
        })
        .await;
        assert_eq!(controller.screen().text(TextField::MiniPlayerScore), "7");
    }

    #[tokio::test]
    async fn outage_degrades_and_recovery_rerenders() {
        let backend = Arc::new(TestBackend::default());
        backend.edit(|snap| {
            snap.camera_active = true;
            snap.processing_active = true;
            snap.game_phase = GamePhase::WaitingStart;
        });
        backend.fail.store(true, Ordering::SeqCst);
        let mut controller = connect(backend.clone()).await;

        drive_until(&mut controller, |event, _| {
            matches!(event, ClientEvent::Degraded { .. })
        })
        .await;
        assert!(controller.is_degraded());
        assert_eq!(
            controller.screen().text(TextField::ResultBanner),
            "connection error"
        );
        assert_eq!(
            controller.screen().tone(TextField::ResultBanner),
            Tone::Negative
        );
        assert_eq!(
            controller.screen().control(Control::PlayRound),
            ControlState::Disabled
        );

        backend.fail.store(false, Ordering::SeqCst);
        drive_until(&mut controller, |event, _| {
            matches!(event, ClientEvent::Applied { .. })
        })
        .await;
        assert!(!controller.is_degraded());
        assert!(
            controller
                .screen()
                .control(Control::PlayRound)
                .is_enabled()
        );
        let notes: Vec<&str> = controller
            .screen()
            .notes()
            .map(|note| note.text.as_str())
            .collect();
        assert!(notes.iter().any(|text| text.contains("connection lost")));
        assert!(notes.iter().any(|text| *text == "connection restored"));
    }

    #[tokio::test]
    async fn accepted_command_resyncs_the_display() {
        let backend = Arc::new(TestBackend::default());
        let mut controller = connect(backend).await;

        // Idle backend first, then the command flips it to ready.
        drive_until(&mut controller, |event, _| {
            matches!(event, ClientEvent::Applied { .. })
        })
        .await;
        assert_eq!(
            controller.screen().control(Control::StartCapture),
            ControlState::Enabled
        );

        controller.dispatch(Command::StartCapture);
        let mut acknowledged = false;
        drive_until(&mut controller, |event, screen| {
            if let ClientEvent::Command(report) = event {
                assert_eq!(
                    *report,
                    CommandReport::Accepted {
                        command: Command::StartCapture,
                        message: "processing started".to_string(),
                    }
                );
                acknowledged = true;
            }
            screen.control(Control::PlayRound).is_enabled()
        })
        .await;
        assert!(acknowledged);
        assert_eq!(
            controller.screen().control(Control::StartCapture),
            ControlState::Hidden
        );
    }

    #[tokio::test]
    async fn rejected_command_surfaces_as_a_note() {
        let backend = Arc::new(TestBackend::default());
        let mut controller = connect(backend).await;

        controller.dispatch(Command::PlayRound);
        drive_until(&mut controller, |event, _| {
            matches!(
                event,
                ClientEvent::Command(CommandReport::Rejected { .. })
            )
        })
        .await;
        assert!(
            controller
                .screen()
                .notes()
                .any(|note| note.text == "play round rejected: wrong phase")
        );
    }
}
