//! Endpoint surface of the practice backend.
//!
//! | Method | Path                          | Description                       |
//! |--------|-------------------------------|-----------------------------------|
//! | `GET`  | `/jokenpo_game_status`        | Full state snapshot (JSON)        |
//! | `GET`  | `/control_processing/{action}`| Start or stop capture             |
//! | `GET`  | `/play_jokenpo`               | Begin the round countdown         |
//! | `GET`  | `/finish_round`               | Dismiss a finished round          |
//! | `GET`  | `/reset_jokenpo`              | Zero the scoreboard               |
//! | `GET`  | `/video_feed`                 | Stub of the camera MJPEG stream   |
//!
//! Every command answers an acknowledgement document; rejections use
//! `status == "error"` rather than an HTTP error status, matching the
//! contract the display layer expects.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::Mutex;

use crate::table::GameTable;
use jokenpo_core::protocol::{CommandAck, Snapshot};

/// Shared application state available to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<Mutex<GameTable>>,
}

impl AppState {
    pub fn new(table: GameTable) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }
}

/// Build the backend route surface over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/jokenpo_game_status", get(game_status))
        .route("/control_processing/{action}", get(control_processing))
        .route("/play_jokenpo", get(play_jokenpo))
        .route("/finish_round", get(finish_round))
        .route("/reset_jokenpo", get(reset_jokenpo))
        .route("/video_feed", get(video_feed))
        .with_state(state)
}

/// `GET /jokenpo_game_status` — the authoritative snapshot.
async fn game_status(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.table.lock().await.snapshot())
}

/// `GET /control_processing/{action}` — toggle the capture pipeline.
async fn control_processing(
    State(state): State<AppState>,
    Path(action): Path<String>,
) -> Json<CommandAck> {
    let mut table = state.table.lock().await;
    let ack = match action.as_str() {
        "start" => table.start(),
        "stop" => table.stop(),
        _ => CommandAck::new("invalid_action", "Ação inválida."),
    };
    Json(ack)
}

/// `GET /play_jokenpo` — begin the countdown for a round.
async fn play_jokenpo(State(state): State<AppState>) -> Json<CommandAck> {
    Json(state.table.lock().await.play())
}

/// `GET /finish_round` — dismiss the result and return to waiting.
async fn finish_round(State(state): State<AppState>) -> Json<CommandAck> {
    Json(state.table.lock().await.finish())
}

/// `GET /reset_jokenpo` — zero the scoreboard.
async fn reset_jokenpo(State(state): State<AppState>) -> Json<CommandAck> {
    Json(state.table.lock().await.reset())
}

/// `GET /video_feed` — a one-frame stand-in for the camera stream, with
/// the multipart content type real MJPEG feeds use so stream consumers
/// attach.
async fn video_feed() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        "--frame\r\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::COUNTDOWN;

    use jokenpo_client::api::{Command, HttpApi};
    use jokenpo_client::controller::{ClientEvent, GameController};
    use jokenpo_client::dispatcher::CommandReport;
    use jokenpo_core::protocol::Gesture;
    use jokenpo_core::view::{Control, TextField};

    use tokio::time::{Duration, timeout};

    async fn connect(state: AppState) -> GameController<HttpApi> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        GameController::connect(&format!("http://{addr}"), Duration::from_millis(10)).unwrap()
    }

    async fn drive_until(
        controller: &mut GameController<HttpApi>,
        mut pred: impl FnMut(&ClientEvent, &jokenpo_core::view::ScreenModel) -> bool,
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
        .expect("client never reached the expected state");
    }

    /// Run one complete scripted round directly against the table.
    fn seed_round(table: &mut GameTable) {
        assert!(!table.play().is_error());
        table.rewind_countdown(COUNTDOWN);
        table.snapshot();
        assert!(!table.finish().is_error());
    }

    #[tokio::test]
    async fn status_flows_through_the_real_client() {
        let mut table = GameTable::new(Vec::new());
        table.start();
        let mut controller = connect(AppState::new(table)).await;

        drive_until(&mut controller, |_, screen| {
            screen.control(Control::PlayRound).is_enabled()
        })
        .await;

        let screen = controller.screen();
        assert_eq!(screen.text(TextField::CameraStatus), "active");
        assert_eq!(screen.text(TextField::PlayerScore), "0");
        assert_eq!(screen.text(TextField::ResultBanner), "Aguardando...");
        assert!(
            screen
                .stream_source()
                .is_some_and(|src| src.ends_with("/video_feed?ts=1"))
        );
    }

    #[tokio::test]
    async fn reset_round_trip_zeroes_the_scoreboard() {
        let mut table = GameTable::new(vec![Gesture::Rock]);
        table.start();
        seed_round(&mut table);
        seed_round(&mut table);
        let mut controller = connect(AppState::new(table)).await;

        drive_until(&mut controller, |_, screen| {
            screen.text(TextField::RoundsPlayed) == "2"
        })
        .await;

        controller.dispatch(Command::ResetScoreboard);
        drive_until(&mut controller, |_, screen| {
            screen.text(TextField::RoundsPlayed) == "0"
        })
        .await;

        let screen = controller.screen();
        for field in [
            TextField::PlayerScore,
            TextField::AiScore,
            TextField::TiesScore,
            TextField::MiniPlayerScore,
            TextField::MiniRoundsPlayed,
        ] {
            assert_eq!(screen.text(field), "0");
        }
    }

    #[tokio::test]
    async fn rejected_play_reaches_the_user() {
        // Processing never started, so play must bounce.
        let mut controller = connect(AppState::new(GameTable::new(Vec::new()))).await;

        controller.dispatch(Command::PlayRound);
        drive_until(&mut controller, |event, _| {
            matches!(
                event,
                ClientEvent::Command(CommandReport::Rejected { message, .. })
                    if message.contains("não está ativo")
            )
        })
        .await;
        assert!(
            controller
                .screen()
                .notes()
                .any(|note| note.text.contains("play round rejected"))
        );
    }

    #[tokio::test]
    async fn invalid_control_action_acks_without_http_error() {
        let state = AppState::new(GameTable::new(Vec::new()));
        let Json(ack) = control_processing(State(state), Path("dance".to_string())).await;
        assert_eq!(ack.status.as_deref(), Some("invalid_action"));
        assert!(!ack.is_error());
    }

    #[tokio::test]
    async fn video_feed_answers_the_multipart_stub() {
        let response = video_feed().await.into_response();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("multipart/x-mixed-replace"));
    }
}
