//! Backend API abstraction.
//!
//! Decouples the polling and dispatch layers from any specific HTTP stack.
//! [`Poller`](crate::poller::Poller) and
//! [`CommandDispatcher`](crate::dispatcher::CommandDispatcher) talk to the
//! backend through the [`StatusApi`] trait; [`HttpApi`] is the production
//! implementation and tests substitute their own.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use jokenpo_core::protocol::{CommandAck, Snapshot};

/// Path of the state snapshot endpoint.
pub const STATUS_PATH: &str = "/jokenpo_game_status";

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed, or the backend answered with a
    /// non-success HTTP status.
    #[error("{0}")]
    Connectivity(String),

    /// A body arrived but could not be decoded as the expected document.
    #[error("bad document: {0}")]
    Schema(String),
}

/// One-shot control commands accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start camera capture and processing.
    StartCapture,
    /// Stop camera capture and processing.
    StopCapture,
    /// Begin the countdown for a round.
    PlayRound,
    /// Dismiss the result of a finished round.
    FinishRound,
    /// Zero the scoreboard and return to the ready state.
    ResetScoreboard,
}

impl Command {
    /// Endpoint path for this command.
    pub fn path(self) -> &'static str {
        match self {
            Command::StartCapture => "/control_processing/start",
            Command::StopCapture => "/control_processing/stop",
            Command::PlayRound => "/play_jokenpo",
            Command::FinishRound => "/finish_round",
            Command::ResetScoreboard => "/reset_jokenpo",
        }
    }

    /// Short label for logs and user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Command::StartCapture => "start capture",
            Command::StopCapture => "stop capture",
            Command::PlayRound => "play round",
            Command::FinishRound => "finish round",
            Command::ResetScoreboard => "reset scoreboard",
        }
    }
}

/// The backend surface the client polls and commands.
pub trait StatusApi: Send + Sync + 'static {
    /// Fetch the current state snapshot.
    fn fetch_status(&self) -> impl Future<Output = Result<Snapshot, ApiError>> + Send;

    /// Issue a one-shot command and return its acknowledgement.
    fn send_command(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<CommandAck, ApiError>> + Send;
}

/// Production [`StatusApi`] over HTTP.
#[derive(Clone)]
pub struct HttpApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    /// Per-request timeout. Bounds how long a stalled fetch can hold one
    /// of the poll scheduler's in-flight permits.
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Build a client for the backend at `base_url`.
    ///
    /// A trailing slash on `base_url` is tolerated.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Connectivity(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Connectivity(format!("HTTP {status}")));
        }
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                ApiError::Schema(e.to_string())
            } else {
                ApiError::Connectivity(e.to_string())
            }
        })
    }
}

impl StatusApi for HttpApi {
    fn fetch_status(&self) -> impl Future<Output = Result<Snapshot, ApiError>> + Send {
        self.get_json(STATUS_PATH)
    }

    fn send_command(
        &self,
        command: Command,
    ) -> impl Future<Output = Result<CommandAck, ApiError>> + Send {
        self.get_json(command.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn fetches_and_decodes_a_snapshot() {
        let router = Router::new().route(
            STATUS_PATH,
            get(|| async {
                axum::Json(json!({
                    "camera_active": true,
                    "processing_active": true,
                    "game_phase": "waiting_start",
                    "player_score": 3,
                }))
            }),
        );
        let api = HttpApi::new(&serve(router).await).unwrap();

        let snapshot = api.fetch_status().await.unwrap();
        assert!(snapshot.camera_active);
        assert_eq!(snapshot.player_score, 3);
    }

    #[tokio::test]
    async fn server_error_status_is_a_connectivity_error() {
        let router = Router::new().route(
            STATUS_PATH,
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let api = HttpApi::new(&serve(router).await).unwrap();

        match api.fetch_status().await {
            Err(ApiError::Connectivity(message)) => assert!(message.contains("500")),
            other => panic!("expected connectivity error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_a_schema_error() {
        let router = Router::new().route(STATUS_PATH, get(|| async { "not a document" }));
        let api = HttpApi::new(&serve(router).await).unwrap();

        assert!(matches!(api.fetch_status().await, Err(ApiError::Schema(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_a_connectivity_error() {
        // Bind then drop a listener so the port is known to be closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let api = HttpApi::new(&format!("http://{addr}")).unwrap();

        assert!(matches!(
            api.fetch_status().await,
            Err(ApiError::Connectivity(_))
        ));
    }

    #[tokio::test]
    async fn command_acks_round_trip() {
        let router = Router::new().route(
            Command::PlayRound.path(),
            get(|| async {
                axum::Json(json!({ "status": "error", "message": "not ready" }))
            }),
        );
        let api = HttpApi::new(&serve(router).await).unwrap();

        let ack = api.send_command(Command::PlayRound).await.unwrap();
        assert!(ack.is_error());
        assert_eq!(ack.message.as_deref(), Some("not ready"));
    }
}
