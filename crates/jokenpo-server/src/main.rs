//! Practice Jokenpô backend.
//!
//! Simulates the camera-and-robotic-hand pipeline of the real machine so
//! the display client has something to poll during development. The
//! route surface lives in [`routes`]; round rules and the simulated
//! capture live in [`table`].
//!
//! `--script` fixes the sequence of captured player gestures (the robot
//! always plays at random); without it every capture is random too.
//! The `PORT` env var takes precedence over `--port`.

mod routes;
mod table;

use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use routes::AppState;
use table::{GameTable, parse_script};

#[derive(Parser)]
#[command(name = "jokenpo-server")]
#[command(about = "Simulated Jokenpô vision backend", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Comma-separated captures to play back in order, e.g. "rock,paper,undefined"
    #[arg(long)]
    script: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialise tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let script = match cli.script.as_deref().map(parse_script).transpose() {
        Ok(script) => script.unwrap_or_default(),
        Err(message) => {
            eprintln!("invalid --script: {message}");
            std::process::exit(2);
        }
    };

    let state = AppState::new(GameTable::new(script));
    let app = routes::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(cli.port);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Jokenpô practice server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
