use clap::Parser;

mod client;
mod tui;

#[derive(Parser)]
#[command(name = "jokenpo")]
#[command(about = "Display client for the Jokenpô camera game", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(short, long, default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Poll interval in milliseconds
    #[arg(short, long, default_value_t = 100)]
    interval_ms: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    println!("Connecting to {}...", cli.server);

    if let Err(e) = client::start_client(&cli.server, cli.interval_ms).await {
        eprintln!("Error: {}", e);
    }
}
