//! Client orchestrator — connects polling, the screen model, and the TUI.
//!
//! This module owns the event loop and drives:
//! - [`jokenpo_client::controller::GameController`] — polling, reconciliation,
//!   and command dispatch
//! - [`crate::tui::Tui`] — ratatui TUI frontend
//!
//! This module is specific to the TUI binary.

use crate::tui::{Tui, UserIntent};
use jokenpo_client::api::HttpApi;
use jokenpo_client::controller::{ClientEvent, GameController};

/// Start the display client against the backend at `base_url`.
///
/// Waits for the first poll result, good or degraded, before entering
/// the alternate screen so the first frame is never blank.
pub async fn start_client(
    base_url: &str,
    interval_ms: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let interval = tokio::time::Duration::from_millis(interval_ms);
    let mut controller = GameController::connect(base_url, interval)?;

    if matches!(controller.next_event().await, ClientEvent::Closed) {
        return Err("polling stopped before the first snapshot".into());
    }

    // Launch TUI and run the main event loop.
    let mut tui = Tui::setup()?;
    let result = run_event_loop(&mut tui, &mut controller).await;
    tui.teardown()?;
    result
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

async fn run_event_loop(
    tui: &mut Tui,
    controller: &mut GameController<HttpApi>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tui.render(controller.screen(), !controller.is_degraded())?;

        let timeout = tokio::time::Duration::from_millis(50);

        tokio::select! {
            event = controller.next_event() => {
                if matches!(event, ClientEvent::Closed) {
                    break;
                }
            }

            _ = tokio::time::sleep(timeout) => {
                match tui.poll_and_handle_input(controller.screen())? {
                    UserIntent::Quit => break,
                    UserIntent::Dispatch(command) => {
                        controller.dispatch(command);
                    }
                    UserIntent::Feedback(text, kind) => {
                        controller.screen_mut().push_note(text, kind);
                    }
                    UserIntent::None => {}
                }
            }
        }
    }

    Ok(())
}
