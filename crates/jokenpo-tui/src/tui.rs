//! Ratatui TUI frontend for the game display.
//!
//! Pure UI module: terminal lifecycle, rendering, and input → command
//! mapping. All reconciled display state lives in
//! [`jokenpo_core::view::ScreenModel`]; this module has no networking
//! dependencies.

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use std::io::{self, Stdout};

use jokenpo_client::api::Command;
use jokenpo_core::view::{Control, IconSlot, NoteKind, ScreenModel, TextField, Tone};

// ---------------------------------------------------------------------------
// UserIntent — result of processing user input
// ---------------------------------------------------------------------------

/// The result of processing a user input event.
#[derive(Debug)]
pub enum UserIntent {
    /// No action needed (e.g. the event was purely cosmetic).
    None,
    /// The user wants to quit / close the application.
    Quit,
    /// The user wants to send a command to the backend.
    Dispatch(Command),
    /// Local feedback line (e.g. pressing a disabled button). The event
    /// loop should route this into the screen model's note log.
    Feedback(String, NoteKind),
}

// ---------------------------------------------------------------------------
// TUI-only state
// ---------------------------------------------------------------------------

/// UI-layer state that lives alongside (but separate from) the screen model.
#[derive(Default)]
struct TuiState {
    /// Currently selected control button index
    selected_button: usize,
    /// Show help popup
    show_help: bool,
    /// Show the raw snapshot popup
    show_raw: bool,
}

// ---------------------------------------------------------------------------
// Button model
// ---------------------------------------------------------------------------

/// Fixed display order of the control surfaces.
const CONTROL_ORDER: [Control; 5] = [
    Control::StartCapture,
    Control::StopCapture,
    Control::PlayRound,
    Control::FinishRound,
    Control::ResetScoreboard,
];

/// The controls currently occupying screen space, in display order.
/// Disabled controls are included; hidden ones are not.
fn visible_controls(screen: &ScreenModel) -> Vec<Control> {
    CONTROL_ORDER
        .iter()
        .copied()
        .filter(|control| screen.control(*control).is_visible())
        .collect()
}

fn clamp_selected_button(tui: &mut TuiState, screen: &ScreenModel) {
    let max = visible_controls(screen).len();
    if max == 0 {
        tui.selected_button = 0;
    } else if tui.selected_button >= max {
        tui.selected_button = max - 1;
    }
}

// ---------------------------------------------------------------------------
// Control activation (maps button press → Command)
// ---------------------------------------------------------------------------

fn command_for(control: Control) -> Command {
    match control {
        Control::StartCapture => Command::StartCapture,
        Control::StopCapture => Command::StopCapture,
        Control::PlayRound => Command::PlayRound,
        Control::FinishRound => Command::FinishRound,
        Control::ResetScoreboard => Command::ResetScoreboard,
    }
}

fn handle_control_activation(screen: &ScreenModel, control: Control) -> UserIntent {
    if screen.control(control).is_enabled() {
        UserIntent::Dispatch(command_for(control))
    } else {
        UserIntent::Feedback(
            format!("{} is not available right now", control.label()),
            NoteKind::Error,
        )
    }
}

// ---------------------------------------------------------------------------
// Public API — Tui struct
// ---------------------------------------------------------------------------

/// Owns the ratatui terminal and all UI-layer state.
///
/// The client orchestrator ([`crate::client`]) drives this struct: call
/// [`Tui::render`] each frame and [`Tui::poll_and_handle_input`] to
/// process keyboard events.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: TuiState,
}

impl Tui {
    /// Set up the terminal (raw mode, alternate screen) and return a ready `Tui`.
    pub fn setup() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self {
            terminal,
            state: TuiState::default(),
        })
    }

    /// Restore the terminal to its original state.
    pub fn teardown(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Draw the current frame. Automatically clamps the selected button index.
    pub fn render(&mut self, screen: &ScreenModel, connected: bool) -> io::Result<()> {
        clamp_selected_button(&mut self.state, screen);
        self.terminal
            .draw(|f| ui(f, screen, connected, &self.state))?;
        Ok(())
    }

    /// Poll for a keyboard event and, if one is available, translate it into
    /// a [`UserIntent`]. This never blocks — returns [`UserIntent::None`]
    /// immediately when no event is pending.
    pub fn poll_and_handle_input(&mut self, screen: &ScreenModel) -> io::Result<UserIntent> {
        if !event::poll(std::time::Duration::from_millis(0))? {
            return Ok(UserIntent::None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(UserIntent::None);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(UserIntent::None);
        }
        Ok(self.handle_key_event(key, screen))
    }

    // -- private -----------------------------------------------------------

    fn handle_key_event(&mut self, key: KeyEvent, screen: &ScreenModel) -> UserIntent {
        let tui = &mut self.state;
        match key.code {
            KeyCode::Esc => {
                if tui.show_help || tui.show_raw {
                    tui.show_help = false;
                    tui.show_raw = false;
                    UserIntent::None
                } else {
                    UserIntent::Quit
                }
            }
            KeyCode::Char('q') => {
                if tui.show_help || tui.show_raw {
                    UserIntent::None
                } else {
                    UserIntent::Quit
                }
            }
            KeyCode::F(1) | KeyCode::Char('?') => {
                tui.show_help = !tui.show_help;
                UserIntent::None
            }
            KeyCode::Char('r') => {
                if !tui.show_help {
                    tui.show_raw = !tui.show_raw;
                }
                UserIntent::None
            }
            KeyCode::Enter => {
                if tui.show_help || tui.show_raw {
                    return UserIntent::None;
                }
                let controls = visible_controls(screen);
                match controls.get(tui.selected_button) {
                    Some(control) => handle_control_activation(screen, *control),
                    None => UserIntent::None,
                }
            }
            KeyCode::Left => {
                if !tui.show_help && !tui.show_raw {
                    let total = visible_controls(screen).len();
                    if total > 0 {
                        tui.selected_button = (tui.selected_button + total - 1) % total;
                    }
                }
                UserIntent::None
            }
            KeyCode::Right => {
                if !tui.show_help && !tui.show_raw {
                    let total = visible_controls(screen).len();
                    if total > 0 {
                        tui.selected_button = (tui.selected_button + 1) % total;
                    }
                }
                UserIntent::None
            }
            _ => UserIntent::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn ui(frame: &mut Frame, screen: &ScreenModel, connected: bool, tui: &TuiState) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Camera + scoreboard header
            Constraint::Length(8), // Table
            Constraint::Length(3), // Controls
            Constraint::Min(4),    // Log
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(44),    // Camera panel
            Constraint::Length(26), // Scoreboard
        ])
        .split(main_layout[0]);

    render_camera_panel(frame, screen, header_layout[0]);
    render_scoreboard_panel(frame, screen, header_layout[1]);
    render_table(frame, screen, main_layout[1]);
    render_controls_bar(frame, screen, tui, main_layout[2]);
    render_log(frame, screen, main_layout[3]);

    // Status bar
    let status_color = if connected { Color::Green } else { Color::Red };
    let status_text = if connected {
        "● Connected"
    } else {
        "● Degraded"
    };
    let status_spans = vec![
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw(" | "),
        Span::styled("F1", Style::default().fg(Color::Cyan).bold()),
        Span::raw(": Help | "),
        Span::styled("r", Style::default().fg(Color::Cyan).bold()),
        Span::raw(": Raw | "),
        Span::styled("ESC", Style::default().fg(Color::Cyan).bold()),
        Span::raw(": Quit"),
    ];
    let status = Paragraph::new(Line::from(status_spans));
    frame.render_widget(status, main_layout[4]);

    // Popups
    if tui.show_raw {
        render_raw_popup(frame, screen);
    }
    if tui.show_help {
        render_help_popup(frame);
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Positive => Color::Green,
        Tone::Negative => Color::Red,
        Tone::Neutral => Color::White,
        Tone::Muted => Color::DarkGray,
    }
}

fn render_camera_panel(frame: &mut Frame, screen: &ScreenModel, area: Rect) {
    let feed = match screen.stream_source() {
        Some(source) => Span::styled(source, Style::default().fg(Color::White)),
        None => Span::styled("detached", Style::default().fg(Color::DarkGray)),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(" Feed: ", Style::default().fg(Color::Gray)),
            feed,
        ]),
        Line::from(vec![
            Span::styled(" Camera: ", Style::default().fg(Color::Gray)),
            Span::styled(
                screen.text(TextField::CameraStatus),
                Style::default().fg(tone_color(screen.tone(TextField::CameraStatus))),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Hand: ", Style::default().fg(Color::Gray)),
            Span::styled(
                screen.text(TextField::HandStatus),
                Style::default().fg(tone_color(screen.tone(TextField::HandStatus))),
            ),
            Span::styled("  Servos: ", Style::default().fg(Color::Gray)),
            Span::styled(
                screen.text(TextField::FingerPose),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled(" Detected: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} {}",
                    screen.icon(IconSlot::Detected).icon(),
                    screen.text(TextField::DetectedGesture)
                ),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title(" Camera ")
            .title_style(Style::default().fg(Color::Blue).bold()),
    );

    frame.render_widget(panel, area);
}

fn render_scoreboard_panel(frame: &mut Frame, screen: &ScreenModel, area: Rect) {
    let row = |label: &'static str, field: TextField, color: Color| {
        Line::from(vec![
            Span::styled(format!(" {label:<8}"), Style::default().fg(Color::Gray)),
            Span::styled(screen.text(field), Style::default().fg(color).bold()),
        ])
    };

    let lines = vec![
        row("You", TextField::PlayerScore, Color::Cyan),
        row("Robot", TextField::AiScore, Color::Magenta),
        row("Ties", TextField::TiesScore, Color::White),
        row("Rounds", TextField::RoundsPlayed, Color::White),
        Line::from(vec![Span::styled(
            format!(
                " mini {}/{}/{} ({})",
                screen.text(TextField::MiniPlayerScore),
                screen.text(TextField::MiniAiScore),
                screen.text(TextField::MiniTiesScore),
                screen.text(TextField::MiniRoundsPlayed),
            ),
            Style::default().fg(Color::DarkGray),
        )]),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Scoreboard ")
            .title_style(Style::default().fg(Color::Green).bold()),
    );

    frame.render_widget(panel, area);
}

fn render_table(frame: &mut Frame, screen: &ScreenModel, area: Rect) {
    let mut lines = vec![];

    lines.push(Line::from(vec![
        Span::styled("You: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!(
                "{} {}",
                screen.icon(IconSlot::Player).icon(),
                screen.text(TextField::PlayerGesture)
            ),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::raw("      "),
        Span::styled("Robot: ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!(
                "{} {}",
                screen.icon(IconSlot::Ai).icon(),
                screen.text(TextField::AiGesture)
            ),
            Style::default().fg(Color::Magenta).bold(),
        ),
    ]));

    lines.push(Line::from(""));

    lines.push(Line::from(vec![Span::styled(
        screen.text(TextField::ResultBanner),
        Style::default()
            .fg(tone_color(screen.tone(TextField::ResultBanner)))
            .bold(),
    )]));

    lines.push(Line::from(vec![
        Span::styled("robot side: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            screen.text(TextField::OpponentBanner),
            Style::default().fg(tone_color(screen.tone(TextField::OpponentBanner))),
        ),
    ]));

    lines.push(Line::from(""));

    lines.push(Line::from(vec![Span::styled(
        screen.text(TextField::Countdown),
        Style::default().fg(Color::Yellow).bold(),
    )]));

    let board = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Table ")
            .title_style(Style::default().fg(Color::Magenta).bold()),
    );

    frame.render_widget(board, area);
}

fn render_controls_bar(frame: &mut Frame, screen: &ScreenModel, tui: &TuiState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Controls ")
        .title_style(Style::default().fg(Color::Blue).bold());
    frame.render_widget(&block, area);

    let inner = block.inner(area);
    let controls = visible_controls(screen);
    if controls.is_empty() {
        return;
    }

    let mut spans = Vec::with_capacity(controls.len() * 2);
    let mut row_width = 0usize;
    for (index, control) in controls.iter().enumerate() {
        let enabled = screen.control(*control).is_enabled();
        let mut style = if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if index == tui.selected_button {
            style = style.bg(Color::Blue).fg(Color::Black).bold();
        }

        if index > 0 {
            spans.push(Span::raw(" "));
            row_width += 1;
        }
        let label = format!(" {} ", control.label());
        row_width += label.len();
        spans.push(Span::styled(label, style));
    }

    let pad = (inner.width as usize).saturating_sub(row_width) / 2;
    if pad > 0 {
        spans.insert(0, Span::raw(" ".repeat(pad)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_log(frame: &mut Frame, screen: &ScreenModel, area: Rect) {
    let items: Vec<ListItem> = screen
        .notes()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .rev()
        .map(|note| {
            let style = match note.kind {
                NoteKind::System => Style::default().fg(Color::Yellow),
                NoteKind::Command => Style::default().fg(Color::White),
                NoteKind::Error => Style::default().fg(Color::Red),
            };
            ListItem::new(Span::styled(note.text.as_str(), style))
        })
        .collect();

    let log = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" Log ")
            .title_style(Style::default().fg(Color::DarkGray)),
    );

    frame.render_widget(log, area);
}

fn render_raw_popup(frame: &mut Frame, screen: &ScreenModel) {
    let area = centered_rect(70, 80, frame.area());

    frame.render_widget(Clear, area);

    let raw = Paragraph::new(screen.text(TextField::RawSnapshot))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Snapshot ")
                .title_style(Style::default().fg(Color::Cyan).bold())
                .style(Style::default().bg(Color::Black)),
        );

    frame.render_widget(raw, area);
}

fn render_help_popup(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.area());

    frame.render_widget(Clear, area);

    let help_text = Text::from(vec![
        Line::from(vec![Span::styled(
            "CONTROLS",
            Style::default().fg(Color::Yellow).bold(),
        )]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  NAVIGATION",
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from("  Left/Right    Move between buttons"),
        Line::from("  Enter         Activate selected button"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  PANELS",
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from("  r             Toggle raw snapshot view"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  SYSTEM",
            Style::default().fg(Color::Cyan).bold(),
        )]),
        Line::from("  F1 / ?        Toggle this help"),
        Line::from("  q / ESC       Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press ESC or F1 to close",
            Style::default().fg(Color::DarkGray),
        )]),
    ]);

    let help = Paragraph::new(help_text).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help ")
            .title_style(Style::default().fg(Color::Cyan).bold())
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
