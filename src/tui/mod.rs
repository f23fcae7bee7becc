//! Terminal User Interface for db-chat.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod history;
mod ui;
pub mod widgets;

pub use app::App;
pub use events::{Event, EventHandler};
pub use history::{ChatHistory, Exchange};

use crate::app::Orchestrator;
use crate::error::{ChatError, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| ChatError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| ChatError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the chat loop until the user quits.
    pub async fn run_with_orchestrator(
        &mut self,
        orchestrator: Arc<Orchestrator>,
        connection_info: Option<String>,
    ) -> Result<()> {
        // Pipeline panics happen on runtime workers and are contained there;
        // only a panic on the UI thread tears the terminal down.
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            if std::thread::current().name() == Some("main") {
                let _ = disable_raw_mode();
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                original_hook(panic_info);
            } else {
                error!("Panic while answering a question: {}", panic_info);
            }
        }));

        let mut app = App::new(connection_info, orchestrator.mode().as_str());
        let (tx, mut rx) = mpsc::channel::<String>(8);

        let result = self.run_event_loop(&mut app, &orchestrator, tx, &mut rx).await;

        // Drop our hook and reinstall the default one.
        let _ = panic::take_hook();

        result
    }

    async fn run_event_loop(
        &mut self,
        app: &mut App,
        orchestrator: &Arc<Orchestrator>,
        tx: mpsc::Sender<String>,
        rx: &mut mpsc::Receiver<String>,
    ) -> Result<()> {
        loop {
            self.terminal
                .draw(|frame| ui::render(frame, app))
                .map_err(|e| ChatError::internal(format!("Failed to draw: {e}")))?;

            if !app.running {
                break;
            }

            let handler = self.event_handler;
            tokio::select! {
                event = tokio::task::spawn_blocking(move || handler.next()) => {
                    let event = event
                        .map_err(|e| ChatError::internal(format!("Event task failed: {e}")))??;
                    if let Some(question) = app.handle_event(event) {
                        Self::spawn_question(Arc::clone(orchestrator), question, tx.clone());
                    }
                }

                Some(answer) = rx.recv() => {
                    debug!("Answer received");
                    app.complete(answer);
                }
            }
        }

        Ok(())
    }

    /// Answers a question on a background task so the UI keeps redrawing.
    fn spawn_question(orchestrator: Arc<Orchestrator>, question: String, tx: mpsc::Sender<String>) {
        info!("Question submitted");
        tokio::spawn(async move {
            let answer = orchestrator.process(&question).await;
            if tx.send(answer).await.is_err() {
                debug!("UI closed before the answer arrived");
            }
        });
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive chat, then closes the database connection.
pub async fn run(orchestrator: Orchestrator, connection_info: Option<String>) -> Result<()> {
    let orchestrator = Arc::new(orchestrator);

    let result = {
        let mut tui = Tui::new()?;
        tui.run_with_orchestrator(Arc::clone(&orchestrator), connection_info)
            .await
    };

    if let Err(e) = orchestrator.close().await {
        warn!("Error closing database connection: {}", e);
    }

    result
}
