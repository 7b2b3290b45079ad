//! Terminal front-end: owns the [`Session`] and runs the input/draw loop.
pub mod action;
pub mod state;
pub mod view;

use crate::client::NewsClient;
use crate::config::Config;
use crate::location::SearchParams;
use crate::paths::AppPaths;
use crate::session::Session;
use crate::tui::action::map_key;
use crate::tui::state::AppState;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::panic;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NEWSHOUND_LOG";
const TICK: Duration = Duration::from_millis(50);

/// Sends tracing output to a log file so it does not garble the screen.
pub fn init_logging() -> Result<WorkerGuard> {
    let dir = AppPaths::log_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log dir {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(&dir, "newshound.log"));
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

pub async fn run(initial: SearchParams) -> Result<()> {
    let config_path = AppPaths::config_file()?;
    let config = Config::load_from(&config_path)?;
    if !config_path.exists()
        && let Err(e) = config.save_to(&config_path)
    {
        tracing::warn!(error = %e, "Could not write default config");
    }

    let client = NewsClient::new(&config.api_host, config.allow_insecure_certs)?;
    tracing::info!(api_host = client.api_host(), query = %initial, "Starting");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let today = chrono::Local::now().date_naive();
    let mut session = Session::new(client, &config, initial, today, tx);

    install_panic_hook();
    let mut term = TerminalSession::enter()?;

    session.resize(term.terminal.size()?.width);
    session.start();
    let mut app = AppState::new(session);

    let res = run_loop(&mut term.terminal, &mut app, &mut rx).await;
    drop(term);
    res
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Restores the terminal before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Raw mode plus alternate screen for as long as it lives.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let setup = execute!(io::stdout(), EnterAlternateScreen)
            .map_err(anyhow::Error::from)
            .and_then(|_| Terminal::new(CrosstermBackend::new(io::stdout())).map_err(Into::into));
        match setup {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = restore_terminal();
                Err(e)
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        if let Err(e) = restore_terminal() {
            tracing::warn!(error = %e, "Could not restore terminal");
        }
    }
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<NewsClient>,
    rx: &mut mpsc::UnboundedReceiver<crate::session::SessionEvent>,
) -> Result<()> {
    loop {
        while let Ok(ev) = rx.try_recv() {
            app.session.handle(ev);
        }
        if app.session.pump_location() {
            app.message = format!("?{}", app.session.location().search());
        }
        if app.session.sync().range_in_flight().is_none() && app.message == "Loading..." {
            app.message = format!("{} entries", app.session.calendar().entries().len());
        }
        app.clamp_selection();

        terminal.draw(|f| view::draw(f, app))?;

        // Let spawned fetches make progress between polls.
        tokio::task::yield_now().await;
        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = map_key(app.mode, key) {
                        app.update(action);
                    }
                }
                Event::Resize(width, _) => app.session.resize(width),
                _ => {}
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}
