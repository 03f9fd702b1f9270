//! Aula TUI entry point.

use aula_cache::ResourceCache;
use aula_tui::api_client::RestClient;
use aula_tui::config::TuiConfig;
use aula_tui::error::TuiError;
use aula_tui::events::TuiEvent;
use aula_tui::keys::map_key;
use aula_tui::logging;
use aula_tui::persistence;
use aula_tui::state::App;
use aula_tui::views::render_view;
use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), TuiError> {
    let config = TuiConfig::load()?;
    logging::init(&config)?;

    let client = RestClient::new(&config)?;
    let cache = ResourceCache::new(config.cache_config());
    let gc = cache.spawn_gc();

    let persisted = match persistence::load(&config.persistence_path) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(error = %err, "Ignoring unreadable UI state");
            None
        }
    };
    let mut app = App::new(config, cache, &client, persisted);

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let (event_tx, mut event_rx) = mpsc::channel::<TuiEvent>(256);
    spawn_input_reader(event_tx.clone());

    let mut ticker = tokio::time::interval(app.config.refresh_interval());

    let mut dirty = true;
    loop {
        if dirty || app.needs_redraw() {
            let snapshot = app.snapshot();
            terminal.draw(|f| render_view(f, &app, snapshot.as_ref()))?;
            app.mark_drawn();
            dirty = false;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            Some(event) = event_rx.recv() => {
                dirty = true;
                if handle_event(&mut app, event) {
                    break;
                }
            }
        }
    }

    gc.abort();
    if let Err(err) = persistence::save(&app.config.persistence_path, &app.persisted_state()) {
        tracing::warn!(error = %err, "Failed to save UI state");
    }
    tracing::info!(stats = ?app.cache.stats(), "Exiting");
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, TuiError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<TuiEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            let forwarded = match event::read() {
                Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    sender.blocking_send(TuiEvent::Input(key))
                }
                Ok(CrosstermEvent::Resize(width, height)) => {
                    sender.blocking_send(TuiEvent::Resize { width, height })
                }
                _ => Ok(()),
            };
            if forwarded.is_err() {
                break;
            }
        }
    });
}

fn handle_event(app: &mut App, event: TuiEvent) -> bool {
    match event {
        TuiEvent::Input(key) => match map_key(key, app.mode) {
            Some(action) => app.handle_action(action),
            None => false,
        },
        TuiEvent::Resize { width, height } => {
            tracing::debug!(width, height, "Terminal resized");
            false
        }
    }
}
