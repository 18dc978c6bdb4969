//! Terminal UI for takatrack that shows live bin fill levels and full-bin alerts.

mod app;
mod input;
mod sink;
mod ui;

use std::{fs::OpenOptions, io, sync::Arc, sync::Mutex, time::Duration as StdDuration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use takatrack_core::{
    config::{SyncConfig, load_config},
    ports::RenderSink,
    scheduler::RefreshScheduler,
};
use takatrack_source_http::HttpSnapshotSource;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::Action;
use crate::sink::{ChannelSink, UiEvent};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    init_tracing(&config)?;
    tracing::info!(?config, "takatrack: starting");

    // Source, sinks, and refresh loop
    let source = Arc::new(HttpSnapshotSource::from_config(&config)?);
    let (tx, rx) = mpsc::unbounded_channel();
    let sink = Arc::new(ChannelSink::new(tx));
    let render_sink: Arc<dyn RenderSink> = Arc::<ChannelSink>::clone(&sink);
    let scheduler = RefreshScheduler::from_config(&config, source, render_sink, sink).start();

    // App state
    let app = App::new(config.endpoint());

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // An in-flight fetch may take up to the fetch timeout to give up.
    scheduler.stop();
    match tokio::time::timeout(config.fetch_timeout, scheduler.join()).await {
        Ok(joined) => {
            joined.context("refresh loop panicked")?;
        }
        Err(_elapsed) => tracing::warn!("takatrack: refresh loop did not stop in time"),
    }

    res
}

fn init_tracing(config: &SyncConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    // The terminal belongs to the UI, so logs go to a file.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    mut events: UnboundedReceiver<UiEvent>,
) -> Result<()> {
    loop {
        // Apply whatever the refresh loop published since the last draw
        while let Ok(event) = events.try_recv() {
            match event {
                UiEvent::Frame(frame) => app.apply_frame(frame),
                UiEvent::Alert(alert) => app.push_alert(alert),
                UiEvent::FetchFailed(message) => app.record_failure(message),
            }
        }

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
            && input::handle_key_event(key, &mut app) == Action::Quit
        {
            break;
        }
    }

    Ok(())
}
