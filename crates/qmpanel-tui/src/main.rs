//! qmpanel - a lightweight desktop panel in the terminal.
//!
//! Hosts the panel core: the application menu, quick launch buttons, the
//! taskbar fed by the compositor and the clock with its calendar. Terminal
//! input is hit-tested against the panel layout and posted as panel events.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use qmpanel_core::config::{Config, Directories};
use qmpanel_core::menu::{ApplicationDatabase, DesktopEntryDatabase, InMemoryDatabase};
use qmpanel_core::{Panel, PanelEvent, PanelUpdate, WindowEvent, launch};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod app;
mod cli;
mod colors;
mod compositor;
mod config_watcher;
mod render;
mod signals;

use app::{App, panel_geometry};
use cli::Cli;
use compositor::CompositorType;
use config_watcher::spawn_config_watcher;
use signals::spawn_signal_handler;

/// Set up logging with file output. The terminal belongs to the panel.
fn setup_logging(debug_flag: bool) {
    let level = if debug_flag || cfg!(debug_assertions) {
        "debug"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("qmpanel-{timestamp}.log");
    let log_path = std::path::Path::new("/tmp").join(&log_filename);

    let symlink_path = std::path::Path::new("/tmp/qmpanel.log");
    let _ = std::fs::remove_file(symlink_path);
    let _ = std::os::unix::fs::symlink(&log_path, symlink_path);

    let file_appender = tracing_appender::rolling::never("/tmp", &log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    std::mem::forget(guard);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match Config::load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config {}: {e}, using defaults", path.display());
            Config::default()
        }
    }
}

fn load_database(dirs: Option<&Directories>) -> Box<dyn ApplicationDatabase> {
    let application_dirs = dirs.map(|d| d.application_dirs.clone()).unwrap_or_default();
    match DesktopEntryDatabase::load(&application_dirs) {
        Ok(db) => Box::new(db),
        Err(e) => {
            warn!("Failed to load desktop entries: {e}");
            Box::new(InMemoryDatabase::new())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    let dirs = match Directories::new() {
        Ok(dirs) => {
            if let Err(e) = dirs.ensure_exists() {
                warn!("Failed to create qmpanel directories: {e}");
            }
            Some(dirs)
        }
        Err(e) => {
            warn!("No home directory: {e}");
            None
        }
    };
    let config_path = cli
        .config
        .clone()
        .or_else(|| dirs.as_ref().map(|d| d.config_file.clone()));

    let config = load_config(config_path.as_ref());
    let database = load_database(dirs.as_ref());
    let (windows, window_events) = compositor::connect(CompositorType::detect());

    let (mut panel, updates) = Panel::new(config, database, windows);
    let Some(panel_events) = panel.take_event_receiver() else {
        anyhow::bail!("Panel event receiver already taken");
    };
    let _signals = spawn_signal_handler(panel.event_sender())?;

    let (reload_tx, reload_rx) = mpsc::unbounded_channel();
    let _config_watcher = config_path
        .clone()
        .map(|path| spawn_config_watcher(path, reload_tx));

    if !cli.no_autostart {
        launch::spawn_all(&panel.config().launch);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let channels = Channels {
        updates,
        panel_events,
        window_events,
        reload: reload_rx,
    };
    let result = run_panel(&mut terminal, &mut panel, channels, config_path).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!("qmpanel exiting");
    result
}

struct Channels {
    updates: UnboundedReceiver<PanelUpdate>,
    panel_events: UnboundedReceiver<PanelEvent>,
    window_events: UnboundedReceiver<WindowEvent>,
    reload: UnboundedReceiver<()>,
}

fn resize(panel: &mut Panel, width: u16, height: u16) {
    let geometry = panel_geometry(width, height, &panel.config().panel);
    panel.process(PanelEvent::GeometryChanged(geometry));
}

fn apply(panel: &mut Panel, events: Vec<PanelEvent>) -> bool {
    let any = !events.is_empty();
    for event in events {
        panel.process(event);
    }
    any
}

fn on_update(app: &mut App, update: &PanelUpdate) {
    if let PanelUpdate::Launch { action } = update {
        info!("Launching {}", action.id);
        if let Err(e) = launch::spawn(&action.command) {
            warn!("Failed to launch {}: {e}", action.id);
        }
    }
    app.on_update(update);
}

async fn run_panel(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    panel: &mut Panel,
    mut channels: Channels,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut app = App::new();
    let mut event_stream = EventStream::new();

    let (width, height) = crossterm::terminal::size()?;
    resize(panel, width, height);
    panel.start();

    let mut needs_render = true;

    loop {
        if needs_render {
            terminal.draw(|f| render::ui(f, panel, &app))?;
            needs_render = false;
        }

        let refresh = panel.clock().next_refresh(&Local::now());

        tokio::select! {
            Some(event_result) = event_stream.next() => {
                let event = match event_result {
                    Ok(e) => e,
                    Err(e) => {
                        error!("Event stream error: {}", e);
                        continue;
                    }
                };
                needs_render = match event {
                    Event::Key(key) => {
                        let events = app.handle_key(panel, key);
                        apply(panel, events)
                    }
                    Event::Mouse(mouse) => {
                        let events = app.handle_mouse(panel, mouse);
                        apply(panel, events)
                    }
                    Event::Resize(width, height) => {
                        resize(panel, width, height);
                        true
                    }
                    _ => false,
                };
            }

            Some(update) = channels.updates.recv() => {
                on_update(&mut app, &update);
                needs_render = true;
            }

            Some(event) = channels.panel_events.recv() => {
                panel.process(event);
            }

            Some(event) = channels.window_events.recv() => {
                panel.process(PanelEvent::Window(event));
            }

            Some(()) = channels.reload.recv() => {
                let Some(path) = config_path.as_ref() else {
                    continue;
                };
                match Config::load(path) {
                    Ok(config) => {
                        info!("Config reloaded");
                        panel.process(PanelEvent::ConfigReloaded(Box::new(config)));
                        // Edge and thickness may have changed.
                        let (width, height) = crossterm::terminal::size()?;
                        resize(panel, width, height);
                    }
                    Err(e) => warn!("Config reload failed, keeping current config: {e}"),
                }
            }

            () = tokio::time::sleep(refresh) => {
                debug!("Clock refresh");
                panel.process(PanelEvent::ClockTick);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
