//! Config file watcher for hot-reload.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::Watcher;
use tokio::sync::mpsc as tokio_mpsc;
use tracing::{debug, error, info};

const RELOAD_SETTLE_DELAY: Duration = Duration::from_millis(100);
const CONFIG_DEBOUNCE_DURATION: Duration = Duration::from_millis(500);

pub struct ConfigWatcher {
    _watcher_thread: std::thread::JoinHandle<()>,
    _bridge_thread: std::thread::JoinHandle<()>,
}

/// Watch the directory of `config_path` and send `()` whenever the file is
/// written or created.
pub fn spawn_config_watcher(
    config_path: PathBuf,
    tx: tokio_mpsc::UnboundedSender<()>,
) -> ConfigWatcher {
    let (sync_tx, sync_rx) = mpsc::channel::<()>();

    let watcher_thread = std::thread::spawn(move || {
        if let Err(e) = watch_config_file(&config_path, &sync_tx) {
            error!("Config watcher error: {e}");
        }
    });

    let bridge_thread = std::thread::spawn(move || {
        while sync_rx.recv().is_ok() {
            debug!("Config file changed, sending reload notification");
            std::thread::sleep(RELOAD_SETTLE_DELAY);
            if tx.send(()).is_err() {
                debug!("Config reload receiver dropped, stopping watcher");
                break;
            }
        }
    });

    ConfigWatcher {
        _watcher_thread: watcher_thread,
        _bridge_thread: bridge_thread,
    }
}

fn is_config_event(event: &notify::Event, config_path: &Path) -> bool {
    matches!(
        event.kind,
        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == config_path.file_name())
}

fn watch_config_file(config_path: &Path, tx: &mpsc::Sender<()>) -> notify::Result<()> {
    let Some(parent) = config_path.parent() else {
        return Err(notify::Error::generic("Invalid config path"));
    };
    // The directory may not exist before the first save.
    std::fs::create_dir_all(parent).map_err(notify::Error::io)?;

    let debounce: Mutex<Option<Instant>> = Mutex::new(None);
    let watched = config_path.to_owned();
    let (watcher_tx, watcher_rx) = mpsc::channel();

    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<notify::Event>| match result {
            Ok(event) if is_config_event(&event, &watched) => {
                let Ok(mut last_event) = debounce.lock() else {
                    error!("Config watcher debounce mutex poisoned, skipping event");
                    return;
                };
                let now = Instant::now();
                if last_event.is_none_or(|last| now.duration_since(last) > CONFIG_DEBOUNCE_DURATION) {
                    *last_event = Some(now);
                    let _ = watcher_tx.send(());
                }
            }
            Ok(_) => {}
            Err(e) => error!("Watcher error: {}", e),
        })?;

    watcher.watch(parent, notify::RecursiveMode::NonRecursive)?;
    info!("Watching config directory: {:?}", parent);

    while watcher_rx.recv().is_ok() {
        let _ = tx.send(());
    }

    Ok(())
}
