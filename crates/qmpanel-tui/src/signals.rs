//! Process lifecycle: termination signals become a single quit request.

use qmpanel_core::PanelEvent;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Wait for SIGHUP, SIGINT or SIGTERM and post [`PanelEvent::Quit`] once.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
pub fn spawn_signal_handler(tx: UnboundedSender<PanelEvent>) -> std::io::Result<JoinHandle<()>> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = hangup.recv() => "SIGHUP",
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!("Received {}, quitting", name);
        if tx.send(PanelEvent::Quit).is_err() {
            debug!("Panel already gone");
        }
    }))
}
