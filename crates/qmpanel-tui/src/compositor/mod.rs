//! Compositor integration for Wayland (Niri)

mod niri;

use qmpanel_core::window::{HeadlessWindowSystem, WindowSystem};
use qmpanel_types::WindowEvent;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver};

pub use niri::NiriWindowSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositorType {
    Niri { socket: PathBuf },
    Unknown,
}

impl CompositorType {
    pub fn detect() -> Self {
        let compositor_type = match std::env::var_os("NIRI_SOCKET") {
            Some(socket) if !socket.is_empty() => Self::Niri {
                socket: PathBuf::from(socket),
            },
            _ => Self::Unknown,
        };

        tracing::info!("Detected compositor: {:?}", compositor_type);
        compositor_type
    }
}

/// Window system for the running compositor and its event stream.
///
/// Without a supported compositor the taskbar stays empty and the event
/// receiver never yields.
pub fn connect(compositor: CompositorType) -> (Box<dyn WindowSystem>, UnboundedReceiver<WindowEvent>) {
    match compositor {
        CompositorType::Niri { socket } => {
            let (ws, events) = NiriWindowSystem::connect(socket);
            (Box::new(ws), events)
        }
        CompositorType::Unknown => {
            tracing::warn!("No supported compositor, taskbar will be empty");
            let (_tx, rx) = mpsc::unbounded_channel();
            (Box::new(HeadlessWindowSystem), rx)
        }
    }
}
