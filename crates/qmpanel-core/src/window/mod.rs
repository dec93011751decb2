//! Window tracking for the taskbar.
//!
//! The registry mirrors the window system's live top-level windows as an
//! ordered list of task buttons. Everything the registry knows comes from a
//! [`WindowSystem`] adapter; every change it makes is requested through
//! fire-and-forget [`WindowCommand`]s and confirmed later by notifications.

mod button;
mod drag;
mod registry;

pub use button::{DragState, TaskAction, TaskButton, TaskButtonState};
pub use drag::DragTimer;
pub use registry::{FilterContext, TaskbarChange, WindowRegistry, accept_window};

use qmpanel_types::{DesktopId, DesktopInfo, WindowCommand, WindowHandle, WindowInfo};
use tracing::debug;

/// Adapter over the platform's window management.
///
/// Queries never block and degrade to empty answers when the window system
/// is unreachable or a handle has gone stale.
pub trait WindowSystem: Send {
    /// Live top-level windows in the window system's stacking/creation order.
    fn enumerate_windows(&self) -> Vec<WindowHandle>;

    /// Snapshot of a window, `None` if the handle no longer refers to a window.
    fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo>;

    fn active_window(&self) -> Option<WindowHandle>;

    fn current_desktop(&self) -> Option<DesktopId>;

    fn desktops(&self) -> Vec<DesktopInfo>;

    /// Name of the screen the panel lives on.
    fn current_screen(&self) -> Option<String>;

    /// Queue a command. Results are observed through notifications only.
    fn send(&self, command: WindowCommand);
}

/// Window system used when no supported compositor is running.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessWindowSystem;

impl WindowSystem for HeadlessWindowSystem {
    fn enumerate_windows(&self) -> Vec<WindowHandle> {
        Vec::new()
    }

    fn window_info(&self, _handle: WindowHandle) -> Option<WindowInfo> {
        None
    }

    fn active_window(&self) -> Option<WindowHandle> {
        None
    }

    fn current_desktop(&self) -> Option<DesktopId> {
        None
    }

    fn desktops(&self) -> Vec<DesktopInfo> {
        Vec::new()
    }

    fn current_screen(&self) -> Option<String> {
        None
    }

    fn send(&self, command: WindowCommand) {
        debug!("Headless window system dropping {:?}", command);
    }
}
