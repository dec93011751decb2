//! Shared types for qmpanel components.
//!
//! This crate provides the domain types exchanged between qmpanel-core and
//! its frontends: window handles and snapshots, window-system events and
//! commands, and the small geometry vocabulary used for popup placement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Windows
// ============================================================================

/// Opaque identifier for a top-level window owned by the window system.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identifier of a virtual desktop (workspace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesktopId(pub u64);

/// A virtual desktop as listed by the window system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopInfo {
    pub id: DesktopId,
    pub name: String,
}

/// Window type as reported by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[default]
    Normal,
    Dialog,
    Utility,
    Toolbar,
    Menu,
    Splash,
    Dock,
    Desktop,
}

/// Snapshot of a top-level window's properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub handle: WindowHandle,
    /// Raw window name
    pub name: String,
    /// Name as displayed by the window manager (may carry a `<2>` suffix etc.)
    #[serde(default)]
    pub visible_name: Option<String>,
    /// Icon name from the window's application id
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub kind: WindowKind,
    #[serde(default)]
    pub skip_taskbar: bool,
    #[serde(default)]
    pub is_minimized: bool,
    #[serde(default)]
    pub is_maximized: bool,
    #[serde(default)]
    pub is_shaded: bool,
    #[serde(default)]
    pub is_urgent: bool,
    /// `None` means the window is shown on every desktop
    #[serde(default)]
    pub desktop: Option<DesktopId>,
    /// Output/screen name the window lives on
    #[serde(default)]
    pub screen: Option<String>,
}

impl WindowInfo {
    /// Title to display: the visible name, falling back to the raw name.
    #[must_use]
    pub fn title(&self) -> &str {
        match self.visible_name.as_deref() {
            Some(visible) if !visible.is_empty() => visible,
            _ => &self.name,
        }
    }

    /// Whether the window is shown on `desktop`.
    #[must_use]
    pub fn is_on_desktop(&self, desktop: DesktopId) -> bool {
        self.desktop.is_none_or(|d| d == desktop)
    }
}

bitflags::bitflags! {
    /// Set of window properties carried by a change notification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct WindowProps: u8 {
        const TITLE = 1;
        const ICON = 1 << 1;
        /// Minimized, maximized, shaded, urgency, skip-taskbar
        const STATE = 1 << 2;
        const DESKTOP = 1 << 3;
        const SCREEN = 1 << 4;
        const KIND = 1 << 5;
    }
}

impl WindowProps {
    /// Properties whose change can alter whether a window qualifies for the taskbar.
    #[must_use]
    pub fn affects_qualification(self) -> bool {
        self.intersects(Self::STATE | Self::KIND | Self::DESKTOP | Self::SCREEN)
    }
}

/// Notifications delivered by the window system, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WindowEvent {
    /// A top-level window appeared
    Added { handle: WindowHandle },

    /// A top-level window went away
    Removed { handle: WindowHandle },

    /// The active window changed (`None` when nothing has focus)
    ActiveChanged { handle: Option<WindowHandle> },

    /// Properties of a window changed
    Changed {
        handle: WindowHandle,
        props: WindowProps,
    },

    /// The user switched virtual desktop
    CurrentDesktopChanged { desktop: Option<DesktopId> },

    /// The panel moved to another screen
    CurrentScreenChanged { screen: Option<String> },
}

/// Fire-and-forget commands sent to the window system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WindowCommand {
    /// Raise and focus
    Activate { handle: WindowHandle },
    Minimize { handle: WindowHandle },
    Maximize { handle: WindowHandle },
    DeMaximize { handle: WindowHandle },
    Shade { handle: WindowHandle },
    Unshade { handle: WindowHandle },
    Close { handle: WindowHandle },
    MoveToDesktop {
        handle: WindowHandle,
        desktop: DesktopId,
    },
    /// Start an interactive move
    Move { handle: WindowHandle },
    /// Start an interactive resize
    Resize { handle: WindowHandle },
}

impl WindowCommand {
    /// The window this command targets.
    #[must_use]
    pub fn handle(&self) -> WindowHandle {
        match self {
            Self::Activate { handle }
            | Self::Minimize { handle }
            | Self::Maximize { handle }
            | Self::DeMaximize { handle }
            | Self::Shade { handle }
            | Self::Unshade { handle }
            | Self::Close { handle }
            | Self::MoveToDesktop { handle, .. }
            | Self::Move { handle }
            | Self::Resize { handle } => *handle,
        }
    }
}

// ============================================================================
// Icons
// ============================================================================

/// Generic icon used when a window or application has none.
pub const FALLBACK_ICON: &str = "application-x-executable";

/// A themed icon with its resolved file, when one was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Icon {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Icon {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Screen edge the panel is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Edge {
    #[must_use]
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Top | Self::Bottom => Orientation::Horizontal,
            Self::Left | Self::Right => Orientation::Vertical,
        }
    }
}

/// Direction in which panel items are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. `right()` and `bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn from_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Returns the rectangle moved so that it lies inside `bounds` where possible.
    /// Right/bottom are fixed first, then left/top, so an oversized rectangle
    /// keeps its top-left corner on screen.
    #[must_use]
    pub fn clamped_to(mut self, bounds: Rect) -> Self {
        if self.right() > bounds.right() {
            self.x = bounds.right() - self.width;
        }
        if self.bottom() > bounds.bottom() {
            self.y = bounds.bottom() - self.height;
        }
        if self.x < bounds.x {
            self.x = bounds.x;
        }
        if self.y < bounds.y {
            self.y = bounds.y;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, visible: Option<&str>) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(1),
            name: name.to_string(),
            visible_name: visible.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_title_prefers_visible_name() {
        assert_eq!(info("xterm", Some("xterm <2>")).title(), "xterm <2>");
    }

    #[test]
    fn test_title_falls_back_to_name_when_visible_empty() {
        assert_eq!(info("xterm", Some("")).title(), "xterm");
        assert_eq!(info("xterm", None).title(), "xterm");
    }

    #[test]
    fn test_default_window_info() {
        let info = WindowInfo::default();
        assert_eq!(info.handle, WindowHandle(0));
        assert_eq!(info.title(), "");
    }

    #[test]
    fn test_sticky_window_is_on_every_desktop() {
        let sticky = info("conky", None);
        assert!(sticky.is_on_desktop(DesktopId(1)));
        assert!(sticky.is_on_desktop(DesktopId(7)));

        let pinned = WindowInfo {
            desktop: Some(DesktopId(2)),
            ..sticky
        };
        assert!(pinned.is_on_desktop(DesktopId(2)));
        assert!(!pinned.is_on_desktop(DesktopId(1)));
    }

    #[test]
    fn test_window_props_qualification() {
        assert!(!WindowProps::TITLE.affects_qualification());
        assert!(!(WindowProps::TITLE | WindowProps::ICON).affects_qualification());
        assert!(WindowProps::STATE.affects_qualification());
        assert!((WindowProps::TITLE | WindowProps::DESKTOP).affects_qualification());
    }

    #[test]
    fn test_command_handle() {
        let cmd = WindowCommand::MoveToDesktop {
            handle: WindowHandle(9),
            desktop: DesktopId(3),
        };
        assert_eq!(cmd.handle(), WindowHandle(9));
        assert_eq!(
            WindowCommand::Close {
                handle: WindowHandle(4)
            }
            .handle(),
            WindowHandle(4)
        );
    }

    #[test]
    fn test_command_serializes_tagged() {
        let json = serde_json::to_value(WindowCommand::Activate {
            handle: WindowHandle(5),
        })
        .unwrap();
        assert_eq!(json["command"], "activate");
        assert_eq!(json["handle"], 5);
    }

    #[test]
    fn test_window_event_deserializes() {
        let event: WindowEvent =
            serde_json::from_str(r#"{"type":"active_changed","handle":null}"#).unwrap();
        assert_eq!(event, WindowEvent::ActiveChanged { handle: None });
    }

    #[test]
    fn test_handle_display_is_hex() {
        assert_eq!(WindowHandle(255).to_string(), "0xff");
    }

    #[test]
    fn test_edge_orientation() {
        assert_eq!(Edge::Bottom.orientation(), Orientation::Horizontal);
        assert_eq!(Edge::Top.orientation(), Orientation::Horizontal);
        assert_eq!(Edge::Left.orientation(), Orientation::Vertical);
        assert_eq!(Edge::Right.orientation(), Orientation::Vertical);
    }

    #[test]
    fn test_rect_edges_and_contains() {
        let r = Rect::new(10, 20, 30, 40);
        assert_eq!(r.right(), 40);
        assert_eq!(r.bottom(), 60);
        assert!(r.contains(Point::new(10, 20)));
        assert!(r.contains(Point::new(39, 59)));
        assert!(!r.contains(Point::new(40, 59)));
        assert!(!r.contains(Point::new(9, 30)));
    }

    #[test]
    fn test_rect_clamp_inside_bounds_is_unchanged() {
        let screen = Rect::new(0, 0, 100, 100);
        let r = Rect::new(10, 10, 20, 20);
        assert_eq!(r.clamped_to(screen), r);
    }

    #[test]
    fn test_rect_clamp_moves_back_on_screen() {
        let screen = Rect::new(0, 0, 100, 100);
        assert_eq!(
            Rect::new(90, 95, 20, 20).clamped_to(screen),
            Rect::new(80, 80, 20, 20)
        );
        assert_eq!(
            Rect::new(-5, -7, 20, 20).clamped_to(screen),
            Rect::new(0, 0, 20, 20)
        );
    }

    #[test]
    fn test_rect_clamp_oversized_keeps_top_left() {
        let screen = Rect::new(0, 0, 100, 100);
        assert_eq!(
            Rect::new(50, 50, 150, 150).clamped_to(screen),
            Rect::new(0, 0, 150, 150)
        );
    }
}
