use super::DragTimer;
use qmpanel_types::{
    DesktopId, DesktopInfo, FALLBACK_ICON, Icon, WindowCommand, WindowHandle, WindowInfo,
    WindowProps,
};
use tracing::debug;

/// Displayable state of one taskbar button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskButtonState {
    pub handle: WindowHandle,
    pub title: String,
    pub icon: Icon,
    pub is_active: bool,
    pub is_minimized: bool,
    pub is_maximized: bool,
    pub is_shaded: bool,
    pub is_urgent: bool,
    pub desktop: Option<DesktopId>,
    pub screen: Option<String>,
}

impl TaskButtonState {
    #[must_use]
    pub fn from_info(info: &WindowInfo) -> Self {
        Self {
            handle: info.handle,
            title: info.title().to_string(),
            icon: icon_of(info),
            is_active: false,
            is_minimized: info.is_minimized,
            is_maximized: info.is_maximized,
            is_shaded: info.is_shaded,
            is_urgent: info.is_urgent,
            desktop: info.desktop,
            screen: info.screen.clone(),
        }
    }
}

fn icon_of(info: &WindowInfo) -> Icon {
    match info.icon.as_deref() {
        Some(name) if !name.is_empty() => Icon::named(name),
        _ => Icon::named(FALLBACK_ICON),
    }
}

/// Drag-and-drop hover state of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Something is dragged over the button, activation timer armed
    DragHover,
    /// The hover timer fired and the window was activated
    Activated,
}

/// A taskbar button tracking one window.
#[derive(Debug)]
pub struct TaskButton {
    state: TaskButtonState,
    drag: DragState,
    timer: Option<DragTimer>,
}

impl TaskButton {
    #[must_use]
    pub fn new(info: &WindowInfo) -> Self {
        Self {
            state: TaskButtonState::from_info(info),
            drag: DragState::Idle,
            timer: None,
        }
    }

    #[must_use]
    pub fn handle(&self) -> WindowHandle {
        self.state.handle
    }

    #[must_use]
    pub fn state(&self) -> &TaskButtonState {
        &self.state
    }

    #[must_use]
    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.state.is_active = active;
    }

    /// Refresh the attributes named by `props` from a fresh snapshot.
    /// Returns whether anything visible changed.
    pub fn refresh(&mut self, info: &WindowInfo, props: WindowProps) -> bool {
        let before = self.state.clone();

        if props.contains(WindowProps::TITLE) {
            info.title().clone_into(&mut self.state.title);
        }
        if props.contains(WindowProps::ICON) {
            self.state.icon = icon_of(info);
        }
        if props.contains(WindowProps::STATE) {
            self.state.is_minimized = info.is_minimized;
            self.state.is_maximized = info.is_maximized;
            self.state.is_shaded = info.is_shaded;
            self.state.is_urgent = info.is_urgent;
        }
        if props.contains(WindowProps::DESKTOP) {
            self.state.desktop = info.desktop;
        }
        if props.contains(WindowProps::SCREEN) {
            self.state.screen.clone_from(&info.screen);
        }

        self.state != before
    }

    /// Command for a plain click: minimize the active window, raise any other.
    #[must_use]
    pub fn click(&self) -> WindowCommand {
        let handle = self.handle();
        if self.state.is_active && !self.state.is_minimized {
            WindowCommand::Minimize { handle }
        } else {
            WindowCommand::Activate { handle }
        }
    }

    /// Close request. Local state is left alone until the window goes away.
    #[must_use]
    pub fn close(&self) -> WindowCommand {
        WindowCommand::Close {
            handle: self.handle(),
        }
    }

    /// Entries of the button's context menu.
    #[must_use]
    pub fn context_actions(&self, desktops: &[DesktopInfo]) -> Vec<TaskAction> {
        let state = &self.state;
        let mut actions = vec![TaskAction::Raise];

        if !state.is_minimized {
            actions.push(TaskAction::Minimize);
        }
        actions.push(if state.is_maximized {
            TaskAction::Restore
        } else {
            TaskAction::Maximize
        });
        actions.push(if state.is_shaded {
            TaskAction::Unshade
        } else {
            TaskAction::Shade
        });

        actions.extend(
            desktops
                .iter()
                .filter(|d| state.desktop != Some(d.id))
                .map(|d| TaskAction::MoveToDesktop {
                    desktop: d.id,
                    name: d.name.clone(),
                }),
        );

        actions.extend([TaskAction::Move, TaskAction::Resize, TaskAction::Close]);
        actions
    }

    /// Start hovering. Ignored unless the button is idle.
    pub fn drag_enter(&mut self, timer: DragTimer) -> bool {
        if self.drag != DragState::Idle {
            return false;
        }
        debug!("Drag hover on {}", self.handle());
        self.drag = DragState::DragHover;
        self.timer = Some(timer);
        true
    }

    /// Drag left or dropped: cancel any pending activation.
    pub fn drag_leave(&mut self) {
        if self.drag != DragState::Idle {
            debug!("Drag left {}", self.handle());
        }
        self.drag = DragState::Idle;
        self.timer = None;
    }

    /// Hover timer expiry. Returns the activation command when the expiry
    /// belongs to the currently armed timer.
    pub fn drag_elapsed(&mut self, generation: u64) -> Option<WindowCommand> {
        let armed = self
            .timer
            .as_ref()
            .is_some_and(|t| t.generation() == generation);

        if self.drag != DragState::DragHover || !armed {
            debug!(
                "Ignoring stale drag expiry {} for {}",
                generation,
                self.handle()
            );
            return None;
        }

        self.timer = None;
        self.drag = DragState::Activated;
        Some(WindowCommand::Activate {
            handle: self.handle(),
        })
    }

    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }
}

/// Entry of a task button's context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    Raise,
    Minimize,
    Maximize,
    Restore,
    Shade,
    Unshade,
    MoveToDesktop { desktop: DesktopId, name: String },
    Move,
    Resize,
    Close,
}

impl TaskAction {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Raise => "Raise".to_string(),
            Self::Minimize => "Minimize".to_string(),
            Self::Maximize => "Maximize".to_string(),
            Self::Restore => "Restore".to_string(),
            Self::Shade => "Roll down".to_string(),
            Self::Unshade => "Roll up".to_string(),
            Self::MoveToDesktop { name, .. } => format!("Move to {name}"),
            Self::Move => "Move".to_string(),
            Self::Resize => "Resize".to_string(),
            Self::Close => "Close".to_string(),
        }
    }

    #[must_use]
    pub fn command(&self, handle: WindowHandle) -> WindowCommand {
        match self {
            Self::Raise => WindowCommand::Activate { handle },
            Self::Minimize => WindowCommand::Minimize { handle },
            Self::Maximize => WindowCommand::Maximize { handle },
            Self::Restore => WindowCommand::DeMaximize { handle },
            Self::Shade => WindowCommand::Shade { handle },
            Self::Unshade => WindowCommand::Unshade { handle },
            Self::MoveToDesktop { desktop, .. } => WindowCommand::MoveToDesktop {
                handle,
                desktop: *desktop,
            },
            Self::Move => WindowCommand::Move { handle },
            Self::Resize => WindowCommand::Resize { handle },
            Self::Close => WindowCommand::Close { handle },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(3),
            name: "foot".to_string(),
            icon: Some("foot".to_string()),
            desktop: Some(DesktopId(1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_button_uses_title_and_icon() {
        let button = TaskButton::new(&info());
        assert_eq!(button.state().title, "foot");
        assert_eq!(button.state().icon, Icon::named("foot"));
        assert!(!button.is_active());
        assert_eq!(button.drag_state(), DragState::Idle);
    }

    #[test]
    fn test_missing_icon_falls_back() {
        let button = TaskButton::new(&WindowInfo {
            icon: Some(String::new()),
            ..info()
        });
        assert_eq!(button.state().icon.name, FALLBACK_ICON);
    }

    #[test]
    fn test_refresh_only_touches_named_props() {
        let mut button = TaskButton::new(&info());
        let changed = WindowInfo {
            name: "vim".to_string(),
            is_urgent: true,
            ..info()
        };

        assert!(button.refresh(&changed, WindowProps::STATE));
        assert_eq!(button.state().title, "foot");
        assert!(button.state().is_urgent);

        assert!(button.refresh(&changed, WindowProps::TITLE));
        assert_eq!(button.state().title, "vim");

        assert!(!button.refresh(&changed, WindowProps::TITLE));
    }

    #[test]
    fn test_click_toggles_between_raise_and_minimize() {
        let mut button = TaskButton::new(&info());
        assert!(matches!(button.click(), WindowCommand::Activate { .. }));

        button.set_active(true);
        assert!(matches!(button.click(), WindowCommand::Minimize { .. }));
    }

    #[test]
    fn test_close_does_not_change_state() {
        let button = TaskButton::new(&info());
        let before = button.state().clone();
        assert_eq!(
            button.close(),
            WindowCommand::Close {
                handle: WindowHandle(3)
            }
        );
        assert_eq!(button.state(), &before);
    }

    #[test]
    fn test_context_actions_follow_state() {
        let desktops = vec![
            DesktopInfo {
                id: DesktopId(1),
                name: "1".to_string(),
            },
            DesktopInfo {
                id: DesktopId(2),
                name: "web".to_string(),
            },
        ];

        let button = TaskButton::new(&WindowInfo {
            is_maximized: true,
            ..info()
        });
        let actions = button.context_actions(&desktops);

        assert!(actions.contains(&TaskAction::Restore));
        assert!(!actions.contains(&TaskAction::Maximize));
        assert!(actions.contains(&TaskAction::Shade));
        assert_eq!(
            actions
                .iter()
                .filter(|a| matches!(a, TaskAction::MoveToDesktop { .. }))
                .count(),
            1
        );
        assert_eq!(actions.last(), Some(&TaskAction::Close));
    }

    #[test]
    fn test_task_action_commands() {
        let handle = WindowHandle(8);
        assert_eq!(
            TaskAction::Restore.command(handle),
            WindowCommand::DeMaximize { handle }
        );
        assert_eq!(
            TaskAction::MoveToDesktop {
                desktop: DesktopId(2),
                name: "web".to_string()
            }
            .command(handle),
            WindowCommand::MoveToDesktop {
                handle,
                desktop: DesktopId(2)
            }
        );
        assert_eq!(
            TaskAction::MoveToDesktop {
                desktop: DesktopId(2),
                name: "web".to_string()
            }
            .label(),
            "Move to web"
        );
    }
}
