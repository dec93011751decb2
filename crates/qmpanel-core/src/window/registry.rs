use super::{TaskButton, WindowSystem};
use qmpanel_types::{DesktopId, WindowHandle, WindowInfo, WindowKind, WindowProps};
use tracing::{debug, trace};

/// Context the taskbar inclusion predicate is evaluated in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterContext {
    /// Hide windows that are not on `current_desktop`
    pub per_desktop: bool,
    /// Hide windows that are not on `current_screen`
    pub per_screen: bool,
    pub current_desktop: Option<DesktopId>,
    pub current_screen: Option<String>,
    /// Screen the panel is pinned to. Overrides the focused screen.
    pub output: Option<String>,
}

/// Whether a window gets a taskbar button.
#[must_use]
pub fn accept_window(info: &WindowInfo, filter: &FilterContext) -> bool {
    if info.skip_taskbar {
        return false;
    }

    if !matches!(info.kind, WindowKind::Normal | WindowKind::Dialog) {
        return false;
    }

    if filter.per_desktop
        && let Some(current) = filter.current_desktop
        && !info.is_on_desktop(current)
    {
        return false;
    }

    if filter.per_screen
        && let (Some(current), Some(screen)) = (&filter.current_screen, &info.screen)
        && current != screen
    {
        return false;
    }

    true
}

/// Change to the visible button list, reported for relayout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskbarChange {
    /// A button was inserted at `index`
    Inserted { handle: WindowHandle, index: usize },
    /// A button was removed from `index`
    Removed { handle: WindowHandle, index: usize },
    /// A button's title, icon or state changed
    Updated { handle: WindowHandle },
    /// The highlighted button changed
    ActiveChanged {
        previous: Option<WindowHandle>,
        current: Option<WindowHandle>,
    },
    /// The whole list was rebuilt
    Reset,
}

/// Ordered set of task buttons, one per qualifying live window.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    buttons: Vec<TaskButton>,
    filter: FilterContext,
}

impl WindowRegistry {
    #[must_use]
    pub fn new(filter: FilterContext) -> Self {
        Self {
            buttons: Vec::new(),
            filter,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &FilterContext {
        &self.filter
    }

    #[must_use]
    pub fn buttons(&self) -> &[TaskButton] {
        &self.buttons
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    #[must_use]
    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.position(handle).is_some()
    }

    #[must_use]
    pub fn handles(&self) -> Vec<WindowHandle> {
        self.buttons.iter().map(TaskButton::handle).collect()
    }

    #[must_use]
    pub fn button(&self, handle: WindowHandle) -> Option<&TaskButton> {
        self.buttons.iter().find(|b| b.handle() == handle)
    }

    pub fn button_mut(&mut self, handle: WindowHandle) -> Option<&mut TaskButton> {
        self.buttons.iter_mut().find(|b| b.handle() == handle)
    }

    #[must_use]
    pub fn active(&self) -> Option<WindowHandle> {
        self.buttons
            .iter()
            .find(|b| b.is_active())
            .map(TaskButton::handle)
    }

    fn position(&self, handle: WindowHandle) -> Option<usize> {
        self.buttons.iter().position(|b| b.handle() == handle)
    }

    /// Rebuild from scratch in enumeration order.
    pub fn populate(&mut self, ws: &dyn WindowSystem) -> Vec<TaskbarChange> {
        self.filter.current_desktop = ws.current_desktop();
        self.filter.current_screen = self.filter.output.clone().or_else(|| ws.current_screen());
        self.buttons.clear();

        for handle in ws.enumerate_windows() {
            if self.contains(handle) {
                continue;
            }
            if let Some(info) = ws.window_info(handle)
                && accept_window(&info, &self.filter)
            {
                self.buttons.push(TaskButton::new(&info));
            }
        }

        self.mark_active(ws.active_window());
        debug!("Taskbar populated with {} buttons", self.buttons.len());
        vec![TaskbarChange::Reset]
    }

    pub fn on_window_added(
        &mut self,
        ws: &dyn WindowSystem,
        handle: WindowHandle,
    ) -> Vec<TaskbarChange> {
        if self.contains(handle) {
            trace!("Window {} already tracked", handle);
            return Vec::new();
        }

        let Some(info) = ws.window_info(handle) else {
            debug!("Window {} vanished before it could be added", handle);
            return Vec::new();
        };

        if !accept_window(&info, &self.filter) {
            trace!("Window {} does not qualify for the taskbar", handle);
            return Vec::new();
        }

        self.insert(ws, &info)
    }

    fn insert(&mut self, ws: &dyn WindowSystem, info: &WindowInfo) -> Vec<TaskbarChange> {
        let mut button = TaskButton::new(info);
        let is_active = ws.active_window() == Some(info.handle);
        if is_active {
            for other in &mut self.buttons {
                other.set_active(false);
            }
        }
        button.set_active(is_active);

        let index = self.buttons.len();
        self.buttons.push(button);
        debug!("Added task button {} at {}", info.handle, index);

        vec![TaskbarChange::Inserted {
            handle: info.handle,
            index,
        }]
    }

    pub fn on_window_removed(&mut self, handle: WindowHandle) -> Vec<TaskbarChange> {
        let Some(index) = self.position(handle) else {
            trace!("Removal of untracked window {}", handle);
            return Vec::new();
        };

        // Dropping the button cancels its drag timer.
        self.buttons.remove(index);
        debug!("Removed task button {} from {}", handle, index);

        vec![TaskbarChange::Removed { handle, index }]
    }

    pub fn on_active_window_changed(&mut self, handle: Option<WindowHandle>) -> Vec<TaskbarChange> {
        let previous = self.active();
        self.mark_active(handle);
        let current = self.active();

        if previous == current {
            return Vec::new();
        }
        vec![TaskbarChange::ActiveChanged { previous, current }]
    }

    fn mark_active(&mut self, handle: Option<WindowHandle>) {
        for button in &mut self.buttons {
            let active = Some(button.handle()) == handle;
            button.set_active(active);
        }
    }

    pub fn on_window_changed(
        &mut self,
        ws: &dyn WindowSystem,
        handle: WindowHandle,
        props: WindowProps,
    ) -> Vec<TaskbarChange> {
        let Some(info) = ws.window_info(handle) else {
            trace!("Change notification for stale window {}", handle);
            return Vec::new();
        };

        if props.affects_qualification() {
            let qualifies = accept_window(&info, &self.filter);
            match (self.contains(handle), qualifies) {
                (true, false) => return self.on_window_removed(handle),
                (false, true) => return self.insert(ws, &info),
                (false, false) => return Vec::new(),
                (true, true) => {}
            }
        }

        match self.button_mut(handle) {
            Some(button) => {
                if button.refresh(&info, props) {
                    vec![TaskbarChange::Updated { handle }]
                } else {
                    Vec::new()
                }
            }
            None => Vec::new(),
        }
    }

    pub fn on_current_desktop_changed(
        &mut self,
        ws: &dyn WindowSystem,
        desktop: Option<DesktopId>,
    ) -> Vec<TaskbarChange> {
        if self.filter.current_desktop == desktop {
            return Vec::new();
        }
        debug!("Current desktop changed to {:?}", desktop);
        self.filter.current_desktop = desktop;
        self.refilter(ws)
    }

    pub fn on_current_screen_changed(
        &mut self,
        ws: &dyn WindowSystem,
        screen: Option<String>,
    ) -> Vec<TaskbarChange> {
        if self.filter.output.is_some() {
            trace!("Ignoring screen change to {:?}, panel output is pinned", screen);
            return Vec::new();
        }
        if self.filter.current_screen == screen {
            return Vec::new();
        }
        debug!("Current screen changed to {:?}", screen);
        self.filter.current_screen = screen;
        self.refilter(ws)
    }

    /// Apply new per-desktop/per-screen settings.
    pub fn set_filtering(
        &mut self,
        ws: &dyn WindowSystem,
        per_desktop: bool,
        per_screen: bool,
    ) -> Vec<TaskbarChange> {
        if self.filter.per_desktop == per_desktop && self.filter.per_screen == per_screen {
            return Vec::new();
        }
        self.filter.per_desktop = per_desktop;
        self.filter.per_screen = per_screen;
        self.refilter(ws)
    }

    /// Pin the panel to `output`, or follow the focused screen again on `None`.
    pub fn set_output(
        &mut self,
        ws: &dyn WindowSystem,
        output: Option<String>,
    ) -> Vec<TaskbarChange> {
        if self.filter.output == output {
            return Vec::new();
        }
        debug!("Panel output set to {:?}", output);
        self.filter.current_screen = output.clone().or_else(|| ws.current_screen());
        self.filter.output = output;
        self.refilter(ws)
    }

    /// Drop buttons that stopped qualifying, then append newly qualifying
    /// windows in enumeration order.
    fn refilter(&mut self, ws: &dyn WindowSystem) -> Vec<TaskbarChange> {
        let mut changes = Vec::new();

        let stale: Vec<WindowHandle> = self
            .buttons
            .iter()
            .map(TaskButton::handle)
            .filter(|&h| {
                ws.window_info(h)
                    .is_none_or(|info| !accept_window(&info, &self.filter))
            })
            .collect();
        for handle in stale {
            changes.extend(self.on_window_removed(handle));
        }

        for handle in ws.enumerate_windows() {
            if self.contains(handle) {
                continue;
            }
            if let Some(info) = ws.window_info(handle)
                && accept_window(&info, &self.filter)
            {
                changes.extend(self.insert(ws, &info));
            }
        }

        changes
    }

    /// Cancel every armed drag timer and reset drag state.
    pub fn cancel_drags(&mut self) {
        for button in &mut self.buttons {
            button.drag_leave();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: u64) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(id),
            name: format!("window-{id}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_accept_normal_and_dialog() {
        let filter = FilterContext::default();
        assert!(accept_window(&window(1), &filter));
        assert!(accept_window(
            &WindowInfo {
                kind: WindowKind::Dialog,
                ..window(1)
            },
            &filter
        ));
    }

    #[test]
    fn test_reject_skip_taskbar_and_tool_kinds() {
        let filter = FilterContext::default();
        assert!(!accept_window(
            &WindowInfo {
                skip_taskbar: true,
                ..window(1)
            },
            &filter
        ));

        for kind in [
            WindowKind::Utility,
            WindowKind::Toolbar,
            WindowKind::Menu,
            WindowKind::Splash,
            WindowKind::Dock,
            WindowKind::Desktop,
        ] {
            assert!(
                !accept_window(
                    &WindowInfo {
                        kind,
                        ..window(1)
                    },
                    &filter
                ),
                "{kind:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_per_desktop_filtering() {
        let filter = FilterContext {
            per_desktop: true,
            current_desktop: Some(DesktopId(1)),
            ..Default::default()
        };
        let elsewhere = WindowInfo {
            desktop: Some(DesktopId(2)),
            ..window(1)
        };

        assert!(!accept_window(&elsewhere, &filter));
        assert!(accept_window(&window(1), &filter), "sticky windows qualify");
        assert!(accept_window(
            &elsewhere,
            &FilterContext {
                per_desktop: false,
                ..filter
            }
        ));
    }

    #[test]
    fn test_per_screen_filtering() {
        let filter = FilterContext {
            per_screen: true,
            current_screen: Some("DP-1".to_string()),
            ..Default::default()
        };
        let other = WindowInfo {
            screen: Some("HDMI-A-1".to_string()),
            ..window(1)
        };
        let same = WindowInfo {
            screen: Some("DP-1".to_string()),
            ..window(2)
        };

        assert!(!accept_window(&other, &filter));
        assert!(accept_window(&same, &filter));
        assert!(accept_window(&window(3), &filter));
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut registry = WindowRegistry::default();
        assert!(registry.on_window_removed(WindowHandle(9)).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_active_change_to_untracked_clears_nothing_visible() {
        let mut registry = WindowRegistry::default();
        assert!(registry.on_active_window_changed(Some(WindowHandle(1))).is_empty());
        assert!(registry.on_active_window_changed(None).is_empty());
    }
}
