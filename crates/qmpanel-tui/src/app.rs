//! Frontend state and terminal input mapping.
//!
//! Keys and mouse events are hit-tested against the panel's item layout and
//! open popups, then translated into [`PanelEvent`]s. The panel itself stays
//! the only owner of panel state; `App` only keeps what the terminal needs
//! on top (press/drag tracking and the task menu cursor).

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use qmpanel_core::config::PanelConfig;
use qmpanel_core::menu::MenuKey;
use qmpanel_core::{
    CalendarKey, Edge, ItemInput, Panel, PanelEvent, PanelGeometry, PanelUpdate, Point,
    PointerButton, Rect, TaskMenu,
};

/// Strip order of the panel items, as returned by [`Panel::items`].
pub const MENU_ITEM: usize = 0;
pub const TASKBAR_ITEM: usize = 2;
pub const CLOCK_ITEM: usize = 3;

/// One hit area of one panel item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub item: usize,
    pub slot: usize,
}

#[derive(Debug, Default)]
pub struct App {
    pub should_quit: bool,
    /// Cursor in the open task context menu
    pub task_menu_selected: usize,
    pressed: bool,
    dragging: bool,
    drag_hover: Option<Slot>,
}

/// Panel strip of `config.thickness` cells along the configured edge of a
/// `width` x `height` terminal.
pub fn panel_geometry(width: u16, height: u16, config: &PanelConfig) -> PanelGeometry {
    let (w, h) = (i32::from(width), i32::from(height));
    let limit = match config.edge {
        Edge::Top | Edge::Bottom => h,
        Edge::Left | Edge::Right => w,
    };
    let t = config.thickness.clamp(1, limit.max(1));

    let panel = match config.edge {
        Edge::Top => Rect::new(0, 0, w, t),
        Edge::Bottom => Rect::new(0, h - t, w, t),
        Edge::Left => Rect::new(0, 0, t, h),
        Edge::Right => Rect::new(w - t, 0, t, h),
    };

    PanelGeometry {
        panel,
        edge: config.edge,
        screen: Rect::new(0, 0, w, h),
    }
}

/// Item and slot under `point`.
pub fn hit_test(panel: &Panel, point: Point) -> Option<Slot> {
    let ctx = panel.layout_context();
    let items = panel.items();
    let (item, rect) = panel
        .item_rects()
        .into_iter()
        .enumerate()
        .find(|(_, rect)| rect.contains(point))?;

    items[item]
        .slot_rects(rect, &ctx)
        .iter()
        .position(|r| r.contains(point))
        .map(|slot| Slot { item, slot })
}

/// First of `total` rows to show in `visible` lines so that `selected`
/// stays in view.
pub fn scroll_offset(total: usize, selected: Option<usize>, visible: usize) -> usize {
    if visible == 0 || total <= visible {
        return 0;
    }
    let selected = selected.unwrap_or(0);
    selected
        .saturating_sub(visible - 1)
        .min(total - visible)
}

/// Row of the framed list inside `rect` at screen line `y`.
fn framed_row(rect: Rect, y: i32) -> Option<usize> {
    let line = y - rect.y - 1;
    if line < 0 || line >= rect.height - 2 {
        return None;
    }
    usize::try_from(line).ok()
}

fn menu_key(code: KeyCode, ctrl: bool) -> Option<MenuKey> {
    match code {
        KeyCode::Esc => Some(MenuKey::Escape),
        KeyCode::Enter => Some(MenuKey::Enter),
        KeyCode::Up => Some(MenuKey::Up),
        KeyCode::Down => Some(MenuKey::Down),
        KeyCode::Backspace => Some(MenuKey::Backspace),
        KeyCode::Char(c) if !ctrl => Some(MenuKey::Char(c)),
        _ => None,
    }
}

fn calendar_key(code: KeyCode) -> Option<CalendarKey> {
    match code {
        KeyCode::Esc | KeyCode::Char('q' | 'c') => Some(CalendarKey::Escape),
        KeyCode::Left | KeyCode::PageUp | KeyCode::Char('h') => Some(CalendarKey::PrevMonth),
        KeyCode::Right | KeyCode::PageDown | KeyCode::Char('l') => Some(CalendarKey::NextMonth),
        _ => None,
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track panel output that affects frontend state.
    pub fn on_update(&mut self, update: &PanelUpdate) {
        match update {
            PanelUpdate::TaskMenuShown { .. } => self.task_menu_selected = 0,
            PanelUpdate::Quit => self.should_quit = true,
            _ => {}
        }
    }

    pub fn handle_key(&mut self, panel: &Panel, key: KeyEvent) -> Vec<PanelEvent> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return vec![PanelEvent::Quit];
        }

        if panel.menu().is_visible() {
            return menu_key(key.code, ctrl)
                .map(PanelEvent::MenuKey)
                .into_iter()
                .collect();
        }
        if let Some(menu) = panel.task_menu() {
            return self.task_menu_key(menu, key.code);
        }
        if panel.clock().is_calendar_open() {
            return calendar_key(key.code)
                .map(PanelEvent::CalendarKey)
                .into_iter()
                .collect();
        }

        match key.code {
            KeyCode::Char('q') => vec![PanelEvent::Quit],
            KeyCode::Char('m' | ' ') | KeyCode::F(1) => vec![PanelEvent::MenuToggle],
            KeyCode::Char('c') => vec![PanelEvent::ClockClicked],
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                panel
                    .registry()
                    .buttons()
                    .get(index)
                    .map(|button| PanelEvent::TaskClicked {
                        handle: button.handle(),
                    })
                    .into_iter()
                    .collect()
            }
            _ => Vec::new(),
        }
    }

    fn task_menu_key(&mut self, menu: &TaskMenu, code: KeyCode) -> Vec<PanelEvent> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => vec![PanelEvent::TaskMenuDismissed],
            KeyCode::Up | KeyCode::Char('k') => {
                self.task_menu_selected = self.task_menu_selected.saturating_sub(1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.task_menu_selected =
                    (self.task_menu_selected + 1).min(menu.actions.len().saturating_sub(1));
                Vec::new()
            }
            KeyCode::Enter => menu
                .actions
                .get(self.task_menu_selected)
                .map(|action| PanelEvent::TaskAction {
                    handle: menu.handle,
                    action: action.clone(),
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Left presses act on release so that a press-and-drag over the
    /// taskbar is a drag hover rather than a click.
    pub fn handle_mouse(&mut self, panel: &Panel, mouse: MouseEvent) -> Vec<PanelEvent> {
        let point = Point::new(i32::from(mouse.column), i32::from(mouse.row));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.pressed = true;
                self.dragging = false;
                Vec::new()
            }
            MouseEventKind::Drag(MouseButton::Left) if self.pressed => {
                self.dragging = true;
                self.drag_to(panel, point)
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.pressed = false;
                if std::mem::take(&mut self.dragging) {
                    return self.finish_drag(panel);
                }
                self.click(panel, point, PointerButton::Left)
            }
            MouseEventKind::Down(MouseButton::Middle) => {
                self.click(panel, point, PointerButton::Middle)
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.click(panel, point, PointerButton::Right)
            }
            MouseEventKind::ScrollUp if panel.menu().is_visible() => {
                vec![PanelEvent::MenuKey(MenuKey::Up)]
            }
            MouseEventKind::ScrollDown if panel.menu().is_visible() => {
                vec![PanelEvent::MenuKey(MenuKey::Down)]
            }
            _ => Vec::new(),
        }
    }

    fn drag_to(&mut self, panel: &Panel, point: Point) -> Vec<PanelEvent> {
        let hover = hit_test(panel, point).filter(|s| s.item == TASKBAR_ITEM);
        if hover == self.drag_hover {
            return Vec::new();
        }

        let taskbar = panel.items()[TASKBAR_ITEM];
        let mut events = Vec::new();
        if let Some(old) = self.drag_hover.take() {
            events.extend(taskbar.handle_input(ItemInput::DragLeave { slot: old.slot }));
        }
        if let Some(new) = hover {
            events.extend(taskbar.handle_input(ItemInput::DragEnter { slot: new.slot }));
        }
        self.drag_hover = hover;
        events
    }

    fn finish_drag(&mut self, panel: &Panel) -> Vec<PanelEvent> {
        self.drag_hover
            .take()
            .map(|slot| panel.items()[TASKBAR_ITEM].handle_input(ItemInput::Drop { slot: slot.slot }))
            .unwrap_or_default()
    }

    fn click(&mut self, panel: &Panel, point: Point, button: PointerButton) -> Vec<PanelEvent> {
        if let Some(events) = Self::click_popup(panel, point, button) {
            return events;
        }

        let hit = hit_test(panel, point);
        let mut events = dismiss_popups(panel, hit.map(|s| s.item));
        if let Some(slot) = hit {
            events.extend(
                panel.items()[slot.item].handle_input(ItemInput::Press {
                    slot: slot.slot,
                    button,
                }),
            );
        }
        events
    }

    /// Events for a click inside an open popup, `None` when the click
    /// missed every popup.
    fn click_popup(panel: &Panel, point: Point, button: PointerButton) -> Option<Vec<PanelEvent>> {
        let menu = panel.menu();
        if menu.is_visible()
            && let Some(rect) = menu.geometry()
            && rect.contains(point)
        {
            let row = framed_row(rect, point.y).filter(|_| button == PointerButton::Left);
            return Some(
                row.map(|line| {
                    let rows = menu.rows().len();
                    let visible = usize::try_from(rect.height - 2).unwrap_or(0);
                    let offset = scroll_offset(rows, menu.selected_row(), visible);
                    PanelEvent::MenuActivateRow { row: offset + line }
                })
                .into_iter()
                .collect(),
            );
        }

        if let Some(task_menu) = panel.task_menu()
            && task_menu.rect.contains(point)
        {
            return Some(
                framed_row(task_menu.rect, point.y)
                    .and_then(|line| task_menu.actions.get(line))
                    .map(|action| PanelEvent::TaskAction {
                        handle: task_menu.handle,
                        action: action.clone(),
                    })
                    .into_iter()
                    .collect(),
            );
        }

        if let Some(rect) = panel.clock().calendar_rect(panel.geometry())
            && rect.contains(point)
        {
            // Title row carries the month arrows at its ends.
            let key = (point.y == rect.y + 1)
                .then(|| {
                    if point.x <= rect.x + 2 {
                        Some(CalendarKey::PrevMonth)
                    } else if point.x >= rect.right() - 3 {
                        Some(CalendarKey::NextMonth)
                    } else {
                        None
                    }
                })
                .flatten();
            return Some(key.map(PanelEvent::CalendarKey).into_iter().collect());
        }

        None
    }
}

/// Close popups not owned by `item`; the owning item toggles its own.
fn dismiss_popups(panel: &Panel, item: Option<usize>) -> Vec<PanelEvent> {
    let mut events = Vec::new();
    if panel.menu().is_visible() && item != Some(MENU_ITEM) {
        events.push(PanelEvent::MenuDismissed);
    }
    if panel.task_menu().is_some() {
        events.push(PanelEvent::TaskMenuDismissed);
    }
    if panel.clock().is_calendar_open() && item != Some(CLOCK_ITEM) {
        events.push(PanelEvent::CalendarKey(CalendarKey::Escape));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use qmpanel_core::config::Config;
    use qmpanel_core::menu::InMemoryDatabase;
    use qmpanel_core::window::{TaskbarChange, WindowSystem};
    use qmpanel_core::{DesktopId, DesktopInfo, WindowCommand, WindowHandle, WindowInfo};

    struct StaticWindows(Vec<WindowInfo>);

    impl WindowSystem for StaticWindows {
        fn enumerate_windows(&self) -> Vec<WindowHandle> {
            self.0.iter().map(|w| w.handle).collect()
        }

        fn window_info(&self, handle: WindowHandle) -> Option<WindowInfo> {
            self.0.iter().find(|w| w.handle == handle).cloned()
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

        fn send(&self, _command: WindowCommand) {}
    }

    fn window(id: u64, name: &str) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle(id),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// 80x24 terminal, panel on the bottom row: menu button at 0..6,
    /// one quick launch button at 6..9, task buttons of 20 from 9.
    fn panel() -> Panel {
        let mut db = InMemoryDatabase::new();
        db.add("foot.desktop", "Foot", "System");
        db.add("firefox.desktop", "Firefox", "Internet");

        let mut config = Config::default();
        config.quick_launch = vec!["foot.desktop".to_string()];
        config.taskbar.button_width = 20;
        let geometry = panel_geometry(80, 24, &config.panel);

        let windows = StaticWindows(vec![window(1, "A"), window(2, "B")]);
        let (mut panel, _updates) = Panel::new(config, Box::new(db), Box::new(windows));
        panel.start();
        panel.process(PanelEvent::GeometryChanged(geometry));
        panel
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn left_click(app: &mut App, panel: &Panel, column: u16, row: u16) -> Vec<PanelEvent> {
        app.handle_mouse(panel, mouse(MouseEventKind::Down(MouseButton::Left), column, row));
        app.handle_mouse(panel, mouse(MouseEventKind::Up(MouseButton::Left), column, row))
    }

    fn apply(panel: &mut Panel, events: Vec<PanelEvent>) {
        for event in events {
            panel.process(event);
        }
    }

    #[test]
    fn test_panel_geometry_per_edge() {
        let mut config = PanelConfig::default();

        let bottom = panel_geometry(80, 24, &config);
        assert_eq!(bottom.panel, Rect::new(0, 23, 80, 1));
        assert_eq!(bottom.screen, Rect::new(0, 0, 80, 24));

        config.edge = Edge::Top;
        assert_eq!(panel_geometry(80, 24, &config).panel, Rect::new(0, 0, 80, 1));

        config.edge = Edge::Right;
        config.thickness = 12;
        assert_eq!(panel_geometry(80, 24, &config).panel, Rect::new(68, 0, 12, 24));

        config.edge = Edge::Left;
        config.thickness = 500;
        assert_eq!(panel_geometry(80, 24, &config).panel, Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn test_scroll_offset_keeps_selection_visible() {
        assert_eq!(scroll_offset(5, Some(4), 10), 0);
        assert_eq!(scroll_offset(30, Some(3), 10), 0);
        assert_eq!(scroll_offset(30, Some(12), 10), 3);
        assert_eq!(scroll_offset(30, Some(29), 10), 20);
        assert_eq!(scroll_offset(30, None, 10), 0);
        assert_eq!(scroll_offset(30, Some(5), 0), 0);
    }

    #[test]
    fn test_hit_test_finds_items_and_slots() {
        let panel = panel();

        assert_eq!(hit_test(&panel, Point::new(2, 23)), Some(Slot { item: MENU_ITEM, slot: 0 }));
        assert_eq!(hit_test(&panel, Point::new(7, 23)), Some(Slot { item: 1, slot: 0 }));
        assert_eq!(
            hit_test(&panel, Point::new(10, 23)),
            Some(Slot { item: TASKBAR_ITEM, slot: 0 })
        );
        assert_eq!(
            hit_test(&panel, Point::new(30, 23)),
            Some(Slot { item: TASKBAR_ITEM, slot: 1 })
        );
        assert_eq!(hit_test(&panel, Point::new(10, 5)), None);
    }

    #[test]
    fn test_click_on_task_button() {
        let panel = panel();
        let mut app = App::new();

        assert_eq!(
            left_click(&mut app, &panel, 30, 23),
            vec![PanelEvent::TaskClicked {
                handle: WindowHandle(2)
            }]
        );
        assert_eq!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Down(MouseButton::Middle), 10, 23)),
            vec![PanelEvent::TaskMiddleClicked {
                handle: WindowHandle(1)
            }]
        );
    }

    #[test]
    fn test_drag_over_taskbar_hovers_then_drops() {
        let panel = panel();
        let mut app = App::new();

        app.handle_mouse(&panel, mouse(MouseEventKind::Down(MouseButton::Left), 2, 5));
        assert!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Drag(MouseButton::Left), 3, 20))
                .is_empty()
        );
        assert_eq!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Drag(MouseButton::Left), 10, 23)),
            vec![PanelEvent::DragEnter {
                handle: WindowHandle(1)
            }]
        );
        assert!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Drag(MouseButton::Left), 12, 23))
                .is_empty()
        );
        assert_eq!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Drag(MouseButton::Left), 30, 23)),
            vec![
                PanelEvent::DragLeave {
                    handle: WindowHandle(1)
                },
                PanelEvent::DragEnter {
                    handle: WindowHandle(2)
                },
            ]
        );
        assert_eq!(
            app.handle_mouse(&panel, mouse(MouseEventKind::Up(MouseButton::Left), 30, 23)),
            vec![PanelEvent::Drop {
                handle: WindowHandle(2)
            }]
        );
    }

    #[test]
    fn test_menu_click_and_typing() {
        let mut panel = panel();
        let mut app = App::new();

        let events = left_click(&mut app, &panel, 2, 23);
        assert_eq!(events, vec![PanelEvent::MenuToggle]);
        apply(&mut panel, events);
        assert!(panel.menu().is_visible());

        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Char('q'))),
            vec![PanelEvent::MenuKey(MenuKey::Char('q'))]
        );
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Esc)),
            vec![PanelEvent::MenuKey(MenuKey::Escape)]
        );

        // Clicking the menu button again only toggles.
        assert_eq!(left_click(&mut app, &panel, 2, 23), vec![PanelEvent::MenuToggle]);
    }

    #[test]
    fn test_click_on_menu_row_activates_it() {
        let mut panel = panel();
        let mut app = App::new();
        apply(&mut panel, vec![PanelEvent::MenuToggle]);
        let rect = panel.menu().geometry().unwrap();

        // First line inside the frame is the search field, then the categories.
        let x = u16::try_from(rect.x + 1).unwrap();
        let y = u16::try_from(rect.y + 2).unwrap();
        assert_eq!(
            left_click(&mut app, &panel, x, y),
            vec![PanelEvent::MenuActivateRow { row: 1 }]
        );
    }

    #[test]
    fn test_click_outside_dismisses_menu() {
        let mut panel = panel();
        let mut app = App::new();
        apply(&mut panel, vec![PanelEvent::MenuToggle]);

        assert_eq!(left_click(&mut app, &panel, 70, 2), vec![PanelEvent::MenuDismissed]);
        assert_eq!(
            left_click(&mut app, &panel, 10, 23),
            vec![
                PanelEvent::MenuDismissed,
                PanelEvent::TaskClicked {
                    handle: WindowHandle(1)
                }
            ]
        );
    }

    #[test]
    fn test_task_menu_navigation() {
        let mut panel = panel();
        let mut app = App::new();

        let events =
            app.handle_mouse(&panel, mouse(MouseEventKind::Down(MouseButton::Right), 30, 23));
        assert_eq!(
            events,
            vec![PanelEvent::TaskContextMenu {
                handle: WindowHandle(2)
            }]
        );
        apply(&mut panel, events);
        let menu = panel.task_menu().unwrap().clone();

        assert!(app.handle_key(&panel, key(KeyCode::Down)).is_empty());
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Enter)),
            vec![PanelEvent::TaskAction {
                handle: WindowHandle(2),
                action: menu.actions[1].clone()
            }]
        );
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Esc)),
            vec![PanelEvent::TaskMenuDismissed]
        );

        app.on_update(&PanelUpdate::TaskMenuShown {
            handle: menu.handle,
            actions: menu.actions,
            rect: menu.rect,
        });
        assert_eq!(app.task_menu_selected, 0);
    }

    #[test]
    fn test_calendar_keys() {
        let mut panel = panel();
        let mut app = App::new();

        let events = app.handle_key(&panel, key(KeyCode::Char('c')));
        assert_eq!(events, vec![PanelEvent::ClockClicked]);
        apply(&mut panel, events);

        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Right)),
            vec![PanelEvent::CalendarKey(CalendarKey::NextMonth)]
        );
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Esc)),
            vec![PanelEvent::CalendarKey(CalendarKey::Escape)]
        );
    }

    #[test]
    fn test_global_keys() {
        let panel = panel();
        let mut app = App::new();

        assert_eq!(app.handle_key(&panel, key(KeyCode::Char('q'))), vec![PanelEvent::Quit]);
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Char('m'))),
            vec![PanelEvent::MenuToggle]
        );
        assert_eq!(
            app.handle_key(&panel, key(KeyCode::Char('2'))),
            vec![PanelEvent::TaskClicked {
                handle: WindowHandle(2)
            }]
        );
        assert!(app.handle_key(&panel, key(KeyCode::Char('9'))).is_empty());

        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        assert_eq!(app.handle_key(&panel, ctrl_c), vec![PanelEvent::Quit]);
    }

    #[test]
    fn test_quit_update_sets_flag() {
        let mut app = App::new();
        app.on_update(&PanelUpdate::TaskbarChanged {
            changes: vec![TaskbarChange::Reset],
        });
        assert!(!app.should_quit);
        app.on_update(&PanelUpdate::Quit);
        assert!(app.should_quit);
    }
}
