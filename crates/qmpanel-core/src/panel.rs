//! The panel dispatcher.
//!
//! [`Panel`] owns every component and is driven by [`PanelEvent`]s, handled
//! strictly in delivery order on a single task. Results are reported as
//! [`PanelUpdate`]s over a channel; window changes are requested from the
//! window system as fire-and-forget commands.

use crate::clock::Clock;
use crate::config::Config;
use crate::item::{LayoutContext, PanelItem, layout};
use crate::menu::{ApplicationDatabase, MainMenu, MenuAction, MenuKey, MenuResponse, MenuTree};
use crate::popup::PanelGeometry;
use crate::quick_launch::QuickLaunch;
use crate::window::{
    DragState, DragTimer, FilterContext, TaskAction, TaskbarChange, WindowRegistry, WindowSystem,
};
use qmpanel_types::{Rect, Size, WindowCommand, WindowEvent, WindowHandle};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, trace};

/// Keys handled while the calendar popup is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKey {
    Escape,
    PrevMonth,
    NextMonth,
}

/// Input to the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// Notification from the window system
    Window(WindowEvent),

    DragEnter {
        handle: WindowHandle,
    },
    DragLeave {
        handle: WindowHandle,
    },
    Drop {
        handle: WindowHandle,
    },
    /// Posted by a drag-hover timer
    DragHoverElapsed {
        handle: WindowHandle,
        generation: u64,
    },

    TaskClicked {
        handle: WindowHandle,
    },
    TaskMiddleClicked {
        handle: WindowHandle,
    },
    /// Open the context menu of a task button
    TaskContextMenu {
        handle: WindowHandle,
    },
    /// An entry of the task context menu was chosen
    TaskAction {
        handle: WindowHandle,
        action: TaskAction,
    },
    TaskMenuDismissed,

    MenuToggle,
    MenuKey(MenuKey),
    /// The frontend's search field was edited
    MenuQueryChanged {
        query: String,
    },
    /// A row of the main menu was clicked
    MenuActivateRow {
        row: usize,
    },
    /// Focus left the menu or the user clicked outside it
    MenuDismissed,

    QuickLaunchClicked {
        index: usize,
    },

    ClockTick,
    ClockClicked,
    CalendarKey(CalendarKey),

    GeometryChanged(PanelGeometry),
    ConfigReloaded(Box<Config>),

    Quit,
}

/// Output of the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelUpdate {
    TaskbarChanged {
        changes: Vec<TaskbarChange>,
    },
    /// Drag hover or other per-button decoration changed
    TaskButtonChanged {
        handle: WindowHandle,
    },
    TaskMenuShown {
        handle: WindowHandle,
        actions: Vec<TaskAction>,
        rect: Rect,
    },
    TaskMenuHidden,

    MenuShown {
        rect: Rect,
    },
    MenuMoved {
        rect: Rect,
    },
    /// Rows, query or selection of the open menu changed
    MenuChanged,
    MenuHidden,

    /// Start an application
    Launch {
        action: Arc<MenuAction>,
    },

    /// Quick launch or other fixed items changed size
    LayoutChanged,

    ClockChanged {
        text: String,
    },
    CalendarShown {
        rect: Rect,
    },
    CalendarChanged,
    CalendarHidden,

    Quit,
}

/// Open context menu of a task button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMenu {
    pub handle: WindowHandle,
    pub actions: Vec<TaskAction>,
    pub rect: Rect,
}

pub struct Panel {
    config: Config,
    database: Box<dyn ApplicationDatabase>,
    windows: Box<dyn WindowSystem>,

    registry: WindowRegistry,
    menu: MainMenu,
    quick_launch: QuickLaunch,
    clock: Clock,
    task_menu: Option<TaskMenu>,

    geometry: PanelGeometry,
    drag_generation: u64,

    update_tx: UnboundedSender<PanelUpdate>,
    event_tx: UnboundedSender<PanelEvent>,
    event_rx: Option<UnboundedReceiver<PanelEvent>>,
}

impl Panel {
    /// Create a panel and the receiver for its updates.
    pub fn new(
        config: Config,
        database: Box<dyn ApplicationDatabase>,
        windows: Box<dyn WindowSystem>,
    ) -> (Self, UnboundedReceiver<PanelUpdate>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let registry = WindowRegistry::new(FilterContext {
            per_desktop: config.panel.per_desktop,
            per_screen: config.panel.per_screen,
            output: config.panel.output.clone(),
            ..Default::default()
        });
        let menu = MainMenu::new(
            MenuTree::build(database.as_ref(), &config.menu.pinned),
            config.menu.clone(),
        );
        let quick_launch = QuickLaunch::build(database.as_ref(), &config.quick_launch);
        let clock = Clock::new(&config.clock);
        let geometry = PanelGeometry {
            edge: config.panel.edge,
            ..Default::default()
        };

        (
            Self {
                config,
                database,
                windows,
                registry,
                menu,
                quick_launch,
                clock,
                task_menu: None,
                geometry,
                drag_generation: 0,
                update_tx,
                event_tx,
                event_rx: Some(event_rx),
            },
            update_rx,
        )
    }

    /// Sender for events posted back into the panel (timers, adapters).
    #[must_use]
    pub fn event_sender(&self) -> UnboundedSender<PanelEvent> {
        self.event_tx.clone()
    }

    /// Receiver of events posted through [`event_sender`](Self::event_sender).
    /// Can be taken once.
    pub fn take_event_receiver(&mut self) -> Option<UnboundedReceiver<PanelEvent>> {
        self.event_rx.take()
    }

    /// Populate the taskbar and format the clock.
    pub fn start(&mut self) {
        info!("Starting panel");
        let changes = self.registry.populate(self.windows.as_ref());
        self.send_update(PanelUpdate::TaskbarChanged { changes });
        self.tick_clock();
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    #[must_use]
    pub fn menu(&self) -> &MainMenu {
        &self.menu
    }

    #[must_use]
    pub fn quick_launch(&self) -> &QuickLaunch {
        &self.quick_launch
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn task_menu(&self) -> Option<&TaskMenu> {
        self.task_menu.as_ref()
    }

    #[must_use]
    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Items in strip order.
    #[must_use]
    pub fn items(&self) -> [&dyn PanelItem; 4] {
        [
            &self.menu,
            &self.quick_launch,
            &self.registry,
            &self.clock,
        ]
    }

    #[must_use]
    pub fn layout_context(&self) -> LayoutContext {
        LayoutContext {
            orientation: self.geometry.edge.orientation(),
            thickness: self.config.panel.thickness,
            button_width: self.config.taskbar.button_width,
        }
    }

    /// Rectangles of the items along the panel strip.
    #[must_use]
    pub fn item_rects(&self) -> Vec<Rect> {
        layout(&self.items(), self.geometry.panel, &self.layout_context())
    }

    fn item_rect(&self, index: usize) -> Rect {
        self.item_rects().get(index).copied().unwrap_or_default()
    }

    fn task_button_rect(&self, handle: WindowHandle) -> Rect {
        let ctx = self.layout_context();
        let taskbar = self.item_rect(2);
        self.registry
            .buttons()
            .iter()
            .position(|b| b.handle() == handle)
            .and_then(|i| self.registry.slot_rects(taskbar, &ctx).get(i).copied())
            .unwrap_or(taskbar)
    }

    fn send_update(&self, update: PanelUpdate) {
        if let Err(e) = self.update_tx.send(update) {
            error!("Failed to send update: {}", e);
        }
    }

    fn send_command(&self, command: WindowCommand) {
        debug!("Window command {:?}", command);
        self.windows.send(command);
    }

    /// Handle one event.
    pub fn process(&mut self, event: PanelEvent) {
        trace!("Processing {:?}", event);
        match event {
            PanelEvent::Window(event) => self.handle_window_event(event),

            PanelEvent::DragEnter { handle } => self.handle_drag_enter(handle),
            PanelEvent::DragLeave { handle } | PanelEvent::Drop { handle } => {
                self.handle_drag_leave(handle);
            }
            PanelEvent::DragHoverElapsed { handle, generation } => {
                self.handle_drag_elapsed(handle, generation);
            }

            PanelEvent::TaskClicked { handle } => {
                if let Some(button) = self.registry.button(handle) {
                    self.send_command(button.click());
                }
            }
            PanelEvent::TaskMiddleClicked { handle } => {
                if self.config.taskbar.middle_click_close
                    && let Some(button) = self.registry.button(handle)
                {
                    self.send_command(button.close());
                }
            }
            PanelEvent::TaskContextMenu { handle } => self.show_task_menu(handle),
            PanelEvent::TaskAction { handle, action } => {
                self.hide_task_menu();
                if self.registry.contains(handle) {
                    self.send_command(action.command(handle));
                }
            }
            PanelEvent::TaskMenuDismissed => self.hide_task_menu(),

            PanelEvent::MenuToggle => self.toggle_menu(),
            PanelEvent::MenuKey(key) => {
                if self.menu.is_visible() {
                    let response = self.menu.handle_key(key);
                    self.apply_menu_response(response);
                }
            }
            PanelEvent::MenuQueryChanged { query } => {
                if self.menu.is_visible() {
                    let response = self.menu.set_query(query);
                    self.apply_menu_response(response);
                }
            }
            PanelEvent::MenuActivateRow { row } => {
                if self.menu.is_visible() {
                    let response = self.menu.activate_row(row);
                    self.apply_menu_response(response);
                }
            }
            PanelEvent::MenuDismissed => self.hide_menu(),

            PanelEvent::QuickLaunchClicked { index } => {
                if let Some(action) = self.quick_launch.get(index) {
                    self.send_update(PanelUpdate::Launch {
                        action: Arc::clone(action),
                    });
                }
            }

            PanelEvent::ClockTick => self.tick_clock(),
            PanelEvent::ClockClicked => self.toggle_calendar(),
            PanelEvent::CalendarKey(key) => self.handle_calendar_key(key),

            PanelEvent::GeometryChanged(geometry) => self.set_geometry(geometry),
            PanelEvent::ConfigReloaded(config) => self.reload_config(*config),

            PanelEvent::Quit => {
                info!("Quit requested");
                self.send_update(PanelUpdate::Quit);
            }
        }
    }

    fn handle_window_event(&mut self, event: WindowEvent) {
        if let WindowEvent::Removed { handle } = event
            && self.task_menu.as_ref().is_some_and(|m| m.handle == handle)
        {
            self.hide_task_menu();
        }

        let ws = self.windows.as_ref();
        let changes = match event {
            WindowEvent::Added { handle } => self.registry.on_window_added(ws, handle),
            WindowEvent::Removed { handle } => self.registry.on_window_removed(handle),
            WindowEvent::ActiveChanged { handle } => {
                self.registry.on_active_window_changed(handle)
            }
            WindowEvent::Changed { handle, props } => {
                self.registry.on_window_changed(ws, handle, props)
            }
            WindowEvent::CurrentDesktopChanged { desktop } => {
                self.registry.on_current_desktop_changed(ws, desktop)
            }
            WindowEvent::CurrentScreenChanged { screen } => {
                self.registry.on_current_screen_changed(ws, screen)
            }
        };

        if !changes.is_empty() {
            self.send_update(PanelUpdate::TaskbarChanged { changes });
        }
    }

    fn handle_drag_enter(&mut self, handle: WindowHandle) {
        let Some(button) = self.registry.button(handle) else {
            return;
        };
        if button.drag_state() != DragState::Idle {
            return;
        }

        // Only one button may have an armed timer.
        self.registry.cancel_drags();

        self.drag_generation += 1;
        let generation = self.drag_generation;
        let timer = DragTimer::start(
            self.config.taskbar.drag_activate_delay(),
            generation,
            self.event_tx.clone(),
            PanelEvent::DragHoverElapsed { handle, generation },
        );

        if let Some(button) = self.registry.button_mut(handle)
            && button.drag_enter(timer)
        {
            self.send_update(PanelUpdate::TaskButtonChanged { handle });
        }
    }

    fn handle_drag_leave(&mut self, handle: WindowHandle) {
        if let Some(button) = self.registry.button_mut(handle)
            && button.drag_state() != DragState::Idle
        {
            button.drag_leave();
            self.send_update(PanelUpdate::TaskButtonChanged { handle });
        }
    }

    fn handle_drag_elapsed(&mut self, handle: WindowHandle, generation: u64) {
        let command = self
            .registry
            .button_mut(handle)
            .and_then(|button| button.drag_elapsed(generation));

        if let Some(command) = command {
            self.send_command(command);
            self.send_update(PanelUpdate::TaskButtonChanged { handle });
        }
    }

    fn show_task_menu(&mut self, handle: WindowHandle) {
        let Some(button) = self.registry.button(handle) else {
            return;
        };
        let actions = button.context_actions(&self.windows.desktops());

        self.hide_menu();
        self.hide_calendar();

        let width = actions
            .iter()
            .map(|a| a.label().chars().count())
            .max()
            .unwrap_or(0)
            + 4;
        let size = Size::new(
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(actions.len() + 2).unwrap_or(i32::MAX),
        );
        let rect = self
            .geometry
            .popup_rect(self.task_button_rect(handle), size);

        self.task_menu = Some(TaskMenu {
            handle,
            actions: actions.clone(),
            rect,
        });
        self.send_update(PanelUpdate::TaskMenuShown {
            handle,
            actions,
            rect,
        });
    }

    fn hide_task_menu(&mut self) {
        if self.task_menu.take().is_some() {
            self.send_update(PanelUpdate::TaskMenuHidden);
        }
    }

    fn toggle_menu(&mut self) {
        if self.menu.is_visible() {
            self.hide_menu();
            return;
        }

        self.hide_task_menu();
        self.hide_calendar();

        let anchor = self.item_rect(0);
        let rect = self.menu.show(anchor, &self.geometry);
        self.send_update(PanelUpdate::MenuShown { rect });
    }

    fn hide_menu(&mut self) {
        if self.menu.is_visible() {
            self.menu.hide();
            self.send_update(PanelUpdate::MenuHidden);
        }
    }

    fn apply_menu_response(&mut self, response: MenuResponse) {
        match response {
            MenuResponse::Unchanged => {}
            MenuResponse::Relayout => {
                if let Some(rect) = self.menu.reposition(&self.geometry) {
                    self.send_update(PanelUpdate::MenuMoved { rect });
                }
                self.send_update(PanelUpdate::MenuChanged);
            }
            MenuResponse::Hide => self.send_update(PanelUpdate::MenuHidden),
            MenuResponse::Launch(action) => {
                self.send_update(PanelUpdate::MenuHidden);
                self.send_update(PanelUpdate::Launch { action });
            }
        }
    }

    fn tick_clock(&mut self) {
        if self.clock.tick(&chrono::Local::now()) {
            self.send_update(PanelUpdate::ClockChanged {
                text: self.clock.text().to_string(),
            });
        }
    }

    fn toggle_calendar(&mut self) {
        if self.clock.is_calendar_open() {
            self.hide_calendar();
            return;
        }

        self.hide_menu();
        self.hide_task_menu();

        let today = chrono::Local::now().date_naive();
        let anchor = self.item_rect(3);
        if let Some(rect) = self.clock.toggle_calendar(today, anchor, &self.geometry) {
            self.send_update(PanelUpdate::CalendarShown { rect });
        }
    }

    fn hide_calendar(&mut self) {
        if self.clock.close_calendar() {
            self.send_update(PanelUpdate::CalendarHidden);
        }
    }

    fn handle_calendar_key(&mut self, key: CalendarKey) {
        let Some(calendar) = self.clock.calendar_mut() else {
            return;
        };
        match key {
            CalendarKey::PrevMonth => calendar.prev_month(),
            CalendarKey::NextMonth => calendar.next_month(),
            CalendarKey::Escape => {
                self.hide_calendar();
                return;
            }
        }
        self.send_update(PanelUpdate::CalendarChanged);
    }

    fn set_geometry(&mut self, geometry: PanelGeometry) {
        if geometry == self.geometry {
            return;
        }
        debug!("Panel geometry {:?}", geometry);
        self.geometry = geometry;

        if let Some(rect) = self.menu.reposition(&self.geometry) {
            self.send_update(PanelUpdate::MenuMoved { rect });
        }
        if let Some(rect) = self.clock.calendar_rect(&self.geometry) {
            self.send_update(PanelUpdate::CalendarShown { rect });
        }
        if let Some(handle) = self.task_menu.as_ref().map(|m| m.handle) {
            self.show_task_menu(handle);
        }
    }

    fn reload_config(&mut self, config: Config) {
        info!("Applying reloaded config");

        self.menu.rebuild(
            MenuTree::build(self.database.as_ref(), &config.menu.pinned),
            config.menu.clone(),
        );
        self.quick_launch = QuickLaunch::build(self.database.as_ref(), &config.quick_launch);
        self.clock.set_config(&config.clock);
        self.geometry.edge = config.panel.edge;

        let mut changes = self.registry.set_filtering(
            self.windows.as_ref(),
            config.panel.per_desktop,
            config.panel.per_screen,
        );
        changes.extend(
            self.registry
                .set_output(self.windows.as_ref(), config.panel.output.clone()),
        );
        self.config = config;

        if !changes.is_empty() {
            self.send_update(PanelUpdate::TaskbarChanged { changes });
        }
        if self.menu.is_visible() {
            self.apply_menu_response(MenuResponse::Relayout);
        }
        self.tick_clock();
        self.send_update(PanelUpdate::LayoutChanged);
    }
}
