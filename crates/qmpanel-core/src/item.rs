//! Uniform interface of the widgets living on the panel strip.

use crate::clock::Clock;
use crate::menu::MainMenu;
use crate::panel::PanelEvent;
use crate::quick_launch::QuickLaunch;
use crate::window::{DragState, WindowRegistry};
use qmpanel_types::{Icon, Orientation, Rect, Size, WindowHandle};

/// Pointer buttons the panel distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// Raw input on one slot of an item, as hit-tested by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemInput {
    Press { slot: usize, button: PointerButton },
    DragEnter { slot: usize },
    DragLeave { slot: usize },
    Drop { slot: usize },
}

/// Layout parameters shared by all items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutContext {
    pub orientation: Orientation,
    /// Panel extent across its orientation
    pub thickness: i32,
    /// Preferred length of a task button
    pub button_width: i32,
}

/// One clickable button as shown by a frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonView {
    pub label: String,
    pub icon: Icon,
    pub active: bool,
    pub urgent: bool,
    pub minimized: bool,
    pub drag_hover: bool,
}

/// What an item wants drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemView {
    MenuButton { label: String, open: bool },
    QuickLaunch { buttons: Vec<ButtonView> },
    Taskbar { buttons: Vec<ButtonView> },
    Clock { text: String, calendar_open: bool },
}

pub trait PanelItem {
    /// Size along and across the panel.
    fn preferred_size(&self, ctx: &LayoutContext) -> Size;

    /// Whether the item takes the space left over by the others.
    fn stretches(&self) -> bool {
        false
    }

    /// Hit areas inside `rect`, one per slot.
    fn slot_rects(&self, rect: Rect, _ctx: &LayoutContext) -> Vec<Rect> {
        vec![rect]
    }

    fn render(&self) -> ItemView;

    /// Translate input on a slot into panel events.
    fn handle_input(&self, input: ItemInput) -> Vec<PanelEvent>;
}

fn oriented(ctx: &LayoutContext, length: i32) -> Size {
    match ctx.orientation {
        Orientation::Horizontal => Size::new(length, ctx.thickness),
        Orientation::Vertical => Size::new(ctx.thickness, length),
    }
}

fn length_of(ctx: &LayoutContext, size: Size) -> i32 {
    match ctx.orientation {
        Orientation::Horizontal => size.width,
        Orientation::Vertical => size.height,
    }
}

/// Sub-rectangle of `strip` starting `offset` along it, `length` long.
fn segment(strip: Rect, orientation: Orientation, offset: i32, length: i32) -> Rect {
    match orientation {
        Orientation::Horizontal => Rect::new(strip.x + offset, strip.y, length, strip.height),
        Orientation::Vertical => Rect::new(strip.x, strip.y + offset, strip.width, length),
    }
}

fn len_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Lay `items` out along `strip`. Fixed items get their preferred length,
/// stretching items share what is left.
#[must_use]
pub fn layout(items: &[&dyn PanelItem], strip: Rect, ctx: &LayoutContext) -> Vec<Rect> {
    let total = length_of(ctx, strip.size());
    let fixed: i32 = items
        .iter()
        .filter(|item| !item.stretches())
        .map(|item| length_of(ctx, item.preferred_size(ctx)))
        .sum();
    let stretchers = len_i32(items.iter().filter(|item| item.stretches()).count());
    let spare = (total - fixed).max(0);

    let mut offset = 0;
    items
        .iter()
        .map(|item| {
            let length = if item.stretches() {
                spare / stretchers.max(1)
            } else {
                length_of(ctx, item.preferred_size(ctx))
            };
            let length = length.min((total - offset).max(0));
            let rect = segment(strip, ctx.orientation, offset, length);
            offset += length;
            rect
        })
        .collect()
}

fn equal_slots(rect: Rect, ctx: &LayoutContext, count: usize, preferred: i32) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let available = length_of(ctx, rect.size());
    if available <= 0 || preferred <= 0 {
        return Vec::new();
    }
    // Buttons past the end of the strip get no slot.
    let length = preferred.min(available / len_i32(count)).max(1);
    let fits = usize::try_from(available / length).map_or(0, |n| n.min(count));
    (0..fits)
        .map(|i| segment(rect, ctx.orientation, len_i32(i) * length, length))
        .collect()
}

impl PanelItem for MainMenu {
    fn preferred_size(&self, ctx: &LayoutContext) -> Size {
        let length = match ctx.orientation {
            Orientation::Horizontal => 6,
            Orientation::Vertical => 1,
        };
        oriented(ctx, length)
    }

    fn render(&self) -> ItemView {
        ItemView::MenuButton {
            label: "Menu".to_string(),
            open: self.is_visible(),
        }
    }

    fn handle_input(&self, input: ItemInput) -> Vec<PanelEvent> {
        match input {
            ItemInput::Press {
                button: PointerButton::Left,
                ..
            } => vec![PanelEvent::MenuToggle],
            _ => Vec::new(),
        }
    }
}

const QUICK_LAUNCH_BUTTON: i32 = 3;

impl PanelItem for QuickLaunch {
    fn preferred_size(&self, ctx: &LayoutContext) -> Size {
        let per_button = match ctx.orientation {
            Orientation::Horizontal => QUICK_LAUNCH_BUTTON,
            Orientation::Vertical => 1,
        };
        oriented(ctx, len_i32(self.len()) * per_button)
    }

    fn slot_rects(&self, rect: Rect, ctx: &LayoutContext) -> Vec<Rect> {
        let per_button = length_of(ctx, self.preferred_size(ctx)) / len_i32(self.len()).max(1);
        equal_slots(rect, ctx, self.len(), per_button)
    }

    fn render(&self) -> ItemView {
        ItemView::QuickLaunch {
            buttons: self
                .actions()
                .iter()
                .map(|action| ButtonView {
                    label: action.display_name.clone(),
                    icon: action.icon.clone(),
                    active: false,
                    urgent: false,
                    minimized: false,
                    drag_hover: false,
                })
                .collect(),
        }
    }

    fn handle_input(&self, input: ItemInput) -> Vec<PanelEvent> {
        match input {
            ItemInput::Press {
                slot,
                button: PointerButton::Left,
            } if slot < self.len() => vec![PanelEvent::QuickLaunchClicked { index: slot }],
            _ => Vec::new(),
        }
    }
}

impl WindowRegistry {
    fn handle_at(&self, slot: usize) -> Option<WindowHandle> {
        self.buttons().get(slot).map(crate::window::TaskButton::handle)
    }
}

impl PanelItem for WindowRegistry {
    fn preferred_size(&self, ctx: &LayoutContext) -> Size {
        oriented(ctx, len_i32(self.len()) * ctx.button_width)
    }

    fn stretches(&self) -> bool {
        true
    }

    fn slot_rects(&self, rect: Rect, ctx: &LayoutContext) -> Vec<Rect> {
        let preferred = match ctx.orientation {
            Orientation::Horizontal => ctx.button_width,
            Orientation::Vertical => 1,
        };
        equal_slots(rect, ctx, self.len(), preferred)
    }

    fn render(&self) -> ItemView {
        ItemView::Taskbar {
            buttons: self
                .buttons()
                .iter()
                .map(|button| {
                    let state = button.state();
                    ButtonView {
                        label: state.title.clone(),
                        icon: state.icon.clone(),
                        active: state.is_active,
                        urgent: state.is_urgent,
                        minimized: state.is_minimized,
                        drag_hover: button.drag_state() != DragState::Idle,
                    }
                })
                .collect(),
        }
    }

    fn handle_input(&self, input: ItemInput) -> Vec<PanelEvent> {
        let event = match input {
            ItemInput::Press { slot, button } => {
                self.handle_at(slot).map(|handle| match button {
                    PointerButton::Left => PanelEvent::TaskClicked { handle },
                    PointerButton::Middle => PanelEvent::TaskMiddleClicked { handle },
                    PointerButton::Right => PanelEvent::TaskContextMenu { handle },
                })
            }
            ItemInput::DragEnter { slot } => self
                .handle_at(slot)
                .map(|handle| PanelEvent::DragEnter { handle }),
            ItemInput::DragLeave { slot } => self
                .handle_at(slot)
                .map(|handle| PanelEvent::DragLeave { handle }),
            ItemInput::Drop { slot } => self
                .handle_at(slot)
                .map(|handle| PanelEvent::Drop { handle }),
        };
        event.into_iter().collect()
    }
}

impl PanelItem for Clock {
    fn preferred_size(&self, ctx: &LayoutContext) -> Size {
        let length = match ctx.orientation {
            Orientation::Horizontal => len_i32(self.text().chars().count()) + 2,
            Orientation::Vertical => 1,
        };
        oriented(ctx, length)
    }

    fn render(&self) -> ItemView {
        ItemView::Clock {
            text: self.text().to_string(),
            calendar_open: self.is_calendar_open(),
        }
    }

    fn handle_input(&self, input: ItemInput) -> Vec<PanelEvent> {
        match input {
            ItemInput::Press {
                button: PointerButton::Left,
                ..
            } => vec![PanelEvent::ClockClicked],
            _ => Vec::new(),
        }
    }
}
