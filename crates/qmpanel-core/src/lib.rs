pub mod config;
pub mod launch;
pub mod menu;
pub mod window;

mod clock;
mod error;
mod item;
mod panel;
mod popup;
mod quick_launch;

#[cfg(test)]
mod tests;

pub use clock::{Calendar, Clock};
pub use error::{Error, Result};
pub use item::{ButtonView, ItemInput, ItemView, LayoutContext, PanelItem, PointerButton, layout};
pub use panel::{CalendarKey, Panel, PanelEvent, PanelUpdate, TaskMenu};
pub use popup::{PanelGeometry, calc_popup_pos};
pub use quick_launch::QuickLaunch;

pub use qmpanel_types::*;
