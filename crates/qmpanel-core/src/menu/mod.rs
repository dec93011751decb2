//! Main menu: application database, search index and the browse/search
//! state machine.

mod action;
mod database;
mod desktop_entry;
mod main_menu;
mod search;

pub use action::{MenuAction, MenuCategory, MenuEntry, MenuTree, category_icon};
pub use database::{ApplicationDatabase, InMemoryDatabase};
pub use desktop_entry::DesktopEntryDatabase;
pub use main_menu::{MainMenu, MenuKey, MenuResponse, MenuView};
pub use search::SearchIndex;
