mod dirs;
mod settings;
mod validation;

pub use dirs::Directories;
pub use settings::{ClockConfig, Config, FirstWeekday, MenuConfig, PanelConfig, TaskbarConfig};
pub use validation::warn_unknown_fields;
