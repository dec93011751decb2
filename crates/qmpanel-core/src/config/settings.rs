use crate::Result;
use qmpanel_types::Edge;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub taskbar: TaskbarConfig,

    #[serde(default)]
    pub menu: MenuConfig,

    /// Application ids shown as quick-launch buttons, in order
    #[serde(default)]
    pub quick_launch: Vec<String>,

    /// Commands spawned once at startup
    #[serde(default)]
    pub launch: Vec<String>,

    #[serde(default)]
    pub clock: ClockConfig,
}

impl Config {
    /// Load config from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    #[serde(default)]
    pub edge: Edge,

    /// Panel thickness in frontend units (rows for the terminal frontend)
    #[serde(default = "default_thickness")]
    pub thickness: i32,

    /// Only show windows on the current desktop
    #[serde(default = "default_true")]
    pub per_desktop: bool,

    /// Only show windows on the panel's screen
    #[serde(default)]
    pub per_screen: bool,

    /// Output the panel lives on; `None` follows the focused output
    #[serde(default)]
    pub output: Option<String>,
}

fn default_thickness() -> i32 {
    1
}
fn default_true() -> bool {
    true
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            edge: Edge::default(),
            thickness: default_thickness(),
            per_desktop: true,
            per_screen: false,
            output: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskbarConfig {
    #[serde(default = "default_button_width")]
    pub button_width: i32,

    /// Hover time before a drag over a button raises its window
    #[serde(default = "default_drag_delay")]
    pub drag_activate_delay_ms: u64,

    #[serde(default = "default_true")]
    pub middle_click_close: bool,
}

fn default_button_width() -> i32 {
    24
}
fn default_drag_delay() -> u64 {
    500
}

impl TaskbarConfig {
    #[must_use]
    pub fn drag_activate_delay(&self) -> Duration {
        Duration::from_millis(self.drag_activate_delay_ms)
    }
}

impl Default for TaskbarConfig {
    fn default() -> Self {
        Self {
            button_width: default_button_width(),
            drag_activate_delay_ms: default_drag_delay(),
            middle_click_close: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    /// Application ids pinned above the categories, in order
    #[serde(default)]
    pub pinned: Vec<String>,

    #[serde(default = "default_menu_width")]
    pub width: i32,

    #[serde(default = "default_max_rows")]
    pub max_visible_rows: usize,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_menu_width() -> i32 {
    36
}
fn default_max_rows() -> usize {
    20
}
fn default_placeholder() -> String {
    "Search".to_string()
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            pinned: Vec::new(),
            width: default_menu_width(),
            max_visible_rows: default_max_rows(),
            placeholder: default_placeholder(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockConfig {
    /// `chrono` strftime format
    #[serde(default = "default_clock_format")]
    pub format: String,

    #[serde(default)]
    pub first_weekday: FirstWeekday,
}

fn default_clock_format() -> String {
    "%H:%M".to_string()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            format: default_clock_format(),
            first_weekday: FirstWeekday::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstWeekday {
    #[default]
    Monday,
    Sunday,
}

impl From<FirstWeekday> for chrono::Weekday {
    fn from(day: FirstWeekday) -> Self {
        match day {
            FirstWeekday::Monday => chrono::Weekday::Mon,
            FirstWeekday::Sunday => chrono::Weekday::Sun,
        }
    }
}
