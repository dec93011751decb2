use super::ApplicationDatabase;
use qmpanel_types::Icon;
use std::sync::Arc;
use tracing::debug;

/// A launchable application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuAction {
    /// Desktop file id, e.g. `firefox.desktop`
    pub id: String,
    pub display_name: String,
    pub icon: Icon,
    /// Main category the action is listed under
    pub category: String,
    /// Command line with field codes already stripped
    pub command: String,
    pub comment: Option<String>,
}

/// A category of the browse view with its actions in display order.
#[derive(Debug, Clone)]
pub struct MenuCategory {
    pub name: String,
    pub icon: Icon,
    pub actions: Vec<Arc<MenuAction>>,
}

/// A row of the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Category {
        index: usize,
        name: String,
        icon: Icon,
        expanded: bool,
    },
    SearchField {
        query: String,
    },
    SearchResult {
        action: Arc<MenuAction>,
    },
    Action {
        action: Arc<MenuAction>,
    },
}

impl MenuEntry {
    /// Rows the selection can rest on.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !matches!(self, Self::SearchField { .. })
    }

    #[must_use]
    pub fn action(&self) -> Option<&Arc<MenuAction>> {
        match self {
            Self::SearchResult { action } | Self::Action { action } => Some(action),
            Self::Category { .. } | Self::SearchField { .. } => None,
        }
    }
}

/// Pinned actions followed by categories, as read from the database.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    pub pinned: Vec<Arc<MenuAction>>,
    pub categories: Vec<MenuCategory>,
}

impl MenuTree {
    /// Resolve pinned ids and list every non-empty category.
    /// Unresolvable pinned ids are skipped.
    pub fn build(db: &dyn ApplicationDatabase, pinned: &[String]) -> Self {
        let pinned = pinned
            .iter()
            .filter_map(|id| {
                let action = db.resolve(id);
                if action.is_none() {
                    debug!("Pinned application {} not found", id);
                }
                action
            })
            .collect();

        let categories = db
            .categories()
            .into_iter()
            .filter_map(|name| {
                let actions = db.list_by_category(&name);
                if actions.is_empty() {
                    return None;
                }
                Some(MenuCategory {
                    icon: db.icon_for(category_icon(&name)),
                    name,
                    actions,
                })
            })
            .collect();

        Self { pinned, categories }
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.pinned.len()
            + self
                .categories
                .iter()
                .map(|c| c.actions.len())
                .sum::<usize>()
    }
}

/// Themed icon name for a main category.
#[must_use]
pub fn category_icon(category: &str) -> &'static str {
    match category {
        "Multimedia" => "applications-multimedia",
        "Development" => "applications-development",
        "Education" => "applications-science",
        "Games" => "applications-games",
        "Graphics" => "applications-graphics",
        "Internet" => "applications-internet",
        "Office" => "applications-office",
        "Settings" => "preferences-desktop",
        "System" => "applications-system",
        "Accessories" => "applications-accessories",
        _ => "applications-other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::InMemoryDatabase;

    #[test]
    fn test_build_skips_unresolvable_pinned() {
        let mut db = InMemoryDatabase::new();
        db.add("firefox.desktop", "Firefox", "Internet");
        db.add("foot.desktop", "Foot", "System");

        let tree = MenuTree::build(
            &db,
            &["missing.desktop".to_string(), "foot.desktop".to_string()],
        );

        assert_eq!(tree.pinned.len(), 1);
        assert_eq!(tree.pinned[0].id, "foot.desktop");
        assert_eq!(tree.categories.len(), 2);
        assert_eq!(tree.action_count(), 3);
    }

    #[test]
    fn test_category_icons() {
        assert_eq!(category_icon("Internet"), "applications-internet");
        assert_eq!(category_icon("Whatever"), "applications-other");
    }

    #[test]
    fn test_search_field_is_not_selectable() {
        assert!(
            !MenuEntry::SearchField {
                query: String::new()
            }
            .is_selectable()
        );
    }
}
