use super::MenuAction;
use qmpanel_types::Icon;
use std::sync::Arc;

/// Source of launchable applications.
pub trait ApplicationDatabase: Send {
    /// Look up an action by its desktop file id.
    fn resolve(&self, id: &str) -> Option<Arc<MenuAction>>;

    /// Category names in display order.
    fn categories(&self) -> Vec<String>;

    /// Actions of one category in display order.
    fn list_by_category(&self, category: &str) -> Vec<Arc<MenuAction>>;

    /// Resolve a themed icon.
    fn icon_for(&self, name: &str) -> Icon;
}

/// Application database held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    actions: Vec<Arc<MenuAction>>,
}

impl InMemoryDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: MenuAction) {
        self.actions.retain(|a| a.id != action.id);
        self.actions.push(Arc::new(action));
    }

    /// Convenience for a plain action whose command is its lowercased name.
    pub fn add(&mut self, id: &str, name: &str, category: &str) {
        self.insert(MenuAction {
            id: id.to_string(),
            display_name: name.to_string(),
            icon: Icon::named(id.trim_end_matches(".desktop")),
            category: category.to_string(),
            command: name.to_lowercase(),
            comment: None,
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl FromIterator<MenuAction> for InMemoryDatabase {
    fn from_iter<I: IntoIterator<Item = MenuAction>>(iter: I) -> Self {
        let mut db = Self::new();
        for action in iter {
            db.insert(action);
        }
        db
    }
}

impl ApplicationDatabase for InMemoryDatabase {
    fn resolve(&self, id: &str) -> Option<Arc<MenuAction>> {
        self.actions.iter().find(|a| a.id == id).cloned()
    }

    fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for action in &self.actions {
            if !categories.contains(&action.category) {
                categories.push(action.category.clone());
            }
        }
        categories
    }

    fn list_by_category(&self, category: &str) -> Vec<Arc<MenuAction>> {
        self.actions
            .iter()
            .filter(|a| a.category == category)
            .cloned()
            .collect()
    }

    fn icon_for(&self, name: &str) -> Icon {
        Icon::named(name)
    }
}
