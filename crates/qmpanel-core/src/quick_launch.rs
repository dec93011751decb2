use crate::menu::{ApplicationDatabase, MenuAction};
use std::sync::Arc;
use tracing::debug;

/// Ordered launcher buttons for configured application ids.
#[derive(Debug, Clone, Default)]
pub struct QuickLaunch {
    actions: Vec<Arc<MenuAction>>,
}

impl QuickLaunch {
    /// Resolve `ids` in order. Ids the database does not know are left out.
    pub fn build(db: &dyn ApplicationDatabase, ids: &[String]) -> Self {
        let actions = ids
            .iter()
            .filter_map(|id| {
                let action = db.resolve(id);
                if action.is_none() {
                    debug!("Quick launch: no application {}", id);
                }
                action
            })
            .collect();
        Self { actions }
    }

    #[must_use]
    pub fn actions(&self) -> &[Arc<MenuAction>] {
        &self.actions
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<MenuAction>> {
        self.actions.get(index)
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
