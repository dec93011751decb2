use super::{MenuAction, MenuEntry, MenuTree, SearchIndex};
use crate::config::MenuConfig;
use crate::popup::PanelGeometry;
use qmpanel_types::{Rect, Size};
use std::sync::Arc;
use tracing::debug;

/// Which set of rows the menu shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuView {
    /// Pinned actions and the category tree
    #[default]
    Browse,
    /// Actions matching the query
    Search,
}

/// Keys the menu reacts to while it has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKey {
    Escape,
    Enter,
    Up,
    Down,
    Backspace,
    Char(char),
}

/// What the owner of the menu has to do after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuResponse {
    Unchanged,
    /// Rows or size changed; redraw and reposition
    Relayout,
    /// The menu closed
    Hide,
    /// The menu closed after activating an action
    Launch(Arc<MenuAction>),
}

/// Start menu with a browse view and an incremental search view.
#[derive(Debug)]
pub struct MainMenu {
    config: MenuConfig,
    tree: MenuTree,
    expanded: Vec<bool>,
    index: SearchIndex,
    view: MenuView,
    query: String,
    results: Vec<Arc<MenuAction>>,
    /// Index into the selectable rows
    selected: usize,
    visible: bool,
    anchor: Rect,
    geometry: Option<Rect>,
}

impl MainMenu {
    #[must_use]
    pub fn new(tree: MenuTree, config: MenuConfig) -> Self {
        let index = SearchIndex::build(&tree);
        debug!("Main menu built with {} actions", index.len());
        Self {
            config,
            expanded: vec![false; tree.categories.len()],
            tree,
            index,
            view: MenuView::Browse,
            query: String::new(),
            results: Vec::new(),
            selected: 0,
            visible: false,
            anchor: Rect::default(),
            geometry: None,
        }
    }

    /// Replace the menu contents, keeping visibility and the current query.
    pub fn rebuild(&mut self, tree: MenuTree, config: MenuConfig) {
        self.index = SearchIndex::build(&tree);
        self.expanded = vec![false; tree.categories.len()];
        self.tree = tree;
        self.config = config;
        self.results = if self.query.is_empty() {
            Vec::new()
        } else {
            self.index.filter(&self.query)
        };
        self.clamp_selection();
    }

    #[must_use]
    pub fn view(&self) -> MenuView {
        self.view
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    #[must_use]
    pub fn results(&self) -> &[Arc<MenuAction>] {
        &self.results
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Popup rectangle while shown.
    #[must_use]
    pub fn geometry(&self) -> Option<Rect> {
        self.geometry
    }

    #[must_use]
    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    /// Rows in display order, starting with the search field.
    #[must_use]
    pub fn rows(&self) -> Vec<MenuEntry> {
        let mut rows = vec![MenuEntry::SearchField {
            query: self.query.clone(),
        }];

        match self.view {
            MenuView::Search => {
                rows.extend(
                    self.results
                        .iter()
                        .map(|action| MenuEntry::SearchResult {
                            action: Arc::clone(action),
                        }),
                );
            }
            MenuView::Browse => {
                rows.extend(self.tree.pinned.iter().map(|action| MenuEntry::Action {
                    action: Arc::clone(action),
                }));

                for (index, category) in self.tree.categories.iter().enumerate() {
                    let expanded = self.expanded.get(index).copied().unwrap_or(false);
                    rows.push(MenuEntry::Category {
                        index,
                        name: category.name.clone(),
                        icon: category.icon.clone(),
                        expanded,
                    });
                    if expanded {
                        rows.extend(category.actions.iter().map(|action| MenuEntry::Action {
                            action: Arc::clone(action),
                        }));
                    }
                }
            }
        }

        rows
    }

    fn selectable_rows(&self) -> Vec<MenuEntry> {
        self.rows()
            .into_iter()
            .filter(MenuEntry::is_selectable)
            .collect()
    }

    /// Position of the selection among [`rows`](Self::rows), if any row is selectable.
    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        let rows = self.rows();
        rows.iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_selectable())
            .nth(self.selected)
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn selected_entry(&self) -> Option<MenuEntry> {
        self.selectable_rows().into_iter().nth(self.selected)
    }

    fn clamp_selection(&mut self) {
        let count = self.selectable_rows().len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    /// Size including the frame, capped at the configured row count.
    #[must_use]
    pub fn preferred_size(&self) -> Size {
        let rows = self.rows().len().min(self.config.max_visible_rows.saturating_add(1));
        let height = i32::try_from(rows).unwrap_or(i32::MAX).saturating_add(2);
        Size::new(self.config.width, height)
    }

    /// Show the menu next to `anchor` and return its placement.
    pub fn show(&mut self, anchor: Rect, geometry: &PanelGeometry) -> Rect {
        self.visible = true;
        self.anchor = anchor;
        self.selected = 0;
        let rect = geometry.popup_rect(anchor, self.preferred_size());
        self.geometry = Some(rect);
        debug!("Main menu shown at {:?}", rect);
        rect
    }

    /// Hide the menu. The query is always cleared.
    pub fn hide(&mut self) {
        if self.visible {
            debug!("Main menu hidden");
        }
        self.visible = false;
        self.geometry = None;
        self.set_query_inner(String::new());
        self.selected = 0;
    }

    /// Recompute placement after a size or panel change. Returns the new
    /// rectangle when it moved or resized.
    pub fn reposition(&mut self, geometry: &PanelGeometry) -> Option<Rect> {
        if !self.visible {
            return None;
        }
        let rect = geometry.popup_rect(self.anchor, self.preferred_size());
        if self.geometry == Some(rect) {
            return None;
        }
        self.geometry = Some(rect);
        Some(rect)
    }

    /// Replace the query, switching view when it becomes empty or non-empty.
    pub fn set_query(&mut self, query: impl Into<String>) -> MenuResponse {
        let query = query.into();
        if query == self.query {
            return MenuResponse::Unchanged;
        }
        self.set_query_inner(query);
        MenuResponse::Relayout
    }

    fn set_query_inner(&mut self, query: String) {
        self.query = query;

        let view = if self.query.is_empty() {
            MenuView::Browse
        } else {
            MenuView::Search
        };
        if view != self.view {
            debug!("Main menu view {:?} -> {:?}", self.view, view);
            self.view = view;
        }

        self.results = match self.view {
            MenuView::Search => self.index.filter(&self.query),
            MenuView::Browse => Vec::new(),
        };
        self.selected = 0;
    }

    pub fn handle_key(&mut self, key: MenuKey) -> MenuResponse {
        match key {
            MenuKey::Escape => {
                if self.query.is_empty() {
                    self.hide();
                    MenuResponse::Hide
                } else {
                    self.set_query(String::new())
                }
            }
            MenuKey::Enter => self.activate_selected(),
            MenuKey::Up => self.move_selection(-1),
            MenuKey::Down => self.move_selection(1),
            MenuKey::Backspace => {
                let mut query = self.query.clone();
                if query.pop().is_none() {
                    return MenuResponse::Unchanged;
                }
                self.set_query(query)
            }
            MenuKey::Char(c) if !c.is_control() => {
                let mut query = self.query.clone();
                query.push(c);
                self.set_query(query)
            }
            MenuKey::Char(_) => MenuResponse::Unchanged,
        }
    }

    fn move_selection(&mut self, delta: isize) -> MenuResponse {
        let count = self.selectable_rows().len();
        if count == 0 {
            return MenuResponse::Unchanged;
        }
        let next = self
            .selected
            .saturating_add_signed(delta)
            .min(count - 1);
        if next == self.selected {
            return MenuResponse::Unchanged;
        }
        self.selected = next;
        MenuResponse::Relayout
    }

    /// Activate the selected row: launch an action or fold a category.
    pub fn activate_selected(&mut self) -> MenuResponse {
        match self.selected_entry() {
            Some(entry) => self.activate_entry(entry),
            None => MenuResponse::Unchanged,
        }
    }

    /// Activate the row at `row` of [`rows`](Self::rows), e.g. after a click.
    pub fn activate_row(&mut self, row: usize) -> MenuResponse {
        let rows = self.rows();
        let Some(entry) = rows.get(row).cloned() else {
            return MenuResponse::Unchanged;
        };
        if entry.is_selectable() {
            self.selected = rows[..row].iter().filter(|e| e.is_selectable()).count();
        }
        self.activate_entry(entry)
    }

    fn activate_entry(&mut self, entry: MenuEntry) -> MenuResponse {
        match entry {
            MenuEntry::Category { index, .. } => {
                if let Some(expanded) = self.expanded.get_mut(index) {
                    *expanded = !*expanded;
                }
                MenuResponse::Relayout
            }
            MenuEntry::SearchResult { action } | MenuEntry::Action { action } => {
                debug!("Activating {}", action.id);
                self.hide();
                MenuResponse::Launch(action)
            }
            MenuEntry::SearchField { .. } => MenuResponse::Unchanged,
        }
    }
}
