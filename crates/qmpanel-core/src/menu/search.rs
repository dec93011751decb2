use super::{MenuAction, MenuTree};
use nucleo_matcher::pattern::{Atom, AtomKind, CaseMatching, Normalization};
use nucleo_matcher::{Config, Matcher, Utf32Str};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Flat list of every launchable action, filtered per keystroke.
///
/// An action matches when its display name contains the query as a
/// case-insensitive substring. Matches keep index order; there is no ranking.
pub struct SearchIndex {
    actions: Vec<Arc<MenuAction>>,
    matcher: Matcher,
    buf: Vec<char>,
}

impl SearchIndex {
    /// Index pinned actions, then every category. Duplicate ids keep their
    /// first occurrence.
    #[must_use]
    pub fn build(tree: &MenuTree) -> Self {
        let mut seen = HashSet::new();
        let actions = tree
            .pinned
            .iter()
            .chain(tree.categories.iter().flat_map(|c| c.actions.iter()))
            .filter(|a| seen.insert(a.id.clone()))
            .cloned()
            .collect();

        Self::from_actions(actions)
    }

    #[must_use]
    pub fn from_actions(actions: Vec<Arc<MenuAction>>) -> Self {
        Self {
            actions,
            matcher: Matcher::new(Config::DEFAULT),
            buf: Vec::new(),
        }
    }

    #[must_use]
    pub fn actions(&self) -> &[Arc<MenuAction>] {
        &self.actions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions whose display name contains `query`, in index order.
    pub fn filter(&mut self, query: &str) -> Vec<Arc<MenuAction>> {
        if query.is_empty() {
            return self.actions.clone();
        }

        // Fold both sides with full lowercase mapping; nucleo only folds per char.
        let needle = query.to_lowercase();
        let atom = Atom::new(
            &needle,
            CaseMatching::Ignore,
            Normalization::Never,
            AtomKind::Substring,
            false,
        );

        let matches: Vec<_> = self
            .actions
            .iter()
            .filter(|action| {
                let name = &action.display_name;
                let haystack = if name.is_ascii() {
                    Utf32Str::Ascii(name.as_bytes())
                } else {
                    // Keep every char; grapheme folding would drop combining marks.
                    self.buf.clear();
                    self.buf.extend(name.to_lowercase().chars());
                    Utf32Str::Unicode(&self.buf)
                };
                atom.score(haystack, &mut self.matcher).is_some()
            })
            .cloned()
            .collect();

        trace!("Query {:?} matched {} actions", query, matches.len());
        matches
    }
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{InMemoryDatabase, MenuTree};

    fn index(names: &[&str]) -> SearchIndex {
        let mut db = InMemoryDatabase::new();
        for name in names {
            db.add(&format!("{}.desktop", name.to_lowercase()), name, "Other");
        }
        SearchIndex::build(&MenuTree::build(&db, &[]))
    }

    fn names(actions: &[Arc<MenuAction>]) -> Vec<&str> {
        actions.iter().map(|a| a.display_name.as_str()).collect()
    }

    #[test]
    fn test_substring_is_case_insensitive() {
        let mut index = index(&["Firefox", "FILEMANAGER", "Bonfire", "Terminal"]);
        assert_eq!(names(&index.filter("fire")), vec!["Firefox", "Bonfire"]);
        assert_eq!(names(&index.filter("FIRE")), vec!["Firefox", "Bonfire"]);
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let mut index = index(&["Firefox", "Terminal"]);
        assert!(index.filter("ffx").is_empty());
        assert!(index.filter("trml").is_empty());
    }

    #[test]
    fn test_results_keep_index_order() {
        let mut index = index(&["Text Editor", "Editor", "Hex Editor"]);
        assert_eq!(
            names(&index.filter("editor")),
            vec!["Text Editor", "Editor", "Hex Editor"]
        );
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let mut index = index(&["A", "B"]);
        assert_eq!(index.filter("").len(), 2);
    }

    #[test]
    fn test_build_deduplicates_pinned() {
        let mut db = InMemoryDatabase::new();
        db.add("firefox.desktop", "Firefox", "Internet");
        db.add("foot.desktop", "Foot", "System");

        let tree = MenuTree::build(&db, &["firefox.desktop".to_string()]);
        let index = SearchIndex::build(&tree);

        assert_eq!(index.len(), 2);
        assert_eq!(index.actions()[0].id, "firefox.desktop");
    }

    #[test]
    fn test_combining_marks_are_matched_literally() {
        let mut index = index(&["Cafe\u{301} Manager", "Cafe Tycoon"]);
        assert_eq!(names(&index.filter("e\u{301}")), vec!["Cafe\u{301} Manager"]);
        assert_eq!(names(&index.filter("CAFE\u{301}")), vec!["Cafe\u{301} Manager"]);
        assert_eq!(names(&index.filter("cafe")).len(), 2);
    }

    #[test]
    fn test_joined_emoji_parts_are_searchable() {
        let mut index = index(&["\u{1f468}\u{200d}\u{1f4bb} Dev Tools", "Terminal"]);
        assert_eq!(
            names(&index.filter("\u{1f4bb}")),
            vec!["\u{1f468}\u{200d}\u{1f4bb} Dev Tools"]
        );
    }

    #[test]
    fn test_multi_char_lowercase_mapping() {
        let mut index = index(&["\u{130}nternet", "Intranet"]);
        assert_eq!(names(&index.filter("i\u{307}n")), vec!["\u{130}nternet"]);
        assert_eq!(names(&index.filter("\u{130}N")), vec!["\u{130}nternet"]);
    }

    #[test]
    fn test_query_with_spaces_is_literal() {
        let mut index = index(&["Text Editor", "Editor Text"]);
        assert_eq!(names(&index.filter("text e")), vec!["Text Editor"]);
    }
}
