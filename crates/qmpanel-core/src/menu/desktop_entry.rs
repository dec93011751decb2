//! Application database backed by freedesktop `.desktop` files.

use super::{ApplicationDatabase, MenuAction};
use crate::{Error, Result};
use qmpanel_types::{FALLBACK_ICON, Icon};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Categories in display order. Entries without a main category go to `Other`.
const CATEGORY_ORDER: &[&str] = &[
    "Accessories",
    "Development",
    "Education",
    "Games",
    "Graphics",
    "Internet",
    "Multimedia",
    "Office",
    "Settings",
    "System",
    "Other",
];

const ICON_SIZE: u16 = 24;

/// Map a freedesktop main category to the menu category it is listed under.
fn main_category(categories: &str) -> &'static str {
    categories
        .split_terminator(';')
        .find_map(|category| match category {
            "AudioVideo" | "Audio" | "Video" => Some("Multimedia"),
            "Development" => Some("Development"),
            "Education" | "Science" => Some("Education"),
            "Game" => Some("Games"),
            "Graphics" => Some("Graphics"),
            "Network" => Some("Internet"),
            "Office" => Some("Office"),
            "Settings" => Some("Settings"),
            "System" => Some("System"),
            "Utility" => Some("Accessories"),
            _ => None,
        })
        .unwrap_or("Other")
}

/// Applications found under the XDG `applications/` directories.
#[derive(Debug, Default)]
pub struct DesktopEntryDatabase {
    by_id: HashMap<String, Arc<MenuAction>>,
    by_category: HashMap<&'static str, Vec<Arc<MenuAction>>>,
}

impl DesktopEntryDatabase {
    /// Scan `dirs` in order; an id found in an earlier directory shadows later ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the field code pattern fails to compile.
    pub fn load(dirs: &[PathBuf]) -> Result<Self> {
        let field_codes =
            Regex::new(r"%[%a-zA-Z]").map_err(|e| Error::DesktopEntry(e.to_string()))?;

        let mut files = Vec::new();
        let mut seen = HashSet::new();
        for dir in dirs {
            collect_entries(dir, dir, &mut seen, &mut files);
        }

        let mut db = Self::default();
        for (id, path) in files {
            match parse_entry(&id, &path, &field_codes) {
                Ok(Some(action)) => db.insert(action),
                Ok(None) => trace!("Skipping hidden entry {}", id),
                Err(e) => warn!("{}", e),
            }
        }

        for actions in db.by_category.values_mut() {
            actions.sort_by_cached_key(|a| a.display_name.to_lowercase());
        }

        debug!(
            "Loaded {} applications from {} directories",
            db.by_id.len(),
            dirs.len()
        );
        Ok(db)
    }

    fn insert(&mut self, mut action: MenuAction) {
        let category = CATEGORY_ORDER
            .iter()
            .copied()
            .find(|c| *c == action.category)
            .unwrap_or("Other");
        action.icon = lookup_icon(&action.icon.name);

        let action = Arc::new(action);
        self.by_id.insert(action.id.clone(), Arc::clone(&action));
        self.by_category.entry(category).or_default().push(action);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ApplicationDatabase for DesktopEntryDatabase {
    fn resolve(&self, id: &str) -> Option<Arc<MenuAction>> {
        self.by_id.get(id).cloned()
    }

    fn categories(&self) -> Vec<String> {
        CATEGORY_ORDER
            .iter()
            .filter(|c| self.by_category.contains_key(*c))
            .map(ToString::to_string)
            .collect()
    }

    fn list_by_category(&self, category: &str) -> Vec<Arc<MenuAction>> {
        self.by_category.get(category).cloned().unwrap_or_default()
    }

    fn icon_for(&self, name: &str) -> Icon {
        lookup_icon(name)
    }
}

/// Recursively collect `*.desktop` files. Ids are relative paths with `/` replaced by `-`.
fn collect_entries(
    root: &Path,
    dir: &Path,
    seen: &mut HashSet<String>,
    out: &mut Vec<(String, PathBuf)>,
) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        trace!("Application directory {} not readable", dir.display());
        return;
    };

    let mut paths: Vec<PathBuf> = read_dir.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_entries(root, &path, seen, out);
            continue;
        }
        if path.extension().is_none_or(|ext| ext != "desktop") {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let id = relative.to_string_lossy().replace('/', "-");
        if seen.insert(id.clone()) {
            out.push((id, path));
        }
    }
}

/// Parse one entry. `Ok(None)` for entries that must not be shown.
fn parse_entry(id: &str, path: &Path, field_codes: &Regex) -> Result<Option<MenuAction>> {
    let entry = freedesktop_entry_parser::parse_entry(path)
        .map_err(|e| Error::DesktopEntry(format!("{}: {e}", path.display())))?;
    let section = entry.section("Desktop Entry");

    if section.attr("Type").is_some_and(|t| t != "Application")
        || section.attr("NoDisplay") == Some("true")
        || section.attr("Hidden") == Some("true")
    {
        return Ok(None);
    }

    let Some(name) = section.attr("Name") else {
        return Err(Error::DesktopEntry(format!(
            "{}: missing Name",
            path.display()
        )));
    };
    let Some(exec) = section.attr("Exec") else {
        return Err(Error::DesktopEntry(format!(
            "{}: missing Exec",
            path.display()
        )));
    };

    Ok(Some(MenuAction {
        id: id.to_string(),
        display_name: name.to_string(),
        icon: Icon::named(section.attr("Icon").unwrap_or(FALLBACK_ICON)),
        category: main_category(section.attr("Categories").unwrap_or_default()).to_string(),
        command: strip_field_codes(exec, field_codes),
        comment: section.attr("Comment").map(String::from),
    }))
}

/// Remove `%f`-style field codes; `%%` becomes a literal `%`.
fn strip_field_codes(exec: &str, field_codes: &Regex) -> String {
    let stripped = field_codes.replace_all(exec, |caps: &regex::Captures| {
        if &caps[0] == "%%" {
            "%".to_string()
        } else {
            String::new()
        }
    });
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lookup_icon(name: &str) -> Icon {
    let path = Path::new(name);
    if path.is_absolute() {
        return Icon {
            name: name.to_string(),
            path: path.exists().then(|| path.to_path_buf()),
        };
    }

    Icon {
        name: name.to_string(),
        path: freedesktop_icons::lookup(name).with_size(ICON_SIZE).find(),
    }
}
