use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Application directories following the XDG base directory layout
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/qmpanel)
    pub config: PathBuf,

    /// Data directory (~/.local/share/qmpanel)
    pub data: PathBuf,

    /// Cache directory (~/.cache/qmpanel)
    pub cache: PathBuf,

    /// Config file path
    pub config_file: PathBuf,

    /// Directories searched for `applications/*.desktop`, most important first
    pub application_dirs: Vec<PathBuf>,
}

impl Directories {
    /// Create a new `Directories` instance with standard XDG paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> crate::Result<Self> {
        let project = ProjectDirs::from("", "", "qmpanel").ok_or_else(|| {
            crate::Error::Config("Failed to determine project directories".to_string())
        })?;

        let config = project.config_dir().to_path_buf();

        Ok(Self {
            config_file: config.join("config.json"),
            config,
            data: project.data_dir().to_path_buf(),
            cache: project.cache_dir().to_path_buf(),
            application_dirs: Self::find_application_dirs(),
        })
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            application_dirs: vec![base.join("applications")],
            config: base.clone(),
            data: base.clone(),
            cache: base,
        }
    }

    /// `$XDG_DATA_HOME/applications` followed by each `$XDG_DATA_DIRS` entry.
    fn find_application_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();

        if let Some(base) = BaseDirs::new() {
            dirs.push(base.data_dir().join("applications"));
        }

        let data_dirs = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());

        dirs.extend(Self::split_data_dirs(&data_dirs));
        dirs
    }

    fn split_data_dirs(value: &str) -> impl Iterator<Item = PathBuf> + '_ {
        value
            .split(':')
            .filter(|s| !s.is_empty())
            .map(|s| PathBuf::from(s).join("applications"))
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_exists(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        std::fs::create_dir_all(&self.cache)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-qmpanel");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.data, base);
        assert_eq!(dirs.cache, base);
        assert_eq!(dirs.config_file, base.join("config.json"));
        assert_eq!(dirs.application_dirs, vec![base.join("applications")]);
    }

    #[test]
    fn test_ensure_exists_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = temp_dir.path().join("qmpanel-test-subdir");
        let dirs = Directories::with_base(base.clone());

        assert!(!base.exists());

        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
        assert!(dirs.data.exists());
        assert!(dirs.cache.exists());
    }

    #[test]
    fn test_ensure_exists_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dirs = Directories::with_base(temp_dir.path().to_path_buf());

        dirs.ensure_exists().unwrap();
        dirs.ensure_exists().unwrap();

        assert!(dirs.config.exists());
    }

    #[test]
    fn test_split_data_dirs_skips_empty_segments() {
        let dirs: Vec<_> = Directories::split_data_dirs("/opt/share::/usr/share:").collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/opt/share/applications"),
                PathBuf::from("/usr/share/applications"),
            ]
        );
    }

    #[test]
    fn test_new_returns_valid_xdg_paths() {
        let Ok(dirs) = Directories::new() else {
            return;
        };

        assert!(dirs.config.to_string_lossy().contains("qmpanel"));
        assert!(dirs.config_file.to_string_lossy().ends_with("config.json"));
        assert!(
            dirs.application_dirs
                .iter()
                .all(|d| d.ends_with("applications"))
        );
    }
}
