use crate::model::Preferences;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

const APP_DIR: &str = "thasinn";
const PREFS_FILE: &str = "prefs.json";
const LOG_DIR: &str = "logs";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("THASINN_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn log_dir() -> Result<PathBuf> {
    Ok(config_root()?.join(LOG_DIR))
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
}

/// Durable home of the preference entries.
pub trait PreferenceStore {
    fn load(&self) -> Result<Preferences>;
    fn save(&mut self, prefs: &Preferences) -> Result<()>;
}

pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_config_root() -> Result<Self> {
        Ok(Self::new(config_root()?.join(PREFS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read preferences {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse preferences {}", self.path.display()))
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Process-local store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    entries: Rc<RefCell<Preferences>>,
}

impl MemoryPreferences {
    pub fn with(prefs: Preferences) -> Self {
        Self {
            entries: Rc::new(RefCell::new(prefs)),
        }
    }

    pub fn snapshot(&self) -> Preferences {
        self.entries.borrow().clone()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load(&self) -> Result<Preferences> {
        Ok(self.snapshot())
    }

    fn save(&mut self, prefs: &Preferences) -> Result<()> {
        *self.entries.borrow_mut() = prefs.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VOLUME_KEY;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let mut store = FilePreferences::new(dir.path().join("nested").join(PREFS_FILE));

        let mut prefs = Preferences::default();
        prefs.set_volume(0.25);
        store.save(&prefs).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.get_item(VOLUME_KEY), Some("0.25"));
        assert!((loaded.volume() - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = FilePreferences::new(dir.path().join(PREFS_FILE));
        let loaded = store.load().expect("load");
        assert_eq!(loaded, Preferences::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(PREFS_FILE);
        fs::write(&path, "{not json").expect("write");
        let store = FilePreferences::new(path);
        let err = store.load().expect_err("corrupt json");
        assert!(format!("{err:#}").contains("failed to parse preferences"));
    }

    #[test]
    fn config_root_honours_override() {
        let dir = tempdir().expect("tempdir");
        unsafe {
            env::set_var("THASINN_CONFIG_DIR", dir.path());
        }
        let root = config_root();
        let logs = log_dir();
        unsafe {
            env::remove_var("THASINN_CONFIG_DIR");
        }

        assert_eq!(root.expect("root"), dir.path());
        assert_eq!(logs.expect("logs"), dir.path().join(LOG_DIR));
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryPreferences::default();
        let mut writer = store.clone();
        let mut prefs = Preferences::default();
        prefs.set_volume(0.4);
        writer.save(&prefs).expect("save");
        assert_eq!(store.snapshot().get_item(VOLUME_KEY), Some("0.4"));
    }
}
