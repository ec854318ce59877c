//! Small persisted preferences. Only the last searched city lives here.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::config::{Config, DEFAULT_CITY};

const KEY_LAST_CITY: &str = "last_city";

/// String key-value storage.
pub trait KeyValueStore: Send + Sync + Debug {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A flat TOML table of strings on disk. Every write rewrites the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preferences: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse preferences: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values: Mutex::new(values) })
    }

    /// `prefs.toml` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::project_dirs()?.data_dir().join("prefs.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set_string(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }
        let toml = toml::to_string(&*values).context("Failed to serialize preferences")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

/// Typed access to the stored preferences.
#[derive(Debug, Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
    default_city: String,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_default_city(store, DEFAULT_CITY)
    }

    pub fn with_default_city(store: Arc<dyn KeyValueStore>, default_city: impl Into<String>) -> Self {
        Self { store, default_city: default_city.into() }
    }

    pub fn last_city(&self) -> String {
        self.store
            .get_string(KEY_LAST_CITY)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_city.clone())
    }

    /// Failures are logged, never surfaced.
    pub fn set_last_city(&self, city: &str) {
        if let Err(e) = self.store.set_string(KEY_LAST_CITY, city) {
            tracing::warn!("Failed to save last searched city: {:#}", e);
        }
    }
}
