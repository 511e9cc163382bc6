use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::blob::{BlobStore, JsonFileBlobStore, MemoryBlobStore, SqliteBlobStore};
use crate::core::error::Result;
use crate::core::store::{Store, DEFAULT_KEY};

const APP_DIR: &str = "mailstate";
pub const DEFAULT_SENDER: &str = "Default Sender";

/// Where the mailbox blob lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Json,
    /// Nothing survives the process.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "json" => Ok(StorageBackend::Json),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend {other:?}")),
        }
    }
}

/// Runtime config with every value resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub sender_name: String,
}

/// On-disk representation. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl FileConfig {
    pub fn load() -> std::result::Result<Option<Self>, String> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> std::result::Result<Option<Self>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
        let cfg: FileConfig =
            serde_json::from_str(&data).map_err(|e| format!("parse config: {e}"))?;
        Ok(Some(cfg))
    }

    pub fn save_to(&self, path: &Path) -> std::result::Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create config dir: {e}"))?;
        }
        let data =
            serde_json::to_string_pretty(self).map_err(|e| format!("serialize config: {e}"))?;
        fs::write(path, data).map_err(|e| format!("write config: {e}"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            storage_key: DEFAULT_KEY.to_string(),
            sender_name: DEFAULT_SENDER.to_string(),
        }
    }
}

impl Config {
    /// Resolution order: env vars → config file → defaults.
    pub fn resolve() -> Self {
        let file = match FileConfig::load() {
            Ok(Some(fc)) => {
                log::info!("Config loaded from {}", config_path().display());
                Some(fc)
            }
            Ok(None) => {
                log::info!("No config file found, using defaults");
                None
            }
            Err(e) => {
                log::warn!("Config file error: {}", e);
                None
            }
        };
        Self::resolve_with(file, |name| std::env::var(name).ok())
    }

    /// Layer `env` over `file` over defaults.
    pub fn resolve_with(file: Option<FileConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(fc) = file {
            config.backend = fc.backend;
            if let Some(dir) = fc.data_dir {
                config.data_dir = dir;
            }
            if let Some(key) = fc.key {
                config.storage_key = key;
            }
            if let Some(sender) = fc.sender {
                config.sender_name = sender;
            }
        }

        if let Some(backend) = env("MAILSTATE_BACKEND") {
            match backend.parse() {
                Ok(b) => config.backend = b,
                Err(e) => log::warn!("Ignoring MAILSTATE_BACKEND: {e}"),
            }
        }
        if let Some(dir) = env("MAILSTATE_DATA_DIR").filter(|s| !s.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = env("MAILSTATE_KEY").filter(|s| !s.is_empty()) {
            config.storage_key = key;
        }
        if let Some(sender) = env("MAILSTATE_SENDER").filter(|s| !s.trim().is_empty()) {
            config.sender_name = sender.trim().to_string();
        }

        config
    }

    pub fn open_blob_store(&self) -> Result<Box<dyn BlobStore>> {
        let blob: Box<dyn BlobStore> = match self.backend {
            StorageBackend::Sqlite => Box::new(SqliteBlobStore::open(&self.data_dir)?),
            StorageBackend::Json => Box::new(JsonFileBlobStore::new(&self.data_dir)),
            StorageBackend::Memory => Box::new(MemoryBlobStore::new()),
        };
        Ok(blob)
    }

    /// Open the configured backend and load the mailbox from it.
    pub fn open_store(&self) -> Result<Store> {
        let blob = self.open_blob_store().inspect_err(|e| {
            log::error!("{:?} backend unavailable: {e}", self.backend);
        })?;
        Ok(Store::load(blob, self.storage_key.clone()))
    }
}
