use std::{fs, path::{Path, PathBuf}, collections::HashMap, net::SocketAddr};
use serde::{Serialize, Deserialize};
use toml;
use anyhow::{self, Context};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory relative ledger paths are resolved against
    #[serde(default)]
    prefix: PathBuf,
}

type LedgerLocationById = HashMap<String, PathBuf>;

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    pub ledgers: LedgerLocationById
}

impl AppConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(filepath)
            .with_context(|| "failed to read config file")?;
        Self::parse(&file_content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(content)
            .with_context(|| "failed to parse config file")?;
        return Ok(config);
    }

    pub fn ledger_path(&self, id: &str) -> Option<PathBuf> {
        self.ledgers.get(id).map(|path| self.storage.prefix.join(path))
    }
}
