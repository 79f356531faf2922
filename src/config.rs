use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::backend::FjallStore;
use crate::curie::PrefixMapping;

#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    /// Prefix bindings installed on every store opened from this config.
    pub prefixes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub partition: String,
    /// Delete the data directory when the store is dropped.
    pub temporary: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("triplestore.db"),
            partition: String::from("subjects"),
            temporary: false,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        Config::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Config> {
        Ok(toml::from_str(text)?)
    }

    pub fn prefix_mapping(&self) -> PrefixMapping {
        self.prefixes
            .iter()
            .map(|(prefix, iri)| (prefix.as_str(), iri.as_str()))
            .collect()
    }

    pub fn open_store(&self) -> Result<FjallStore> {
        FjallStore::open(
            &self.store.path,
            &self.store.partition,
            self.store.temporary,
        )
    }
}
