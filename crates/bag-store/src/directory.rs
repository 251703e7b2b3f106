//! Data bags stored as directories of item files
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   mysql/
//!     config_web01_example_com.json
//!     custom_cfg.yaml
//!   nginx/
//!     config_web01_example_com.toml
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::{RecordBackend, finish_load};
use crate::record::{ITEM_ID_KEY, record_from_value};
use crate::store::ITEM_EXTENSIONS;
use crate::{ChaChaItemCipher, Error, ItemCipher, ItemStore, Record, Result, Secret};

/// How an item is located inside its bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupStrategy {
    /// Load the file named after the item identifier.
    #[default]
    Direct,
    /// Scan every item in the bag for a matching `id` field.
    Search,
}

/// Record backend reading data bags from a directory tree.
pub struct DirectoryBackend {
    root: PathBuf,
    strategy: LookupStrategy,
    store: ItemStore,
    cipher: Arc<dyn ItemCipher>,
}

impl DirectoryBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            strategy: LookupStrategy::default(),
            store: ItemStore::new(),
            cipher: Arc::new(ChaChaItemCipher::new()),
        }
    }

    pub fn with_strategy(mut self, strategy: LookupStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn ItemCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn strategy(&self) -> LookupStrategy {
        self.strategy
    }

    /// List the item file stems of a bag, sorted.
    pub fn list_items(&self, bag: &str) -> Result<Vec<String>> {
        let mut items: Vec<String> = self
            .item_files(bag)?
            .iter()
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        items.sort();
        items.dedup();
        Ok(items)
    }

    fn bag_dir(&self, bag: &str) -> Result<PathBuf> {
        validate_identifier(bag, bag, "bag")?;
        let dir = self.root.join(bag);
        if !dir.is_dir() {
            return Err(Error::BagNotFound {
                bag: bag.to_string(),
            });
        }
        Ok(dir)
    }

    fn item_files(&self, bag: &str) -> Result<Vec<PathBuf>> {
        let dir = self.bag_dir(bag)?;
        let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            let known = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ITEM_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
            if known && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load_direct(&self, bag: &str, item: &str) -> Result<Value> {
        validate_identifier(bag, item, "item")?;
        let dir = self.bag_dir(bag)?;
        let path = self
            .store
            .locate(&dir, item)
            .ok_or_else(|| Error::ItemNotFound {
                bag: bag.to_string(),
                item: item.to_string(),
            })?;
        tracing::debug!(path = %path.display(), "Loading data bag item");
        self.store.load(&path)
    }

    fn load_search(&self, bag: &str, item: &str) -> Result<Value> {
        for path in self.item_files(bag)? {
            let value = match self.store.load(&path) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable item");
                    continue;
                }
            };
            if value.get(ITEM_ID_KEY).and_then(Value::as_str) == Some(item) {
                tracing::debug!(path = %path.display(), "Found data bag item by search");
                return Ok(value);
            }
        }
        Err(Error::ItemNotFound {
            bag: bag.to_string(),
            item: item.to_string(),
        })
    }
}

impl RecordBackend for DirectoryBackend {
    fn load(
        &self,
        bag: &str,
        item: &str,
        encrypted: bool,
        secret: Option<&Secret>,
    ) -> Result<Record> {
        let value = match self.strategy {
            LookupStrategy::Direct => self.load_direct(bag, item)?,
            LookupStrategy::Search => self.load_search(bag, item)?,
        };
        let record = record_from_value(value, bag, item)?;
        finish_load(self.cipher.as_ref(), bag, item, record, encrypted, secret)
    }
}

/// Bag and item names become path segments, so they must stay inside the root.
fn validate_identifier(bag: &str, name: &str, what: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if invalid {
        return Err(Error::malformed(
            bag,
            name,
            format!("invalid {what} identifier"),
        ));
    }
    Ok(())
}
