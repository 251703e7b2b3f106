//! Resolver configuration
//!
//! Settings are read from TOML:
//!
//! ```toml
//! namespace_override = "mysql"
//! record_name_override = "shared_db"
//! allow_list = ["mysql", "nginx"]
//! deny_list = ["legacy"]
//! data_bag_path = "/var/lib/bags"
//! lookup = "search"
//! share_cache = true
//! ```
//!
//! Every key is optional. Several files can be merged, later ones winning.

use std::fs;
use std::path::{Path, PathBuf};

use bag_store::{DirectoryBackend, LookupStrategy};
use serde::{Deserialize, Serialize};

use crate::{AccessFilter, Error, RecordCache, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Namespace to use instead of the caller name
    #[serde(default)]
    pub namespace_override: Option<String>,

    /// Data bag to read instead of the resolved one
    #[serde(default)]
    pub record_name_override: Option<String>,

    /// Namespaces allowed to read data bags; empty allows all
    #[serde(default)]
    pub allow_list: Vec<String>,

    /// Namespaces never allowed to read data bags
    #[serde(default)]
    pub deny_list: Vec<String>,

    /// Root of the data bag directory tree
    #[serde(default)]
    pub data_bag_path: Option<PathBuf>,

    /// How items are located inside a bag; direct when unset
    #[serde(default)]
    pub lookup: Option<LookupStrategy>,

    /// Share one record cache across every context of a run; off when unset
    #[serde(default)]
    pub share_cache: Option<bool>,
}

impl ResolverConfig {
    pub fn parse(content: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!(?path, "Loading resolver config");
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Merge another configuration into this one
    ///
    /// `other` wins for every value it sets; lists are extended with its
    /// unique entries.
    pub fn merge(&mut self, other: &ResolverConfig) {
        if other.namespace_override.is_some() {
            self.namespace_override = other.namespace_override.clone();
        }
        if other.record_name_override.is_some() {
            self.record_name_override = other.record_name_override.clone();
        }
        if other.data_bag_path.is_some() {
            self.data_bag_path = other.data_bag_path.clone();
        }
        if other.lookup.is_some() {
            self.lookup = other.lookup;
        }
        if other.share_cache.is_some() {
            self.share_cache = other.share_cache;
        }

        for namespace in &other.allow_list {
            if !self.allow_list.contains(namespace) {
                self.allow_list.push(namespace.clone());
            }
        }
        for namespace in &other.deny_list {
            if !self.deny_list.contains(namespace) {
                self.deny_list.push(namespace.clone());
            }
        }
    }

    pub fn lookup(&self) -> LookupStrategy {
        self.lookup.unwrap_or_default()
    }

    pub fn shares_cache(&self) -> bool {
        self.share_cache.unwrap_or(false)
    }

    pub fn filter(&self) -> AccessFilter {
        AccessFilter::new()
            .allow_all(&self.allow_list)
            .deny_all(&self.deny_list)
    }

    /// Directory backend for `data_bag_path`, if configured.
    pub fn backend(&self) -> Option<DirectoryBackend> {
        self.data_bag_path
            .as_ref()
            .map(|root| DirectoryBackend::new(root).with_strategy(self.lookup()))
    }

    /// Cache for a new context: the run's cache when sharing is enabled,
    /// otherwise a fresh private one.
    pub fn cache_for(&self, run_cache: &RecordCache) -> RecordCache {
        if self.shares_cache() {
            run_cache.clone()
        } else {
            RecordCache::new()
        }
    }
}
