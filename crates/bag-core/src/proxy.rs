//! Node accessor with data bag overrides
//!
//! [`NodeOverride`] stands in for a [`Node`] wherever attributes are read.
//! Reading the attribute named after the active namespace returns the node's
//! value with the data bag item deep-merged over its override layer. Every
//! other read goes straight to the node.
//!
//! Resolution of the namespace, data bag and item happens once, on first
//! access. Any failure to produce a record (backend down, item missing,
//! item malformed, wrong secret) is logged at debug level and the read
//! falls back to the plain node attributes.

use std::sync::OnceLock;

use bag_store::{Record, RecordBackend, Secret, SecretResolver, strip_id};
use serde_json::{Map, Value};

use crate::attributes::{AttributeLayers, Node, NodeAttributes};
use crate::bag_spec::BagSpec;
use crate::namespace::{resolve_namespace, resolve_record_name};
use crate::{AccessFilter, Error, RecordCache, Result};

/// Caller-supplied inputs to resolution.
#[derive(Debug, Clone, Default)]
pub struct OverrideSettings {
    /// Name of the cookbook, recipe or resource reading attributes.
    pub caller: Option<String>,

    /// Namespace to use instead of the caller name.
    pub namespace_override: Option<String>,

    /// Data bag to read instead of the resolved one.
    pub record_name_override: Option<String>,

    /// Configured allow/deny lists; node-level lists are added on resolution.
    pub filter: AccessFilter,
}

/// Outcome of resolving where a namespace's overrides come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub namespace: String,
    pub data_bag: String,
    pub item: String,
    pub encrypted: bool,

    /// Whether the access filter admits the namespace.
    pub allowed: bool,

    secret_source: Option<Secret>,
}

/// Node accessor that overlays data bag values on one namespace.
pub struct NodeOverride<'a> {
    node: &'a Node,
    backend: &'a dyn RecordBackend,
    settings: OverrideSettings,
    cache: RecordCache,
    secrets: SecretResolver,
    resolution: OnceLock<Option<Resolution>>,
}

impl<'a> NodeOverride<'a> {
    pub fn new(node: &'a Node, backend: &'a dyn RecordBackend) -> Self {
        Self::with_settings(node, backend, OverrideSettings::default())
    }

    pub fn with_settings(
        node: &'a Node,
        backend: &'a dyn RecordBackend,
        settings: OverrideSettings,
    ) -> Self {
        Self {
            node,
            backend,
            settings,
            cache: RecordCache::new(),
            secrets: SecretResolver::new(),
            resolution: OnceLock::new(),
        }
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.settings.caller = Some(caller.into());
        self
    }

    pub fn with_filter(mut self, filter: AccessFilter) -> Self {
        self.settings.filter = filter;
        self
    }

    /// Use `cache` instead of a private one, e.g. a handle shared by a run.
    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.cache = cache;
        self
    }

    /// Use `namespace` instead of the caller name.
    ///
    /// Fails once attributes have been resolved.
    pub fn override_node_key(&mut self, namespace: impl Into<String>) -> Result<()> {
        self.ensure_unresolved("node key")?;
        self.settings.namespace_override = Some(namespace.into());
        Ok(())
    }

    /// Read items from data bag `name` instead of the resolved one.
    ///
    /// Fails once attributes have been resolved.
    pub fn override_data_bag(&mut self, name: impl Into<String>) -> Result<()> {
        self.ensure_unresolved("data bag")?;
        self.settings.record_name_override = Some(name.into());
        Ok(())
    }

    /// The wrapped node, without overrides.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn settings(&self) -> &OverrideSettings {
        &self.settings
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// The active namespace, if any caller or override names one.
    pub fn namespace(&self) -> Option<&str> {
        self.resolution().map(|r| r.namespace.as_str())
    }

    /// Resolve namespace, data bag and item on first call.
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.get_or_init(|| self.resolve()).as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.get().is_some()
    }

    /// The data bag item for the active namespace, loaded at most once.
    ///
    /// `None` when no namespace is active, the filter denies it, or loading
    /// failed.
    pub fn record(&self) -> Option<Record> {
        let resolution = self.resolution()?;
        if !resolution.allowed {
            tracing::debug!(
                namespace = %resolution.namespace,
                "Namespace filtered from data bag overrides"
            );
            return None;
        }
        self.cache
            .get_or_load(&resolution.namespace, || self.load_record(resolution))
    }

    /// Resolved attribute `key`, with data bag overrides when `key` is the
    /// active namespace.
    ///
    /// An empty key yields `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = key.trim();
        if key.is_empty() {
            tracing::debug!("Attribute lookup with empty key");
            return None;
        }

        self.overridden(key).or_else(|| self.node.get(key))
    }

    /// Value of `key` inside the data bag item, falling back to the plain
    /// node attribute of the same name.
    pub fn bag_or_node(&self, key: &str) -> Option<Value> {
        self.record()
            .and_then(|record| record.get(key).cloned())
            .or_else(|| self.node.get(key))
    }

    /// [`bag_or_node`](Self::bag_or_node) for several keys at once.
    ///
    /// Keys without a value map to `null`.
    pub fn bag_or_node_args<I, S>(&self, keys: I) -> Map<String, Value>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let record = self.record();
        keys.into_iter()
            .map(|key| {
                let key = key.as_ref();
                let value = record
                    .as_ref()
                    .and_then(|record| record.get(key).cloned())
                    .or_else(|| self.node.get(key))
                    .unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect()
    }

    fn overridden(&self, key: &str) -> Option<Value> {
        let resolution = self.resolution()?;
        if resolution.namespace != key {
            return None;
        }

        let record = self.record()?;
        let mut overlay = Map::new();
        overlay.insert(
            resolution.namespace.clone(),
            Value::Object(strip_id(&record)),
        );
        self.node.layers().merged_view(&overlay).get(key)
    }

    fn resolve(&self) -> Option<Resolution> {
        let layers = self.node.layers();
        let namespace = resolve_namespace(
            self.settings.namespace_override.as_deref(),
            layers,
            self.settings.caller.as_deref(),
        );
        let Some(namespace) = namespace else {
            tracing::debug!("No namespace for data bag overrides");
            return None;
        };

        let data_bag = resolve_record_name(
            self.settings.record_name_override.as_deref(),
            layers,
            &namespace,
        );
        let spec = BagSpec::from_attributes(layers, &namespace, self.node.name());
        let allowed = self
            .settings
            .filter
            .with_node_lists(layers, &namespace)
            .allows(&namespace);

        tracing::debug!(
            %namespace,
            %data_bag,
            item = %spec.item,
            encrypted = spec.encrypted,
            allowed,
            "Resolved data bag overrides"
        );

        Some(Resolution {
            namespace,
            data_bag,
            item: spec.item,
            encrypted: spec.encrypted,
            allowed,
            secret_source: spec.secret_source,
        })
    }

    fn load_record(&self, resolution: &Resolution) -> Option<Record> {
        let secret = if resolution.encrypted {
            resolution
                .secret_source
                .as_ref()
                .map(|source| self.secrets.resolve(source.expose()))
        } else {
            None
        };

        match self.backend.load(
            &resolution.data_bag,
            &resolution.item,
            resolution.encrypted,
            secret.as_ref(),
        ) {
            Ok(record) => {
                tracing::debug!(
                    data_bag = %resolution.data_bag,
                    item = %resolution.item,
                    "Loaded configuration bag"
                );
                Some(record)
            }
            Err(e) => {
                tracing::debug!(
                    data_bag = %resolution.data_bag,
                    item = %resolution.item,
                    error = %e,
                    "No configuration bag found"
                );
                None
            }
        }
    }

    fn ensure_unresolved(&self, setting: &str) -> Result<()> {
        match self.resolution.get() {
            Some(resolution) => Err(Error::AlreadyResolved {
                setting: setting.to_string(),
                namespace: resolution
                    .as_ref()
                    .map(|r| r.namespace.clone())
                    .unwrap_or_default(),
            }),
            None => Ok(()),
        }
    }
}

impl NodeAttributes for NodeOverride<'_> {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn get(&self, key: &str) -> Option<Value> {
        NodeOverride::get(self, key)
    }

    fn layers(&self) -> &AttributeLayers {
        self.node.layers()
    }
}
