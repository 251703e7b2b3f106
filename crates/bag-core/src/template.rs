//! Template renders that resolve attributes like the context that declared them

use bag_store::RecordBackend;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::RecordCache;
use crate::attributes::Node;
use crate::proxy::{NodeOverride, OverrideSettings};

/// Template variable carrying the declaring context's namespace.
pub const NODE_KEY_VARIABLE: &str = "node_key";

/// Template variable carrying an explicit data bag override.
pub const DATA_BAG_VARIABLE: &str = "data_bag";

/// A template render declared by a [`BagContext`](crate::BagContext).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateJob {
    pub source: String,

    #[serde(default)]
    pub variables: Map<String, Value>,
}

impl TemplateJob {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            variables: Map::new(),
        }
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    pub fn with_node_key(self, namespace: impl Into<String>) -> Self {
        self.with_variable(NODE_KEY_VARIABLE, Value::String(namespace.into()))
    }

    pub fn node_key(&self) -> Option<&str> {
        self.variables.get(NODE_KEY_VARIABLE).and_then(Value::as_str)
    }

    pub fn with_data_bag(self, name: impl Into<String>) -> Self {
        self.with_variable(DATA_BAG_VARIABLE, Value::String(name.into()))
    }

    pub fn data_bag(&self) -> Option<&str> {
        self.variables.get(DATA_BAG_VARIABLE).and_then(Value::as_str)
    }
}

/// Attribute access while rendering a [`TemplateJob`].
///
/// The job's `node_key` becomes the namespace and its `data_bag` tag the
/// data bag, so the template sees the same overrides as the context that
/// declared it. Allow/deny lists configured on that context only apply when
/// its settings are passed in, see [`with_settings`](Self::with_settings) and
/// [`BagContext::render`](crate::BagContext::render).
pub struct TemplateContext<'a> {
    job: TemplateJob,
    proxy: NodeOverride<'a>,
}

impl<'a> TemplateContext<'a> {
    pub fn new(job: TemplateJob, node: &'a Node, backend: &'a dyn RecordBackend) -> Self {
        Self::with_settings(job, node, backend, OverrideSettings::default())
    }

    /// Render with the declaring context's settings, including its access
    /// filter. The job's tags take the place of the namespace and fill in
    /// a data bag override the settings leave unset.
    pub fn with_settings(
        job: TemplateJob,
        node: &'a Node,
        backend: &'a dyn RecordBackend,
        mut settings: OverrideSettings,
    ) -> Self {
        if let Some(namespace) = job.node_key() {
            settings.namespace_override = Some(namespace.to_string());
        }
        if settings.record_name_override.is_none() {
            settings.record_name_override = job.data_bag().map(String::from);
        }
        let proxy = NodeOverride::with_settings(node, backend, settings);
        Self { job, proxy }
    }

    /// Share the declaring context's cache to avoid loading the item twice.
    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.proxy = self.proxy.with_cache(cache);
        self
    }

    pub fn node(&self) -> &NodeOverride<'a> {
        &self.proxy
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.job.variables.get(name)
    }

    pub fn job(&self) -> &TemplateJob {
        &self.job
    }
}
