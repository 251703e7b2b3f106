//! Caller-side wiring for data bag overrides
//!
//! A [`BagContext`] is what a recipe or resource holds: its own name, the
//! node it configures and the record backend. It hands out the override
//! proxy in place of the raw node and tags the templates it renders with
//! the active namespace.

use std::ptr;

use bag_store::RecordBackend;

use crate::attributes::Node;
use crate::config::ResolverConfig;
use crate::proxy::{NodeOverride, OverrideSettings};
use crate::template::{TemplateContext, TemplateJob};
use crate::{RecordCache, Result};

/// A resolution context: one caller configuring one node.
pub struct BagContext<'a> {
    backend: &'a dyn RecordBackend,
    proxy: NodeOverride<'a>,
}

impl<'a> BagContext<'a> {
    /// Create a context for `caller` with a private record cache.
    pub fn new(caller: impl Into<String>, node: &'a Node, backend: &'a dyn RecordBackend) -> Self {
        let proxy = NodeOverride::new(node, backend).with_caller(caller);
        Self { backend, proxy }
    }

    /// Create a context with overrides and filters taken from `config`.
    pub fn from_config(
        caller: impl Into<String>,
        node: &'a Node,
        backend: &'a dyn RecordBackend,
        config: &ResolverConfig,
    ) -> Self {
        let settings = OverrideSettings {
            caller: Some(caller.into()),
            namespace_override: config.namespace_override.clone(),
            record_name_override: config.record_name_override.clone(),
            filter: config.filter(),
        };
        let proxy = NodeOverride::with_settings(node, backend, settings);
        Self { backend, proxy }
    }

    /// Replace the private cache, typically with a handle shared by a run.
    pub fn with_cache(mut self, cache: RecordCache) -> Self {
        self.proxy = self.proxy.with_cache(cache);
        self
    }

    /// Use `key` as namespace instead of the caller name.
    ///
    /// Must be called before the first attribute read.
    pub fn override_node_key(&mut self, key: impl Into<String>) -> Result<()> {
        self.proxy.override_node_key(key)
    }

    /// Read configuration items from data bag `name`.
    ///
    /// Must be called before the first attribute read.
    pub fn override_data_bag(&mut self, name: impl Into<String>) -> Result<()> {
        self.proxy.override_data_bag(name)
    }

    /// Node accessor with data bag overrides applied.
    pub fn node(&self) -> &NodeOverride<'a> {
        &self.proxy
    }

    /// The node without any overrides.
    pub fn original_node(&self) -> &'a Node {
        self.proxy.node()
    }

    /// Point the context at another node.
    ///
    /// Swapping in a different node restarts resolution; caller settings and
    /// the record cache carry over.
    pub fn set_node(&mut self, node: &'a Node) {
        if ptr::eq(node, self.proxy.node()) {
            return;
        }
        let settings = self.proxy.settings().clone();
        let cache = self.proxy.cache().clone();
        self.proxy = NodeOverride::with_settings(node, self.backend, settings).with_cache(cache);
    }

    pub fn node_key(&self) -> Option<&str> {
        self.proxy.namespace()
    }

    pub fn data_bag(&self) -> Option<&str> {
        self.proxy.resolution().map(|r| r.data_bag.as_str())
    }

    /// Declare a template render, tagged with the active namespace so the
    /// render step resolves attributes the same way.
    pub fn template(&self, source: impl Into<String>) -> TemplateJob {
        let mut job = TemplateJob::new(source);
        if let Some(namespace) = self.node_key() {
            job = job.with_node_key(namespace);
        }
        if let Some(data_bag) = &self.proxy.settings().record_name_override {
            job = job.with_data_bag(data_bag.clone());
        }
        job
    }

    /// Render context for `job` with this context's settings and cache.
    pub fn render(&self, job: TemplateJob) -> TemplateContext<'a> {
        TemplateContext::with_settings(
            job,
            self.proxy.node(),
            self.backend,
            self.proxy.settings().clone(),
        )
        .with_cache(self.proxy.cache().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{NodeAttributes, Precedence};
    use bag_store::MemoryBackend;
    use serde_json::json;

    fn node() -> Node {
        Node::new("web01.example.com")
            .with_layer(Precedence::Normal, json!({"mysql": {"port": 3306}, "app": {"port": 80}}))
    }

    fn backend() -> MemoryBackend {
        MemoryBackend::new()
            .with_item("mysql", json!({"id": "config_web01_example_com", "port": 3307}))
            .with_item("app", json!({"id": "config_web01_example_com", "port": 8080}))
    }

    #[test]
    fn caller_name_is_default_namespace() {
        let node = node();
        let backend = backend();
        let ctx = BagContext::new("mysql", &node, &backend);

        assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3307);
        assert_eq!(ctx.node_key(), Some("mysql"));
        assert_eq!(ctx.data_bag(), Some("mysql"));
        assert_eq!(ctx.original_node().get("mysql").unwrap()["port"], 3306);
    }

    #[test]
    fn overrides_before_first_read() {
        let node = node();
        let backend = backend();
        let mut ctx = BagContext::new("mysql", &node, &backend);
        ctx.override_node_key("app").unwrap();

        assert_eq!(ctx.node().get("app").unwrap()["port"], 8080);
        assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3306);
        assert!(ctx.override_data_bag("mysql").is_err());
    }

    #[test]
    fn from_config_applies_filter() {
        let node = node();
        let backend = backend();
        let config = ResolverConfig {
            deny_list: vec!["mysql".into()],
            ..Default::default()
        };
        let ctx = BagContext::from_config("mysql", &node, &backend, &config);

        assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3306);
        assert_eq!(backend.load_count(), 0);
    }

    #[test]
    fn set_node_restarts_resolution_and_keeps_cache() {
        let first = node();
        let second = Node::new("db01").with_layer(Precedence::Normal, json!({"mysql": {"port": 1}}));
        let backend = backend();
        let mut ctx = BagContext::new("mysql", &first, &backend);

        assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3307);
        ctx.set_node(&first);
        assert!(ctx.node().is_resolved());

        ctx.set_node(&second);
        assert!(!ctx.node().is_resolved());
        assert_eq!(ctx.node().name(), "db01");
        // the namespace entry is still cached from the first node
        assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3307);
        assert_eq!(backend.load_count(), 1);
    }

    #[test]
    fn template_is_tagged_with_namespace() {
        let node = node();
        let backend = backend();
        let mut ctx = BagContext::new("mysql", &node, &backend);
        ctx.override_node_key("app").unwrap();

        let job = ctx.template("app.conf.erb");
        assert_eq!(job.source, "app.conf.erb");
        assert_eq!(job.node_key(), Some("app"));
    }
}
