//! Allow/deny lists gating which namespaces may read data bags

use std::collections::BTreeSet;

use serde_json::Value;

use crate::attributes::AttributeLayers;

/// Key below the namespace listing namespaces allowed to read data bags.
pub const ALLOW_LIST_KEY: &str = "bag_whitelist";

/// Key below the namespace listing namespaces denied data bag reads.
pub const DENY_LIST_KEY: &str = "bag_blacklist";

/// Namespace-level gate for data bag overrides.
///
/// An empty allow list admits every namespace. The deny list always wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessFilter {
    allow: BTreeSet<String>,
    deny: BTreeSet<String>,
}

impl AccessFilter {
    /// A filter admitting every namespace.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, namespace: impl AsRef<str>) -> Self {
        self.allow.insert(normalize(namespace.as_ref()));
        self
    }

    pub fn deny(mut self, namespace: impl AsRef<str>) -> Self {
        self.deny.insert(normalize(namespace.as_ref()));
        self
    }

    pub fn allow_all<I, S>(self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        namespaces.into_iter().fold(self, |filter, ns| filter.allow(ns))
    }

    pub fn deny_all<I, S>(self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        namespaces.into_iter().fold(self, |filter, ns| filter.deny(ns))
    }

    /// Extend this filter with the lists a node declares under `namespace`.
    ///
    /// `bag_whitelist` and `bag_blacklist` may be arrays of strings or a
    /// single string.
    pub fn with_node_lists(&self, attributes: &AttributeLayers, namespace: &str) -> Self {
        let scope = attributes.get(namespace);
        let list = |key: &str| {
            scope
                .as_ref()
                .and_then(|scope| scope.get(key))
                .map(string_list)
                .unwrap_or_default()
        };

        self.clone()
            .allow_all(list(ALLOW_LIST_KEY))
            .deny_all(list(DENY_LIST_KEY))
    }

    /// Whether data bag overrides apply to `namespace`.
    pub fn allows(&self, namespace: &str) -> bool {
        allowed(namespace, &self.allow, &self.deny)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.allow.is_empty() && self.deny.is_empty()
    }
}

/// `(allow is empty OR namespace in allow) AND namespace not in deny`
pub fn allowed(namespace: &str, allow: &BTreeSet<String>, deny: &BTreeSet<String>) -> bool {
    let namespace = normalize(namespace);
    (allow.is_empty() || allow.contains(&namespace)) && !deny.contains(&namespace)
}

fn normalize(namespace: &str) -> String {
    namespace.trim().to_string()
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
