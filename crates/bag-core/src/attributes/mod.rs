//! Layered node attributes
//!
//! A node carries four attribute layers. Reads combine them in ascending
//! precedence, each layer deep-merged over the previous one:
//!
//! 1. **default** - cookbook defaults
//! 2. **normal** - values persisted on the node
//! 3. **override** - role and environment overrides
//! 4. **automatic** - facts discovered on the host, always win
//!
//! The layers are read-only to the resolver; overrides are applied to a
//! transient copy built by [`AttributeLayers::merged_view`].

mod merge;
mod node;

pub use merge::deep_merge;
pub use node::Node;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One of the four attribute layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    Default,
    Normal,
    Override,
    Automatic,
}

impl Precedence {
    /// All layers, lowest precedence first.
    pub const ASCENDING: [Precedence; 4] = [
        Precedence::Default,
        Precedence::Normal,
        Precedence::Override,
        Precedence::Automatic,
    ];
}

/// The four attribute layers of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeLayers {
    #[serde(default)]
    pub default: Map<String, Value>,

    #[serde(default)]
    pub normal: Map<String, Value>,

    #[serde(default, rename = "override")]
    pub overrides: Map<String, Value>,

    #[serde(default)]
    pub automatic: Map<String, Value>,
}

impl AttributeLayers {
    pub fn layer(&self, precedence: Precedence) -> &Map<String, Value> {
        match precedence {
            Precedence::Default => &self.default,
            Precedence::Normal => &self.normal,
            Precedence::Override => &self.overrides,
            Precedence::Automatic => &self.automatic,
        }
    }

    pub fn layer_mut(&mut self, precedence: Precedence) -> &mut Map<String, Value> {
        match precedence {
            Precedence::Default => &mut self.default,
            Precedence::Normal => &mut self.normal,
            Precedence::Override => &mut self.overrides,
            Precedence::Automatic => &mut self.automatic,
        }
    }

    /// Read a top-level key through all layers.
    ///
    /// Object values are deep-merged layer over layer; any other value from a
    /// higher layer replaces what lower layers held.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut resolved: Option<Value> = None;
        for precedence in Precedence::ASCENDING {
            if let Some(value) = self.layer(precedence).get(key) {
                match resolved.as_mut() {
                    Some(acc) => deep_merge(acc, value),
                    None => resolved = Some(value.clone()),
                }
            }
        }
        resolved
    }

    /// Build a copy whose override layer has `overlay` deep-merged into it.
    ///
    /// `self` is left untouched.
    pub fn merged_view(&self, overlay: &Map<String, Value>) -> AttributeLayers {
        let mut view = self.clone();
        let mut overrides = Value::Object(std::mem::take(&mut view.overrides));
        deep_merge(&mut overrides, &Value::Object(overlay.clone()));
        if let Value::Object(map) = overrides {
            view.overrides = map;
        }
        view
    }

    /// Top-level keys present in any layer, sorted.
    pub fn keys(&self) -> BTreeSet<String> {
        Precedence::ASCENDING
            .iter()
            .flat_map(|p| self.layer(*p).keys().cloned())
            .collect()
    }
}

/// Read-only accessor for node attributes.
///
/// Implemented by [`Node`] and by the data bag override proxy, so anything
/// written against this trait accepts either.
pub trait NodeAttributes {
    /// Node name, usually its fully qualified host name.
    fn name(&self) -> &str;

    /// Resolved value of a top-level attribute.
    fn get(&self, key: &str) -> Option<Value>;

    /// The raw layers this accessor reads from.
    fn layers(&self) -> &AttributeLayers;

    fn layer(&self, precedence: Precedence) -> &Map<String, Value> {
        self.layers().layer(precedence)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn keys(&self) -> BTreeSet<String> {
        self.layers().keys()
    }

    /// Follow `path` below the top-level attribute `key`.
    fn get_path(&self, key: &str, path: &[&str]) -> Option<Value> {
        let mut current = self.get(key)?;
        for segment in path {
            current = current.get(segment)?.clone();
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn layers() -> AttributeLayers {
        AttributeLayers {
            default: map(json!({"mysql": {"port": 3305, "user": "mysql"}, "motd": "hi"})),
            normal: map(json!({"mysql": {"port": 3306}})),
            overrides: map(json!({"mysql": {"bind": "0.0.0.0"}})),
            automatic: map(json!({"hostname": "web01"})),
        }
    }

    #[test]
    fn get_merges_layers_by_precedence() {
        let layers = layers();
        assert_eq!(
            layers.get("mysql"),
            Some(json!({"port": 3306, "user": "mysql", "bind": "0.0.0.0"}))
        );
        assert_eq!(layers.get("motd"), Some(json!("hi")));
        assert_eq!(layers.get("missing"), None);
    }

    #[test]
    fn automatic_beats_override() {
        let mut layers = layers();
        layers.overrides.insert("hostname".into(), json!("fake"));
        assert_eq!(layers.get("hostname"), Some(json!("web01")));
    }

    #[test]
    fn merged_view_leaves_original_untouched() {
        let layers = layers();
        let view = layers.merged_view(&map(json!({"mysql": {"port": 3307}})));

        assert_eq!(view.get("mysql").unwrap()["port"], 3307);
        assert_eq!(view.get("mysql").unwrap()["bind"], "0.0.0.0");
        assert_eq!(layers.get("mysql").unwrap()["port"], 3306);
        assert_eq!(layers, self::layers());
    }

    #[test]
    fn keys_span_all_layers() {
        let keys: Vec<String> = layers().keys().into_iter().collect();
        assert_eq!(keys, vec!["hostname", "motd", "mysql"]);
    }

    #[test]
    fn get_path_walks_nested_objects() {
        let node = Node::new("web01").with_layer(
            Precedence::Normal,
            json!({"mysql": {"config_bag": {"name": "custom"}}}),
        );
        assert_eq!(
            node.get_path("mysql", &["config_bag", "name"]),
            Some(json!("custom"))
        );
        assert_eq!(node.get_path("mysql", &["config_bag", "secret"]), None);
    }
}
