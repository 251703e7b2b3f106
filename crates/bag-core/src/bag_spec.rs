//! Which data bag item a namespace reads, and how
//!
//! Configured under `<namespace>.config_bag`, either as a plain item name:
//!
//! ```json
//! {"mysql": {"config_bag": "custom_cfg"}}
//! ```
//!
//! or as an object:
//!
//! ```json
//! {"mysql": {"config_bag": {"item": "custom_cfg", "encrypted": true, "secret": "/etc/keys/mysql"}}}
//! ```
//!
//! `name` is accepted in place of `item`. Without either the item defaults
//! to `config_<node name>`.

use bag_store::Secret;
use serde_json::Value;

use crate::attributes::AttributeLayers;
use crate::namespace::attribute_string;

/// Key below the namespace describing the configuration item.
pub const CONFIG_BAG_KEY: &str = "config_bag";

/// Item coordinates read from node attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagSpec {
    /// Identifier of the item inside its data bag.
    pub item: String,

    /// Whether item values are encrypted.
    ///
    /// Read strictly: only `true`, a non-zero number, or one of the strings
    /// `"true"`, `"yes"`, `"1"` enable it. `"false"`, `"no"` and `0` mean a
    /// plain item.
    pub encrypted: bool,

    /// Raw `secret` attribute: a key file path or the secret itself.
    /// Only kept for encrypted items.
    pub secret_source: Option<Secret>,
}

impl BagSpec {
    pub fn from_attributes(attributes: &AttributeLayers, namespace: &str, node_name: &str) -> Self {
        let config_bag = attributes
            .get(namespace)
            .and_then(|scope| scope.get(CONFIG_BAG_KEY).cloned());

        let (item, encrypted, secret_source) = match config_bag {
            Some(Value::Object(spec)) => {
                let item = spec
                    .get("item")
                    .and_then(attribute_string)
                    .or_else(|| spec.get("name").and_then(attribute_string));
                let encrypted = spec.get("encrypted").is_some_and(truthy);
                let secret = spec
                    .get("secret")
                    .and_then(Value::as_str)
                    .filter(|_| encrypted)
                    .map(Secret::new);
                (item, encrypted, secret)
            }
            Some(other) => (attribute_string(&other), false, None),
            None => (None, false, None),
        };

        Self {
            item: item.unwrap_or_else(|| default_item_name(node_name)),
            encrypted,
            secret_source,
        }
    }
}

/// Default item identifier for a node: `config_` followed by the node name
/// with every character outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn default_item_name(node_name: &str) -> String {
    let normalized: String = node_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("config_{normalized}")
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Node, Precedence};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn spec(namespace_attrs: Value) -> BagSpec {
        let node = Node::new("web01.example.com")
            .with_layer(Precedence::Normal, json!({ "mysql": namespace_attrs }));
        BagSpec::from_attributes(&node.layers, "mysql", &node.name)
    }

    #[rstest]
    #[case("web01.example.com", "config_web01_example_com")]
    #[case("db-01", "config_db-01")]
    #[case("host name:1", "config_host_name_1")]
    fn default_item_normalizes_separators(#[case] node: &str, #[case] expected: &str) {
        assert_eq!(default_item_name(node), expected);
    }

    #[test]
    fn missing_config_bag_uses_default_item() {
        assert_eq!(
            spec(json!({"port": 3306})),
            BagSpec {
                item: "config_web01_example_com".into(),
                encrypted: false,
                secret_source: None,
            }
        );
    }

    #[test]
    fn string_config_bag_names_item() {
        let spec = spec(json!({"config_bag": "custom_cfg"}));
        assert_eq!(spec.item, "custom_cfg");
        assert!(!spec.encrypted);
    }

    #[test]
    fn object_config_bag_prefers_item_over_name() {
        assert_eq!(spec(json!({"config_bag": {"name": "by_name"}})).item, "by_name");
        assert_eq!(
            spec(json!({"config_bag": {"name": "by_name", "item": "by_item"}})).item,
            "by_item"
        );
        assert_eq!(
            spec(json!({"config_bag": {"name": ""}})).item,
            "config_web01_example_com"
        );
    }

    #[test]
    fn encrypted_object_keeps_secret_source() {
        let spec = spec(json!({"config_bag": {"name": "c", "encrypted": true, "secret": "k"}}));
        assert!(spec.encrypted);
        assert_eq!(spec.secret_source, Some(Secret::new("k")));
    }

    #[test]
    fn secret_is_ignored_for_plain_items() {
        let spec = spec(json!({"config_bag": {"name": "c", "encrypted": false, "secret": "k"}}));
        assert!(!spec.encrypted);
        assert_eq!(spec.secret_source, None);
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!("yes"), true)]
    #[case(json!(1), true)]
    #[case(json!(false), false)]
    #[case(json!("no"), false)]
    #[case(json!("false"), false)]
    #[case(json!(0), false)]
    #[case(json!(null), false)]
    fn encrypted_flag_truthiness(#[case] flag: Value, #[case] expected: bool) {
        assert_eq!(spec(json!({"config_bag": {"encrypted": flag}})).encrypted, expected);
    }
}
