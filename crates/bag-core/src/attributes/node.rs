//! A node and its attribute layers

use std::path::Path;

use bag_store::ItemStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{AttributeLayers, NodeAttributes, Precedence};
use crate::{Error, Result};

/// A managed host with layered attributes.
///
/// Serialized in the usual node document shape:
///
/// ```json
/// {
///   "name": "web01.example.com",
///   "default": {},
///   "normal": {"mysql": {"port": 3306}},
///   "override": {},
///   "automatic": {"hostname": "web01"}
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,

    #[serde(flatten)]
    pub layers: AttributeLayers,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: AttributeLayers::default(),
        }
    }

    /// Replace one layer wholesale. Non-object values leave the layer empty.
    pub fn with_layer(mut self, precedence: Precedence, attributes: Value) -> Self {
        *self.layers.layer_mut(precedence) = match attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self
    }

    /// Set a single top-level attribute in one layer.
    pub fn set(&mut self, precedence: Precedence, key: impl Into<String>, value: Value) {
        self.layers.layer_mut(precedence).insert(key.into(), value);
    }

    /// Load a node document from a JSON, TOML or YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let document = ItemStore::new().load(path)?;
        serde_json::from_value(document).map_err(|e| Error::InvalidNode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl NodeAttributes for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.layers.get(key)
    }

    fn layers(&self) -> &AttributeLayers {
        &self.layers
    }
}
