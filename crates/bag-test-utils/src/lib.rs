//! Shared test utilities for the bag-config workspace.
//!
//! This crate provides standardised fixtures for data bag directories and
//! node documents. It is a dev-dependency only, never published.

use std::fs;
use std::path::{Path, PathBuf};

use bag_store::{ChaChaItemCipher, Secret};
use serde_json::Value;
use tempfile::TempDir;

/// A temporary workspace holding a data bag tree, node documents and key
/// files.
///
/// # Example
///
/// ```rust,no_run
/// use bag_test_utils::BagFixture;
/// use serde_json::json;
///
/// let fixture = BagFixture::new();
/// fixture.write_item("mysql", json!({"id": "custom_cfg", "port": 3307}));
/// let node = fixture.write_node(json!({"name": "web01", "normal": {}}));
/// assert!(node.is_file());
/// ```
pub struct BagFixture {
    temp_dir: TempDir,
}

impl Default for BagFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl BagFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("data_bags")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root of the data bag tree.
    pub fn data_bags(&self) -> PathBuf {
        self.root().join("data_bags")
    }

    /// Write `item` as `data_bags/<bag>/<id>.json`.
    pub fn write_item(&self, bag: &str, item: Value) -> PathBuf {
        let id = item_id(&item);
        self.write_file(&format!("data_bags/{bag}/{id}.json"), &pretty(&item))
    }

    /// Encrypt `item` with `secret` and write it like [`write_item`](Self::write_item).
    pub fn write_encrypted_item(&self, bag: &str, item: Value, secret: &str) -> PathBuf {
        let id = item_id(&item);
        let record = item.as_object().cloned().unwrap();
        let encrypted = ChaChaItemCipher::new()
            .encrypt_item(&id, &record, &Secret::new(secret))
            .unwrap();
        self.write_file(
            &format!("data_bags/{bag}/{id}.json"),
            &pretty(&Value::Object(encrypted)),
        )
    }

    /// Write a node document as `nodes/<name>.json`.
    pub fn write_node(&self, node: Value) -> PathBuf {
        let name = node["name"].as_str().unwrap_or("node").to_string();
        self.write_file(&format!("nodes/{name}.json"), &pretty(&node))
    }

    /// Write a secret key file under `keys/`.
    pub fn write_secret(&self, name: &str, secret: &str) -> PathBuf {
        self.write_file(&format!("keys/{name}"), secret)
    }

    /// Write arbitrary content relative to the fixture root.
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }
}

fn item_id(item: &Value) -> String {
    item["id"]
        .as_str()
        .expect("fixture items need a string id")
        .to_string()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap()
}
