//! Format-agnostic item loading

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{Error, Result};

/// File extensions recognised as data bag items, in lookup order.
pub const ITEM_EXTENSIONS: &[&str] = &["json", "toml", "yaml", "yml"];

/// Format-agnostic item reader.
///
/// Detects the format from the file extension and parses the document
/// into a JSON value so every backend hands out the same shape.
#[derive(Debug, Default, Clone, Copy)]
pub struct ItemStore;

impl ItemStore {
    pub fn new() -> Self {
        Self
    }

    /// Load an item document from a file.
    ///
    /// Format is detected from file extension:
    /// - `.json` -> JSON
    /// - `.toml` -> TOML
    /// - `.yaml`, `.yml` -> YAML
    pub fn load(&self, path: &Path) -> Result<Value> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();
        if !ITEM_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::UnsupportedFormat { extension });
        }

        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.parse(&content, &extension, path)
    }

    /// Find the item file for `stem` inside `dir`, trying each known extension.
    pub fn locate(&self, dir: &Path, stem: &str) -> Option<PathBuf> {
        ITEM_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|candidate| candidate.is_file())
    }

    fn parse(&self, content: &str, extension: &str, path: &Path) -> Result<Value> {
        let parse_error = |format: &str, message: String| Error::ItemParse {
            path: path.to_path_buf(),
            format: format.into(),
            message,
        };

        match extension {
            "json" => serde_json::from_str(content).map_err(|e| parse_error("JSON", e.to_string())),
            "toml" => {
                let table: toml::Value =
                    toml::from_str(content).map_err(|e| parse_error("TOML", e.to_string()))?;
                serde_json::to_value(table).map_err(|e| parse_error("TOML", e.to_string()))
            }
            _ => serde_yaml::from_str(content).map_err(|e| parse_error("YAML", e.to_string())),
        }
    }
}
