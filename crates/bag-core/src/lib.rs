//! Data bag attribute overrides for node configuration
//!
//! A cookbook reads its settings from node attributes under its own
//! namespace (`node["mysql"]["port"]`). This crate lets a data bag item
//! override those settings for one node without touching the node itself:
//!
//! ```text
//!   caller ("mysql") ──> namespace ──> data bag + item ──> RecordCache ──> RecordBackend
//!                            │                                 │
//!                            v                                 v
//!   node["mysql"] <── override layer ⊕ {"mysql": item} <── record (id stripped)
//! ```
//!
//! Every other namespace reads straight from the node. Broken or missing
//! items never fail a run: the read falls back to the node attributes.
//!
//! # Example
//!
//! ```
//! use bag_core::{BagContext, Node, Precedence};
//! use bag_store::MemoryBackend;
//! use serde_json::json;
//!
//! let node = Node::new("web01.example.com")
//!     .with_layer(Precedence::Normal, json!({"mysql": {"port": 3306, "config_bag": "custom_cfg"}}));
//! let backend = MemoryBackend::new()
//!     .with_item("mysql", json!({"id": "custom_cfg", "port": 3307}));
//!
//! let ctx = BagContext::new("mysql", &node, &backend);
//! assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3307);
//! ```

pub mod attributes;
pub mod bag_spec;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod logging;
pub mod namespace;
pub mod proxy;
pub mod template;

pub use attributes::{AttributeLayers, Node, NodeAttributes, Precedence, deep_merge};
pub use bag_spec::{BagSpec, default_item_name};
pub use cache::RecordCache;
pub use config::ResolverConfig;
pub use context::BagContext;
pub use error::{Error, Result};
pub use filter::AccessFilter;
pub use namespace::{resolve_namespace, resolve_record_name};
pub use proxy::{NodeOverride, OverrideSettings, Resolution};
pub use template::{TemplateContext, TemplateJob};
