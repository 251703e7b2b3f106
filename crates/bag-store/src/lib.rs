//! Data bag item storage for bag-config
//!
//! Provides the record side of attribute resolution: loading configuration
//! items ("data bag items") from a backend, resolving the secret that guards
//! encrypted items, and decrypting item values.
//!
//! # Backends
//!
//! - [`MemoryBackend`] - in-process items, used by embedders and tests
//! - [`DirectoryBackend`] - `<root>/<bag>/<item>.{json,toml,yaml}` on disk
//!
//! Both implement [`RecordBackend`], the only seam the resolver depends on.

pub mod backend;
pub mod cipher;
pub mod directory;
pub mod error;
pub mod record;
pub mod secret;
pub mod store;

pub use backend::{MemoryBackend, RecordBackend};
pub use cipher::{ChaChaItemCipher, ItemCipher};
pub use directory::{DirectoryBackend, LookupStrategy};
pub use error::{Error, Result};
pub use record::{ITEM_ID_KEY, Record, record_from_value, strip_id};
pub use secret::{Secret, SecretResolver};
pub use store::ItemStore;
