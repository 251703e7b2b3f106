//! The record backend seam and an in-memory implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;

use crate::record::{ITEM_ID_KEY, record_from_value};
use crate::{ChaChaItemCipher, Error, ItemCipher, Record, Result, Secret};

/// Loads data bag items by bag name and item identifier.
///
/// Implementations decrypt encrypted items with the supplied secret and
/// report every failure as an [`Error`]; callers decide whether a failure
/// is fatal.
pub trait RecordBackend: Send + Sync {
    fn load(&self, bag: &str, item: &str, encrypted: bool, secret: Option<&Secret>)
    -> Result<Record>;
}

/// Decrypt `record` when the caller asked for an encrypted item.
pub(crate) fn finish_load(
    cipher: &dyn ItemCipher,
    bag: &str,
    item: &str,
    record: Record,
    encrypted: bool,
    secret: Option<&Secret>,
) -> Result<Record> {
    if !encrypted {
        return Ok(record);
    }
    let secret = secret.ok_or_else(|| Error::MissingSecret {
        bag: bag.to_string(),
        item: item.to_string(),
    })?;
    cipher.decrypt_item(item, record, secret)
}

/// In-process record backend.
///
/// Counts every `load` call, which makes cache behaviour observable, and can
/// be switched into a failing mode to simulate an unreachable store.
pub struct MemoryBackend {
    bags: HashMap<String, HashMap<String, Value>>,
    cipher: Arc<dyn ItemCipher>,
    failure: Option<String>,
    loads: AtomicUsize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            bags: HashMap::new(),
            cipher: Arc::new(ChaChaItemCipher::new()),
            failure: None,
            loads: AtomicUsize::new(0),
        }
    }

    /// Add an item, keyed by its `id` field.
    ///
    /// Items without a string `id` are stored under an empty identifier.
    pub fn with_item(mut self, bag: impl Into<String>, item: Value) -> Self {
        let id = item
            .get(ITEM_ID_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.insert(bag, id, item);
        self
    }

    /// Make every subsequent load fail with [`Error::Unavailable`].
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    pub fn with_cipher(mut self, cipher: Arc<dyn ItemCipher>) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn insert(&mut self, bag: impl Into<String>, item: impl Into<String>, value: Value) {
        self.bags
            .entry(bag.into())
            .or_default()
            .insert(item.into(), value);
    }

    /// Number of `load` calls made so far, successful or not.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl RecordBackend for MemoryBackend {
    fn load(
        &self,
        bag: &str,
        item: &str,
        encrypted: bool,
        secret: Option<&Secret>,
    ) -> Result<Record> {
        self.loads.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.failure {
            return Err(Error::Unavailable(reason.clone()));
        }

        let items = self.bags.get(bag).ok_or_else(|| Error::BagNotFound {
            bag: bag.to_string(),
        })?;
        let value = items.get(item).cloned().ok_or_else(|| Error::ItemNotFound {
            bag: bag.to_string(),
            item: item.to_string(),
        })?;

        let record = record_from_value(value, bag, item)?;
        finish_load(self.cipher.as_ref(), bag, item, record, encrypted, secret)
    }
}
