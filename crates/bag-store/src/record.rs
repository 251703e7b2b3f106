//! The record type loaded from a data bag

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Reserved key holding the item identifier inside every record.
pub const ITEM_ID_KEY: &str = "id";

/// A loaded data bag item: a JSON object keyed by attribute name.
pub type Record = Map<String, Value>;

/// Convert a parsed item document into a [`Record`].
///
/// Items must be objects; anything else is reported as
/// [`Error::MalformedItem`].
pub fn record_from_value(value: Value, bag: &str, item: &str) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::malformed(
            bag,
            item,
            format!("expected an object, found {}", type_name(&other)),
        )),
    }
}

/// Return a copy of `record` without the reserved `id` key.
pub fn strip_id(record: &Record) -> Record {
    let mut stripped = record.clone();
    stripped.remove(ITEM_ID_KEY);
    stripped
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
