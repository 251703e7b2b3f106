//! Namespace ("node key") and data bag name resolution
//!
//! The namespace is the top-level attribute key whose values a data bag may
//! override. It defaults to the caller's own name (the cookbook or recipe
//! asking for attributes) and can be remapped per node:
//!
//! ```json
//! {"bag_config": {"map": {"mysql_server": "mysql"}}}
//! ```

use serde_json::Value;

use crate::attributes::AttributeLayers;

/// Node attribute holding resolver settings shared by every namespace.
pub const BAG_CONFIG_KEY: &str = "bag_config";

/// Key below [`BAG_CONFIG_KEY`] mapping caller names to namespaces.
pub const NAMESPACE_MAP_KEY: &str = "map";

/// Key below the namespace naming the data bag to read.
pub const DATA_BAG_OVERRIDE_KEY: &str = "config_data_bag_override";

/// Resolve the namespace governing attribute overrides.
///
/// Priority: explicit override, then `bag_config.map.<caller>`, then the
/// caller itself. Returns `None` when nothing names a namespace, in which
/// case no data bag override is possible.
pub fn resolve_namespace(
    explicit_override: Option<&str>,
    attributes: &AttributeLayers,
    caller: Option<&str>,
) -> Option<String> {
    if let Some(namespace) = non_empty(explicit_override) {
        return Some(namespace);
    }

    let caller = non_empty(caller)?;
    let mapped = attributes
        .get(BAG_CONFIG_KEY)
        .as_ref()
        .and_then(|config| config.get(NAMESPACE_MAP_KEY))
        .and_then(|map| map.get(&caller))
        .and_then(attribute_string);

    Some(mapped.unwrap_or(caller))
}

/// Resolve the name of the data bag holding configuration items.
///
/// Priority: explicit override, then `<namespace>.config_data_bag_override`
/// when set and non-empty, then the namespace itself.
pub fn resolve_record_name(
    explicit_override: Option<&str>,
    attributes: &AttributeLayers,
    namespace: &str,
) -> String {
    if let Some(name) = non_empty(explicit_override) {
        return name;
    }

    attributes
        .get(namespace)
        .as_ref()
        .and_then(|scope| scope.get(DATA_BAG_OVERRIDE_KEY))
        .and_then(attribute_string)
        .unwrap_or_else(|| namespace.to_string())
}

/// Render a scalar attribute as a trimmed, non-empty string.
pub(crate) fn attribute_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
