//! Command implementations
//!
//! Both commands load the node, build a resolver configuration from the
//! optional config file plus command-line flags (flags win) and read through
//! a [`NodeOverride`] backed by the data bag directory.

use colored::Colorize;
use serde_json::{Value, json};

use bag_core::{Node, NodeAttributes, NodeOverride, OverrideSettings, ResolverConfig};
use bag_store::{DirectoryBackend, LookupStrategy};

use crate::cli::ResolveArgs;
use crate::error::{CliError, Result};

/// Outcome of reading one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub key: String,
    pub value: Value,
    pub namespace: Option<String>,
    pub data_bag: Option<String>,
    pub item: Option<String>,

    /// Whether a data bag item contributed to `value`.
    pub overridden: bool,
}

/// Where overrides for a caller come from.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub node: String,
    pub namespace: Option<String>,
    pub data_bag: Option<String>,
    pub item: Option<String>,
    pub encrypted: bool,
    pub allowed: bool,
    pub record_found: bool,
}

/// Run the get command
pub fn run_get(args: &ResolveArgs, key: &str, json: bool) -> Result<()> {
    let lookup = lookup(args, key)?;

    if json {
        let output = json!({
            "key": lookup.key,
            "value": lookup.value,
            "namespace": lookup.namespace,
            "data_bag": lookup.data_bag,
            "item": lookup.item,
            "overridden": lookup.overridden,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &lookup.value {
            Value::String(s) => println!("{s}"),
            other => println!("{}", serde_json::to_string_pretty(other)?),
        }
    }
    Ok(())
}

/// Run the describe command
pub fn run_describe(args: &ResolveArgs, json: bool) -> Result<()> {
    let description = describe(args)?;

    if json {
        let output = json!({
            "node": description.node,
            "namespace": description.namespace,
            "data_bag": description.data_bag,
            "item": description.item,
            "encrypted": description.encrypted,
            "allowed": description.allowed,
            "record_found": description.record_found,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_description(&description);
    }
    Ok(())
}

/// Resolve `key` the way the caller in `args` would see it.
pub fn lookup(args: &ResolveArgs, key: &str) -> Result<Lookup> {
    let node = Node::load(&args.node)?;
    let config = resolver_config(args)?;
    let backend = backend(&config)?;
    let proxy = NodeOverride::with_settings(&node, &backend, settings(args, &config));

    let value = proxy.get(key).ok_or_else(|| {
        CliError::user(format!("Attribute '{}' is not set on node {}", key.trim(), node.name()))
    })?;

    let resolution = proxy.resolution();
    let overridden = resolution.is_some_and(|r| r.allowed && r.namespace == key.trim())
        && proxy.record().is_some();

    Ok(Lookup {
        key: key.trim().to_string(),
        value,
        namespace: resolution.map(|r| r.namespace.clone()),
        data_bag: resolution.map(|r| r.data_bag.clone()),
        item: resolution.map(|r| r.item.clone()),
        overridden,
    })
}

/// Resolve namespace, data bag and item for the caller in `args`.
pub fn describe(args: &ResolveArgs) -> Result<Description> {
    let node = Node::load(&args.node)?;
    let config = resolver_config(args)?;
    let backend = backend(&config)?;
    let proxy = NodeOverride::with_settings(&node, &backend, settings(args, &config));

    let record_found = proxy.record().is_some();
    let resolution = proxy.resolution();

    Ok(Description {
        node: node.name().to_string(),
        namespace: resolution.map(|r| r.namespace.clone()),
        data_bag: resolution.map(|r| r.data_bag.clone()),
        item: resolution.map(|r| r.item.clone()),
        encrypted: resolution.is_some_and(|r| r.encrypted),
        allowed: resolution.is_some_and(|r| r.allowed),
        record_found,
    })
}

/// Configuration file (if any) with command-line flags merged over it.
fn resolver_config(args: &ResolveArgs) -> Result<ResolverConfig> {
    let mut config = match &args.config {
        Some(path) => ResolverConfig::load(path)?,
        None => ResolverConfig::default(),
    };

    let flags = ResolverConfig {
        namespace_override: args.namespace.clone(),
        record_name_override: args.data_bag.clone(),
        allow_list: args.allow.clone(),
        deny_list: args.deny.clone(),
        data_bag_path: args.data_bags.clone(),
        lookup: args.search.then_some(LookupStrategy::Search),
        share_cache: None,
    };
    config.merge(&flags);

    tracing::debug!(?config, "Resolver configuration");
    Ok(config)
}

fn backend(config: &ResolverConfig) -> Result<DirectoryBackend> {
    config.backend().ok_or_else(|| {
        CliError::user("No data bag directory. Pass --data-bags or set data_bag_path in --config.")
    })
}

fn settings(args: &ResolveArgs, config: &ResolverConfig) -> OverrideSettings {
    OverrideSettings {
        caller: args.caller.clone(),
        namespace_override: config.namespace_override.clone(),
        record_name_override: config.record_name_override.clone(),
        filter: config.filter(),
    }
}

fn print_description(description: &Description) {
    println!("{} {}", "Node".blue().bold(), description.node.yellow());

    let Some(namespace) = &description.namespace else {
        println!(
            "{} No caller or namespace given, attributes come from the node only.",
            "!".yellow().bold()
        );
        return;
    };

    let unset = String::from("-");
    println!("  {:<10} {}", "namespace", namespace.cyan());
    println!(
        "  {:<10} {}",
        "data bag",
        description.data_bag.as_ref().unwrap_or(&unset)
    );
    println!(
        "  {:<10} {}",
        "item",
        description.item.as_ref().unwrap_or(&unset)
    );
    println!("  {:<10} {}", "encrypted", description.encrypted);

    if !description.allowed {
        println!("{} Namespace is filtered from data bag overrides.", "!".yellow().bold());
    } else if description.record_found {
        println!("{} Data bag item found.", "OK".green().bold());
    } else {
        println!("{} No data bag item found, using node attributes.", "!".yellow().bold());
    }
}
