//! Workspace scenarios
//!
//! A whole configuration run against a data bag directory: several
//! contexts, a resolver configuration file, templates and encrypted items.

use std::sync::Arc;
use std::thread;

use bag_core::{
    BagContext, Node, NodeAttributes, RecordCache, ResolverConfig, TemplateContext,
};
use bag_store::{DirectoryBackend, LookupStrategy};
use bag_test_utils::BagFixture;
use pretty_assertions::assert_eq;
use serde_json::json;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// A data bag tree with items for two cookbooks and one node document.
fn site() -> (BagFixture, Node) {
    let fixture = BagFixture::new();
    fixture.write_item(
        "mysql",
        json!({"id": "custom_cfg", "port": 3307, "tuning": {"buffer": "1G"}}),
    );
    fixture.write_item(
        "apps",
        json!({"id": "config_web01_example_com", "workers": 16}),
    );
    let path = fixture.write_node(json!({
        "name": "web01.example.com",
        "default": {"mysql": {"port": 3305, "tuning": {"threads": 4}}, "app": {"workers": 2}},
        "normal": {
            "mysql": {"port": 3306, "config_bag": "custom_cfg"},
            "app": {"config_data_bag_override": "apps"}
        },
        "automatic": {"hostname": "web01"}
    }));
    let node = Node::load(&path).unwrap();
    (fixture, node)
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn configured_run_shares_one_cache() {
    let (fixture, node) = site();
    let config = ResolverConfig::parse(&format!(
        "data_bag_path = {:?}\nshare_cache = true\ndeny_list = [\"legacy\"]\n",
        fixture.data_bags().display().to_string()
    ))
    .unwrap();
    let backend = config.backend().unwrap();
    let run_cache = RecordCache::new();

    let recipe = BagContext::from_config("mysql", &node, &backend, &config)
        .with_cache(config.cache_for(&run_cache));
    let resource = BagContext::from_config("mysql", &node, &backend, &config)
        .with_cache(config.cache_for(&run_cache));
    let app = BagContext::from_config("app", &node, &backend, &config)
        .with_cache(config.cache_for(&run_cache));

    let mysql = recipe.node().get("mysql").unwrap();
    assert_eq!(mysql["port"], 3307);
    assert_eq!(mysql["tuning"], json!({"threads": 4, "buffer": "1G"}));
    assert_eq!(resource.node().get("mysql"), Some(mysql));

    assert_eq!(app.data_bag(), Some("apps"));
    assert_eq!(app.node().get("app").unwrap()["workers"], 16);
    assert_eq!(app.node().get("mysql"), node.get("mysql"));

    assert!(run_cache.is_shared());
    assert_eq!(run_cache.len(), 2);
}

#[test]
fn template_sees_declaring_namespace() {
    let (fixture, node) = site();
    let backend = DirectoryBackend::new(fixture.data_bags());
    let run_cache = RecordCache::new();

    let mut ctx = BagContext::new("frontend", &node, &backend).with_cache(run_cache.clone());
    ctx.override_node_key("mysql").unwrap();
    let job = ctx.template("my.cnf.erb").with_variable("socket", json!("/tmp/mysql.sock"));

    let render = TemplateContext::new(job, &node, &backend).with_cache(run_cache.clone());
    assert_eq!(render.node().get("mysql").unwrap()["port"], 3307);
    assert_eq!(render.variable("socket"), Some(&json!("/tmp/mysql.sock")));
    assert_eq!(run_cache.len(), 1);
}

#[test]
fn template_keeps_configured_deny_list() {
    let (fixture, node) = site();
    let config = ResolverConfig::parse(&format!(
        "data_bag_path = {:?}\ndeny_list = [\"mysql\"]\n",
        fixture.data_bags().display().to_string()
    ))
    .unwrap();
    let backend = config.backend().unwrap();

    let ctx = BagContext::from_config("mysql", &node, &backend, &config);
    let render = ctx.render(ctx.template("my.cnf.erb"));

    assert_eq!(ctx.node().get("mysql").unwrap()["port"], 3306);
    assert_eq!(render.node().get("mysql").unwrap()["port"], 3306);
}

#[test]
fn template_reads_overridden_data_bag() {
    let (fixture, node) = site();
    fixture.write_item("shared", json!({"id": "custom_cfg", "port": 4000}));
    let backend = DirectoryBackend::new(fixture.data_bags());

    let mut ctx = BagContext::new("mysql", &node, &backend);
    ctx.override_data_bag("shared").unwrap();
    let job = ctx.template("my.cnf.erb");

    assert_eq!(ctx.node().get("mysql").unwrap()["port"], 4000);
    assert_eq!(ctx.render(job.clone()).node().get("mysql").unwrap()["port"], 4000);
    let detached = TemplateContext::new(job, &node, &backend);
    assert_eq!(detached.node().get("mysql").unwrap()["port"], 4000);
}

#[test]
fn encrypted_item_found_by_search() {
    let fixture = BagFixture::new();
    let key = fixture.write_secret("db.key", "s3cret\n");
    let item = json!({"id": "db_primary", "password": "hunter2", "port": 5433});
    let encrypted = fixture.write_encrypted_item("postgres", item, "s3cret");
    std::fs::rename(&encrypted, encrypted.with_file_name("renamed.json")).unwrap();

    let node = Node::new("db01").with_layer(
        bag_core::Precedence::Normal,
        json!({"postgres": {"port": 5432, "config_bag": {
            "item": "db_primary",
            "encrypted": "yes",
            "secret": key.display().to_string(),
        }}}),
    );

    let direct = DirectoryBackend::new(fixture.data_bags());
    let ctx = BagContext::new("postgres", &node, &direct);
    assert_eq!(ctx.node().get("postgres").unwrap()["port"], 5432);

    let search = DirectoryBackend::new(fixture.data_bags()).with_strategy(LookupStrategy::Search);
    let ctx = BagContext::new("postgres", &node, &search);
    let postgres = ctx.node().get("postgres").unwrap();
    assert_eq!(postgres["port"], 5433);
    assert_eq!(postgres["password"], "hunter2");
}

#[test]
fn bag_or_node_reads_item_then_node() {
    let (fixture, node) = site();
    let backend = DirectoryBackend::new(fixture.data_bags());
    let ctx = BagContext::new("mysql", &node, &backend);

    assert_eq!(ctx.node().bag_or_node("port"), Some(json!(3307)));
    assert_eq!(ctx.node().bag_or_node("hostname"), Some(json!("web01")));

    let args = ctx.node().bag_or_node_args(["port", "hostname", "absent"]);
    assert_eq!(args["port"], 3307);
    assert_eq!(args["hostname"], "web01");
    assert_eq!(args["absent"], serde_json::Value::Null);
}

#[test]
fn concurrent_contexts_load_each_namespace_once() {
    let (fixture, node) = site();
    let backend = Arc::new(DirectoryBackend::new(fixture.data_bags()));
    let node = Arc::new(node);
    let run_cache = RecordCache::new();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let backend = Arc::clone(&backend);
            let node = Arc::clone(&node);
            let cache = run_cache.clone();
            thread::spawn(move || {
                let ctx = BagContext::new("mysql", &node, backend.as_ref()).with_cache(cache);
                ctx.node().get("mysql").unwrap()["port"].clone()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), json!(3307));
    }
    assert_eq!(run_cache.len(), 1);
}

#[test]
fn yaml_node_document() {
    let fixture = BagFixture::new();
    fixture.write_item("nginx", json!({"id": "config_lb01", "worker_processes": 8}));
    let path = fixture.write_file(
        "nodes/lb01.yaml",
        "name: lb01\nnormal:\n  nginx:\n    worker_processes: 2\n    bag_whitelist: [nginx]\n",
    );
    let node = Node::load(&path).unwrap();
    let backend = DirectoryBackend::new(fixture.data_bags());
    let ctx = BagContext::new("nginx", &node, &backend);

    assert_eq!(ctx.node().get("nginx").unwrap()["worker_processes"], 8);
}
