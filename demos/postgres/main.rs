use flowrepo::{Config, Script, ScriptType, Vertex, WorkspaceBuilder};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_str = include_str!("./config.toml");

    let config = Config::load_from_str(config_str).unwrap();

    let mut workspace = WorkspaceBuilder::new().config(config).build().unwrap();

    if workspace.store().exists("word-count").unwrap() {
        workspace.open_project("word-count").unwrap();
    } else {
        workspace.initialize_project("word-count").unwrap();
    }

    let graph = workspace.graph_mut().unwrap();
    if graph.is_empty() {
        graph.add_vertex(Vertex::new("in", json!({"source": {"http": {}}}))).unwrap();
        graph.add_vertex(Vertex::new("count", json!({"udf": {"container": {"image": "count:latest"}}}))).unwrap();
        graph.add_vertex(Vertex::new("out", json!({"sink": {"log": {}}}))).unwrap();
        graph.connect("in", "count").unwrap();
        graph.connect("count", "out").unwrap();
    }
    workspace.add_script(Script::from_template("count", ScriptType::Reduce)).unwrap();

    let report = workspace.sync("Update word-count").unwrap();
    println!("Committed: {}, failures: {}", report.is_committed(), report.failures.len());

    for summary in workspace.list_projects().unwrap() {
        println!("{} (modified {})", summary.name, summary.last_modified);
    }
}
