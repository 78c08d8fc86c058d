use flowrepo::{Script, ScriptType, WorkspaceBuilder};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut workspace = WorkspaceBuilder::new().build().unwrap();

    workspace.initialize_project("even-odd").unwrap();

    let text = include_str!("./pipeline.yaml");
    workspace.replace_pipeline(text).unwrap();

    workspace.add_script(Script::from_template("even-odd", ScriptType::Map)).unwrap();
    workspace.attach_deployment("even-odd").unwrap();

    let report = workspace.sync("Add even-odd pipeline").unwrap();
    println!("Committed: {}, head: {}", report.is_committed(), report.head().short());

    let history = workspace.history().unwrap();
    for path in history.fs().walk_files("/").unwrap() {
        println!("{}", path);
    }
    for commit in history.log() {
        println!("{} {} <{}>", commit.id.short(), commit.message, commit.author);
    }

    let (file, text) = workspace.download_pipeline().unwrap();
    println!("--- {}\n{}", file, text);
}
