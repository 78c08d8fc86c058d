//! Editing session over one active project.
//!
//! The workspace owns the working copies of the active project: the
//! project record, its pipeline graph and its version history. Nothing is
//! durable until [`Workspace::sync`] runs:
//!
//! ```text
//! graph -> pipeline text -> file tree -> commit -> project store
//! ```

use tracing::{debug, info, trace};

use crate::{
    FlowRepoError, Result,
    artifacts::ScriptBundle,
    config::ArtifactsConfig,
    history::{CommitReport, VersionHistory},
    model::{PipelineGraph, Project, ProjectSummary, Script},
    naming::sanitize_filesystem_name,
    pipeline::{export_pipeline, export_pipeline_text, import_pipeline},
    store::ProjectStore,
};

struct Session {
    project: Project,
    graph: PipelineGraph,
    history: VersionHistory,
}

impl Session {
    fn open(project: Project) -> Result<Self> {
        let graph = match project.pipeline.as_deref() {
            Some(text) if !text.trim().is_empty() => import_pipeline(text)?.into_graph(),
            _ => PipelineGraph::new(),
        };
        let history = VersionHistory::initialize(Some(&project))?;
        Ok(Self {
            project,
            graph,
            history,
        })
    }
}

pub struct Workspace {
    store: ProjectStore,
    artifacts: ArtifactsConfig,
    session: Option<Session>,
}

impl Workspace {
    pub fn new(
        store: ProjectStore,
        artifacts: ArtifactsConfig,
    ) -> Self {
        Self {
            store,
            artifacts,
            session: None,
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(FlowRepoError::Project("no active project".into()))
    }

    fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(FlowRepoError::Project("no active project".into()))
    }

    /// Create an empty project in the store and make it active.
    pub fn initialize_project(
        &mut self,
        name: &str,
    ) -> Result<&Project> {
        trace!("workspace::initialize_project({})", name);
        let project = self.store.create(name)?;
        let session = Session::open(project)?;
        info!("initialized project {}", name);
        Ok(&self.session.insert(session).project)
    }

    /// Load a stored project and make it active.
    ///
    /// On error the previously active project stays active.
    pub fn open_project(
        &mut self,
        name: &str,
    ) -> Result<&Project> {
        trace!("workspace::open_project({})", name);
        let project = self.store.load(name)?.ok_or(FlowRepoError::NotFound(format!("project {}", name)))?;
        let session = Session::open(project)?;
        debug!("opened project {} with {} vertices and {} scripts", name, session.graph.vertices().len(), session.project.scripts.len());
        Ok(&self.session.insert(session).project)
    }

    /// Drop the active project; changes since the last sync are discarded.
    pub fn close_project(&mut self) -> Option<Project> {
        let session = self.session.take()?;
        debug!("closed project {}", session.project.name);
        Some(session.project)
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn project(&self) -> Result<&Project> {
        Ok(&self.session()?.project)
    }

    pub fn project_mut(&mut self) -> Result<&mut Project> {
        Ok(&mut self.session_mut()?.project)
    }

    pub fn graph(&self) -> Result<&PipelineGraph> {
        Ok(&self.session()?.graph)
    }

    pub fn graph_mut(&mut self) -> Result<&mut PipelineGraph> {
        Ok(&mut self.session_mut()?.graph)
    }

    pub fn history(&self) -> Result<&VersionHistory> {
        Ok(&self.session()?.history)
    }

    /// Add a script to the active project, replacing one of the same name.
    pub fn add_script(
        &mut self,
        script: Script,
    ) -> Result<()> {
        self.project_mut()?.add_script(script)
    }

    /// Change the body of a script and optionally move it to a new name.
    pub fn edit_script(
        &mut self,
        name: &str,
        new_name: &str,
        body: &str,
    ) -> Result<()> {
        self.project_mut()?.rename_script(name, new_name, body)
    }

    pub fn remove_script(
        &mut self,
        name: &str,
    ) -> Result<Script> {
        self.project_mut()?.remove_script(name)
    }

    /// Generate deployment and service manifests for a script in the configured namespace.
    pub fn attach_deployment(
        &mut self,
        script_name: &str,
    ) -> Result<(String, String)> {
        let namespace = self.artifacts.namespace.clone();
        self.project_mut()?.attach_deployment(script_name, Some(&namespace))
    }

    /// The script file and its build file, for download.
    pub fn script_bundle(
        &self,
        name: &str,
    ) -> Result<ScriptBundle> {
        let script = self.project()?.script(name).ok_or(FlowRepoError::NotFound(format!("script {}", name)))?;
        Ok(ScriptBundle::for_script(&script.name, &script.body))
    }

    /// Replace the graph with an imported document; on error the graph is untouched.
    pub fn replace_pipeline(
        &mut self,
        text: &str,
    ) -> Result<()> {
        trace!("workspace::replace_pipeline()");
        let session = self.session_mut()?;
        let imported = import_pipeline(text)?;
        if let Some(name) = imported.name.as_deref().filter(|name| *name != session.project.name) {
            debug!("imported pipeline {} into project {}", name, session.project.name);
        }
        session.graph = imported.into_graph();
        Ok(())
    }

    /// The current graph as text, with the name placeholder.
    pub fn preview_pipeline(&self) -> Result<String> {
        export_pipeline_text(self.graph()?)
    }

    /// File name and text of the final document, named after the project.
    pub fn download_pipeline(&self) -> Result<(String, String)> {
        let session = self.session()?;
        let text = export_pipeline(&session.graph)?.with_name(&session.project.name).to_yaml()?;
        Ok((format!("{}.yaml", sanitize_filesystem_name(&session.project.name)), text))
    }

    /// Export the graph into the project, commit the tree and save the project.
    ///
    /// An empty graph is not exported into a project that has no pipeline yet.
    pub fn sync(
        &mut self,
        message: &str,
    ) -> Result<CommitReport> {
        trace!("workspace::sync({})", message);
        let session = self.session.as_mut().ok_or(FlowRepoError::Project("no active project".into()))?;

        if !session.graph.is_empty() || session.project.pipeline.is_some() {
            let text = export_pipeline(&session.graph)?.with_name(&session.project.name).to_yaml()?;
            session.project.pipeline = Some(text);
        }

        let report = session.history.commit(&session.project, message)?;
        self.store.save(&mut session.project)?;
        info!("synced project {} at {}", session.project.name, report.head().short());
        Ok(report)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        self.store.list()
    }

    /// Delete a stored project, closing it first when it is the active one.
    pub fn delete_project(
        &mut self,
        name: &str,
    ) -> Result<bool> {
        trace!("workspace::delete_project({})", name);
        if self.session.as_ref().is_some_and(|s| s.project.name == name) {
            self.close_project();
        }
        self.store.delete(name)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        history::CommitOutcome,
        model::{ScriptType, Vertex},
        store::MemStore,
    };

    fn workspace() -> Workspace {
        Workspace::new(ProjectStore::new(&MemStore::new()).unwrap(), ArtifactsConfig::default())
    }

    fn add_scenario_graph(ws: &mut Workspace) {
        let graph = ws.graph_mut().unwrap();
        graph.add_vertex(Vertex::new("in", json!({"source": {"generator": {"rpu": 5}}}))).unwrap();
        graph.add_vertex(Vertex::new("cat", json!({"udf": {"container": {"image": "cat:latest"}}}))).unwrap();
        graph.add_vertex(Vertex::new("out", json!({"sink": {"log": {}}}))).unwrap();
        graph.connect("in", "cat").unwrap();
        graph.connect("cat", "out").unwrap();
    }

    #[test]
    fn test_requires_active_project() {
        let mut ws = workspace();
        assert!(!ws.is_open());
        assert!(matches!(ws.graph(), Err(FlowRepoError::Project(_))));
        assert!(matches!(ws.sync("x"), Err(FlowRepoError::Project(_))));
        assert!(ws.close_project().is_none());
    }

    #[test]
    fn test_initialize_and_sync() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        assert_eq!(ws.history().unwrap().len(), 1);

        let report = ws.sync("nothing yet").unwrap();
        assert!(!report.is_committed());
        assert!(ws.project().unwrap().pipeline.is_none());

        add_scenario_graph(&mut ws);
        ws.add_script(Script::from_template("cat", ScriptType::Map)).unwrap();
        let report = ws.sync("add pipeline").unwrap();
        assert!(report.is_committed());
        assert_eq!(ws.history().unwrap().len(), 2);

        let stored = ws.store().load("demo").unwrap().unwrap();
        let pipeline = stored.pipeline.unwrap();
        assert!(pipeline.contains("name: demo"));
        assert!(stored.scripts.contains_key("cat"));

        let head = ws.history().unwrap().head().cloned().unwrap();
        assert_eq!(ws.history().unwrap().read_file(&head, "pipeline.yaml").unwrap(), pipeline.as_bytes());

        assert_eq!(ws.sync("again").unwrap().outcome, CommitOutcome::Unchanged(head));
    }

    #[test]
    fn test_open_restores_graph() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        add_scenario_graph(&mut ws);
        ws.sync("save").unwrap();
        let before = ws.graph().unwrap().clone();

        ws.close_project();
        ws.open_project("demo").unwrap();
        assert_eq!(ws.graph().unwrap().vertices(), before.vertices());
        assert_eq!(ws.graph().unwrap().edges().len(), 2);
        assert_eq!(ws.history().unwrap().len(), 1);
    }

    #[test]
    fn test_close_discards_unsynced_changes() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        ws.add_script(Script::new("a", ScriptType::Map, "pass")).unwrap();
        assert!(ws.close_project().unwrap().scripts.contains_key("a"));

        ws.open_project("demo").unwrap();
        assert!(ws.project().unwrap().scripts.is_empty());
    }

    #[test]
    fn test_open_missing_keeps_active() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        assert!(matches!(ws.open_project("missing"), Err(FlowRepoError::NotFound(_))));
        assert_eq!(ws.project().unwrap().name, "demo");
    }

    #[test]
    fn test_replace_pipeline_keeps_graph_on_error() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        add_scenario_graph(&mut ws);

        assert!(matches!(ws.replace_pipeline("spec: [unclosed"), Err(FlowRepoError::MalformedInput(_))));
        assert!(matches!(ws.replace_pipeline("kind: Pipeline\n"), Err(FlowRepoError::MalformedInput(_))));
        assert_eq!(ws.graph().unwrap().vertices().len(), 3);

        let text = "spec:\n  vertices:\n    - name: only\n      source: {http: {}}\n";
        ws.replace_pipeline(text).unwrap();
        assert_eq!(ws.graph().unwrap().vertices().len(), 1);
        assert!(ws.graph().unwrap().edges().is_empty());
    }

    #[test]
    fn test_preview_and_download() {
        let mut ws = workspace();
        ws.initialize_project("my demo").unwrap();
        add_scenario_graph(&mut ws);

        assert!(ws.preview_pipeline().unwrap().contains("<pipeline-name>"));
        let (file, text) = ws.download_pipeline().unwrap();
        assert_eq!(file, "my_demo.yaml");
        assert!(text.contains("name: my demo"));
    }

    #[test]
    fn test_scripts_and_deployment() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        ws.add_script(Script::new("even odd", ScriptType::Map, "pass")).unwrap();
        ws.edit_script("even odd", "even-odd", "print(1)").unwrap();

        let bundle = ws.script_bundle("even-odd").unwrap();
        assert_eq!(bundle.script_file, "even-odd.py");
        assert_eq!(bundle.script_body, "print(1)");
        assert!(matches!(ws.script_bundle("even odd"), Err(FlowRepoError::NotFound(_))));

        let (deployment, service) = ws.attach_deployment("even-odd").unwrap();
        assert_eq!(deployment, "even-odd-deployment.yaml");
        assert_eq!(service, "even-odd-service.yaml");
        ws.sync("deploy").unwrap();

        let head = ws.history().unwrap().head().cloned().unwrap();
        let files = ws.history().unwrap().files_at(&head).unwrap();
        assert!(files.contains(&"manifests/even-odd-deployment.yaml"));

        ws.remove_script("even-odd").unwrap();
        assert!(ws.remove_script("even-odd").is_err());
    }

    #[test]
    fn test_delete_active_project() {
        let mut ws = workspace();
        ws.initialize_project("demo").unwrap();
        ws.initialize_project("other").unwrap();
        ws.open_project("demo").unwrap();

        assert!(ws.delete_project("demo").unwrap());
        assert!(!ws.is_open());
        let names: Vec<_> = ws.list_projects().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["other"]);
        assert!(matches!(ws.initialize_project("other"), Err(FlowRepoError::DuplicateName(_))));
    }
}
