//! Version history of a project's file tree.
//!
//! A [`VersionHistory`] owns the [`MemoryFs`] its project is materialized
//! into, a staging index and an arena of content-addressed objects. Every
//! commit resyncs the tree from the project, stages each file and records a
//! snapshot only when the stage differs from head:
//!
//! ```text
//! resync -> enumerate -> stage each -> status matrix -> commit | unchanged
//! ```

mod object;
mod status;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::{
    FlowRepoError, Result,
    model::Project,
    vfs::{self, MemoryFs},
};
pub use object::{Commit, ObjectId, ObjectStore, Signature, Tree};
pub use status::{ChangeType, PathChange, StatusRow};

pub const AUTHOR_NAME: &str = "Pipeline Designer";
pub const AUTHOR_EMAIL: &str = "designer@pipeline.local";
pub const INITIAL_COMMIT_MESSAGE: &str = "Initial commit";

/// Identity stamped on every commit.
pub fn system_author() -> Signature {
    Signature {
        name: AUTHOR_NAME.to_string(),
        email: AUTHOR_EMAIL.to_string(),
    }
}

fn relative(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// A path that could not be staged. The commit goes on without it.
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub path: String,
    pub error: FlowRepoError,
}

impl StageFailure {
    fn new(
        path: &str,
        err: FlowRepoError,
    ) -> Self {
        warn!("failed to stage {}: {}", path, err);
        Self {
            path: relative(path).to_string(),
            error: FlowRepoError::PartialStage(format!("{}: {}", relative(path), err)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(ObjectId),
    /// Nothing differed from head; carries the current head.
    Unchanged(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub outcome: CommitOutcome,
    pub failures: Vec<StageFailure>,
}

impl CommitReport {
    pub fn head(&self) -> &ObjectId {
        match &self.outcome {
            CommitOutcome::Committed(id) | CommitOutcome::Unchanged(id) => id,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.outcome, CommitOutcome::Committed(_))
    }
}

#[derive(Debug, Clone)]
pub struct VersionHistory {
    fs: MemoryFs,
    objects: ObjectStore,
    index: BTreeMap<String, ObjectId>,
    head: Option<ObjectId>,
}

impl VersionHistory {
    /// Materialize `project`, stage every file and record the first commit.
    pub fn initialize(project: Option<&Project>) -> Result<Self> {
        let mut history = Self {
            fs: MemoryFs::new(),
            objects: ObjectStore::default(),
            index: BTreeMap::new(),
            head: None,
        };
        history.sync(project);

        let (paths, _) = history.enumerate();
        history.stage_paths(&paths);
        let id = history.record(INITIAL_COMMIT_MESSAGE);
        debug!("history initialized at {}", id.short());
        Ok(history)
    }

    /// Snapshot the current state of `project`.
    ///
    /// Returns [`CommitOutcome::Unchanged`] when the staged tree equals head.
    /// On error head is left where it was.
    pub fn commit(
        &mut self,
        project: &Project,
        message: &str,
    ) -> Result<CommitReport> {
        let mut failures = self.sync(Some(project));

        let (paths, walk_failures) = self.enumerate();
        failures.extend(walk_failures);
        failures.extend(self.stage_paths(&paths));

        let fs = &self.fs;
        self.index.retain(|path, _| fs.exists(path));

        let changed = self.status()?.into_iter().filter(StatusRow::is_staged_change).count();
        let outcome = match self.head.clone() {
            Some(head) if changed == 0 => {
                debug!("nothing to commit, head stays at {}", head.short());
                CommitOutcome::Unchanged(head)
            }
            _ => {
                let id = self.record(message);
                debug!("committed {} with {} changed paths", id.short(), changed);
                CommitOutcome::Committed(id)
            }
        };

        Ok(CommitReport {
            outcome,
            failures,
        })
    }

    fn record(
        &mut self,
        message: &str,
    ) -> ObjectId {
        let tree = self.objects.put_tree(Tree {
            entries: self.index.clone(),
        });
        let commit = Commit::new(message, system_author(), self.head.clone(), tree);
        let id = self.objects.put_commit(commit);
        self.head = Some(id.clone());
        id
    }

    /// Rebuild the tree; paths that could not be materialized come back as failures.
    fn sync(
        &mut self,
        project: Option<&Project>,
    ) -> Vec<StageFailure> {
        self.fs.sync_from_project(project).into_iter().map(|(path, err)| StageFailure::new(&path, err)).collect()
    }

    /// Every file under the root; a failed walk stages nothing.
    fn enumerate(&self) -> (Vec<String>, Vec<StageFailure>) {
        match self.fs.walk_files(vfs::ROOT) {
            Ok(files) => (files, Vec::new()),
            Err(err) => (Vec::new(), vec![StageFailure::new(vfs::ROOT, err)]),
        }
    }

    pub(crate) fn stage_paths(
        &mut self,
        paths: &[String],
    ) -> Vec<StageFailure> {
        let mut failures = Vec::new();
        for path in paths {
            match self.stage(path) {
                Ok(()) => {}
                Err(err) => failures.push(StageFailure::new(path, err)),
            }
        }
        failures
    }

    fn stage(
        &mut self,
        path: &str,
    ) -> Result<()> {
        if self.fs.stat(path)?.is_dir() {
            return Ok(());
        }
        let id = self.objects.put_blob(self.fs.read(path)?);
        self.index.insert(relative(path).to_string(), id);
        Ok(())
    }

    /// Head, working tree and stage compared for every known path.
    pub fn status(&self) -> Result<Vec<StatusRow>> {
        let head = match &self.head {
            Some(id) => Some(self.objects.commit_tree(id)?),
            None => None,
        };
        let workdir = self
            .fs
            .files()
            .map(|path| Ok((relative(path).to_string(), ObjectId::for_blob(self.fs.read(path)?))))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(status::status_matrix(head, &workdir, &self.index))
    }

    pub fn head(&self) -> Option<&ObjectId> {
        self.head.as_ref()
    }

    pub fn commit_info(
        &self,
        id: &ObjectId,
    ) -> Option<&Commit> {
        self.objects.commit(id)
    }

    /// Commits reachable from head, newest first.
    pub fn log(&self) -> Vec<&Commit> {
        let mut commits = Vec::new();
        let mut next = self.head.as_ref();
        while let Some(commit) = next.and_then(|id| self.objects.commit(id)) {
            commits.push(commit);
            next = commit.parent.as_ref();
        }
        commits
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Content of `path` as recorded by `commit`.
    pub fn read_file(
        &self,
        commit: &ObjectId,
        path: &str,
    ) -> Result<&[u8]> {
        let path = relative(path);
        let tree = self.objects.commit_tree(commit)?;
        let blob = tree.entries.get(path).ok_or(FlowRepoError::NotFound(format!("{} in commit {}", path, commit.short())))?;
        self.objects.blob(blob)
    }

    /// Paths recorded by `commit`, sorted.
    pub fn files_at(
        &self,
        commit: &ObjectId,
    ) -> Result<Vec<&str>> {
        Ok(self.objects.commit_tree(commit)?.entries.keys().map(String::as_str).collect())
    }

    /// Paths that differ between two commits; `from = None` compares against an empty tree.
    pub fn changed_paths(
        &self,
        from: Option<&ObjectId>,
        to: &ObjectId,
    ) -> Result<Vec<PathChange>> {
        let from = match from {
            Some(id) => Some(self.objects.commit_tree(id)?),
            None => None,
        };
        Ok(status::diff_trees(from, self.objects.commit_tree(to)?))
    }

    /// The materialized tree, read only.
    pub fn fs(&self) -> &MemoryFs {
        &self.fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Manifest, ManifestNamespace, Script, ScriptType};

    fn project_with_script(name: &str) -> Project {
        let mut project = Project::new("demo");
        project.add_script(Script::new(name, ScriptType::Map, "print('hi')")).unwrap();
        project
    }

    #[test]
    fn test_initialize_empty_project() {
        let project = Project::new("empty");
        let mut history = VersionHistory::initialize(Some(&project)).unwrap();

        let log = history.log();
        assert_eq!(log.len(), 1);
        assert!(log[0].parent.is_none());
        assert_eq!(log[0].message, INITIAL_COMMIT_MESSAGE);
        assert_eq!(log[0].author, system_author());
        let head = history.head().cloned().unwrap();

        let report = history.commit(&project, "nothing").unwrap();
        assert_eq!(report.outcome, CommitOutcome::Unchanged(head.clone()));
        assert!(!report.is_committed());
        assert_eq!(report.head(), &head);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_initialize_without_project() {
        let history = VersionHistory::initialize(None).unwrap();
        let head = history.head().unwrap();
        assert!(history.files_at(head).unwrap().is_empty());
        assert_eq!(history.fs().file_count(), 0);
    }

    #[test]
    fn test_commit_records_changes() {
        let mut project = Project::new("demo");
        let mut history = VersionHistory::initialize(Some(&project)).unwrap();
        let first = history.head().cloned().unwrap();

        project.add_script(Script::new("even-odd", ScriptType::Map, "pass")).unwrap();
        let report = history.commit(&project, "add even-odd").unwrap();
        assert!(report.is_committed());
        assert!(report.failures.is_empty());

        let head = history.head().cloned().unwrap();
        assert_eq!(history.commit_info(&head).unwrap().parent.as_ref(), Some(&first));
        assert_eq!(history.read_file(&head, "scripts/even-odd.py").unwrap(), b"pass");
        assert_eq!(
            history.changed_paths(Some(&first), &head).unwrap(),
            vec![
                PathChange {
                    path: "dockerfiles/even-odd/Dockerfile".into(),
                    change: ChangeType::Added,
                },
                PathChange {
                    path: "scripts/even-odd.py".into(),
                    change: ChangeType::Added,
                },
            ]
        );
    }

    #[test]
    fn test_repeated_commit_is_noop() {
        let project = project_with_script("a");
        let mut history = VersionHistory::initialize(None).unwrap();

        assert!(history.commit(&project, "first").unwrap().is_committed());
        let head = history.head().cloned().unwrap();
        let report = history.commit(&project, "again").unwrap();
        assert_eq!(report.outcome, CommitOutcome::Unchanged(head));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_rename_drops_old_paths() {
        let mut project = project_with_script("old");
        let mut history = VersionHistory::initialize(Some(&project)).unwrap();
        let before = history.head().cloned().unwrap();

        project.rename_script("old", "new", "print('hi')").unwrap();
        assert!(history.commit(&project, "rename").unwrap().is_committed());
        let after = history.head().cloned().unwrap();

        let files = history.files_at(&after).unwrap();
        assert!(files.contains(&"scripts/new.py"));
        assert!(!files.contains(&"scripts/old.py"));
        assert!(history.read_file(&after, "/scripts/old.py").is_err());
        assert_eq!(history.read_file(&before, "/scripts/old.py").unwrap(), b"print('hi')");

        let deleted: Vec<_> = history.changed_paths(Some(&before), &after).unwrap().into_iter().filter(|c| c.change == ChangeType::Deleted).map(|c| c.path).collect();
        assert_eq!(deleted, vec!["dockerfiles/old/Dockerfile", "scripts/old.py"]);
    }

    #[test]
    fn test_stage_failure_is_skipped() {
        let mut history = VersionHistory::initialize(Some(&Project::new("demo"))).unwrap();
        let failures = history.stage_paths(&["/vanished.py".to_string(), "/pipeline.yaml".to_string()]);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "vanished.py");
        assert!(matches!(failures[0].error, FlowRepoError::PartialStage(_)));
        assert!(history.status().unwrap().iter().all(|row| !row.is_modified()));
    }

    #[test]
    fn test_conflicting_manifest_does_not_block_commit() {
        let mut project = Project::new("demo");
        let mut history = VersionHistory::initialize(Some(&project)).unwrap();
        let first = history.head().cloned().unwrap();

        project.add_script(Script::new("even-odd", ScriptType::Map, "pass")).unwrap();
        project.manifests.insert("a".into(), Manifest::new(ManifestNamespace::Manifests, "kind: A"));
        project.manifests.insert("a/b.yaml".into(), Manifest::new(ManifestNamespace::Manifests, "kind: B"));

        let report = history.commit(&project, "add even-odd").unwrap();
        assert!(report.is_committed());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "manifests/a/b.yaml");
        assert!(matches!(report.failures[0].error, FlowRepoError::PartialStage(_)));

        let head = history.head().cloned().unwrap();
        assert_ne!(head, first);
        assert_eq!(history.read_file(&head, "scripts/even-odd.py").unwrap(), b"pass");
        assert_eq!(history.read_file(&head, "manifests/a").unwrap(), b"kind: A");
        assert!(!history.files_at(&head).unwrap().contains(&"manifests/a/b.yaml"));

        // the failure repeats but nothing else changed
        let again = history.commit(&project, "again").unwrap();
        assert_eq!(again.outcome, CommitOutcome::Unchanged(head));
        assert_eq!(again.failures.len(), 1);
    }

    #[test]
    fn test_empty_manifest_key_does_not_block_commit() {
        let mut project = project_with_script("a");
        project.manifests.insert(String::new(), Manifest::new(ManifestNamespace::Manifests, "orphan"));
        project.manifests.insert("config.yaml".into(), Manifest::new(ManifestNamespace::Manifests, "kind: ConfigMap"));

        let mut history = VersionHistory::initialize(None).unwrap();
        let report = history.commit(&project, "first").unwrap();
        assert!(report.is_committed());
        assert_eq!(report.failures.len(), 1);

        let head = history.head().cloned().unwrap();
        assert_eq!(history.read_file(&head, "scripts/a.py").unwrap(), b"print('hi')");
    }

    #[test]
    fn test_log_is_newest_first() {
        let mut project = Project::new("demo");
        let mut history = VersionHistory::initialize(Some(&project)).unwrap();
        project.add_script(Script::new("a", ScriptType::Map, "1")).unwrap();
        history.commit(&project, "add a").unwrap();
        project.add_script(Script::new("b", ScriptType::Reduce, "2")).unwrap();
        history.commit(&project, "add b").unwrap();

        let messages: Vec<_> = history.log().iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["add b", "add a", INITIAL_COMMIT_MESSAGE]);
        assert!(history.log().iter().all(|c| c.author.to_string() == "Pipeline Designer <designer@pipeline.local>"));
    }

    #[test]
    fn test_changed_paths_from_empty() {
        let history = VersionHistory::initialize(Some(&project_with_script("a"))).unwrap();
        let head = history.head().unwrap();
        let changes = history.changed_paths(None, head).unwrap();
        assert_eq!(changes.len(), 4);
        assert!(changes.iter().all(|c| c.change == ChangeType::Added));
    }
}
