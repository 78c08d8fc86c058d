use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::history::object::{ObjectId, Tree};

/// State of one path across head, working tree and stage.
///
/// `None` means the path is absent from that state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub path: String,
    pub head: Option<ObjectId>,
    pub workdir: Option<ObjectId>,
    pub stage: Option<ObjectId>,
}

impl StatusRow {
    /// The working tree or the stage disagrees with head.
    pub fn is_modified(&self) -> bool {
        self.head != self.workdir || self.workdir != self.stage
    }

    /// The stage disagrees with head, so committing would record it.
    pub fn is_staged_change(&self) -> bool {
        self.head != self.stage
    }
}

/// How a path changed between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub change: ChangeType,
}

/// Build the status matrix over the union of paths of the three states.
pub(crate) fn status_matrix(
    head: Option<&Tree>,
    workdir: &BTreeMap<String, ObjectId>,
    stage: &BTreeMap<String, ObjectId>,
) -> Vec<StatusRow> {
    let empty = BTreeMap::new();
    let head = head.map(|t| &t.entries).unwrap_or(&empty);

    let paths: BTreeSet<&String> = head.keys().chain(workdir.keys()).chain(stage.keys()).collect();
    paths
        .into_iter()
        .map(|path| StatusRow {
            path: path.clone(),
            head: head.get(path).cloned(),
            workdir: workdir.get(path).cloned(),
            stage: stage.get(path).cloned(),
        })
        .collect()
}

/// Paths that differ between two trees, sorted.
pub(crate) fn diff_trees(
    from: Option<&Tree>,
    to: &Tree,
) -> Vec<PathChange> {
    let empty = BTreeMap::new();
    let from = from.map(|t| &t.entries).unwrap_or(&empty);

    let paths: BTreeSet<&String> = from.keys().chain(to.entries.keys()).collect();
    paths
        .into_iter()
        .filter_map(|path| {
            let change = match (from.get(path), to.entries.get(path)) {
                (None, Some(_)) => ChangeType::Added,
                (Some(_), None) => ChangeType::Deleted,
                (Some(a), Some(b)) if a != b => ChangeType::Modified,
                _ => return None,
            };
            Some(PathChange {
                path: path.clone(),
                change,
            })
        })
        .collect()
}
