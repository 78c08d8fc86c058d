//! Content-addressed objects of the version history.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{FlowRepoError, Result};

/// Hex encoded SHA-256 of an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(String);

impl ObjectId {
    fn hash(
        kind: &str,
        data: &[u8],
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("{} {}\0", kind, data.len()).as_bytes());
        hasher.update(data);
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn for_blob(data: &[u8]) -> Self {
        Self::hash("blob", data)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First seven hex digits.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat snapshot of a file tree: relative path → blob id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub entries: BTreeMap<String, ObjectId>,
}

impl Tree {
    fn id(&self) -> ObjectId {
        let mut data = Vec::new();
        for (path, blob) in &self.entries {
            data.extend_from_slice(path.as_bytes());
            data.push(0);
            data.extend_from_slice(blob.as_str().as_bytes());
            data.push(b'\n');
        }
        ObjectId::hash("tree", &data)
    }
}

/// Identity stamped on every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl fmt::Display for Signature {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// An immutable snapshot in the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: ObjectId,
    pub message: String,
    pub author: Signature,
    pub timestamp: DateTime<Utc>,
    pub parent: Option<ObjectId>,
    pub tree: ObjectId,
}

impl Commit {
    pub(crate) fn new(
        message: &str,
        author: Signature,
        parent: Option<ObjectId>,
        tree: ObjectId,
    ) -> Self {
        let timestamp = Utc::now();
        let header = format!(
            "tree {}\nparent {}\nauthor {} {}\n\n{}",
            tree,
            parent.as_ref().map(ObjectId::as_str).unwrap_or("none"),
            author,
            timestamp.timestamp_millis(),
            message
        );
        Self {
            id: ObjectId::hash("commit", header.as_bytes()),
            message: message.to_string(),
            author,
            timestamp,
            parent,
            tree,
        }
    }
}

/// Arena of every object written so far, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
    blobs: HashMap<ObjectId, Vec<u8>>,
    trees: HashMap<ObjectId, Tree>,
    commits: HashMap<ObjectId, Commit>,
}

impl ObjectStore {
    pub fn put_blob(
        &mut self,
        data: &[u8],
    ) -> ObjectId {
        let id = ObjectId::for_blob(data);
        self.blobs.entry(id.clone()).or_insert_with(|| data.to_vec());
        id
    }

    pub fn put_tree(
        &mut self,
        tree: Tree,
    ) -> ObjectId {
        let id = tree.id();
        self.trees.entry(id.clone()).or_insert(tree);
        id
    }

    pub fn put_commit(
        &mut self,
        commit: Commit,
    ) -> ObjectId {
        let id = commit.id.clone();
        self.commits.insert(id.clone(), commit);
        id
    }

    pub fn blob(
        &self,
        id: &ObjectId,
    ) -> Result<&[u8]> {
        self.blobs.get(id).map(Vec::as_slice).ok_or(FlowRepoError::NotFound(format!("blob {}", id)))
    }

    pub fn tree(
        &self,
        id: &ObjectId,
    ) -> Result<&Tree> {
        self.trees.get(id).ok_or(FlowRepoError::NotFound(format!("tree {}", id)))
    }

    pub fn commit(
        &self,
        id: &ObjectId,
    ) -> Option<&Commit> {
        self.commits.get(id)
    }

    pub fn commit_tree(
        &self,
        id: &ObjectId,
    ) -> Result<&Tree> {
        let commit = self.commit(id).ok_or(FlowRepoError::NotFound(format!("commit {}", id)))?;
        self.tree(&commit.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_ids_are_content_addressed() {
        let mut store = ObjectStore::default();
        let a = store.put_blob(b"hello");
        let b = store.put_blob(b"hello");
        let c = store.put_blob(b"world");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
        assert_eq!(a.short().len(), 7);
        assert_eq!(store.blob(&a).unwrap(), b"hello");
    }

    #[test]
    fn test_tree_id_depends_on_paths() {
        let blob = ObjectId::for_blob(b"x");
        let one = Tree {
            entries: BTreeMap::from([("a.py".to_string(), blob.clone())]),
        };
        let other = Tree {
            entries: BTreeMap::from([("b.py".to_string(), blob)]),
        };
        assert_ne!(one.id(), other.id());
        assert_eq!(one.id(), one.clone().id());
    }

    #[test]
    fn test_missing_objects() {
        let store = ObjectStore::default();
        let id = ObjectId::for_blob(b"");
        assert!(store.blob(&id).is_err());
        assert!(store.tree(&id).is_err());
        assert!(store.commit(&id).is_none());
        assert!(matches!(store.commit_tree(&id), Err(FlowRepoError::NotFound(_))));
    }
}
