//! In-memory hierarchical filesystem.
//!
//! Files are kept as bytes keyed by normalized absolute path. Directories are
//! a separate set; every ancestor of a written file is added to it, so a
//! write never needs a prior `mkdir`.

use std::collections::{BTreeMap, BTreeSet};

use crate::{FlowRepoError, Result, layout, model::Project};

pub const ROOT: &str = "/";

/// Kind of entry found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStat {
    File {
        size: usize,
    },
    Dir,
}

impl FileStat {
    pub fn is_file(&self) -> bool {
        matches!(self, FileStat::File { .. })
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileStat::Dir)
    }
}

/// Normalize a path to the absolute form used as key.
///
/// Strips a leading `./`, turns `\` into `/`, forces a leading `/` and drops
/// a trailing `/` (except for the root).
pub fn normalize_path(path: &str) -> String {
    let path = path.strip_prefix("./").unwrap_or(path).replace('\\', "/");
    let mut normalized = if path.starts_with('/') {
        path
    } else {
        format!("/{}", path)
    };
    if normalized != ROOT && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Join a directory and an entry name into a normalized path.
pub fn join(
    dir: &str,
    name: &str,
) -> String {
    let dir = normalize_path(dir);
    if dir == ROOT {
        normalize_path(name)
    } else {
        normalize_path(&format!("{}/{}", dir, name))
    }
}

fn ancestors(path: &str) -> impl Iterator<Item = String> + '_ {
    let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
    (1..parts.len()).map(move |i| format!("/{}", parts[..i].join("/")))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            dirs: BTreeSet::from([ROOT.to_string()]),
        }
    }

    pub fn read(
        &self,
        path: &str,
    ) -> Result<&[u8]> {
        let path = normalize_path(path);
        self.files.get(&path).map(Vec::as_slice).ok_or(FlowRepoError::NotFound(format!("file {}", path)))
    }

    pub fn read_to_string(
        &self,
        path: &str,
    ) -> Result<String> {
        Ok(String::from_utf8(self.read(path)?.to_vec())?)
    }

    /// Write a file, creating every ancestor directory.
    pub fn write(
        &mut self,
        path: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let path = normalize_path(path);
        if self.dirs.contains(&path) {
            return Err(FlowRepoError::IoError(format!("{} is a directory", path)));
        }
        if let Some(dir) = ancestors(&path).find(|d| self.files.contains_key(d)) {
            return Err(FlowRepoError::IoError(format!("{} is a file", dir)));
        }
        self.dirs.extend(ancestors(&path));
        self.files.insert(path, data.into());
        Ok(())
    }

    /// Create a directory and its ancestors.
    pub fn mkdir(
        &mut self,
        path: &str,
    ) -> Result<()> {
        let path = normalize_path(path);
        if self.files.contains_key(&path) {
            return Err(FlowRepoError::IoError(format!("{} is a file", path)));
        }
        if let Some(dir) = ancestors(&path).find(|d| self.files.contains_key(d)) {
            return Err(FlowRepoError::IoError(format!("{} is a file", dir)));
        }
        self.dirs.extend(ancestors(&path));
        self.dirs.insert(path);
        Ok(())
    }

    /// Immediate children of a directory, sorted; directories end with `/`.
    pub fn list(
        &self,
        dir: &str,
    ) -> Result<Vec<String>> {
        let dir = normalize_path(dir);
        if !self.dirs.contains(&dir) {
            return Err(FlowRepoError::NotFound(format!("directory {}", dir)));
        }
        let prefix = if dir == ROOT {
            ROOT.to_string()
        } else {
            format!("{}/", dir)
        };

        let mut entries = BTreeSet::new();
        for sub in self.dirs.iter().filter(|d| **d != dir) {
            if let Some(rest) = sub.strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or(rest);
                entries.insert(format!("{}/", name));
            }
        }
        for file in self.files.keys() {
            if let Some(rest) = file.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((name, _)) => entries.insert(format!("{}/", name)),
                    None => entries.insert(rest.to_string()),
                };
            }
        }

        Ok(entries.into_iter().collect())
    }

    pub fn stat(
        &self,
        path: &str,
    ) -> Result<FileStat> {
        let path = normalize_path(path);
        if let Some(data) = self.files.get(&path) {
            return Ok(FileStat::File {
                size: data.len(),
            });
        }
        if self.dirs.contains(&path) {
            return Ok(FileStat::Dir);
        }
        Err(FlowRepoError::NotFound(format!("path {}", path)))
    }

    pub fn exists(
        &self,
        path: &str,
    ) -> bool {
        self.stat(path).is_ok()
    }

    pub fn remove(
        &mut self,
        path: &str,
    ) -> Result<()> {
        let path = normalize_path(path);
        self.files.remove(&path).map(|_| ()).ok_or(FlowRepoError::NotFound(format!("file {}", path)))
    }

    /// Remove an empty directory.
    pub fn remove_dir(
        &mut self,
        path: &str,
    ) -> Result<()> {
        let path = normalize_path(path);
        if path == ROOT {
            return Err(FlowRepoError::IoError("cannot remove the root directory".into()));
        }
        if !self.dirs.contains(&path) {
            return Err(FlowRepoError::NotFound(format!("directory {}", path)));
        }
        if !self.list(&path)?.is_empty() {
            return Err(FlowRepoError::IoError(format!("directory {} is not empty", path)));
        }
        self.dirs.remove(&path);
        Ok(())
    }

    /// Every file below `dir`, recursively, sorted.
    pub fn walk_files(
        &self,
        dir: &str,
    ) -> Result<Vec<String>> {
        let mut files = Vec::new();
        let mut pending = vec![normalize_path(dir)];
        while let Some(dir) = pending.pop() {
            for entry in self.list(&dir)? {
                match entry.strip_suffix('/') {
                    Some(name) => pending.push(join(&dir, name)),
                    None => files.push(join(&dir, &entry)),
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// All file paths, sorted.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Replace the whole tree with the directory structure of `project`.
    ///
    /// A path that cannot be rendered or written is left out of the new tree
    /// and returned with its error; every other path is still written.
    pub fn sync_from_project(
        &mut self,
        project: Option<&Project>,
    ) -> Vec<(String, FlowRepoError)> {
        let mut fresh = MemoryFs::new();
        let mut skipped = Vec::new();
        if let Some(structure) = layout::build_directory_structure(project) {
            for (path, content) in structure.iter() {
                if let Err(err) = content.to_bytes().and_then(|bytes| fresh.write(path, bytes)) {
                    skipped.push((path.to_string(), err));
                }
            }
        }
        *self = fresh;
        skipped
    }
}
