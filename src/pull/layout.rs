use crate::resource::ResourceKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]+").expect("file name regex is valid"));

/// Replaces runs of characters unsafe in file names with `_`.
///
/// Scheduled and saved queries carry free-form display names; dataset
/// resources already have BigQuery-safe ids and are left alone.
pub fn sanitize_name(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name.trim(), "_");
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Where each resource lives under one project's output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncLayout {
    root: PathBuf,
}

impl SyncLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding files of `kind`. `dataset` is ignored for
    /// project-level kinds.
    pub fn dir(&self, kind: ResourceKind, dataset: &str) -> PathBuf {
        if kind.is_project_level() {
            self.root.join(kind.dir_name())
        } else {
            self.root.join(dataset).join(kind.dir_name())
        }
    }

    /// The file the fetch decision is made against.
    pub fn primary_path(&self, kind: ResourceKind, dataset: &str, name: &str) -> PathBuf {
        let file_name = if kind.is_project_level() {
            format!("{}.{}", sanitize_name(name), kind.extension())
        } else {
            format!("{}.{}", name, kind.extension())
        };
        self.dir(kind, dataset).join(file_name)
    }

    /// Metadata file for views, routines, tables and external tables.
    pub fn model_path(&self, dataset: &str, name: &str) -> PathBuf {
        self.dir(ResourceKind::Table, dataset)
            .join(format!("{}.yaml", name))
    }
}

/// Selects which resources a forced pull overwrites.
///
/// An entry matches a path when it equals the full path, the path relative
/// to the output root, the file name, or the file stem.
#[derive(Debug, Clone, Default)]
pub struct ForceFilter {
    entries: Vec<String>,
}

impl ForceFilter {
    pub fn new(entries: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).ok();
        let file_name = path.file_name().and_then(|n| n.to_str());
        let stem = path.file_stem().and_then(|n| n.to_str());

        self.entries.iter().any(|entry| {
            let entry_path = Path::new(entry);
            entry_path == path
                || relative.is_some_and(|r| r == entry_path)
                || file_name == Some(entry.as_str())
                || stem == Some(entry.as_str())
        })
    }
}
