use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const PIPELINE_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Parent,
    Directory,
    Pipeline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub kind: EntryKind,
    pub name: String,
    pub path: PathBuf,
}

impl DirEntry {
    pub fn label(&self) -> String {
        match self.kind {
            EntryKind::Parent => "../".to_string(),
            EntryKind::Directory => format!("{}/", self.name),
            EntryKind::Pipeline => self.name.clone(),
        }
    }
}

/// Extension hint only; callers may still submit any file.
pub fn is_pipeline_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PIPELINE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Parent link, then directories, then pipeline files. Hidden entries are skipped.
pub fn list_dir(dir: &Path) -> Result<Vec<DirEntry>> {
    let mut dirs = Vec::new();
    let mut pipelines = Vec::new();

    let read = fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in read {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        // Follows symlinks so linked directories can be entered
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };

        if metadata.is_dir() {
            dirs.push(DirEntry {
                kind: EntryKind::Directory,
                name,
                path,
            });
        } else if metadata.is_file() && is_pipeline_file(&path) {
            pipelines.push(DirEntry {
                kind: EntryKind::Pipeline,
                name,
                path,
            });
        }
    }

    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    pipelines.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(dirs.len() + pipelines.len() + 1);
    if let Some(parent) = dir.parent() {
        entries.push(DirEntry {
            kind: EntryKind::Parent,
            name: "..".to_string(),
            path: parent.to_path_buf(),
        });
    }
    entries.extend(dirs);
    entries.extend(pipelines);
    Ok(entries)
}
