//! Repository context for planning: bounded candidate selection and rendering.
//!
//! Rendering is best-effort: a file that vanished, is unreadable, or is not
//! UTF-8 is skipped rather than failing the planning step.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::io::config::ContextConfig;

#[derive(Debug, Clone)]
pub struct RepoContextBuilder {
    root: PathBuf,
    limits: ContextConfig,
}

impl RepoContextBuilder {
    pub fn new(root: impl Into<PathBuf>, limits: ContextConfig) -> Self {
        Self {
            root: root.into(),
            limits,
        }
    }

    /// Walk the tree in file-name order and keep small files with allowed extensions,
    /// stopping at `max_files`. Hidden entries are not descended into.
    ///
    /// Paths are relative to the root and `/`-separated.
    pub fn select_candidates(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

        for entry in walker.filter_map(|entry| entry.ok()) {
            if candidates.len() >= self.limits.max_files {
                break;
            }
            if !entry.file_type().is_file() || !self.has_allowed_extension(entry.path()) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.len() > self.limits.max_file_chars as u64 {
                continue;
            }
            let Some(relative) = relative_display(&self.root, entry.path()) else {
                continue;
            };
            candidates.push(relative);
        }

        debug!(count = candidates.len(), "selected candidate files");
        candidates
    }

    /// Render the selected candidates.
    pub fn build(&self) -> String {
        self.render_files(&self.select_candidates())
    }

    /// Render the named files (relative to root) as marked sections.
    ///
    /// Missing files, directories, paths leaving the root, and unreadable files are skipped.
    pub fn render_files(&self, paths: &[String]) -> String {
        let mut sections = Vec::new();
        for rel in paths {
            if !is_contained(rel) {
                debug!(path = %rel, "skipping path outside repository");
                continue;
            }
            let path = self.root.join(rel);
            if !path.is_file() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let content = truncate_chars(&content, self.limits.max_file_chars);
                    sections.push(format!("--- FILE: {rel} ---\n{content}"));
                }
                Err(err) => {
                    debug!(path = %path.display(), err = %err, "skipping unreadable file");
                }
            }
        }
        sections.join("\n\n")
    }

    fn has_allowed_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.limits.extensions.iter().any(|allowed| allowed == ext))
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn relative_display(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Relative path that stays under the root.
fn is_contained(rel: &str) -> bool {
    let path = Path::new(rel);
    !rel.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}
