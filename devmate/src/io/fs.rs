//! Filesystem wrapper for the file actions.
//!
//! Relative paths resolve against the working directory; absolute paths are
//! used as given. Underlying OS errors propagate with the path attached.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Filesystem {
    workdir: PathBuf,
}

impl Filesystem {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.workdir.join(path)
    }

    /// Read a UTF-8 file, returning `None` if it does not exist.
    pub fn read_optional(&self, path: &str) -> Result<Option<String>> {
        let resolved = self.resolve(path);
        match fs::read_to_string(&resolved) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %resolved.display(), "file does not exist");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("read {}", resolved.display())),
        }
    }

    /// Write `contents`, creating parent directories as needed.
    pub fn write(&self, path: &str, contents: &str) -> Result<()> {
        let resolved = self.resolve(path);
        if let Some(parent) = resolved.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&resolved, contents).with_context(|| format!("write {}", resolved.display()))
    }

    /// Direct children of `dir`, sorted, shown relative to the requested path.
    pub fn list(&self, dir: &str) -> Result<Vec<String>> {
        let resolved = self.resolve(dir);
        let entries =
            fs::read_dir(&resolved).with_context(|| format!("list {}", resolved.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("list {}", resolved.display()))?;
            names.push(display_child(dir, &entry.file_name().to_string_lossy()));
        }
        names.sort();
        Ok(names)
    }
}

fn display_child(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir == "." {
        return name.to_string();
    }
    Path::new(dir).join(name).to_string_lossy().into_owned()
}
