//! The working directory holding audio artifacts for one invocation.
//!
//! Artifacts are named `<index>.<extension>` with a zero-padded, 1-based
//! document index, so filename order equals document order. Only files that
//! follow that pattern are ever listed or removed. Concurrent runs against
//! the same directory are not supported.

use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Minimum number of digits in an artifact index.
const MIN_INDEX_WIDTH: usize = 4;

/// Suffix for payloads that are still being written.
const PARTIAL_SUFFIX: &str = "part";

#[derive(Debug, Clone)]
pub struct WorkDir {
    path: PathBuf,
    extension: String,
}

impl WorkDir {
    pub fn new(path: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            path: path.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Default location: a dedicated directory under the system temp dir.
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("medium-speech")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Create the directory if it does not exist.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.path)
    }

    /// Path of the artifact for the line at `index`.
    pub fn artifact_path(&self, index: usize, width: usize) -> PathBuf {
        self.path
            .join(format!("{:0width$}.{}", index, self.extension, width = width))
    }

    /// Temporary path a payload is written to before it is moved into place.
    pub fn partial_path(&self, artifact: &Path) -> PathBuf {
        let mut name = artifact.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(PARTIAL_SUFFIX);
        artifact.with_file_name(name)
    }

    /// Whether `path` names an audio artifact (digits stem, our extension).
    pub fn is_artifact(&self, path: &Path) -> bool {
        let stem_is_index = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
        let extension_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.extension);

        stem_is_index && extension_matches
    }

    fn is_partial(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(PARTIAL_SUFFIX)
            && path.file_stem().is_some_and(|stem| self.is_artifact(Path::new(stem)))
    }

    /// All artifacts in the directory, sorted by filename.
    ///
    /// A missing directory has no artifacts.
    pub fn list_artifacts(&self) -> io::Result<Vec<PathBuf>> {
        let mut artifacts = self.scan(|path| self.is_artifact(path))?;
        artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(artifacts)
    }

    /// Remove every artifact and leftover partial write.
    ///
    /// Files that disappear before they can be removed are not errors; other
    /// removal failures are logged and skipped. Returns the number removed.
    pub fn clear_artifacts(&self) -> io::Result<usize> {
        let targets = self.scan(|path| self.is_artifact(path) || self.is_partial(path))?;
        Ok(targets.iter().filter(|path| remove_quietly(path)).count())
    }

    fn scan(&self, keep: impl Fn(&Path) -> bool) -> io::Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && keep(&path) {
                found.push(path);
            }
        }
        Ok(found)
    }
}

/// Delete a file, treating "already gone" as success. Returns whether a file
/// was actually removed.
pub fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            debug!("Failed to remove {}: {}", path.display(), e);
            false
        }
    }
}

/// Digits needed to zero-pad indices up to `max_index`.
pub fn index_width(max_index: usize) -> usize {
    max_index.to_string().len().max(MIN_INDEX_WIDTH)
}
