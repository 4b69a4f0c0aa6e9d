//! Scoped lifecycle for per-request temporary workspaces.
//!
//! Every orchestration call gets one private directory under a configured
//! root, never shared across requests. Deletion is guaranteed on every exit
//! path: [`Workspace::release`] removes the directory explicitly, and the
//! `Drop` impl of the underlying temp dir covers panics and early returns,
//! so a classified failure, an unclassified error, and a success all leave
//! no residue once the caller is done with the result.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// Creates and tracks per-request workspace directories under one root.
#[derive(Debug)]
pub struct ResourceManager {
    root: PathBuf,
}

impl ResourceManager {
    /// Creates a manager rooted at `root`, creating the root if needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the root cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The configured root all workspaces live under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Acquires a fresh, uniquely named workspace directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the directory cannot be created.
    pub fn acquire(&self) -> io::Result<Workspace> {
        let dir = tempfile::Builder::new()
            .prefix("grab-")
            .tempdir_in(&self.root)?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "Workspace acquired");
        Ok(Workspace {
            dir: Some(dir),
            path,
        })
    }
}

/// Handle to one private workspace directory.
///
/// The directory and its contents are removed on [`Workspace::release`] or,
/// failing that, on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Path of the workspace directory.
    ///
    /// Remains a valid path value after release (the directory itself is
    /// gone by then).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recursively removes the workspace directory.
    ///
    /// Idempotent: calling it twice, or after the directory was manually
    /// emptied or removed, does nothing. Removal failures are logged, never
    /// raised; cleanup must not mask the outcome the caller is handling.
    pub fn release(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "Workspace released"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => {
                warn!(path = %self.path.display(), error = %error, "Failed to remove workspace");
            }
        }
    }
}
