//! Project and version-control root detection for kvim
//!
//! Documents are classified by walking their ancestor directories and looking
//! for marker entries (`.kvim` and `.git` by default).

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists the immediate children of a directory.
pub trait DirectoryLister {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<OsString>>;
}

/// Lists directories through the OS filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDirectoryLister;

impl DirectoryLister for FsDirectoryLister {
    fn list_children(&self, dir: &Path) -> io::Result<Vec<OsString>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(dir)? {
            children.push(entry?.file_name());
        }
        Ok(children)
    }
}

/// Entry names marking a project root and a version-control root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub project: String,
    pub vcs: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            project: ".kvim".into(),
            vcs: ".git".into(),
        }
    }
}

/// Where a document sits relative to project and VCS roots.
///
/// A present root is always a strict ancestor of the document's path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WorkspaceInfo {
    pub is_project_member: bool,
    pub project_root: Option<PathBuf>,
    pub has_vcs_root: bool,
    pub vcs_root: Option<PathBuf>,
}

impl WorkspaceInfo {
    /// Neither a project member nor under version control.
    pub fn standalone() -> Self {
        Self::default()
    }

    pub fn is_standalone(&self) -> bool {
        !self.is_project_member && !self.has_vcs_root
    }

    fn is_complete(&self) -> bool {
        self.is_project_member && self.has_vcs_root
    }
}

/// Classifies documents by walking their ancestor directories.
pub struct WorkspaceResolver {
    lister: Box<dyn DirectoryLister>,
    markers: Markers,
}

impl fmt::Debug for WorkspaceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkspaceResolver")
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

impl Default for WorkspaceResolver {
    fn default() -> Self {
        Self::new(Markers::default())
    }
}

impl WorkspaceResolver {
    pub fn new(markers: Markers) -> Self {
        Self::with_lister(FsDirectoryLister, markers)
    }

    pub fn with_lister(lister: impl DirectoryLister + 'static, markers: Markers) -> Self {
        Self {
            lister: Box::new(lister),
            markers,
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Walk from the parent of `path` up to the filesystem root. The nearest
    /// ancestor holding each marker wins; the walk only stops early once both
    /// roots are known. Directories that cannot be listed are skipped.
    pub fn resolve(&self, path: &Path) -> WorkspaceInfo {
        let project_marker = OsStr::new(&self.markers.project);
        let vcs_marker = OsStr::new(&self.markers.vcs);
        let mut info = WorkspaceInfo::standalone();

        for dir in path.ancestors().skip(1) {
            if info.is_complete() || dir.as_os_str().is_empty() {
                break;
            }

            let children = match self.lister.list_children(dir) {
                Ok(children) => children,
                Err(err) => {
                    debug!(?dir, %err, "treating unreadable directory as unmarked");
                    continue;
                }
            };

            if !info.is_project_member && children.iter().any(|name| name == project_marker) {
                info.is_project_member = true;
                info.project_root = Some(dir.to_path_buf());
            }
            if !info.has_vcs_root && children.iter().any(|name| name == vcs_marker) {
                info.has_vcs_root = true;
                info.vcs_root = Some(dir.to_path_buf());
            }
        }

        debug!(?path, ?info, "resolved workspace");
        info
    }
}
