//! Virtual filesystem module
//!
//! The build writes artifacts into a filesystem provider and the middleware
//! reads them back. Only the read side is part of the `FileSystem` contract.

mod memory;

pub use memory::MemoryFs;

use hyper::body::Bytes;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    /// Anything else a provider can report (device, socket, dangling link)
    Other,
}

/// Result of a `stat` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    /// Byte length (0 for directories)
    pub len: u64,
}

impl FileStat {
    pub const fn file(len: u64) -> Self {
        Self {
            kind: FileKind::File,
            len,
        }
    }

    pub const fn directory() -> Self {
        Self {
            kind: FileKind::Directory,
            len: 0,
        }
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Read-only view of a filesystem populated by the build.
///
/// `stat` fails with `NotFound` for missing paths. Implementations must be
/// shareable across request tasks.
pub trait FileSystem: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn read_file(&self, path: &Path) -> io::Result<Bytes>;
}

/// Lexically normalize an absolute path.
///
/// Resolves `.` and `..` segments without touching any real filesystem.
/// `..` never climbs above the root, so the result always stays inside it.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from(std::path::MAIN_SEPARATOR_STR);
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out = PathBuf::from(prefix.as_os_str()),
            Component::RootDir => out.push(std::path::MAIN_SEPARATOR_STR),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            Component::Normal(segment) => out.push(segment),
        }
    }
    out
}

pub(crate) fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: '{}'", path.display()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/dist/")), PathBuf::from("/dist"));
    }

    #[test]
    fn test_normalize_never_escapes_root() {
        assert_eq!(normalize(Path::new("/../../etc/passwd")), PathBuf::from("/etc/passwd"));
        assert_eq!(normalize(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_normalize_relative_is_rooted() {
        assert_eq!(normalize(Path::new("a/b")), PathBuf::from("/a/b"));
    }

    #[test]
    fn test_stat_kinds() {
        assert!(FileStat::file(3).is_file());
        assert!(!FileStat::file(3).is_dir());
        assert!(FileStat::directory().is_dir());
        let other = FileStat {
            kind: FileKind::Other,
            len: 0,
        };
        assert!(!other.is_file() && !other.is_dir());
    }
}
