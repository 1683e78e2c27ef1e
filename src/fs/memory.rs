//! In-memory filesystem
//!
//! Holds build output as a flat map of normalized absolute paths. Parent
//! directories are created implicitly when a build output is swapped in.

use super::{normalize, not_found, FileStat, FileSystem};
use hyper::body::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum Entry {
    Directory,
    File(Bytes),
}

/// Shared in-memory filesystem
///
/// Readers take a shared lock per call; the build replaces a whole output
/// directory under one exclusive lock with [`MemoryFs::replace_dir`].
#[derive(Debug)]
pub struct MemoryFs {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
}

impl MemoryFs {
    /// Create an empty filesystem containing only the root directory
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(normalize(Path::new("/")), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Atomically replace the contents of `dir` with `files`.
    ///
    /// File paths are relative to `dir`. Readers observe either the old
    /// tree or the new one, never a mix.
    pub fn replace_dir<I>(&self, dir: &Path, files: I) -> io::Result<()>
    where
        I: IntoIterator<Item = (PathBuf, Bytes)>,
    {
        let dir = normalize(dir);
        let mut staged: BTreeMap<PathBuf, Entry> = BTreeMap::new();
        insert_dirs(&mut staged, &dir)?;
        for (relative, content) in files {
            insert_file(&mut staged, &normalize(&dir.join(relative)), content)?;
        }

        let mut entries = self.entries.write();
        // Ancestors of `dir` may already exist, but only as directories
        if let Some(blocked) = dir
            .ancestors()
            .skip(1)
            .find(|a| matches!(entries.get(*a), Some(Entry::File(_))))
        {
            return Err(not_a_directory(blocked));
        }
        entries.retain(|p, _| !p.starts_with(&dir));
        entries.extend(staged);
        Ok(())
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFs {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let path = normalize(path);
        match self.entries.read().get(&path) {
            Some(Entry::Directory) => Ok(FileStat::directory()),
            Some(Entry::File(content)) => Ok(FileStat::file(content.len() as u64)),
            None => Err(not_found(&path)),
        }
    }

    fn read_file(&self, path: &Path) -> io::Result<Bytes> {
        let path = normalize(path);
        match self.entries.read().get(&path) {
            Some(Entry::File(content)) => Ok(content.clone()),
            Some(Entry::Directory) => Err(io::Error::other(format!(
                "is a directory: '{}'",
                path.display()
            ))),
            None => Err(not_found(&path)),
        }
    }
}

fn insert_dirs(entries: &mut BTreeMap<PathBuf, Entry>, dir: &Path) -> io::Result<()> {
    for ancestor in dir.ancestors() {
        match entries.get(ancestor) {
            Some(Entry::Directory) => break,
            Some(Entry::File(_)) => return Err(not_a_directory(ancestor)),
            None => {
                entries.insert(ancestor.to_path_buf(), Entry::Directory);
            }
        }
    }
    Ok(())
}

fn insert_file(
    entries: &mut BTreeMap<PathBuf, Entry>,
    path: &Path,
    content: Bytes,
) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        insert_dirs(entries, parent)?;
    }
    if let Some(Entry::Directory) = entries.get(path) {
        return Err(io::Error::other(format!("is a directory: '{}'", path.display())));
    }
    entries.insert(path.to_path_buf(), Entry::File(content));
    Ok(())
}

fn not_a_directory(path: &Path) -> io::Error {
    io::Error::other(format!("not a directory: '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fs_with(dir: &str, files: &[(&str, &'static str)]) -> MemoryFs {
        let fs = MemoryFs::new();
        fs.replace_dir(
            Path::new(dir),
            files
                .iter()
                .map(|&(p, c)| (PathBuf::from(p), Bytes::from_static(c.as_bytes()))),
        )
        .unwrap();
        fs
    }

    #[test]
    fn test_stat_and_read() {
        let fs = fs_with("/dist", &[("app.js", "console.log(1)")]);

        let stat = fs.stat(Path::new("/dist/app.js")).unwrap();
        assert!(stat.is_file());
        assert_eq!(stat.len, 14);
        assert!(fs.stat(Path::new("/dist")).unwrap().is_dir());
        assert!(fs.stat(Path::new("/")).unwrap().is_dir());
        assert_eq!(
            fs.read_file(Path::new("/dist/app.js")).unwrap(),
            Bytes::from_static(b"console.log(1)")
        );
    }

    #[test]
    fn test_missing_path() {
        let fs = MemoryFs::new();
        let err = fs.stat(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.read_file(Path::new("/nope")).is_err());
    }

    #[test]
    fn test_read_directory_fails() {
        let fs = fs_with("/dist", &[("sub/a.js", "a")]);
        assert!(fs.read_file(Path::new("/dist/sub")).is_err());
    }

    #[test]
    fn test_file_blocks_directory() {
        let fs = fs_with("/", &[("dist", "x")]);
        let err = fs.replace_dir(
            Path::new("/dist/js"),
            vec![(PathBuf::from("a.js"), Bytes::from_static(b"y"))],
        );
        assert!(err.is_err());
        assert!(fs.stat(Path::new("/dist")).unwrap().is_file());
    }

    #[test]
    fn test_conflicting_outputs_rejected() {
        let fs = MemoryFs::new();
        let files = vec![
            (PathBuf::from("a"), Bytes::from_static(b"file")),
            (PathBuf::from("a/b.js"), Bytes::from_static(b"nested")),
        ];
        assert!(fs.replace_dir(Path::new("/dist"), files).is_err());
        assert!(fs.stat(Path::new("/dist")).is_err());
    }

    #[test]
    fn test_replace_dir_drops_stale_files() {
        let fs = fs_with("/dist", &[("old.js", "old")]);
        fs.replace_dir(
            Path::new("/other"),
            vec![(PathBuf::from("keep.txt"), Bytes::from_static(b"keep"))],
        )
        .unwrap();

        fs.replace_dir(
            Path::new("/dist"),
            vec![(PathBuf::from("sub/new.js"), Bytes::from_static(b"new"))],
        )
        .unwrap();

        assert!(fs.stat(Path::new("/dist/old.js")).is_err());
        assert!(fs.stat(Path::new("/dist/sub")).unwrap().is_dir());
        assert!(fs.stat(Path::new("/dist/sub/new.js")).unwrap().is_file());
        assert!(fs.stat(Path::new("/other/keep.txt")).unwrap().is_file());
    }
}
