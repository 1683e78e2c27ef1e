//! Compiler abstraction
//!
//! A compiler turns sources into artifacts inside the virtual filesystem.
//! `DirectoryCompiler` mirrors a source directory on disk into the output
//! path, which is enough to drive the dev server end to end.

use async_trait::async_trait;
use hyper::body::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::stats::AssetInfo;
use crate::fs::MemoryFs;

/// Build failures that abort a whole generation
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source directory '{}' is not readable: {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output to '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Artifacts of one successful compile
#[derive(Debug, Default)]
pub struct CompileOutput {
    pub assets: Vec<AssetInfo>,
    /// Per-file problems that did not abort the build
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait Compiler: Send + Sync {
    /// Directory inside the virtual filesystem that receives the artifacts
    fn output_path(&self) -> &Path;

    /// Produce artifacts into `fs` under [`Compiler::output_path`]
    async fn compile(&self, fs: &MemoryFs) -> Result<CompileOutput, BuildError>;
}

/// Copies every file under `source_dir` to `output_path`
#[derive(Debug, Clone)]
pub struct DirectoryCompiler {
    source_dir: PathBuf,
    output_path: PathBuf,
}

impl DirectoryCompiler {
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_path: crate::fs::normalize(&output_path.into()),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}

#[async_trait]
impl Compiler for DirectoryCompiler {
    fn output_path(&self) -> &Path {
        &self.output_path
    }

    async fn compile(&self, fs: &MemoryFs) -> Result<CompileOutput, BuildError> {
        let sources = walk_files(&self.source_dir)
            .await
            .map_err(|source| BuildError::SourceUnreadable {
                path: self.source_dir.clone(),
                source,
            })?;

        let mut output = CompileOutput::default();
        let mut files = Vec::with_capacity(sources.len());

        for relative in sources {
            let absolute = self.source_dir.join(&relative);
            match tokio::fs::read(&absolute).await {
                Ok(content) => {
                    output.assets.push(AssetInfo {
                        name: asset_name(&relative),
                        size: content.len() as u64,
                    });
                    files.push((relative, Bytes::from(content)));
                }
                Err(e) => output
                    .warnings
                    .push(format!("skipped '{}': {e}", absolute.display())),
            }
        }

        fs.replace_dir(&self.output_path, files)
            .map_err(|source| BuildError::Output {
                path: self.output_path.clone(),
                source,
            })?;

        Ok(output)
    }
}

/// Recursively list regular files under `root`, relative to it, sorted
async fn walk_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];

    while let Some(relative) = pending.pop() {
        let mut dir = tokio::fs::read_dir(root.join(&relative)).await?;
        while let Some(entry) = dir.next_entry().await? {
            let file_type = entry.file_type().await?;
            let child = relative.join(entry.file_name());
            if file_type.is_dir() {
                pending.push(child);
            } else if file_type.is_file() {
                files.push(child);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// `/`-separated asset name regardless of platform
fn asset_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
