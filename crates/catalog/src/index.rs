//! Runtime shader index support.
//!
//! Types:
//!
//! - `CatalogError` reports index files that exist but cannot be read, and
//!   shader files that fail mid-read.
//! - `SourceResolver` is the file-resolution seam: it maps one index line to a
//!   named source, or `None` when nothing exists for it.
//! - `FsResolver` resolves lines against a shader directory on disk.
//!
//! Functions:
//!
//! - `parse_index` yields the meaningful lines of an index file.
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::trace;

use crate::CatalogEntry;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read shader index at {path}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read shader source at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait SourceResolver {
    fn resolve(&self, line: &str) -> Result<Option<CatalogEntry>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct FsResolver {
    root: PathBuf,
}

impl FsResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidate(&self, line: &str) -> Option<PathBuf> {
        let direct = self.root.join(line);
        if direct.is_file() {
            return Some(direct);
        }
        let with_ext = self.root.join(format!("{line}.glsl"));
        with_ext.is_file().then_some(with_ext)
    }
}

impl SourceResolver for FsResolver {
    fn resolve(&self, line: &str) -> Result<Option<CatalogEntry>, CatalogError> {
        let Some(path) = self.candidate(line) else {
            trace!(line, root = %self.root.display(), "no shader file for index line");
            return Ok(None);
        };
        let source = fs::read_to_string(&path).map_err(|source| CatalogError::Read {
            path: path.clone(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(line)
            .to_string();
        Ok(Some(CatalogEntry { name, source }))
    }
}

/// Trimmed, non-empty lines that are not `#` comments.
pub fn parse_index(contents: &str) -> impl Iterator<Item = &str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}
