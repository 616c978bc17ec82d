mod builtin;
mod index;

pub use builtin::{builtin_entries, PRELUDE};
pub use index::{parse_index, CatalogError, FsResolver, SourceResolver};

use std::path::Path;

use tracing::{debug, info, warn};

/// One named effect source. Order inside a [`Catalog`] is navigation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub source: String,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Ordered list of effect sources waiting to be compiled.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// The compiled-in table. Never touches the filesystem.
    pub fn builtin() -> Self {
        Self {
            entries: builtin_entries(),
        }
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Appends every shader listed in the index file at `index_path`.
    ///
    /// A missing index means the runtime shader directory is not available and
    /// is not an error: the built-in entries stay and `Ok(0)` is returned.
    /// Lines whose source resolves to empty or unreadable text are skipped.
    pub fn append_from_index(
        &mut self,
        resolver: &dyn SourceResolver,
        index_path: &Path,
    ) -> Result<usize, CatalogError> {
        if !index_path.exists() {
            debug!(index = %index_path.display(), "shader index not present; keeping built-ins");
            return Ok(0);
        }

        let contents =
            std::fs::read_to_string(index_path).map_err(|source| CatalogError::Index {
                path: index_path.to_path_buf(),
                source,
            })?;

        let mut appended = 0;
        for line in parse_index(&contents) {
            match resolver.resolve(line) {
                Ok(Some(entry)) if !entry.source.trim().is_empty() => {
                    debug!(name = %entry.name, "appended shader from index");
                    self.entries.push(entry);
                    appended += 1;
                }
                Ok(_) => {
                    debug!(line, "index entry resolved to empty source; skipping");
                }
                Err(err) => {
                    warn!(line, error = %err, "failed to read indexed shader; skipping");
                }
            }
        }

        info!(
            index = %index_path.display(),
            appended,
            total = self.entries.len(),
            "loaded shader index"
        );
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn builtin_table_is_ordered_and_non_empty() {
        let catalog = Catalog::builtin();
        assert!(!catalog.is_empty());
        assert_eq!(catalog.get(0).map(|e| e.name.as_str()), Some("Bubble"));
        for entry in catalog.iter() {
            assert!(entry.source.starts_with("#version 300 es"));
            assert!(entry.source.contains("void main"));
        }
    }

    #[test]
    fn missing_index_keeps_builtins() {
        let dir = TempDir::new().unwrap();
        let mut catalog = Catalog::builtin();
        let before = catalog.len();
        let resolver = FsResolver::new(dir.path());

        let appended = catalog
            .append_from_index(&resolver, &dir.path().join("index.txt"))
            .unwrap();

        assert_eq!(appended, 0);
        assert_eq!(catalog.len(), before);
    }

    #[test]
    fn index_appends_in_order_and_skips_empty_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alpha.glsl"), "void main() {}").unwrap();
        fs::write(dir.path().join("empty.glsl"), "   \n").unwrap();
        fs::write(dir.path().join("gamma.glsl"), "void main() { }").unwrap();
        fs::write(
            dir.path().join("index.txt"),
            "alpha.glsl\n\n# comment\nempty.glsl\nmissing.glsl\ngamma\n",
        )
        .unwrap();

        let mut catalog = Catalog::default();
        let resolver = FsResolver::new(dir.path());
        let appended = catalog
            .append_from_index(&resolver, &dir.path().join("index.txt"))
            .unwrap();

        assert_eq!(appended, 2);
        assert_eq!(catalog.names(), vec!["alpha", "gamma"]);
    }
}
