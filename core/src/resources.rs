use crate::error::CorpusError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Resolves named configuration resources (training set, URL words) against a configuration directory.
#[derive(Debug, Clone)]
pub struct ResourcePaths {
    pub root: PathBuf,
}

impl ResourcePaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    /// Absolute names are used as-is.
    pub fn resolve(&self, name: &str) -> PathBuf { self.root.join(name) }

    pub fn read_lines(&self, name: &str) -> Result<Vec<String>, CorpusError> {
        let path = self.resolve(name);
        let wrap = |source: std::io::Error| CorpusError::Resource { name: name.to_string(), path: path.clone(), source };
        let f = File::open(&path).map_err(wrap)?;
        let lines = BufReader::new(f).lines().collect::<Result<Vec<_>, _>>().map_err(wrap)?;
        tracing::debug!(resource = name, lines = lines.len(), "read configuration resource");
        Ok(lines)
    }
}
