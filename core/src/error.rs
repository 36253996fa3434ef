use std::path::PathBuf;
use thiserror::Error;

/// Startup failures. None of these are recoverable: a crawl must not run on a half-loaded corpus.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("training line {line}: expected 3 tab-separated fields, found {found}")]
    MalformedTrainingLine { line: usize, found: usize },
    #[error("training line {line}: invalid sample id {value:?}")]
    InvalidSampleId { line: usize, value: String },
    #[error("cannot read resource {name:?} at {}: {source}", path.display())]
    Resource {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("memory capacity must be at least 1")]
    InvalidCapacity,
    #[error("unknown classifier {0:?}, expected \"naive-bayes\" or \"fixed:<label>\"")]
    UnknownClassifier(String),
}
