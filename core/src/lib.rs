use serde::{Deserialize, Serialize};

pub mod classifier;
pub mod corpus;
pub mod error;
pub mod resources;
pub mod store;
pub mod tokenizer;

pub use classifier::{Classification, ClassifierKind, FixedLabel, NaiveBayes, TextClassifier, DEFAULT_LABEL};
pub use corpus::{BoundedCorpusModel, DEFAULT_CAPACITY};
pub use error::CorpusError;
pub use store::{Corpus, MergeReport, SampleStore, SharedCorpus};

pub type SampleId = u64;

/// Label that marks a document as low relevance; its outlinks go through the allow-list.
pub const IGNORE_LABEL: &str = "ignore";

/// One labeled training observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub id: SampleId,
    pub label: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outlink {
    pub to_url: String,
}

impl Outlink {
    pub fn new(to_url: impl Into<String>) -> Self {
        Self { to_url: to_url.into() }
    }
}

/// A fetched document as handed over by the crawler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub outlinks: Vec<Outlink>,
}

/// What the crawler gets back for each document: the label plus the outlinks that survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedDocument {
    pub url: String,
    pub label: String,
    pub outlinks: Vec<Outlink>,
}
