use crate::classifier::{Classification, ClassifierKind};
use crate::corpus::BoundedCorpusModel;
use crate::error::CorpusError;
use crate::tokenizer::tokenize;
use crate::{SampleId, TrainingSample};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    pub learned: usize,
    pub skipped: usize,
    /// Cursor after the merge.
    pub cursor: SampleId,
}

/// Registry of sample IDs already learned, the sync cursor and the URL allow-list.
#[derive(Debug, Default)]
pub struct SampleStore {
    seen_ids: HashSet<SampleId>,
    last_training_id: SampleId,
    url_tokens: Vec<String>,
}

/// Parse one `ID\tLABEL\tTOKENS` line. `line` is 1-based, for error messages.
pub fn parse_training_line(line: usize, raw: &str) -> Result<TrainingSample, CorpusError> {
    let fields: Vec<&str> = raw.split('\t').collect();
    if fields.len() != 3 {
        return Err(CorpusError::MalformedTrainingLine { line, found: fields.len() });
    }
    let id = fields[0]
        .trim()
        .parse::<SampleId>()
        .map_err(|_| CorpusError::InvalidSampleId { line, value: fields[0].to_string() })?;
    Ok(TrainingSample { id, label: fields[1].trim().to_lowercase(), tokens: tokenize(fields[2]) })
}

impl SampleStore {
    pub fn new() -> Self { Self::default() }

    /// Load the local training set and URL allow-list.
    ///
    /// Every line is parsed before anything is learned, so a malformed file leaves
    /// both the store and the model untouched.
    pub fn bootstrap<T, U>(
        &mut self,
        model: &mut BoundedCorpusModel,
        training_lines: T,
        url_token_lines: U,
    ) -> Result<MergeReport, CorpusError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        let mut samples = Vec::new();
        for (i, raw) in training_lines.into_iter().enumerate() {
            let raw = raw.as_ref();
            if raw.trim().is_empty() { continue; }
            samples.push(parse_training_line(i + 1, raw)?);
        }
        let report = self.merge(model, samples);

        let before = self.url_tokens.len();
        for token in url_token_lines {
            self.add_url_token(token.as_ref());
        }
        tracing::info!(
            learned = report.learned,
            skipped = report.skipped,
            cursor = report.cursor,
            url_tokens = self.url_tokens.len() - before,
            "bootstrapped training corpus"
        );
        Ok(report)
    }

    /// Learn every sample whose ID is new. The cursor moves to the batch maximum
    /// even when all IDs were already known, and never moves backwards.
    pub fn merge<I>(&mut self, model: &mut BoundedCorpusModel, samples: I) -> MergeReport
    where
        I: IntoIterator<Item = TrainingSample>,
    {
        let mut report = MergeReport::default();
        for sample in samples {
            self.last_training_id = self.last_training_id.max(sample.id);
            if !self.seen_ids.insert(sample.id) {
                tracing::debug!(id = sample.id, "training sample already included, skipping");
                report.skipped += 1;
                continue;
            }
            tracing::debug!(id = sample.id, label = %sample.label, "adding training sample");
            model.learn(&sample.label, sample.tokens);
            report.learned += 1;
        }
        report.cursor = self.last_training_id;
        report
    }

    fn add_url_token(&mut self, token: &str) {
        // An empty substring would match every URL.
        if token.is_empty() || self.url_tokens.iter().any(|t| t == token) { return; }
        self.url_tokens.push(token.to_string());
    }

    /// True iff `url` contains any allow-list token (case-sensitive).
    pub fn is_url_allowed(&self, url: &str) -> bool {
        self.url_tokens.iter().any(|t| url.contains(t.as_str()))
    }

    pub fn last_training_id(&self) -> SampleId { self.last_training_id }

    pub fn has_seen(&self, id: SampleId) -> bool { self.seen_ids.contains(&id) }

    pub fn seen_count(&self) -> usize { self.seen_ids.len() }

    pub fn url_tokens(&self) -> &[String] { &self.url_tokens }
}

/// The training state of one crawl run: sample registry plus bounded model.
pub struct Corpus {
    pub store: SampleStore,
    pub model: BoundedCorpusModel,
}

/// One corpus shared by every document-processing task. Writers (`merge`) take the
/// write lock, `classify`/`is_url_allowed` share the read lock.
pub type SharedCorpus = Arc<RwLock<Corpus>>;

impl Corpus {
    pub fn new(kind: &ClassifierKind, capacity: usize) -> Result<Self, CorpusError> {
        Ok(Self { store: SampleStore::new(), model: BoundedCorpusModel::new(kind.build(), capacity)? })
    }

    pub fn into_shared(self) -> SharedCorpus { Arc::new(RwLock::new(self)) }

    pub fn bootstrap<T, U>(&mut self, training_lines: T, url_token_lines: U) -> Result<MergeReport, CorpusError>
    where
        T: IntoIterator,
        T::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        self.store.bootstrap(&mut self.model, training_lines, url_token_lines)
    }

    pub fn merge<I>(&mut self, samples: I) -> MergeReport
    where
        I: IntoIterator<Item = TrainingSample>,
    {
        self.store.merge(&mut self.model, samples)
    }

    pub fn classify(&self, tokens: &[String]) -> Classification { self.model.classify(tokens) }

    pub fn is_url_allowed(&self, url: &str) -> bool { self.store.is_url_allowed(url) }

    pub fn last_training_id(&self) -> SampleId { self.store.last_training_id() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FixedLabel;

    fn sample(id: SampleId, label: &str, text: &str) -> TrainingSample {
        TrainingSample { id, label: label.into(), tokens: tokenize(text) }
    }

    fn model() -> BoundedCorpusModel {
        BoundedCorpusModel::with_default_capacity(Box::new(FixedLabel::new("relevant")))
    }

    #[test]
    fn parses_training_line() {
        let s = parse_training_line(1, "7\tIgnore\tFree  Download Now").unwrap();
        assert_eq!(s, sample(7, "ignore", "free download now"));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_training_line(3, "7\tignore").unwrap_err();
        assert!(matches!(err, CorpusError::MalformedTrainingLine { line: 3, found: 2 }));
        let err = parse_training_line(4, "7\tignore\ta\tb").unwrap_err();
        assert!(matches!(err, CorpusError::MalformedTrainingLine { line: 4, found: 4 }));
    }

    #[test]
    fn rejects_non_numeric_id() {
        let err = parse_training_line(1, "x7\tignore\tfree").unwrap_err();
        assert!(matches!(err, CorpusError::InvalidSampleId { line: 1, .. }));
    }

    #[test]
    fn bootstrap_registers_ids_and_cursor() {
        let mut store = SampleStore::new();
        let mut model = model();
        let report = store
            .bootstrap(&mut model, ["3\trelevant\tocean", "", "1\tignore\tspam", "3\trelevant\tdup"], ["geo", "", "geo"])
            .unwrap();
        assert_eq!(report, MergeReport { learned: 2, skipped: 1, cursor: 3 });
        assert_eq!(store.last_training_id(), 3);
        assert!(store.has_seen(1) && store.has_seen(3));
        assert_eq!(store.url_tokens(), ["geo".to_string()]);
        assert_eq!(model.learned_count(), 2);
    }

    #[test]
    fn malformed_bootstrap_learns_nothing() {
        let mut store = SampleStore::new();
        let mut model = model();
        let res = store.bootstrap(&mut model, ["1\trelevant\tocean", "broken line"], Vec::<String>::new());
        assert!(res.is_err());
        assert_eq!(model.learned_count(), 0);
        assert_eq!(store.seen_count(), 0);
        assert_eq!(store.last_training_id(), 0);
    }

    #[test]
    fn url_allow_list_is_case_sensitive_substring() {
        let mut store = SampleStore::new();
        store.bootstrap(&mut model(), Vec::<String>::new(), ["geo", "metadata"]).unwrap();
        assert!(store.is_url_allowed("http://geoscience-repository.edu"));
        assert!(store.is_url_allowed("http://x.org/metadata/1"));
        assert!(!store.is_url_allowed("http://GEOSCIENCE.edu"));
        assert!(!store.is_url_allowed("http://world-of-spam.org"));
    }

    #[test]
    fn empty_allow_list_allows_nothing() {
        assert!(!SampleStore::new().is_url_allowed("http://geoscience-repository.edu"));
    }
}
