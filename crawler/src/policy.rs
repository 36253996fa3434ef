use crate::sync::SampleSyncClient;
use focus_core::tokenizer::tokenize;
use focus_core::{ClassifiedDocument, Corpus, Document, MergeReport, Outlink, SharedCorpus, IGNORE_LABEL};

/// Labels each document and decides which of its outlinks reach the frontier.
///
/// Cheap to share: wrap in an `Arc` and call from as many crawl tasks as needed.
pub struct DocumentClassificationPolicy {
    corpus: SharedCorpus,
    sync: SampleSyncClient,
}

impl DocumentClassificationPolicy {
    pub fn new(corpus: SharedCorpus, sync: SampleSyncClient) -> Self {
        Self { corpus, sync }
    }

    pub fn corpus(&self) -> &SharedCorpus { &self.corpus }

    pub fn sync(&self) -> &SampleSyncClient { &self.sync }

    /// Pull samples newer than the cursor and merge them. `None` when nothing was merged.
    pub async fn refresh(&self) -> Option<MergeReport> {
        if !self.sync.is_enabled() { return None; }
        // The lock is never held across the request.
        let cursor = self.corpus.read().last_training_id();
        let batch = self.sync.fetch_new_samples(cursor).await?;
        if batch.is_empty() { return None; }
        let report = self.corpus.write().merge(batch);
        tracing::info!(
            learned = report.learned,
            skipped = report.skipped,
            cursor = report.cursor,
            "new training samples acquired, retrained the classifier"
        );
        Some(report)
    }

    /// Sync, classify, filter.
    pub async fn process(&self, doc: &Document) -> ClassifiedDocument {
        self.refresh().await;
        self.decide(doc)
    }

    /// Classify and filter against the current corpus, without syncing.
    pub fn decide(&self, doc: &Document) -> ClassifiedDocument {
        let tokens = tokenize(&doc.text);
        let corpus = self.corpus.read();
        let label = corpus.classify(&tokens).label;
        let outlinks = select_outlinks(&corpus, &label, &doc.outlinks);
        drop(corpus);
        tracing::info!(url = %doc.url, %label, kept = outlinks.len(), total = doc.outlinks.len(), "document classified");
        ClassifiedDocument { url: doc.url.clone(), label, outlinks }
    }

    pub fn label_text(&self, text: &str) -> String {
        self.corpus.read().classify(&tokenize(text)).label
    }
}

/// Outlinks of an `ignore` document survive only if the allow-list vouches for them.
/// Any other label keeps everything. Order is preserved either way.
pub fn select_outlinks(corpus: &Corpus, label: &str, outlinks: &[Outlink]) -> Vec<Outlink> {
    if label != IGNORE_LABEL {
        return outlinks.to_vec();
    }
    outlinks.iter().filter(|o| corpus.is_url_allowed(&o.to_url)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use focus_core::ClassifierKind;

    fn corpus(kind: ClassifierKind, words: &[&str]) -> Corpus {
        let mut corpus = Corpus::new(&kind, 1000).unwrap();
        corpus
            .bootstrap(["1\trelevant\tocean climate", "2\tignore\tfree download"], words.iter().copied())
            .unwrap();
        corpus
    }

    fn links(urls: &[&str]) -> Vec<Outlink> {
        urls.iter().map(|u| Outlink::new(*u)).collect()
    }

    #[test]
    fn ignore_keeps_only_allowed_links() {
        let c = corpus(ClassifierKind::NaiveBayes, &["geo", "metadata"]);
        let kept = select_outlinks(&c, "ignore", &links(&["http://geoscience-repository.edu", "http://world-of-spam.org"]));
        assert_eq!(kept, links(&["http://geoscience-repository.edu"]));
    }

    #[test]
    fn other_labels_pass_everything_through() {
        let c = corpus(ClassifierKind::NaiveBayes, &["geo"]);
        let input = links(&["http://world-of-spam.org", "http://geo.edu", "http://world-of-spam.org"]);
        for label in ["relevant", "unclassified", "Ignore", ""] {
            assert_eq!(select_outlinks(&c, label, &input), input);
        }
    }

    #[test]
    fn filtering_preserves_order() {
        let c = corpus(ClassifierKind::NaiveBayes, &["geo", "metadata"]);
        let input = links(&[
            "http://geoscience-repository.edu",
            "http://helpless-site.com",
            "http://geoscience-metadata.org",
            "http://world-of-spam.org",
        ]);
        let kept = select_outlinks(&c, "ignore", &input);
        assert_eq!(kept, links(&["http://geoscience-repository.edu", "http://geoscience-metadata.org"]));
    }

    #[tokio::test]
    async fn process_without_sync_uses_bootstrap_corpus() {
        let policy = DocumentClassificationPolicy::new(
            corpus(ClassifierKind::NaiveBayes, &["geo"]).into_shared(),
            SampleSyncClient::disabled(),
        );
        let doc = Document {
            url: "http://spam.url".into(),
            text: "Free offer, download now".into(),
            outlinks: links(&["http://geo.edu", "http://spam.org"]),
        };
        let out = policy.process(&doc).await;
        assert_eq!(out.label, "ignore");
        assert_eq!(out.outlinks, links(&["http://geo.edu"]));
        assert!(policy.refresh().await.is_none());
        assert_eq!(policy.corpus().read().last_training_id(), 2);
    }

    #[test]
    fn fixed_classifier_forces_label() {
        let policy = DocumentClassificationPolicy::new(
            corpus(ClassifierKind::Fixed("ignore".into()), &[]).into_shared(),
            SampleSyncClient::disabled(),
        );
        let doc = Document { url: "http://a".into(), text: "ocean climate".into(), outlinks: links(&["http://geo.edu"]) };
        let out = policy.decide(&doc);
        assert_eq!(out.label, "ignore");
        assert!(out.outlinks.is_empty());
        assert_eq!(policy.label_text("anything"), "ignore");
    }
}
