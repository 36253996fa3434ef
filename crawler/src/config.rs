use crate::policy::DocumentClassificationPolicy;
use crate::sync::{SampleSyncClient, DEFAULT_SYNC_TIMEOUT};
use anyhow::{Context, Result};
use focus_core::resources::ResourcePaths;
use focus_core::{ClassifierKind, Corpus, DEFAULT_CAPACITY};
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to stand up the filter for one crawl run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Directory that named resources are resolved against.
    pub conf_dir: PathBuf,
    /// Bootstrap training set, `ID\tLABEL\tTOKENS` per line.
    pub training_file: Option<String>,
    /// URL substrings that rescue outlinks of ignored documents, one per line.
    pub url_words_file: Option<String>,
    /// Base address of the sample service; `None` disables sync.
    pub api_url: Option<String>,
    pub memory_capacity: usize,
    pub sync_timeout: Duration,
    pub classifier: ClassifierKind,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            conf_dir: PathBuf::from("./conf"),
            training_file: None,
            url_words_file: None,
            api_url: None,
            memory_capacity: DEFAULT_CAPACITY,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            classifier: ClassifierKind::NaiveBayes,
        }
    }
}

/// Load the bootstrap corpus and wire up sync. Fails on any unreadable or malformed resource.
pub fn build_policy(config: &FilterConfig) -> Result<DocumentClassificationPolicy> {
    let paths = ResourcePaths::new(&config.conf_dir);
    let training = match &config.training_file {
        Some(name) => paths.read_lines(name).context("loading training set")?,
        None => Vec::new(),
    };
    let words = match &config.url_words_file {
        Some(name) => paths.read_lines(name).context("loading URL words")?,
        None => Vec::new(),
    };

    let mut corpus = Corpus::new(&config.classifier, config.memory_capacity)?;
    corpus.bootstrap(&training, &words).context("bootstrapping training corpus")?;

    let api_url = config.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    if let Some(u) = api_url {
        url::Url::parse(u).with_context(|| format!("invalid sample API URL {u:?}"))?;
    }
    let sync = SampleSyncClient::new(api_url, config.sync_timeout).context("building sample sync client")?;
    tracing::info!(
        classifier = ?config.classifier,
        capacity = config.memory_capacity,
        learned = corpus.model.learned_count(),
        cursor = corpus.last_training_id(),
        "classification policy ready"
    );
    Ok(DocumentClassificationPolicy::new(corpus.into_shared(), sync))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_match_library() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.memory_capacity, 1000);
        assert!(cfg.api_url.is_none());
        assert_eq!(cfg.classifier, ClassifierKind::NaiveBayes);
    }

    #[test]
    fn nothing_configured_builds_empty_policy() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FilterConfig { conf_dir: dir.path().to_path_buf(), ..FilterConfig::default() };
        let policy = build_policy(&cfg).unwrap();
        assert!(!policy.sync().is_enabled());
        assert_eq!(policy.corpus().read().last_training_id(), 0);
        assert_eq!(policy.label_text("ocean"), focus_core::DEFAULT_LABEL);
    }

    #[test]
    fn loads_named_resources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bayes.txt"), "1\trelevant\tocean climate\n2\tignore\tfree download\n").unwrap();
        fs::write(dir.path().join("words.txt"), "geo\nmetadata\n").unwrap();
        let cfg = FilterConfig {
            conf_dir: dir.path().to_path_buf(),
            training_file: Some("bayes.txt".into()),
            url_words_file: Some("words.txt".into()),
            api_url: Some("http://samples.local".into()),
            ..FilterConfig::default()
        };
        let policy = build_policy(&cfg).unwrap();
        assert_eq!(policy.sync().endpoint(2).as_deref(), Some("http://samples.local/lastSample/2"));
        let corpus = policy.corpus().read();
        assert_eq!(corpus.last_training_id(), 2);
        assert!(corpus.is_url_allowed("http://geoscience-metadata.org"));
    }

    #[test]
    fn malformed_training_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bayes.txt"), "1\trelevant\n").unwrap();
        let cfg = FilterConfig {
            conf_dir: dir.path().to_path_buf(),
            training_file: Some("bayes.txt".into()),
            ..FilterConfig::default()
        };
        assert!(build_policy(&cfg).is_err());
    }

    #[test]
    fn missing_resource_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FilterConfig {
            conf_dir: dir.path().to_path_buf(),
            url_words_file: Some("absent.txt".into()),
            ..FilterConfig::default()
        };
        assert!(build_policy(&cfg).is_err());
    }

    #[test]
    fn invalid_api_url_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FilterConfig {
            conf_dir: dir.path().to_path_buf(),
            api_url: Some("not a url".into()),
            ..FilterConfig::default()
        };
        assert!(build_policy(&cfg).is_err());
    }
}
