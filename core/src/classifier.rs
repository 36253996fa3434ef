use crate::error::CorpusError;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

/// Label returned when nothing has been learned yet.
pub const DEFAULT_LABEL: &str = "unclassified";

// Weighted-average smoothing for tokens seen rarely or never under a label.
const FEATURE_WEIGHT: f64 = 1.0;
const ASSUMED_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    /// Log-space confidence. Only comparable between labels of the same call.
    pub score: f64,
}

impl Classification {
    fn unclassified() -> Self {
        Self { label: DEFAULT_LABEL.to_string(), score: 0.0 }
    }
}

/// Learns labeled token sequences and assigns the most likely label to new ones.
pub trait TextClassifier: Send + Sync {
    /// Add `tokens` as evidence for `label`. An empty sequence is a no-op.
    fn learn(&mut self, label: &str, tokens: &[String]);
    /// Exact inverse of [`TextClassifier::learn`] for the same arguments.
    fn forget(&mut self, label: &str, tokens: &[String]);
    fn classify(&self, tokens: &[String]) -> Classification;
    /// Number of labels currently holding evidence.
    fn category_count(&self) -> usize;
}

/// Multinomial naive Bayes over raw token counts.
#[derive(Debug, Default)]
pub struct NaiveBayes {
    // label -> token -> occurrences
    feature_counts: HashMap<String, HashMap<String, u32>>,
    token_totals: HashMap<String, u32>,
    label_counts: BTreeMap<String, u32>,
}

impl NaiveBayes {
    pub fn new() -> Self { Self::default() }

    fn feature_count(&self, token: &str, label: &str) -> u32 {
        self.feature_counts
            .get(label)
            .and_then(|tokens| tokens.get(token))
            .copied()
            .unwrap_or(0)
    }

    fn weighted_probability(&self, token: &str, label: &str, label_count: u32) -> f64 {
        let basic = self.feature_count(token, label) as f64 / label_count as f64;
        let total = self.token_totals.get(token).copied().unwrap_or(0) as f64;
        (FEATURE_WEIGHT * ASSUMED_PROBABILITY + total * basic) / (FEATURE_WEIGHT + total)
    }
}

fn decrement<K: std::hash::Hash + Eq>(map: &mut HashMap<K, u32>, key: &K) {
    if let Some(n) = map.get_mut(key) {
        *n = n.saturating_sub(1);
        if *n == 0 {
            map.remove(key);
        }
    }
}

impl TextClassifier for NaiveBayes {
    fn learn(&mut self, label: &str, tokens: &[String]) {
        if tokens.is_empty() { return; }
        let per_label = self.feature_counts.entry(label.to_string()).or_default();
        for token in tokens {
            *per_label.entry(token.clone()).or_insert(0) += 1;
            *self.token_totals.entry(token.clone()).or_insert(0) += 1;
        }
        *self.label_counts.entry(label.to_string()).or_insert(0) += 1;
    }

    fn forget(&mut self, label: &str, tokens: &[String]) {
        if tokens.is_empty() { return; }
        if let Some(per_label) = self.feature_counts.get_mut(label) {
            for token in tokens {
                decrement(per_label, token);
            }
            if per_label.is_empty() {
                self.feature_counts.remove(label);
            }
        }
        for token in tokens {
            decrement(&mut self.token_totals, token);
        }
        if let Some(n) = self.label_counts.get_mut(label) {
            *n = n.saturating_sub(1);
            if *n == 0 {
                self.label_counts.remove(label);
            }
        }
    }

    fn classify(&self, tokens: &[String]) -> Classification {
        let total: u32 = self.label_counts.values().sum();
        if total == 0 {
            return Classification::unclassified();
        }
        let mut best: Option<Classification> = None;
        // Labels iterate in ascending order, so `>=` hands ties to the greatest label.
        for (label, &count) in &self.label_counts {
            let prior = (count as f64 / total as f64).ln();
            let score = tokens
                .iter()
                .map(|t| self.weighted_probability(t, label, count).ln())
                .sum::<f64>()
                + prior;
            if best.as_ref().map_or(true, |b| score >= b.score) {
                best = Some(Classification { label: label.clone(), score });
            }
        }
        best.unwrap_or_else(Classification::unclassified)
    }

    fn category_count(&self) -> usize { self.label_counts.len() }
}

/// Deterministic stand-in that answers with one label no matter the input.
#[derive(Debug, Clone)]
pub struct FixedLabel {
    label: String,
    learned: usize,
}

impl FixedLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), learned: 0 }
    }

    pub fn learned(&self) -> usize { self.learned }
}

impl TextClassifier for FixedLabel {
    fn learn(&mut self, _label: &str, tokens: &[String]) {
        if !tokens.is_empty() {
            self.learned += 1;
        }
    }

    fn forget(&mut self, _label: &str, tokens: &[String]) {
        if !tokens.is_empty() {
            self.learned = self.learned.saturating_sub(1);
        }
    }

    fn classify(&self, _tokens: &[String]) -> Classification {
        Classification { label: self.label.clone(), score: 0.0 }
    }

    fn category_count(&self) -> usize { 1 }
}

/// Which [`TextClassifier`] to build, as named in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    #[default]
    NaiveBayes,
    Fixed(String),
}

impl ClassifierKind {
    pub fn build(&self) -> Box<dyn TextClassifier> {
        match self {
            ClassifierKind::NaiveBayes => Box::new(NaiveBayes::new()),
            ClassifierKind::Fixed(label) => Box::new(FixedLabel::new(label.clone())),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "naive-bayes" | "bayes" => Ok(ClassifierKind::NaiveBayes),
            _ => match s.strip_prefix("fixed:") {
                Some(label) if !label.is_empty() => Ok(ClassifierKind::Fixed(label.to_lowercase())),
                _ => Err(CorpusError::UnknownClassifier(s.to_string())),
            },
        }
    }
}
