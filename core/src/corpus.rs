use crate::classifier::{Classification, TextClassifier};
use crate::error::CorpusError;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 1000;

/// A classifier that only remembers the most recent `capacity` samples.
///
/// Raw samples are kept in arrival order; once the ring is full the oldest one is
/// retracted from the classifier before the next is admitted, so recent training
/// always dominates.
pub struct BoundedCorpusModel {
    classifier: Box<dyn TextClassifier>,
    retained: VecDeque<(String, Vec<String>)>,
    capacity: usize,
    total_learned: u64,
}

impl BoundedCorpusModel {
    pub fn new(classifier: Box<dyn TextClassifier>, capacity: usize) -> Result<Self, CorpusError> {
        if capacity == 0 {
            return Err(CorpusError::InvalidCapacity);
        }
        Ok(Self { classifier, retained: VecDeque::with_capacity(capacity.min(4096)), capacity, total_learned: 0 })
    }

    pub fn with_default_capacity(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier, retained: VecDeque::new(), capacity: DEFAULT_CAPACITY, total_learned: 0 }
    }

    pub fn learn(&mut self, label: &str, tokens: Vec<String>) {
        if tokens.is_empty() { return; }
        while self.retained.len() >= self.capacity {
            if let Some((old_label, old_tokens)) = self.retained.pop_front() {
                self.classifier.forget(&old_label, &old_tokens);
                tracing::debug!(label = %old_label, "evicted oldest training sample");
            }
        }
        self.classifier.learn(label, &tokens);
        self.retained.push_back((label.to_string(), tokens));
        self.total_learned += 1;
    }

    pub fn classify(&self, tokens: &[String]) -> Classification {
        self.classifier.classify(tokens)
    }

    /// Samples currently influencing classification.
    pub fn learned_count(&self) -> usize { self.retained.len() }

    /// Samples ever learned, evicted ones included.
    pub fn total_learned(&self) -> u64 { self.total_learned }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn category_count(&self) -> usize { self.classifier.category_count() }
}
