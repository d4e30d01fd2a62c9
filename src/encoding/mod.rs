//! Text to feature-vector encoding: tokenize, hash each token into a slot,
//! then set the matching positions of a multi-hot vector.

pub mod hashing;
pub mod tokenizer;
pub mod vectorizer;

pub use hashing::{HashStrategy, HashingEncoder};
pub use tokenizer::{Tokenizer, DEFAULT_FILTERS, DEFAULT_SEPARATOR};
pub use vectorizer::MultiHotVectorizer;

use crate::config::EncodingConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("vocabulary size must be greater than 1, got {0}")]
    InvalidVocabularySize(usize),
    #[error("slot index {index} is outside 0..{vocabulary_size}")]
    SlotOutOfRange { index: usize, vocabulary_size: usize },
    #[error("token separator must not be empty")]
    EmptySeparator,
}

/// The full encoding pipeline built from one configuration, so the
/// tokenizer, hash modulus and vector width can never disagree.
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    tokenizer: Tokenizer,
    hasher: HashingEncoder,
    vectorizer: MultiHotVectorizer,
}

impl FeatureEncoder {
    pub fn new(
        tokenizer: Tokenizer,
        vocabulary_size: usize,
        strategy: HashStrategy,
    ) -> Result<Self, EncodingError> {
        Ok(Self {
            tokenizer,
            hasher: HashingEncoder::new(vocabulary_size, strategy)?,
            vectorizer: MultiHotVectorizer::new(vocabulary_size)?,
        })
    }

    pub fn from_config(config: &EncodingConfig) -> Result<Self, EncodingError> {
        let tokenizer = Tokenizer::new(&config.filters, config.lowercase, &config.separator)?;
        Self::new(tokenizer, config.vocabulary_size, config.hash)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.hasher.vocabulary_size()
    }

    pub fn strategy(&self) -> HashStrategy {
        self.hasher.strategy()
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    /// Slot indices for every token of `text`, in token order.
    pub fn one_hot(&self, text: &str) -> Vec<usize> {
        self.hasher.encode(&self.tokenizer.tokenize(text))
    }

    /// One multi-hot vector per input text.
    pub fn feature_vectors<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Result<Vec<Vec<f32>>, EncodingError> {
        let slots: Vec<Vec<usize>> = texts.iter().map(|t| self.one_hot(t.as_ref())).collect();
        self.vectorizer.vectorize(&slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_encoder() -> FeatureEncoder {
        FeatureEncoder::from_config(&EncodingConfig::default()).unwrap()
    }

    #[test]
    fn test_pipeline_end_to_end() {
        let encoder = default_encoder();
        assert_eq!(encoder.tokenize("FREE money now!!!"), vec!["free", "money", "now"]);
        assert_eq!(encoder.one_hot("FREE money now!!!"), vec![1037, 2613, 5170]);

        let vectors = encoder.feature_vectors(&["FREE money now!!! free FREE"]).unwrap();
        assert_eq!(vectors.len(), 1);
        let vector = &vectors[0];
        assert_eq!(vector.len(), 9013);
        assert_eq!(vector[1037], 1.0);
        assert_eq!(vector[2613], 1.0);
        assert_eq!(vector[5170], 1.0);
        assert_eq!(vector.iter().sum::<f32>(), 3.0);
        assert_eq!(vector[0], 0.0);
    }

    #[test]
    fn test_empty_text_gives_zero_vector() {
        let vectors = default_encoder().feature_vectors(&[""]).unwrap();
        assert_eq!(vectors[0].len(), 9013);
        assert!(vectors[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_config() {
        let config = EncodingConfig {
            vocabulary_size: 50,
            hash: HashStrategy::Sha256,
            lowercase: false,
            separator: " ".to_string(),
            filters: DEFAULT_FILTERS.to_string(),
        };
        let encoder = FeatureEncoder::from_config(&config).unwrap();
        assert_eq!(encoder.vocabulary_size(), 50);
        assert_eq!(encoder.strategy(), HashStrategy::Sha256);
        assert_eq!(encoder.tokenize("Hi THERE"), vec!["Hi", "THERE"]);
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut config = EncodingConfig::default();
        config.vocabulary_size = 1;
        assert_eq!(
            FeatureEncoder::from_config(&config).unwrap_err(),
            EncodingError::InvalidVocabularySize(1)
        );

        let mut config = EncodingConfig::default();
        config.separator = String::new();
        assert_eq!(
            FeatureEncoder::from_config(&config).unwrap_err(),
            EncodingError::EmptySeparator
        );
    }

    #[test]
    fn test_encoder_is_shareable_across_threads() {
        let encoder = std::sync::Arc::new(default_encoder());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let encoder = encoder.clone();
                std::thread::spawn(move || encoder.one_hot("free money"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), vec![1037, 2613]);
        }
    }
}
