use super::EncodingError;

/// Turns slot lists into fixed-width multi-hot vectors.
#[derive(Debug, Clone, Copy)]
pub struct MultiHotVectorizer {
    vocabulary_size: usize,
}

impl MultiHotVectorizer {
    pub fn new(vocabulary_size: usize) -> Result<Self, EncodingError> {
        if vocabulary_size <= 1 {
            return Err(EncodingError::InvalidVocabularySize(vocabulary_size));
        }
        Ok(Self { vocabulary_size })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    pub fn vectorize_one(&self, indices: &[usize]) -> Result<Vec<f32>, EncodingError> {
        let mut vector = vec![0.0f32; self.vocabulary_size];
        for &index in indices {
            let slot = vector
                .get_mut(index)
                .ok_or(EncodingError::SlotOutOfRange {
                    index,
                    vocabulary_size: self.vocabulary_size,
                })?;
            *slot = 1.0;
        }
        Ok(vector)
    }

    pub fn vectorize<S: AsRef<[usize]>>(
        &self,
        batch: &[S],
    ) -> Result<Vec<Vec<f32>>, EncodingError> {
        batch
            .iter()
            .map(|indices| self.vectorize_one(indices.as_ref()))
            .collect()
    }
}

pub fn vectorize<S: AsRef<[usize]>>(
    batch: &[S],
    vocabulary_size: usize,
) -> Result<Vec<Vec<f32>>, EncodingError> {
    MultiHotVectorizer::new(vocabulary_size)?.vectorize(batch)
}
