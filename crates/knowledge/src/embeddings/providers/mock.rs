//! Mock embedding provider using character n-gram embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use medfaq_core::{ApiKey, AppResult};
use std::collections::BTreeMap;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Mock provider for offline use and tests.
///
/// Generates deterministic embeddings from character bigrams and trigrams of
/// each text segment. Chinese text has no word boundaries, so segments are
/// runs of alphanumeric characters and the n-grams stand in for words. Not
/// semantically accurate, but texts sharing phrases land close together.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_mock_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();

        let mut segment_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for segment in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .filter(|s| !s.is_ascii() || (s.len() > 2 && !STOP_WORDS.contains(s)))
        {
            *segment_freq.entry(segment).or_insert(0) += 1;
        }

        for (segment, freq) in &segment_freq {
            let chars: Vec<char> = segment.chars().collect();
            let weight = (*freq as f32).sqrt();

            for n in [2usize, 3] {
                for gram in chars.windows(n) {
                    let idx = self.bucket(gram.iter().collect::<String>().as_bytes(), 37);
                    embedding[idx] += weight;
                }
            }

            // Whole segment, so single characters still count
            let idx = self.bucket(segment.as_bytes(), 31);
            embedding[idx] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }

    fn bucket(&self, bytes: &[u8], seed: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(seed).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "ngram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        _api_key: Option<&ApiKey>,
    ) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_mock_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_mock_provider_embed_single() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("便秘怎麼辦", None).await.unwrap();

        assert_eq!(embedding.len(), 384);

        // Verify normalization (unit vector)
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_mock_provider_embed_batch() {
        let provider = MockProvider::new(384);
        let texts = vec![
            "經痛可以吃止痛藥嗎".to_string(),
            "眼藥水開封後可以放多久".to_string(),
            "constipation remedies".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts, None).await.unwrap();

        assert_eq!(embeddings.len(), 3);
        for embedding in &embeddings {
            assert_eq!(embedding.len(), 384);
        }
    }

    #[tokio::test]
    async fn test_mock_provider_deterministic() {
        let provider = MockProvider::new(384);
        let text = "眼藥水可以冰嗎？";

        let embedding1 = provider.embed(text, None).await.unwrap();
        let embedding2 = provider.embed(text, None).await.unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[tokio::test]
    async fn test_mock_provider_shared_phrases_score_higher() {
        let provider = MockProvider::new(384);

        let query = provider.embed("便秘的時候該怎麼辦", None).await.unwrap();
        let related = provider.embed("長期便秘該怎麼辦？", None).await.unwrap();
        let unrelated = provider.embed("隱形眼鏡藥水", None).await.unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_mock_provider_empty_text() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("", None).await.unwrap();

        assert_eq!(embedding.len(), 384);
        // Empty text should produce zero vector
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_mock_provider_skips_stop_words() {
        let provider = MockProvider::new(384);
        let embedding = provider.embed("the and of", None).await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
