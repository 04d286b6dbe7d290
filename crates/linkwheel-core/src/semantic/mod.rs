//! Semantic Module
//!
//! Pluggable providers for the two optional scoring layers. The engine
//! runs correctly with neither attached: the layers then contribute
//! nothing and their breakdown fields stay absent.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;

/// Default embedding-lookup deadline
pub const DEFAULT_EMBEDDING_DEADLINE_MS: u64 = 250;

/// Embedding cache capacity (queries repeat heavily within a session)
const EMBEDDING_CACHE_SIZE: usize = 256;

/// Pluggable embedding backend
///
/// `embed` may block on model inference or IO; the semantic layer enforces
/// the deadline around it. Returning None means "no embedding available"
/// and contributes 0.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Option<Vec<f32>>;
}

/// Pluggable note-note affinity graph for the edge-weight layer
pub trait EdgeWeightProvider: Send + Sync {
    /// Affinity in [0, 1] between a note and an entity's source note
    fn weight(&self, note_path: &str, entity_path: &str) -> Option<f64>;
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Embedding-backed similarity with deadline and LRU cache
pub struct SemanticLayer {
    provider: Arc<dyn EmbeddingProvider>,
    /// LRU cache for embeddings to avoid re-embedding repeated text
    cache: Mutex<LruCache<String, Vec<f32>>>,
    deadline: Duration,
}

impl SemanticLayer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, deadline_ms: u64) -> Self {
        Self {
            provider,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(EMBEDDING_CACHE_SIZE).expect("cache size is non-zero"),
            )),
            deadline: Duration::from_millis(deadline_ms),
        }
    }

    /// Cosine similarity in [0, 1] between note text and an entity name
    ///
    /// Exceeding the deadline contributes 0 and is logged, never surfaced
    /// as an error.
    pub fn similarity(&self, note_text: &str, entity_name: &str) -> f64 {
        let started = Instant::now();

        let Some(note_vec) = self.embed_cached(note_text) else {
            return 0.0;
        };
        if started.elapsed() > self.deadline {
            tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "embedding lookup exceeded deadline, semantic layer contributes 0"
            );
            return 0.0;
        }
        let Some(entity_vec) = self.embed_cached(entity_name) else {
            return 0.0;
        };
        if started.elapsed() > self.deadline {
            tracing::warn!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "embedding lookup exceeded deadline, semantic layer contributes 0"
            );
            return 0.0;
        }

        (cosine_similarity(&note_vec, &entity_vec) as f64).clamp(0.0, 1.0)
    }

    fn embed_cached(&self, text: &str) -> Option<Vec<f32>> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(text) {
                return Some(hit.clone());
            }
        }
        let vector = self.provider.embed(text)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(text.to_string(), vector.clone());
        }
        Some(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProvider {
        calls: AtomicUsize,
    }

    impl EmbeddingProvider for FixedProvider {
        fn embed(&self, text: &str) -> Option<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Toy embedding: letter histogram over a/b/c.
            let mut v = vec![0.0f32; 3];
            for ch in text.chars() {
                match ch {
                    'a' => v[0] += 1.0,
                    'b' => v[1] += 1.0,
                    'c' => v[2] += 1.0,
                    _ => {}
                }
            }
            Some(v)
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_similarity_uses_cache() {
        let provider = Arc::new(FixedProvider {
            calls: AtomicUsize::new(0),
        });
        let layer = SemanticLayer::new(provider.clone(), 250);

        let first = layer.similarity("abc abc", "abc");
        let second = layer.similarity("abc abc", "abc");
        assert!(first > 0.9);
        assert_eq!(first, second);
        // Two unique texts embedded once each.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_identical_text_maximal_similarity() {
        let provider = Arc::new(FixedProvider {
            calls: AtomicUsize::new(0),
        });
        let layer = SemanticLayer::new(provider, 250);
        assert!((layer.similarity("aabbcc", "aabbcc") - 1.0).abs() < 1e-6);
    }
}
