use crate::config::RetrievalConfig;
use crate::error::SynthesisError;
use crate::llm::Embedder;

/// One chunk of the corpus with its embedding.
#[derive(Debug, Clone)]
pub struct Passage {
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A passage paired with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredPassage<'a> {
    pub passage: &'a Passage,
    pub similarity: f32,
}

/// Nearest-passage lookup built once per request and dropped with it.
#[derive(Debug)]
pub struct SemanticIndex {
    passages: Vec<Passage>,
}

impl SemanticIndex {
    /// Split `corpus_text` into passages and embed each one.
    pub async fn build(
        corpus_text: &str,
        embedder: &dyn Embedder,
        config: &RetrievalConfig,
    ) -> Result<Self, SynthesisError> {
        let chunks = split_passages(corpus_text, config.chunk_size, config.chunk_overlap);
        if chunks.is_empty() {
            return Err(SynthesisError::index("corpus has no text to index"));
        }

        let embeddings = embedder
            .embed_batch(&chunks)
            .await
            .map_err(SynthesisError::Embedding)?;
        if embeddings.len() != chunks.len() {
            return Err(SynthesisError::index(format!(
                "embedder returned {} vectors for {} passages",
                embeddings.len(),
                chunks.len()
            )));
        }

        ::log::debug!("Indexed {} passages", chunks.len());
        let passages = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| Passage { text, embedding })
            .collect();
        Ok(Self { passages })
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    /// The `k` passages most similar to `query`, best first.
    ///
    /// Equal scores keep corpus order.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Vec<ScoredPassage<'_>> {
        let mut scored: Vec<ScoredPassage<'_>> = self
            .passages
            .iter()
            .map(|passage| ScoredPassage {
                passage,
                similarity: cosine_similarity(query, &passage.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Split text into passages of at most `chunk_size` characters.
///
/// Paragraphs (blank-line separated) are packed greedily; a paragraph longer
/// than `chunk_size` is cut into windows that share `overlap` characters.
pub fn split_passages(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);
    let mut passages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let para_len = paragraph.chars().count();

        if para_len > chunk_size {
            if !current.is_empty() {
                passages.push(std::mem::take(&mut current));
                current_len = 0;
            }
            passages.extend(windows(paragraph, chunk_size, overlap));
            continue;
        }

        let joined_len = if current.is_empty() {
            para_len
        } else {
            current_len + 2 + para_len
        };
        if joined_len > chunk_size {
            passages.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += para_len;
    }

    if !current.is_empty() {
        passages.push(current);
    }
    passages
}

fn windows(paragraph: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let step = size - overlap;
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        out.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use async_trait::async_trait;

    /// Embeds text as counts of the letters a, b and c.
    struct LetterEmbedder;

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
            Ok(['a', 'b', 'c']
                .iter()
                .map(|l| text.chars().filter(|c| c == l).count() as f32)
                .collect())
        }
    }

    #[test]
    fn test_cosine() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_split_packs_paragraphs() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        assert_eq!(split_passages(text, 10, 0), vec!["aaaa\n\nbbbb", "cccc"]);
        assert_eq!(split_passages(text, 100, 10), vec![text]);
        assert!(split_passages("  \n\n  ", 10, 0).is_empty());
    }

    #[test]
    fn test_split_long_paragraph_with_overlap() {
        let passages = split_passages("abcdefghij", 4, 1);
        assert_eq!(passages, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let passages = split_passages("ééééé", 2, 0);
        assert_eq!(passages, vec!["éé", "éé", "é"]);
    }

    #[tokio::test]
    async fn test_build_and_retrieve() {
        let config = RetrievalConfig {
            top_k: 2,
            chunk_size: 5,
            chunk_overlap: 0,
        };
        let index = SemanticIndex::build("aaa\n\nbbb\n\nccc", &LetterEmbedder, &config)
            .await
            .unwrap();
        assert_eq!(index.passages().len(), 3);

        let hits = index.retrieve(&[0.0, 1.0, 0.1], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].passage.text, "bbb");
        assert_eq!(hits[1].passage.text, "ccc");
    }

    #[tokio::test]
    async fn test_build_rejects_empty_corpus() {
        let err = SemanticIndex::build("   ", &LetterEmbedder, &RetrievalConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SynthesisError::Index { .. }));
    }
}
