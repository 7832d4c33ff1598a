//! Retrieval strategies over the chunked rulebook index.
//!
//! Three strategies implement the same [`Retriever`] trait so the
//! evaluation sweep can run them interchangeably:
//! - **keyword** — keyword-overlap count between the query and each index
//!   entry, ties broken by document order.
//! - **embedding** — cosine similarity between the query vector and
//!   per-entry vectors computed once at construction.
//! - **hybrid** — min-max normalized keyword and embedding scores merged
//!   as `(1 - alpha) * keyword + alpha * embedding`.
//!
//! Construction failures (no provider, API unreachable) drop the affected
//! retriever from the run with a stderr notice rather than aborting it.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::config::Config;
use crate::embedding;
use crate::keywords::{extract_keywords, overlap_count};
use crate::models::{IndexEntry, Rulebook};

/// A named search strategy returning ranked section IDs.
#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    /// Return up to `top_k` section IDs, best match first. Every returned
    /// ID exists in the index the retriever was built over.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>>;
}

/// Rank scored entries: score descending, then index-entry document order.
/// The secondary key makes repeated runs over the same index byte-identical.
fn rank(mut scored: Vec<(usize, String, f64)>, top_k: usize) -> Vec<String> {
    scored.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(top_k);
    scored.into_iter().map(|(_, id, _)| id).collect()
}

// ============ Keyword retriever ============

/// Scores each index entry by how many query keywords it shares.
pub struct KeywordRetriever {
    entries: Vec<IndexEntry>,
}

impl KeywordRetriever {
    pub fn new(rulebook: &Rulebook) -> Self {
        Self {
            entries: rulebook.index.clone(),
        }
    }

    /// Raw overlap scores for every entry with at least one shared keyword,
    /// tagged with the entry's document-order position.
    fn scored(&self, query: &str) -> Vec<(usize, String, f64)> {
        let query_keywords = extract_keywords(query);

        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let overlap = overlap_count(&query_keywords, &entry.keywords);
                if overlap == 0 {
                    return None;
                }
                Some((i, entry.id.clone(), overlap as f64))
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(rank(self.scored(query), top_k))
    }
}

// ============ Embedding retriever ============

/// Ranks index entries by cosine similarity against the query vector.
///
/// Entry vectors are computed once at construction, in batches, from each
/// entry's title and path. Only the query is embedded per search call.
pub struct EmbeddingRetriever {
    config: crate::config::EmbeddingConfig,
    entries: Vec<IndexEntry>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingRetriever {
    pub async fn build(config: &Config, rulebook: &Rulebook) -> Result<Self> {
        // Fail here, not at search time, if the provider is misconfigured.
        let provider = embedding::create_provider(&config.embedding)?;

        let entries = rulebook.index.clone();
        let texts: Vec<String> = entries.iter().map(entry_text).collect();

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(config.embedding.batch_size.max(1)) {
            let batch_vectors = embedding::embed_texts(&config.embedding, batch).await?;
            if batch_vectors.len() != batch.len() {
                bail!(
                    "Embedding batch returned {} vectors for {} texts",
                    batch_vectors.len(),
                    batch.len()
                );
            }
            for vec in &batch_vectors {
                if vec.len() != provider.dims() {
                    bail!(
                        "Model {} returned {}-dim vector, expected {}",
                        provider.model_name(),
                        vec.len(),
                        provider.dims()
                    );
                }
            }
            vectors.extend(batch_vectors);
        }

        Ok(Self {
            config: config.embedding.clone(),
            entries,
            vectors,
        })
    }

    async fn scored(&self, query: &str) -> Result<Vec<(usize, String, f64)>> {
        let query_vec = embedding::embed_query(&self.config, query).await?;

        Ok(self
            .entries
            .iter()
            .zip(self.vectors.iter())
            .enumerate()
            .map(|(i, (entry, vec))| {
                let similarity = embedding::cosine_similarity(&query_vec, vec) as f64;
                (i, entry.id.clone(), similarity)
            })
            .collect())
    }
}

/// Text embedded for one index entry. The path carries ancestor context so
/// "Dragonborn" under "Races" embeds differently from a bare title.
fn entry_text(entry: &IndexEntry) -> String {
    if entry.path.is_empty() {
        entry.title.clone()
    } else {
        format!("{}: {}", entry.path, entry.title)
    }
}

#[async_trait]
impl Retriever for EmbeddingRetriever {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        Ok(rank(self.scored(query).await?, top_k))
    }
}

// ============ Hybrid retriever ============

/// Merges the keyword and embedding channels.
///
/// Each channel's raw scores are min-max normalized to [0, 1], then
/// combined per section as `(1 - alpha) * keyword + alpha * embedding`.
/// Sections seen by only one channel contribute 0 on the other.
pub struct HybridRetriever {
    keyword: KeywordRetriever,
    embedding: EmbeddingRetriever,
    alpha: f64,
}

impl HybridRetriever {
    pub async fn build(config: &Config, rulebook: &Rulebook) -> Result<Self> {
        Ok(Self {
            keyword: KeywordRetriever::new(rulebook),
            embedding: EmbeddingRetriever::build(config, rulebook).await?,
            alpha: config.retrieval.hybrid_alpha,
        })
    }
}

#[async_trait]
impl Retriever for HybridRetriever {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let keyword_scores = self.keyword.scored(query);
        let embedding_scores = self.embedding.scored(query).await?;
        Ok(rank(
            merge_channels(&keyword_scores, &embedding_scores, self.alpha),
            top_k,
        ))
    }
}

/// Min-max normalize one channel's raw scores to [0, 1].
///
/// A single candidate (or all-equal scores) normalizes to 1.0 so a lone
/// match still outranks absent ones.
fn normalize_scores(scored: &[(usize, String, f64)]) -> Vec<(usize, String, f64)> {
    if scored.is_empty() {
        return Vec::new();
    }

    let s_min = scored.iter().map(|(_, _, s)| *s).fold(f64::INFINITY, f64::min);
    let s_max = scored
        .iter()
        .map(|(_, _, s)| *s)
        .fold(f64::NEG_INFINITY, f64::max);

    scored
        .iter()
        .map(|(i, id, s)| {
            let norm = if (s_max - s_min).abs() < f64::EPSILON {
                1.0
            } else {
                (s - s_min) / (s_max - s_min)
            };
            (*i, id.clone(), norm)
        })
        .collect()
}

/// Alpha-weighted merge of two normalized channels.
fn merge_channels(
    keyword_scores: &[(usize, String, f64)],
    embedding_scores: &[(usize, String, f64)],
    alpha: f64,
) -> Vec<(usize, String, f64)> {
    let norm_keyword = normalize_scores(keyword_scores);
    let norm_embedding = normalize_scores(embedding_scores);

    let kw_map: HashMap<&str, f64> = norm_keyword
        .iter()
        .map(|(_, id, s)| (id.as_str(), *s))
        .collect();
    let emb_map: HashMap<&str, f64> = norm_embedding
        .iter()
        .map(|(_, id, s)| (id.as_str(), *s))
        .collect();

    let mut seen: HashMap<String, usize> = HashMap::new();
    for (i, id, _) in norm_keyword.iter().chain(norm_embedding.iter()) {
        let position = seen.entry(id.clone()).or_insert(*i);
        if *i < *position {
            *position = *i;
        }
    }

    seen.into_iter()
        .map(|(id, i)| {
            let k = kw_map.get(id.as_str()).copied().unwrap_or(0.0);
            let e = emb_map.get(id.as_str()).copied().unwrap_or(0.0);
            let merged = (1.0 - alpha) * k + alpha * e;
            (i, id, merged)
        })
        .collect()
}

// ============ Construction ============

/// Build every retriever named in the configuration.
///
/// A retriever whose construction fails is skipped with a stderr notice
/// so the remaining strategies still get evaluated; only an empty result
/// is fatal.
pub async fn build_retrievers(
    config: &Config,
    rulebook: &Rulebook,
) -> Result<Vec<Box<dyn Retriever>>> {
    let mut retrievers: Vec<Box<dyn Retriever>> = Vec::new();

    for name in &config.retrieval.retrievers {
        match name.as_str() {
            "keyword" => retrievers.push(Box::new(KeywordRetriever::new(rulebook))),
            "embedding" => match EmbeddingRetriever::build(config, rulebook).await {
                Ok(r) => retrievers.push(Box::new(r)),
                Err(e) => eprintln!("Warning: skipping embedding retriever: {}", e),
            },
            "hybrid" => match HybridRetriever::build(config, rulebook).await {
                Ok(r) => retrievers.push(Box::new(r)),
                Err(e) => eprintln!("Warning: skipping hybrid retriever: {}", e),
            },
            other => bail!("Unknown retriever: {}", other),
        }
    }

    if retrievers.is_empty() {
        bail!("No retrievers could be constructed");
    }

    Ok(retrievers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndexEntry;

    fn entry(id: &str, title: &str, path: &str) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            title: title.to_string(),
            path: path.to_string(),
            keywords: extract_keywords(title),
            level: 2,
        }
    }

    fn rulebook_with(entries: Vec<IndexEntry>) -> Rulebook {
        Rulebook {
            title: "Test".to_string(),
            sections: Vec::new(),
            total_sections: entries.len(),
            index: entries,
        }
    }

    #[tokio::test]
    async fn test_keyword_retriever_ranks_by_overlap() {
        let rulebook = rulebook_with(vec![
            entry("aaa", "Combat Basics", "Combat Basics"),
            entry("bbb", "Combat Actions and Initiative", "Combat Actions and Initiative"),
            entry("ccc", "Downtime Activities", "Downtime Activities"),
        ]);
        let retriever = KeywordRetriever::new(&rulebook);

        let results = retriever.search("combat initiative", 10).await.unwrap();
        assert_eq!(results, vec!["bbb".to_string(), "aaa".to_string()]);
    }

    #[tokio::test]
    async fn test_keyword_retriever_respects_top_k() {
        let rulebook = rulebook_with(vec![
            entry("aaa", "Spells", "Spells"),
            entry("bbb", "Spell Slots", "Spell Slots"),
            entry("ccc", "Spellcasting", "Spellcasting"),
        ]);
        let retriever = KeywordRetriever::new(&rulebook);

        let results = retriever.search("spell", 2).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_keyword_retriever_no_match_is_empty() {
        let rulebook = rulebook_with(vec![entry("aaa", "Combat", "Combat")]);
        let retriever = KeywordRetriever::new(&rulebook);

        let results = retriever.search("zzz qqq", 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_keyword_ties_break_by_document_order() {
        let rulebook = rulebook_with(vec![
            entry("first", "Combat Rules", "Combat Rules"),
            entry("second", "Combat Options", "Combat Options"),
        ]);
        let retriever = KeywordRetriever::new(&rulebook);

        // Both entries share exactly "combat" with the query.
        let results = retriever.search("combat", 10).await.unwrap();
        assert_eq!(results, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn test_normalize_single_candidate_is_one() {
        let scored = vec![(0, "a".to_string(), 5.0)];
        let result = normalize_scores(&scored);
        assert!((result[0].2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_range() {
        let scored = vec![
            (0, "a".to_string(), 10.0),
            (1, "b".to_string(), 5.0),
            (2, "c".to_string(), 0.0),
        ];
        let result = normalize_scores(&scored);
        assert!((result[0].2 - 1.0).abs() < 1e-9);
        assert!((result[1].2 - 0.5).abs() < 1e-9);
        assert!((result[2].2 - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_alpha_zero_is_keyword_order() {
        let kw = vec![(0, "a".to_string(), 3.0), (1, "b".to_string(), 1.0)];
        let emb = vec![(0, "a".to_string(), 0.1), (1, "b".to_string(), 0.9)];

        let merged = rank(merge_channels(&kw, &emb, 0.0), 10);
        assert_eq!(merged, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_merge_alpha_one_is_embedding_order() {
        let kw = vec![(0, "a".to_string(), 3.0), (1, "b".to_string(), 1.0)];
        let emb = vec![(0, "a".to_string(), 0.1), (1, "b".to_string(), 0.9)];

        let merged = rank(merge_channels(&kw, &emb, 1.0), 10);
        assert_eq!(merged, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_merge_single_channel_candidate_scores_partial() {
        // "c" appears only in the embedding channel: keyword side is 0.
        let kw = vec![(0, "a".to_string(), 2.0)];
        let emb = vec![(0, "a".to_string(), 0.5), (2, "c".to_string(), 0.9)];

        let scored = merge_channels(&kw, &emb, 0.5);
        let c_score = scored.iter().find(|(_, id, _)| id == "c").unwrap().2;
        let a_score = scored.iter().find(|(_, id, _)| id == "a").unwrap().2;
        // a: 0.5 * 1.0 (kw, lone candidate) + 0.5 * 0.0 (emb min) = 0.5
        // c: 0.5 * 0.0 + 0.5 * 1.0 (emb max) = 0.5
        assert!((a_score - 0.5).abs() < 1e-9);
        assert!((c_score - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_build_retrievers_keyword_only() {
        let config_file = {
            use std::io::Write;
            let mut f = tempfile::NamedTempFile::new().unwrap();
            f.write_all(b"[index]\npath = \"x.json\"\n").unwrap();
            f
        };
        let config = crate::config::load_config(config_file.path()).unwrap();
        let rulebook = rulebook_with(vec![entry("aaa", "Combat", "Combat")]);

        let retrievers = build_retrievers(&config, &rulebook).await.unwrap();
        assert_eq!(retrievers.len(), 1);
        assert_eq!(retrievers[0].name(), "keyword");
    }
}
