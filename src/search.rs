//! Keyword search over the stored index.
//!
//! The `lore search` command: load the rulebook JSON, score every index
//! entry by keyword overlap with the query, and print a ranked listing.
//! This is the keyword retriever's scoring exposed interactively; the
//! evaluation sweep uses the same overlap counting through the retriever.

use anyhow::Result;

use crate::chunker;
use crate::config::Config;
use crate::ingest;
use crate::keywords::{extract_keywords, overlap_count};

pub fn run_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let rulebook = ingest::load_rulebook(&config.index.path)?;
    let query_keywords = extract_keywords(query);
    let limit = limit.unwrap_or(config.retrieval.top_k);

    let mut matches: Vec<(usize, &crate::models::IndexEntry)> =
        chunker::search_index(&rulebook, query)
            .into_iter()
            .map(|entry| (overlap_count(&query_keywords, &entry.keywords), entry))
            .collect();

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    // Stable sort keeps document order for equal scores.
    matches.sort_by(|a, b| b.0.cmp(&a.0));
    matches.truncate(limit);

    for (i, (overlap, entry)) in matches.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, overlap, entry.title);
        println!("    path: {}", entry.path);
        println!("    id: {}", entry.id);
        println!();
    }

    Ok(())
}
