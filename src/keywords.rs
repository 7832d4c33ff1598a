//! Title keyword extraction.
//!
//! Keywords are the sole search key for the flat section index: the full
//! lowercase title, every significant title word, and any recognized
//! domain term found in the title. There is no full-text channel.

/// Words too common to carry retrieval signal.
const STOP_WORDS: &[&str] = &[
    "the", "of", "and", "a", "an", "in", "on", "at", "to", "for", "with", "by",
];

/// Fixed game-rules vocabulary matched by substring against the lowercase
/// title. Multi-word terms ("saving throw") can only match this way, since
/// tokenization would split them.
const DOMAIN_TERMS: &[&str] = &[
    "race",
    "class",
    "spell",
    "ability",
    "skill",
    "feat",
    "equipment",
    "combat",
    "magic",
    "level",
    "proficiency",
    "saving throw",
    "hit points",
    "armor class",
    "initiative",
    "action",
    "bonus action",
    "reaction",
];

/// Extract the keyword set for a section title.
///
/// Includes the full lowercase title, alphanumeric word tokens of length
/// three or more that are not stop words, and every domain term the title
/// contains. Deduplicated and sorted so identical titles always produce
/// identical keyword lists.
pub fn extract_keywords(title: &str) -> Vec<String> {
    let lowered = title.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();

    if !lowered.trim().is_empty() {
        keywords.push(lowered.trim().to_string());
    }

    for token in lowered.split(|c: char| !c.is_alphanumeric()) {
        if token.len() < 3 || STOP_WORDS.contains(&token) {
            continue;
        }
        keywords.push(token.to_string());
    }

    for term in DOMAIN_TERMS {
        if lowered.contains(term) {
            keywords.push((*term).to_string());
        }
    }

    keywords.sort();
    keywords.dedup();
    keywords
}

/// True when two keyword lists share at least one keyword.
///
/// Both sides are assumed already lowercase (as produced by
/// [`extract_keywords`]); matching is exact per keyword.
pub fn keywords_intersect(a: &[String], b: &[String]) -> bool {
    a.iter().any(|k| b.contains(k))
}

/// Count of shared keywords, used as the keyword retriever's raw score.
pub fn overlap_count(a: &[String], b: &[String]) -> usize {
    a.iter().filter(|k| b.contains(*k)).count()
}
