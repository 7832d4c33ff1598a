//! Core data models used throughout Lorebook.
//!
//! These types represent the headers, sections, index entries, and
//! evaluation records that flow through the chunking and benchmarking
//! pipeline. Everything here is plain data: the section tree, the ground
//! truth, and evaluation runs are all persisted as JSON.

use serde::{Deserialize, Serialize};

/// One markdown heading occurrence, prior to content attachment.
///
/// Produced by `headers::extract_headers` during a single linear scan.
/// `parent_headers` and `full_path` are populated afterwards by
/// `headers::build_hierarchy_tree`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    /// Leading `#` run length. Not capped at 6: a 7-hash line is kept as
    /// level 7 rather than rejected.
    pub level: usize,
    /// Heading title with hashes, whitespace, and any `{#anchor}` removed.
    pub text: String,
    /// Explicit `{#anchor-id}` if the heading carried one. Content-hash IDs
    /// are assigned later by the chunker, not here.
    pub id: Option<String>,
    /// 1-based line number in the source document.
    pub line_number: usize,
    /// Ancestor titles, root first, nearest ancestor last.
    pub parent_headers: Vec<String>,
    /// `parent_headers` plus this header's own title.
    pub full_path: Vec<String>,
}

/// A tree node: one heading plus its body text and nested child sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Explicit anchor, or the first 8 hex chars of the title's SHA-256.
    pub id: String,
    pub level: usize,
    pub title: String,
    /// Body lines accumulated until the next equal-or-shallower heading,
    /// joined by newlines.
    pub content: String,
    /// Children in document order. A child's level is strictly greater
    /// than its parent's.
    pub subsections: Vec<Section>,
    pub metadata: SectionMetadata,
}

/// Per-section metadata computed during chunking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionMetadata {
    /// Sorted, deduplicated lowercase keywords: the full title, significant
    /// title words, and matched domain terms.
    pub keywords: Vec<String>,
    /// Slash-joined ancestor titles ("Races/Dragonborn").
    pub path: String,
    /// True iff at least one content line starts with `|`.
    pub has_tables: bool,
    /// True iff at least one content line starts with `-`, `*`, or `N.`.
    pub has_lists: bool,
    /// First 100 characters of the first content line, `...`-suffixed when
    /// truncated.
    pub content_preview: String,
    /// Generated one-line description, filled by the summary pass.
    pub summary: String,
}

/// Flat searchable projection of one [`Section`].
///
/// Appended to the rulebook's index exactly once, when the section is
/// opened. Keyword-set intersection against these entries is the only
/// search the index supports; there is no full-text channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub title: String,
    pub path: String,
    pub keywords: Vec<String>,
    pub level: usize,
}

/// A chunked document: the level-0 root sentinel.
///
/// Top-level sections carry whatever levels the document actually uses;
/// a `##` document with no `#` headings puts level-2 sections at the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rulebook {
    pub title: String,
    pub sections: Vec<Section>,
    pub index: Vec<IndexEntry>,
    pub total_sections: usize,
}

/// One ground-truth benchmark question.
///
/// Loaded once from a JSON fixture and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    /// Section IDs considered correct answers. Empty is tolerated but
    /// degenerate: every metric scores 0 for such a question.
    pub relevant_sections: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Per-(retriever, question) evaluation record.
///
/// Retains the query, expected and retrieved ID lists, and all derived
/// metrics so failure analysis works from persisted runs alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub question: String,
    #[serde(default)]
    pub category: Option<String>,
    pub expected: Vec<String>,
    pub retrieved: Vec<String>,
    pub mrr: f64,
    pub recall_at_1: f64,
    pub recall_at_3: f64,
    pub recall_at_5: f64,
    pub latency_ms: f64,
    /// True when `search` returned an error; the record scores 0 across
    /// the board and `retrieved` is empty.
    pub failed: bool,
}

/// Per-retriever aggregate: arithmetic mean of each metric over all
/// questions, plus the per-question records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverReport {
    pub retriever: String,
    pub mean_mrr: f64,
    pub mean_recall_at_1: f64,
    pub mean_recall_at_3: f64,
    pub mean_recall_at_5: f64,
    pub mean_latency_ms: f64,
    pub questions: Vec<QuestionResult>,
}

/// A persisted evaluation run. Fully serializable — no retriever object
/// references — so runs can be compared across invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRun {
    pub run_id: String,
    pub created_at: String,
    pub top_k: usize,
    pub reports: Vec<RetrieverReport>,
}
