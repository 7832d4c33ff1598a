//! # Lorebook
//!
//! A retrieval toolkit for tabletop RPG rulebooks.
//!
//! Lorebook parses markdown rulebooks into a hierarchical section tree,
//! builds a keyword index over it, and benchmarks retrieval strategies
//! (keyword, embedding, hybrid) against a ground-truth question set with
//! MRR and Recall@k.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Markdown   │──▶│   Chunker    │──▶│ Rulebook JSON │
//! │  rulebooks   │   │ headers+tree │   │ sections+index│
//! └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                              │
//!                         ┌────────────────────┤
//!                         ▼                    ▼
//!                   ┌──────────┐        ┌────────────┐
//!                   │   CLI    │        │ Evaluation  │
//!                   │  (lore)  │        │ MRR / R@k   │
//!                   └──────────┘        └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lore chunk ./rulebooks            # parse markdown into the index
//! lore outline ./rulebooks/phb.md   # preview the header hierarchy
//! lore search "dragonborn traits"   # keyword search the index
//! lore get a1b2c3d4                 # print a full section
//! lore eval --questions gt.json     # benchmark the retrievers
//! lore compare run-a.json run-b.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`headers`] | Markdown header extraction and nesting |
//! | [`keywords`] | Title keyword extraction |
//! | [`chunker`] | Section tree and index construction |
//! | [`ingest`] | Chunking pipeline and index persistence |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`retriever`] | Keyword, embedding, and hybrid retrievers |
//! | [`metrics`] | MRR and Recall@k |
//! | [`eval`] | Evaluation sweep, failure analysis, run persistence |

pub mod chunker;
pub mod config;
pub mod embedding;
pub mod eval;
pub mod get;
pub mod headers;
pub mod ingest;
pub mod keywords;
pub mod metrics;
pub mod models;
pub mod outline;
pub mod retriever;
pub mod search;
