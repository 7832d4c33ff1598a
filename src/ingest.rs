//! Chunking pipeline orchestration.
//!
//! Walks a markdown file or directory, parses each document into a section
//! tree, merges the results into a single [`Rulebook`], and writes it as
//! pretty-printed JSON to the configured index path. Every other command
//! reads that JSON back through [`load_rulebook`].

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::chunker;
use crate::config::Config;
use crate::models::Rulebook;

pub fn run_chunk(config: &Config, path: &Path, dry_run: bool) -> Result<()> {
    let files = collect_markdown_files(path)?;
    if files.is_empty() {
        bail!("No markdown files found under {}", path.display());
    }

    let mut rulebooks = Vec::with_capacity(files.len());
    for file in &files {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let title = document_title(file);
        rulebooks.push(chunker::parse_markdown(
            &content,
            &title,
            config.chunking.preview_chars,
        ));
    }

    let combined = merge_rulebooks(rulebooks, path);

    if dry_run {
        println!("chunk {} (dry-run)", path.display());
        println!("  files parsed: {}", files.len());
        println!("  sections: {}", combined.total_sections);
        println!("  index entries: {}", combined.index.len());
        return Ok(());
    }

    if let Some(parent) = config.index.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create index dir: {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(&combined)?;
    std::fs::write(&config.index.path, json)
        .with_context(|| format!("Failed to write index: {}", config.index.path.display()))?;

    println!("chunk {}", path.display());
    println!("  files parsed: {}", files.len());
    println!("  sections: {}", combined.total_sections);
    println!("  index entries: {}", combined.index.len());
    println!("  index written: {}", config.index.path.display());
    println!("ok");

    Ok(())
}

/// Read the stored rulebook JSON back for search, get, and eval.
pub fn load_rulebook(path: &Path) -> Result<Rulebook> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read index {}. Run `lore chunk` first.",
            path.display()
        )
    })?;

    let rulebook: Rulebook = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse index: {}", path.display()))?;

    Ok(rulebook)
}

/// A single `.md` file, or every `.md` file under a directory in sorted
/// path order so repeat runs produce the same section ordering.
fn collect_markdown_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        bail!("Path does not exist: {}", path.display());
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().map(|ext| ext == "md").unwrap_or(false))
        .collect();

    files.sort();
    Ok(files)
}

fn document_title(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Concatenate per-file trees into one rulebook. Section IDs are title
/// hashes, so identical titles across files collide into the same ID;
/// the index keeps both entries and search returns whichever ranks first.
fn merge_rulebooks(mut rulebooks: Vec<Rulebook>, source: &Path) -> Rulebook {
    if rulebooks.len() == 1 {
        return rulebooks.remove(0);
    }

    let mut combined = Rulebook {
        title: document_title(source),
        sections: Vec::new(),
        index: Vec::new(),
        total_sections: 0,
    };

    for rulebook in rulebooks {
        combined.total_sections += rulebook.total_sections;
        combined.sections.extend(rulebook.sections);
        combined.index.extend(rulebook.index);
    }

    combined
}
