//! Section retrieval by ID.
//!
//! The `lore get` command: look up one or more sections in the stored
//! rulebook by their 8-hex (or anchor) IDs and print the full record.
//! Unknown IDs are reported individually; the command still succeeds for
//! the IDs it found.

use anyhow::{bail, Result};

use crate::chunker;
use crate::config::Config;
use crate::ingest;
use crate::models::Section;

pub fn run_get(config: &Config, ids: &[String]) -> Result<()> {
    if ids.is_empty() {
        bail!("No section IDs given");
    }

    let rulebook = ingest::load_rulebook(&config.index.path)?;
    let sections = chunker::sections_by_ids(&rulebook, ids);

    for id in ids {
        if !sections.iter().any(|s| &s.id == id) {
            eprintln!("Warning: section not found: {}", id);
        }
    }

    if sections.is_empty() {
        bail!("No matching sections");
    }

    for section in &sections {
        print_section(section);
    }

    Ok(())
}

fn print_section(section: &Section) {
    println!("--- Section ---");
    println!("id:       {}", section.id);
    println!("title:    {}", section.title);
    println!("level:    {}", section.level);
    println!("path:     {}", section.metadata.path);
    println!("summary:  {}", section.metadata.summary);
    println!("keywords: {}", section.metadata.keywords.join(", "));
    println!(
        "tables: {}  lists: {}  subsections: {}",
        section.metadata.has_tables,
        section.metadata.has_lists,
        section.subsections.len()
    );
    println!();

    if section.content.is_empty() {
        println!("(no body content)");
    } else {
        println!("{}", section.content);
    }
    println!();
}
