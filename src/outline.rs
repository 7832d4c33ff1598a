//! Header hierarchy display.
//!
//! The `lore outline` command: parse a markdown file's headings and print
//! them indented by nesting depth, with the slash-joined path each one
//! resolves to. Useful for eyeballing how a document will chunk before
//! running `lore chunk`.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::headers;

pub fn run_outline(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut headers = headers::extract_headers(&content);
    if headers.is_empty() {
        bail!("No headers found in {}", path.display());
    }
    headers::build_hierarchy_tree(&mut headers);

    for header in &headers {
        // Depth comes from resolved nesting, not the raw hash count, so a
        // document that jumps from # to #### still indents one step.
        let depth = header.full_path.len().saturating_sub(1);
        println!(
            "{}{} (line {}, {})",
            "  ".repeat(depth),
            header.text,
            header.line_number,
            header.full_path.join("/")
        );
    }

    println!();
    println!("{} headers", headers.len());

    Ok(())
}
