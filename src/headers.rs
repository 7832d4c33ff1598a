//! Markdown hierarchy parser.
//!
//! Extracts every heading from a markdown document in a single linear
//! scan, then derives each heading's ancestor chain with an explicit
//! stack. The parser never fails on a malformed heading line: the line is
//! reported on stderr and skipped, and processing continues.
//!
//! Heading levels are the raw leading-`#` run length and are deliberately
//! not capped at 6; a seven-hash line comes back as level 7.

use crate::models::Header;

/// Extract all headers from a markdown document, in document order.
///
/// A line is a header iff its whitespace-trimmed form starts with `#`.
/// An explicit `{#anchor-id}` anywhere in the title is pulled out into
/// [`Header::id`] and removed from the text; headers without an anchor
/// leave `id` unset (the chunker assigns content-hash IDs later).
pub fn extract_headers(content: &str) -> Vec<Header> {
    let mut headers = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if !trimmed.starts_with('#') {
            continue;
        }

        match parse_header_line(trimmed) {
            Some((level, text, id)) => {
                headers.push(Header {
                    level,
                    text,
                    id,
                    line_number: i + 1,
                    parent_headers: Vec::new(),
                    full_path: Vec::new(),
                });
            }
            None => {
                eprintln!("warning: skipping malformed header at line {}: {}", i + 1, trimmed);
            }
        }
    }

    headers
}

/// Parse a trimmed header line into (level, title, explicit anchor).
///
/// Returns `None` for degenerate lines: a bare hash run with no title
/// text at all (`###`), which carries nothing worth indexing.
pub fn parse_header_line(trimmed: &str) -> Option<(usize, String, Option<String>)> {
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    // A closing hash run ("## Title ##") is decoration, not title text.
    let rest = trimmed[level..].trim().trim_end_matches('#').trim_end();

    let (text, id) = extract_anchor(rest);
    if text.is_empty() && id.is_none() {
        return None;
    }

    Some((level, text, id))
}

/// Split an explicit `{#anchor-id}` out of a heading title.
///
/// The anchor may appear anywhere in the text; whatever surrounds it is
/// re-joined and re-trimmed. Text without a well-formed `{#...}` marker is
/// returned untouched.
pub fn extract_anchor(text: &str) -> (String, Option<String>) {
    let Some(start) = text.find("{#") else {
        return (text.trim().to_string(), None);
    };
    let Some(rel_end) = text[start..].find('}') else {
        return (text.trim().to_string(), None);
    };
    let end = start + rel_end;

    let anchor = text[start + 2..end].trim();
    if anchor.is_empty() {
        return (text.trim().to_string(), None);
    }

    let mut remainder = String::new();
    remainder.push_str(&text[..start]);
    remainder.push_str(&text[end + 1..]);

    (remainder.trim().to_string(), Some(anchor.to_string()))
}

/// Populate `parent_headers` and `full_path` for a header sequence.
///
/// Maintains a stack of not-yet-closed headers. An incoming header pops
/// everything with `level >= incoming.level`, so two consecutive headings
/// at the same level are siblings, never nested. The surviving stack
/// titles, root first, become the parent chain. Single forward pass; a
/// header is never revisited once closed.
pub fn build_hierarchy_tree(headers: &mut [Header]) {
    // Stack holds (level, title) of open headers.
    let mut stack: Vec<(usize, String)> = Vec::new();

    for header in headers.iter_mut() {
        while let Some((top_level, _)) = stack.last() {
            if *top_level >= header.level {
                stack.pop();
            } else {
                break;
            }
        }

        header.parent_headers = stack.iter().map(|(_, title)| title.clone()).collect();
        header.full_path = header.parent_headers.clone();
        header.full_path.push(header.text.clone());

        stack.push((header.level, header.text.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_every_header_in_order() {
        let md = "# One\n\ntext\n\n## Two\nmore text\n### Three\n";
        let headers = extract_headers(md);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0].text, "One");
        assert_eq!(headers[1].text, "Two");
        assert_eq!(headers[2].text, "Three");
        assert_eq!(headers[0].level, 1);
        assert_eq!(headers[1].level, 2);
        assert_eq!(headers[2].level, 3);
    }

    #[test]
    fn test_line_numbers_are_one_based() {
        let md = "intro\n# First\n\n## Second";
        let headers = extract_headers(md);
        assert_eq!(headers[0].line_number, 2);
        assert_eq!(headers[1].line_number, 4);
    }

    #[test]
    fn test_level_seven_is_preserved() {
        let headers = extract_headers("####### Deep");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].level, 7);
        assert_eq!(headers[0].text, "Deep");
    }

    #[test]
    fn test_leading_whitespace_is_tolerated() {
        let headers = extract_headers("   ## Indented Heading   ");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].level, 2);
        assert_eq!(headers[0].text, "Indented Heading");
    }

    #[test]
    fn test_closing_hashes_are_stripped() {
        let headers = extract_headers("## Spells ##\n### Cantrips ######");
        assert_eq!(headers[0].text, "Spells");
        assert_eq!(headers[0].level, 2);
        assert_eq!(headers[1].text, "Cantrips");
        assert_eq!(headers[1].level, 3);
    }

    #[test]
    fn test_bare_hash_run_is_skipped() {
        let headers = extract_headers("###\n# Real");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].text, "Real");
    }

    #[test]
    fn test_explicit_anchor_is_extracted_and_removed() {
        let headers = extract_headers("## Dragonborn {#race-dragonborn}");
        assert_eq!(headers[0].text, "Dragonborn");
        assert_eq!(headers[0].id.as_deref(), Some("race-dragonborn"));
    }

    #[test]
    fn test_anchor_mid_text() {
        let (text, id) = extract_anchor("Spells {#spells} by Level");
        assert_eq!(text, "Spells  by Level");
        assert_eq!(id.as_deref(), Some("spells"));
    }

    #[test]
    fn test_unclosed_anchor_is_left_in_text() {
        let (text, id) = extract_anchor("Broken {#oops");
        assert_eq!(text, "Broken {#oops");
        assert!(id.is_none());
    }

    #[test]
    fn test_no_anchor_means_no_id() {
        let headers = extract_headers("# Plain Title");
        assert!(headers[0].id.is_none());
    }

    #[test]
    fn test_hierarchy_full_paths() {
        let md = "# Races\n## Dragonborn\n### Traits\n## Dwarf\n# Classes";
        let mut headers = extract_headers(md);
        build_hierarchy_tree(&mut headers);

        assert_eq!(headers[0].full_path, vec!["Races"]);
        assert_eq!(headers[1].full_path, vec!["Races", "Dragonborn"]);
        assert_eq!(headers[2].full_path, vec!["Races", "Dragonborn", "Traits"]);
        assert_eq!(headers[3].full_path, vec!["Races", "Dwarf"]);
        assert_eq!(headers[4].full_path, vec!["Classes"]);
    }

    #[test]
    fn test_consecutive_same_level_headers_are_siblings() {
        let md = "# Top\n## B\n## C";
        let mut headers = extract_headers(md);
        build_hierarchy_tree(&mut headers);

        assert_eq!(headers[1].parent_headers, vec!["Top"]);
        assert_eq!(headers[2].parent_headers, vec!["Top"]);
        assert!(!headers[2].parent_headers.contains(&"B".to_string()));
    }

    #[test]
    fn test_shallower_header_closes_deeper_ones() {
        let md = "# A\n### Deep\n## Mid";
        let mut headers = extract_headers(md);
        build_hierarchy_tree(&mut headers);

        // "Mid" (level 2) closes "Deep" (level 3), nesting under "A" only.
        assert_eq!(headers[2].parent_headers, vec!["A"]);
    }

    #[test]
    fn test_document_starting_below_level_one() {
        let md = "## Orphan\n### Child";
        let mut headers = extract_headers(md);
        build_hierarchy_tree(&mut headers);

        assert!(headers[0].parent_headers.is_empty());
        assert_eq!(headers[1].parent_headers, vec!["Orphan"]);
    }

    #[test]
    fn test_path_length_equals_nesting_depth() {
        let md = "# A\n## B\n### C\n#### D";
        let mut headers = extract_headers(md);
        build_hierarchy_tree(&mut headers);

        for (depth, header) in headers.iter().enumerate() {
            assert_eq!(header.full_path.len(), depth + 1);
        }
    }
}
