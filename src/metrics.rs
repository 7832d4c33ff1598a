//! Ranking-quality metrics.
//!
//! Pure functions over a ranked list of retrieved section IDs and the
//! ground-truth relevant set. Both metrics are recomputed from the two
//! lists every time; nothing here is cached or stored.

/// Reciprocal rank of the first relevant ID in the retrieved list.
///
/// Rank counting starts at 1 for the first returned item. Returns 0.0
/// when no retrieved ID is relevant; there is no partial credit.
pub fn reciprocal_rank(retrieved: &[String], relevant: &[String]) -> f64 {
    for (i, id) in retrieved.iter().enumerate() {
        if relevant.contains(id) {
            return 1.0 / (i as f64 + 1.0);
        }
    }
    0.0
}

/// Fraction of relevant IDs present among the top-k retrieved items.
///
/// An empty relevant set scores 0.0 by convention rather than dividing by
/// zero. Duplicate IDs in the retrieved list count once: the measure is
/// set intersection over the top-k window.
pub fn recall_at_k(retrieved: &[String], relevant: &[String], k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }

    let top_k = &retrieved[..retrieved.len().min(k)];
    let hits = relevant.iter().filter(|id| top_k.contains(id)).count();
    hits as f64 / relevant.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_worked_example() {
        // relevant = {x, y}, retrieved = [z, x, q, q, y] at top_k = 5.
        let relevant = ids(&["x", "y"]);
        let retrieved = ids(&["z", "x", "q", "q", "y"]);

        assert!((reciprocal_rank(&retrieved, &relevant) - 0.5).abs() < 1e-9);
        assert!((recall_at_k(&retrieved, &relevant, 1) - 0.0).abs() < 1e-9);
        assert!((recall_at_k(&retrieved, &relevant, 3) - 0.5).abs() < 1e-9);
        assert!((recall_at_k(&retrieved, &relevant, 5) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_position_hit() {
        let relevant = ids(&["a"]);
        let retrieved = ids(&["a", "b"]);
        assert!((reciprocal_rank(&retrieved, &relevant) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_hit_scores_zero() {
        let relevant = ids(&["a"]);
        let retrieved = ids(&["b", "c"]);
        assert_eq!(reciprocal_rank(&retrieved, &relevant), 0.0);
        assert_eq!(recall_at_k(&retrieved, &relevant, 5), 0.0);
    }

    #[test]
    fn test_empty_relevant_set_never_divides() {
        let relevant: Vec<String> = Vec::new();
        let retrieved = ids(&["a", "b"]);
        assert_eq!(reciprocal_rank(&retrieved, &relevant), 0.0);
        assert_eq!(recall_at_k(&retrieved, &relevant, 1), 0.0);
        assert_eq!(recall_at_k(&retrieved, &relevant, 5), 0.0);
    }

    #[test]
    fn test_empty_retrieved_list() {
        let relevant = ids(&["a"]);
        let retrieved: Vec<String> = Vec::new();
        assert_eq!(reciprocal_rank(&retrieved, &relevant), 0.0);
        assert_eq!(recall_at_k(&retrieved, &relevant, 3), 0.0);
    }

    #[test]
    fn test_k_larger_than_retrieved_len() {
        let relevant = ids(&["a", "b"]);
        let retrieved = ids(&["a"]);
        assert!((recall_at_k(&retrieved, &relevant, 10) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_retrieved_ids_count_once() {
        let relevant = ids(&["a", "b"]);
        let retrieved = ids(&["a", "a", "a"]);
        assert!((recall_at_k(&retrieved, &relevant, 3) - 0.5).abs() < 1e-9);
    }
}
