//! Retrieval evaluation sweep.
//!
//! Runs every configured retriever over a ground-truth question set,
//! computes MRR and Recall@k per question, aggregates per retriever, and
//! persists the whole run as JSON so later `compare` invocations can line
//! runs up against each other.
//!
//! The sweep is strictly sequential in fixture order; identical retriever
//! output over identical ground truth produces identical aggregates.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::ingest;
use crate::metrics::{recall_at_k, reciprocal_rank};
use crate::models::{EvalRun, Question, QuestionResult, RetrieverReport};
use crate::retriever::{self, Retriever};

/// Load the ground-truth question fixture.
pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read questions file: {}", path.display()))?;

    let questions: Vec<Question> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse questions file: {}", path.display()))?;

    if questions.is_empty() {
        bail!("Questions file is empty: {}", path.display());
    }

    Ok(questions)
}

/// Sweep one retriever over all questions, in fixture order.
///
/// A `search` error becomes a failed, zero-scoring record and the sweep
/// continues; the error itself goes to stderr.
pub async fn evaluate_retriever(
    retriever: &dyn Retriever,
    questions: &[Question],
    top_k: usize,
) -> RetrieverReport {
    let mut results = Vec::with_capacity(questions.len());

    for question in questions {
        let start = Instant::now();
        let outcome = retriever.search(&question.question, top_k).await;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let result = match outcome {
            Ok(retrieved) => QuestionResult {
                question_id: question.id.clone(),
                question: question.question.clone(),
                category: question.category.clone(),
                expected: question.relevant_sections.clone(),
                mrr: reciprocal_rank(&retrieved, &question.relevant_sections),
                recall_at_1: recall_at_k(&retrieved, &question.relevant_sections, 1),
                recall_at_3: recall_at_k(&retrieved, &question.relevant_sections, 3),
                recall_at_5: recall_at_k(&retrieved, &question.relevant_sections, 5),
                retrieved,
                latency_ms,
                failed: false,
            },
            Err(e) => {
                eprintln!(
                    "Warning: {} search failed for question {}: {}",
                    retriever.name(),
                    question.id,
                    e
                );
                QuestionResult {
                    question_id: question.id.clone(),
                    question: question.question.clone(),
                    category: question.category.clone(),
                    expected: question.relevant_sections.clone(),
                    retrieved: Vec::new(),
                    mrr: 0.0,
                    recall_at_1: 0.0,
                    recall_at_3: 0.0,
                    recall_at_5: 0.0,
                    latency_ms,
                    failed: true,
                }
            }
        };
        results.push(result);
    }

    RetrieverReport {
        retriever: retriever.name().to_string(),
        mean_mrr: mean(results.iter().map(|r| r.mrr)),
        mean_recall_at_1: mean(results.iter().map(|r| r.recall_at_1)),
        mean_recall_at_3: mean(results.iter().map(|r| r.recall_at_3)),
        mean_recall_at_5: mean(results.iter().map(|r| r.recall_at_5)),
        mean_latency_ms: mean(results.iter().map(|r| r.latency_ms)),
        questions: results,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    collected.iter().sum::<f64>() / collected.len() as f64
}

// ============ eval command ============

pub async fn run_eval(
    config: &Config,
    questions_path: Option<PathBuf>,
    top_k: Option<usize>,
    failures_below: Option<f64>,
) -> Result<()> {
    let questions_path = questions_path
        .or_else(|| config.evaluation.questions.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No questions file. Pass --questions or set evaluation.questions.")
        })?;

    let rulebook = ingest::load_rulebook(&config.index.path)?;
    let questions = load_questions(&questions_path)?;
    let top_k = top_k.unwrap_or(config.evaluation.top_k);
    let threshold = failures_below.unwrap_or(config.evaluation.failure_threshold);

    let retrievers = retriever::build_retrievers(config, &rulebook).await?;

    let mut reports = Vec::with_capacity(retrievers.len());
    for retriever in &retrievers {
        reports.push(evaluate_retriever(retriever.as_ref(), &questions, top_k).await);
    }

    // Best retriever first; stable sort keeps config order on exact ties.
    reports.sort_by(|a, b| {
        b.mean_mrr
            .partial_cmp(&a.mean_mrr)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    println!(
        "Retrieval evaluation — {} questions, top_k = {}",
        questions.len(),
        top_k
    );
    println!();
    print_report_table(&reports);
    print_failures(&reports, threshold);

    let run = EvalRun {
        run_id: uuid::Uuid::new_v4().to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
        top_k,
        reports,
    };

    let run_path = persist_run(&config.evaluation.results_dir, &run)?;
    println!();
    println!("  run saved: {}", run_path.display());
    println!("ok");

    Ok(())
}

fn print_report_table(reports: &[RetrieverReport]) {
    println!(
        "  {:<12} {:>8} {:>8} {:>8} {:>8} {:>12}",
        "retriever", "MRR", "R@1", "R@3", "R@5", "latency(ms)"
    );
    println!("  {}", "-".repeat(62));
    for report in reports {
        println!(
            "  {:<12} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>12.1}",
            report.retriever,
            report.mean_mrr,
            report.mean_recall_at_1,
            report.mean_recall_at_3,
            report.mean_recall_at_5,
            report.mean_latency_ms
        );
    }
}

/// Print every question whose recall@5 fell below the threshold, with the
/// expected IDs the retriever never returned. Ground-truth IDs that do not
/// exist in the index show up here as misses, not as errors.
fn print_failures(reports: &[RetrieverReport], threshold: f64) {
    println!();
    println!("Failures (recall@5 < {:.2}):", threshold);

    let mut any = false;
    for report in reports {
        for result in &report.questions {
            if result.recall_at_5 >= threshold {
                continue;
            }
            any = true;

            let missing: Vec<&str> = result
                .expected
                .iter()
                .filter(|id| !result.retrieved.contains(id))
                .map(|id| id.as_str())
                .collect();

            let status = if result.failed { " (search error)" } else { "" };
            println!(
                "  [{}] {} — {}{}",
                report.retriever, result.question_id, result.question, status
            );
            println!("    missing: {}", missing.join(", "));
        }
    }

    if !any {
        println!("  none");
    }
}

fn persist_run(results_dir: &Path, run: &EvalRun) -> Result<PathBuf> {
    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("Failed to create results dir: {}", results_dir.display()))?;

    let path = results_dir.join(format!("run-{}.json", run.run_id));
    let json = serde_json::to_string_pretty(run)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write eval run: {}", path.display()))?;

    Ok(path)
}

// ============ compare command ============

/// Print an aggregate table across two or more persisted runs.
pub fn run_compare(paths: &[PathBuf]) -> Result<()> {
    if paths.len() < 2 {
        bail!("compare needs at least two run files");
    }

    let mut runs = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read eval run: {}", path.display()))?;
        let run: EvalRun = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse eval run: {}", path.display()))?;
        runs.push(run);
    }

    println!("Comparing {} runs", runs.len());
    println!();
    println!(
        "  {:<10} {:<20} {:<12} {:>8} {:>8} {:>8} {:>8}",
        "run", "created", "retriever", "MRR", "R@1", "R@3", "R@5"
    );
    println!("  {}", "-".repeat(80));

    for run in &runs {
        let short_id = run.run_id.chars().take(8).collect::<String>();
        let created = run.created_at.chars().take(19).collect::<String>();
        for report in &run.reports {
            println!(
                "  {:<10} {:<20} {:<12} {:>8.3} {:>8.3} {:>8.3} {:>8.3}",
                short_id,
                created,
                report.retriever,
                report.mean_mrr,
                report.mean_recall_at_1,
                report.mean_recall_at_3,
                report.mean_recall_at_5
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::io::Write;

    /// Returns a canned ID list per query; errors on queries it has no
    /// entry for.
    struct StubRetriever {
        answers: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        fn name(&self) -> &str {
            "stub"
        }

        async fn search(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
            match self.answers.get(query) {
                Some(ids) => Ok(ids.iter().take(top_k).cloned().collect()),
                None => bail!("no canned answer"),
            }
        }
    }

    fn question(id: &str, text: &str, relevant: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            question: text.to_string(),
            relevant_sections: relevant.iter().map(|s| s.to_string()).collect(),
            category: None,
        }
    }

    #[tokio::test]
    async fn test_sweep_scores_and_aggregates() {
        let mut answers = HashMap::new();
        answers.insert("q one".to_string(), vec!["a".to_string(), "b".to_string()]);
        answers.insert("q two".to_string(), vec!["x".to_string(), "c".to_string()]);
        let retriever = StubRetriever { answers };

        let questions = vec![
            question("q1", "q one", &["a"]),
            question("q2", "q two", &["c"]),
        ];

        let report = evaluate_retriever(&retriever, &questions, 5).await;
        assert_eq!(report.questions.len(), 2);
        // q1: hit at rank 1 => mrr 1.0; q2: hit at rank 2 => mrr 0.5.
        assert!((report.mean_mrr - 0.75).abs() < 1e-9);
        assert!((report.questions[0].recall_at_1 - 1.0).abs() < 1e-9);
        assert!((report.questions[1].recall_at_1 - 0.0).abs() < 1e-9);
        assert!((report.questions[1].recall_at_3 - 1.0).abs() < 1e-9);
        assert!(!report.questions[0].failed);
    }

    #[tokio::test]
    async fn test_search_error_becomes_failed_zero_record() {
        let retriever = StubRetriever {
            answers: HashMap::new(),
        };
        let questions = vec![question("q1", "anything", &["a"])];

        let report = evaluate_retriever(&retriever, &questions, 5).await;
        let result = &report.questions[0];
        assert!(result.failed);
        assert!(result.retrieved.is_empty());
        assert_eq!(result.mrr, 0.0);
        assert_eq!(result.recall_at_5, 0.0);
        assert_eq!(report.mean_mrr, 0.0);
    }

    #[tokio::test]
    async fn test_sweep_preserves_fixture_order() {
        let mut answers = HashMap::new();
        answers.insert("first".to_string(), Vec::new());
        answers.insert("second".to_string(), Vec::new());
        let retriever = StubRetriever { answers };

        let questions = vec![
            question("q1", "first", &[]),
            question("q2", "second", &[]),
        ];

        let report = evaluate_retriever(&retriever, &questions, 5).await;
        let order: Vec<&str> = report
            .questions
            .iter()
            .map(|r| r.question_id.as_str())
            .collect();
        assert_eq!(order, vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn test_deterministic_aggregates() {
        let mut answers = HashMap::new();
        answers.insert("q".to_string(), vec!["a".to_string(), "b".to_string()]);
        let retriever = StubRetriever { answers };
        let questions = vec![question("q1", "q", &["b"])];

        let first = evaluate_retriever(&retriever, &questions, 5).await;
        let second = evaluate_retriever(&retriever, &questions, 5).await;
        assert_eq!(first.mean_mrr, second.mean_mrr);
        assert_eq!(first.mean_recall_at_5, second.mean_recall_at_5);
    }

    #[test]
    fn test_load_questions_rejects_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();
        let err = load_questions(file.path()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_load_questions_parses_fixture() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[{"id": "q1", "question": "What is a dragonborn?", "relevant_sections": ["abc12345"], "category": "races"}]"#,
        )
        .unwrap();
        let questions = load_questions(file.path()).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "q1");
        assert_eq!(questions[0].category.as_deref(), Some("races"));
    }

    #[test]
    fn test_compare_requires_two_runs() {
        let err = run_compare(&[PathBuf::from("one.json")]).unwrap_err();
        assert!(err.to_string().contains("at least two"));
    }
}
