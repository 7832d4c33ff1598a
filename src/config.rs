use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Where the chunked rulebook JSON is written and read back from.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_preview_chars() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_hybrid_alpha")]
    pub hybrid_alpha: f64,
    #[serde(default = "default_retrievers")]
    pub retrievers: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            hybrid_alpha: default_hybrid_alpha(),
            retrievers: default_retrievers(),
        }
    }
}

fn default_top_k() -> usize {
    10
}
fn default_hybrid_alpha() -> f64 {
    0.6
}
fn default_retrievers() -> Vec<String> {
    vec!["keyword".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: f64,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Default ground-truth fixture; `lore eval --questions` overrides it.
    #[serde(default)]
    pub questions: Option<PathBuf>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            failure_threshold: default_failure_threshold(),
            results_dir: default_results_dir(),
            questions: None,
        }
    }
}

fn default_failure_threshold() -> f64 {
    0.5
}
fn default_results_dir() -> PathBuf {
    PathBuf::from("./eval-runs")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the ollama provider (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            url: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.preview_chars == 0 {
        anyhow::bail!("chunking.preview_chars must be > 0");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.retrieval.hybrid_alpha) {
        anyhow::bail!("retrieval.hybrid_alpha must be in [0.0, 1.0]");
    }

    for name in &config.retrieval.retrievers {
        match name.as_str() {
            "keyword" | "embedding" | "hybrid" => {}
            other => anyhow::bail!(
                "Unknown retriever: '{}'. Must be keyword, embedding, or hybrid.",
                other
            ),
        }
    }

    // Validate evaluation
    if config.evaluation.top_k == 0 {
        anyhow::bail!("evaluation.top_k must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.evaluation.failure_threshold) {
        anyhow::bail!("evaluation.failure_threshold must be in [0.0, 1.0]");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    // The embedding and hybrid retrievers cannot score anything without a
    // provider; catch the misconfiguration at load time rather than at
    // retriever construction.
    let needs_embeddings = config
        .retrieval
        .retrievers
        .iter()
        .any(|r| r == "embedding" || r == "hybrid");
    if needs_embeddings && !config.embedding.is_enabled() {
        anyhow::bail!(
            "Retrievers {:?} require embeddings. Set [embedding] provider in config.",
            config.retrieval.retrievers
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config("[index]\npath = \"./data/rulebook.json\"\n");
        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.chunking.preview_chars, 100);
        assert_eq!(cfg.retrieval.top_k, 10);
        assert_eq!(cfg.retrieval.retrievers, vec!["keyword".to_string()]);
        assert!((cfg.evaluation.failure_threshold - 0.5).abs() < 1e-9);
        assert!(!cfg.embedding.is_enabled());
    }

    #[test]
    fn test_rejects_unknown_retriever() {
        let file =
            write_config("[index]\npath = \"x.json\"\n[retrieval]\nretrievers = [\"bm25\"]\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unknown retriever"));
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        let file = write_config("[index]\npath = \"x.json\"\n[retrieval]\nhybrid_alpha = 1.5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_embedding_retriever_requires_provider() {
        let file = write_config(
            "[index]\npath = \"x.json\"\n[retrieval]\nretrievers = [\"keyword\", \"embedding\"]\n",
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("require embeddings"));
    }

    #[test]
    fn test_enabled_embedding_requires_model_and_dims() {
        let file = write_config("[index]\npath = \"x.json\"\n[embedding]\nprovider = \"openai\"\n");
        assert!(load_config(file.path()).is_err());

        let file = write_config(
            "[index]\npath = \"x.json\"\n[embedding]\nprovider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 1536\n",
        );
        assert!(load_config(file.path()).is_ok());
    }
}
