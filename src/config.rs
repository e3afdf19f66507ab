//! TOML configuration.
//!
//! Every section is optional; omitted values fall back to the defaults
//! below. A handful of environment variables override the file so the
//! same config can be reused across machines:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `DOCINTEL_PERSIST_DIRECTORY` | `store.persist_directory` |
//! | `CHROMA_PERSIST_DIRECTORY` | `store.persist_directory` (legacy name) |
//! | `DOCINTEL_BIND` | `server.bind` |
//!
//! Credentials (`OPENAI_API_KEY`, `OPENAI_BASE_URL`) are read by the
//! providers themselves, never stored in the config.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use docintel_core::chunk::TextSplitter;
use docintel_core::error::RagError;
use docintel_core::rag::RetrievalSettings;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/docintel.toml";

/// SQLite file name inside the persistence directory.
pub const DB_FILE_NAME: &str = "docintel.sqlite";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_persist_directory")]
    pub persist_directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
        }
    }
}

fn default_persist_directory() -> PathBuf {
    PathBuf::from("./docintel_db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub similarity_threshold: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            similarity_threshold: None,
        }
    }
}

fn default_top_k() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default = "default_embedding_model")]
    pub model: Option<String>,
    #[serde(default = "default_embedding_dims")]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dims: default_embedding_dims(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
            url: None,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> Option<String> {
    Some("text-embedding-ada-002".to_string())
}
fn default_embedding_dims() -> Option<usize> {
    Some(1536)
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    2
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            timeout_secs: default_llm_timeout(),
            url: None,
        }
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}
fn default_llm_model() -> String {
    "gpt-4".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_llm_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    #[serde(default = "default_dashboard_dir")]
    pub output_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            output_dir: default_dashboard_dir(),
        }
    }
}

fn default_dashboard_dir() -> PathBuf {
    PathBuf::from("dashboards")
}

impl Config {
    /// Path of the SQLite database inside the persistence directory.
    pub fn db_path(&self) -> PathBuf {
        self.store.persist_directory.join(DB_FILE_NAME)
    }

    pub fn splitter(&self) -> TextSplitter {
        TextSplitter::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
    }

    pub fn retrieval_settings(&self) -> RetrievalSettings {
        RetrievalSettings {
            top_k: self.retrieval.top_k,
            similarity_threshold: self.retrieval.similarity_threshold,
        }
    }
}

/// Read, override and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

/// Resolve the config for the CLI.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// used if present, otherwise built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let fallback = Path::new(DEFAULT_CONFIG_PATH);
    if fallback.exists() {
        return load_config(fallback);
    }
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    let persist = std::env::var("DOCINTEL_PERSIST_DIRECTORY")
        .or_else(|_| std::env::var("CHROMA_PERSIST_DIRECTORY"));
    if let Ok(dir) = persist {
        if !dir.trim().is_empty() {
            config.store.persist_directory = PathBuf::from(dir);
        }
    }
    if let Ok(bind) = std::env::var("DOCINTEL_BIND") {
        if !bind.trim().is_empty() {
            config.server.bind = bind;
        }
    }
}

pub fn validate(config: &Config) -> Result<()> {
    // Chunking
    if config.chunking.chunk_size == 0 {
        bail!(RagError::config("chunking.chunk_size must be > 0"));
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        bail!(RagError::config(format!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap, config.chunking.chunk_size
        )));
    }

    // Retrieval
    if config.retrieval.top_k < 1 {
        bail!(RagError::config("retrieval.top_k must be >= 1"));
    }
    if let Some(t) = config.retrieval.similarity_threshold {
        if !(-1.0..=1.0).contains(&t) {
            bail!(RagError::config(
                "retrieval.similarity_threshold must be in [-1.0, 1.0]"
            ));
        }
    }

    // Embedding
    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "hash" | "local" => {}
        other => bail!(RagError::config(format!(
            "Unknown embedding provider: '{}'. Must be openai, ollama, hash, local, or disabled.",
            other
        ))),
    }
    if config.embedding.is_enabled() && config.embedding.provider != "local" {
        if config.embedding.dims.unwrap_or(0) == 0 {
            bail!(RagError::config(format!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            )));
        }
        if config.embedding.model.is_none() {
            bail!(RagError::config(format!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            )));
        }
    }
    if config.embedding.batch_size == 0 {
        bail!(RagError::config("embedding.batch_size must be > 0"));
    }

    // LLM
    match config.llm.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => bail!(RagError::config(format!(
            "Unknown llm provider: '{}'. Must be openai, ollama, or disabled.",
            other
        ))),
    }
    if !(0.0..=2.0).contains(&config.llm.temperature) {
        bail!(RagError::config("llm.temperature must be in [0.0, 2.0]"));
    }

    // Server
    if config.server.max_upload_bytes == 0 {
        bail!(RagError::config("server.max_upload_bytes must be > 0"));
    }

    Ok(())
}
