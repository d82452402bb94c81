//! Application configuration for KeywordScout.
//!
//! User config lives at `~/.keywordscout/keywordscout.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KeywordScoutError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "keywordscout.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".keywordscout";

/// Default database file name inside the config directory.
const DB_FILE_NAME: &str = "keywordscout.db";

// ---------------------------------------------------------------------------
// Config structs (matching keywordscout.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings (chat model for seeds + relevance).
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// OpenAI settings (embedding model).
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Research pipeline tuning knobs.
    #[serde(default)]
    pub research: ResearchConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Database path. `~` expands to the user's home directory.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Maximum number of keywords persisted per research run.
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Politeness delay between per-seed expansion fetches, in milliseconds.
    #[serde(default = "default_expansion_delay_ms")]
    pub expansion_delay_ms: u64,

    /// Number of seed keywords to generate when none are supplied.
    #[serde(default = "default_seed_count")]
    pub seed_count: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_keywords: default_max_keywords(),
            expansion_delay_ms: default_expansion_delay_ms(),
            seed_count: default_seed_count(),
        }
    }
}

fn default_db_path() -> String {
    format!("~/{CONFIG_DIR_NAME}/{DB_FILE_NAME}")
}
fn default_max_keywords() -> usize {
    30
}
fn default_expansion_delay_ms() -> u64 {
    1000
}
fn default_seed_count() -> usize {
    5
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_openrouter_key_env")]
    pub api_key_env: String,

    /// Chat model used for seed generation and relevance classification.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openrouter_key_env(),
            chat_model: default_chat_model(),
        }
    }
}

fn default_openrouter_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_chat_model() -> String {
    "moonshotai/kimi-k2.5".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding vector dimensionality.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_embedding_dim() -> usize {
    1536
}

/// `[research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Cosine similarity threshold for merging keyword clusters.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum members per cluster.
    #[serde(default = "default_max_cluster_size")]
    pub max_cluster_size: usize,

    /// Iteration cap for the cluster merge loop.
    #[serde(default = "default_max_merge_passes")]
    pub max_merge_passes: usize,

    /// Candidates per relevance-classification request.
    #[serde(default = "default_relevance_chunk_size")]
    pub relevance_chunk_size: usize,

    /// Maximum texts per embedding request.
    #[serde(default = "default_embed_batch_limit")]
    pub embed_batch_limit: usize,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_cluster_size: default_max_cluster_size(),
            max_merge_passes: default_max_merge_passes(),
            relevance_chunk_size: default_relevance_chunk_size(),
            embed_batch_limit: default_embed_batch_limit(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.85
}
fn default_max_cluster_size() -> usize {
    10
}
fn default_max_merge_passes() -> usize {
    100
}
fn default_relevance_chunk_size() -> usize {
    200
}
fn default_embed_batch_limit() -> usize {
    2000
}

// ---------------------------------------------------------------------------
// Research params (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime research parameters — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ResearchParams {
    /// Maximum keywords persisted per run.
    pub max_keywords: usize,
    /// Politeness delay between per-seed fetches, in ms (0 disables).
    pub expansion_delay_ms: u64,
    /// Seeds to generate when none are supplied.
    pub seed_count: usize,
    /// Cluster merge similarity threshold.
    pub similarity_threshold: f32,
    /// Maximum members per cluster.
    pub max_cluster_size: usize,
    /// Cluster merge iteration cap.
    pub max_merge_passes: usize,
    /// Candidates per relevance request.
    pub relevance_chunk_size: usize,
}

impl From<&AppConfig> for ResearchParams {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_keywords: config.defaults.max_keywords,
            expansion_delay_ms: config.defaults.expansion_delay_ms,
            seed_count: config.defaults.seed_count,
            similarity_threshold: config.research.similarity_threshold,
            max_cluster_size: config.research.max_cluster_size,
            max_merge_passes: config.research.max_merge_passes,
            relevance_chunk_size: config.research.relevance_chunk_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.keywordscout/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KeywordScoutError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.keywordscout/keywordscout.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| KeywordScoutError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(path))
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| KeywordScoutError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        KeywordScoutError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KeywordScoutError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KeywordScoutError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KeywordScoutError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that both model API key env vars are set and non-empty.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    for (var_name, hint) in [
        (
            config.openrouter.api_key_env.as_str(),
            "https://openrouter.ai/keys",
        ),
        (
            config.openai.api_key_env.as_str(),
            "https://platform.openai.com/api-keys",
        ),
    ] {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(KeywordScoutError::config(format!(
                    "API key not found. Set the {var_name} environment variable.\n\
                     Get a key at {hint}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("db_path"));
        assert!(toml_str.contains("OPENROUTER_API_KEY"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_keywords, 30);
        assert_eq!(parsed.research.max_cluster_size, 10);
        assert_eq!(parsed.openai.embedding_dim, 1536);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
max_keywords = 50

[research]
similarity_threshold = 0.9
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.max_keywords, 50);
        assert_eq!(config.defaults.expansion_delay_ms, 1000);
        assert!((config.research.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.research.max_merge_passes, 100);
    }

    #[test]
    fn research_params_from_app_config() {
        let app = AppConfig::default();
        let params = ResearchParams::from(&app);
        assert_eq!(params.max_keywords, 30);
        assert_eq!(params.relevance_chunk_size, 200);
        assert!((params.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(params.max_merge_passes, 100);
    }

    #[test]
    fn expand_tilde_passthrough() {
        let p = expand_tilde("/tmp/keywords.db").expect("expand");
        assert_eq!(p, PathBuf::from("/tmp/keywords.db"));
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.openrouter.api_key_env = "KS_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_keys(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
