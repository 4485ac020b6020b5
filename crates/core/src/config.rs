//! Configuration management for medfaq.
//!
//! Configuration is merged from, in increasing precedence:
//! - Built-in defaults
//! - The config file (`.medfaq/config.yaml` or `MEDFAQ_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! State lives under the workspace's `.medfaq/` directory (local index,
//! prompt overrides, exported dialogues).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".medfaq";

const KNOWN_LLM_PROVIDERS: [&str; 2] = ["openai", "ollama"];
const KNOWN_EMBEDDING_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Upper bound for `retrieval.retries`
pub const MAX_RETRIES: u32 = 5;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .medfaq/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Answer generation backend
    pub llm: LlmSettings,

    /// Query/document embedding backend
    pub embedding: EmbeddingSettings,

    /// Vector search settings
    pub retrieval: RetrievalSettings,

    /// Dialogue export settings
    pub export: ExportSettings,

    /// Dataset definitions; empty means the built-in set
    pub datasets: Vec<DatasetConfig>,
}

/// Answer generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// "openai" or "ollama"
    pub provider: String,
    pub model: String,
    /// Base URL override (e.g. an OpenAI-compatible gateway)
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            temperature: 0.3,
            max_tokens: 1000,
        }
    }
}

/// Embedding backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "openai", "ollama" or "mock"
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub endpoint: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            endpoint: None,
        }
    }
}

/// Vector search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of documents forwarded to the answer backend
    pub top_k: usize,
    /// SQLite index location; relative paths resolve against the workspace
    pub index_path: Option<PathBuf>,
    /// Timeout applied to every backend call
    pub request_timeout_secs: u64,
    /// Extra attempts after a connectivity failure
    pub retries: u32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            index_path: None,
            request_timeout_secs: 30,
            retries: 1,
        }
    }
}

/// When the session history is cleared after an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportClearPolicy {
    /// Clear whether or not the export was delivered
    #[default]
    Always,
    /// Clear only after the artifact was serialized and delivered
    OnSuccess,
}

/// Dialogue export settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub clear_policy: ExportClearPolicy,
    /// Directory receiving `dialogue.json`; defaults to the workspace
    pub directory: Option<PathBuf>,
}

/// One dataset entry from config.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub label: String,
    pub department: String,
    pub url: String,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    export: Option<ExportSettings>,
    logging: Option<LoggingConfig>,
    datasets: Option<Vec<DatasetConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            export: ExportSettings::default(),
            datasets: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `MEDFAQ_WORKSPACE`: Override workspace path
    /// - `MEDFAQ_CONFIG`: Path to config file
    /// - `MEDFAQ_PROVIDER`: Answer backend provider
    /// - `MEDFAQ_MODEL`: Answer model identifier
    /// - `MEDFAQ_EMBEDDING_PROVIDER`: Embedding backend provider
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use medfaq_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Like [`AppConfig::load`], with workspace and config file given up
    /// front so that CLI flags decide which file gets read.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("MEDFAQ_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Ok(config_file) = std::env::var("MEDFAQ_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }
        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.medfaq_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("MEDFAQ_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("MEDFAQ_MODEL") {
            config.llm.model = model;
        }

        if let Ok(provider) = std::env::var("MEDFAQ_EMBEDDING_PROVIDER") {
            config.embedding.provider = provider;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let mut merged = self.merge_yaml_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;
        merged.config_file = Some(path.to_path_buf());

        tracing::debug!("Merged config file {:?}", path);
        Ok(merged)
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(export) = config_file.export {
            result.export = export;
        }
        if let Some(datasets) = config_file.datasets {
            result.datasets = datasets;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the
    /// config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .medfaq directory.
    pub fn medfaq_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .medfaq directory exists.
    pub fn ensure_medfaq_dir(&self) -> AppResult<()> {
        let dir = self.medfaq_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }

    /// Resolved SQLite index path.
    pub fn index_path(&self) -> PathBuf {
        match self.retrieval.index_path {
            Some(ref p) if p.is_absolute() => p.clone(),
            Some(ref p) => self.workspace.join(p),
            None => self.medfaq_dir().join("index.sqlite"),
        }
    }

    /// Resolved export directory.
    pub fn export_dir(&self) -> PathBuf {
        match self.export.directory {
            Some(ref p) if p.is_absolute() => p.clone(),
            Some(ref p) => self.workspace.join(p),
            None => self.workspace.clone(),
        }
    }

    /// Validate the merged configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.retries > MAX_RETRIES {
            return Err(AppError::Config(format!(
                "retrieval.retries must be at most {}",
                MAX_RETRIES
            )));
        }

        if self.retrieval.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "retrieval.requestTimeoutSecs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.export.clear_policy, ExportClearPolicy::Always);
        assert!(config.datasets.is_empty());
        assert!(!config.verbose);
    }

    #[test]
    fn test_paths_resolve_under_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/tmp/ws");
        assert!(config.medfaq_dir().ends_with(".medfaq"));
        assert_eq!(
            config.index_path(),
            PathBuf::from("/tmp/ws/.medfaq/index.sqlite")
        );
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/ws"));

        config.retrieval.index_path = Some(PathBuf::from("data/faq.sqlite"));
        config.export.directory = Some(PathBuf::from("/var/exports"));
        assert_eq!(config.index_path(), PathBuf::from("/tmp/ws/data/faq.sqlite"));
        assert_eq!(config.export_dir(), PathBuf::from("/var/exports"));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  provider: ollama
  model: llama3.2
  endpoint: http://localhost:11434
retrieval:
  topK: 5
  retries: 0
export:
  clearPolicy: on-success
logging:
  level: warn
  color: false
datasets:
  - label: 經痛
    department: 婦產科
    url: https://example.org/pain
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.llm.provider, "ollama");
        assert_eq!(merged.llm.model, "llama3.2");
        // unspecified fields in a present section fall back to defaults
        assert_eq!(merged.llm.max_tokens, 1000);
        assert_eq!(merged.retrieval.top_k, 5);
        assert_eq!(merged.retrieval.retries, 0);
        assert_eq!(merged.retrieval.request_timeout_secs, 30);
        assert_eq!(merged.export.clear_policy, ExportClearPolicy::OnSuccess);
        assert_eq!(merged.embedding.provider, "openai");
        assert_eq!(merged.log_level.as_deref(), Some("warn"));
        assert!(merged.no_color);
        assert_eq!(merged.datasets.len(), 1);
        assert_eq!(merged.datasets[0].department, "婦產科");
    }

    #[test]
    fn test_merge_yaml_invalid() {
        let result = AppConfig::default().merge_yaml_str("retrieval: [not, a, map]");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_reads_workspace_config() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(STATE_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "embedding:\n  provider: mock\n  model: trigram\n  dimensions: 64\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.embedding.dimensions, 64);
        assert_eq!(config.embedding.model, "trigram");
        assert!(config.config_file.is_some());
    }

    #[test]
    fn test_load_with_missing_explicit_config_fails() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("qwen2.5".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "qwen2.5");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_retries() {
        let mut config = AppConfig::default();
        config.retrieval.retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.retrieval.retries = 20;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("retrieval.retries")));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(AppConfig::default().validate().is_ok());
    }
}
