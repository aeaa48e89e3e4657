//! Configuration management for Scarbot.
//!
//! Configuration is merged from several sources, lowest precedence first:
//! - Built-in defaults
//! - Config file (`.scarbot/config.yaml` or `SCARBOT_CONFIG`)
//! - Environment variables
//! - Command-line flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::language::Language;

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .scarbot/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Active LLM provider ("openai" or "ollama")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// API key override for the LLM provider
    pub api_key: Option<String>,

    /// Initial session language tag (e.g. "NL", "EN")
    pub language: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations
    pub llm: Option<LlmConfig>,

    /// Knowledge base retrieval settings
    pub retrieval: RetrievalConfig,

    /// Conversation policy settings
    pub conversation: ConversationConfig,

    /// Additional languages beyond the built-in NL/EN
    pub languages: Vec<Language>,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    pub providers: HashMap<String, ProviderConfig>,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
        #[serde(rename = "organizationEnv")]
        organization_env: Option<String>,
        #[serde(rename = "maxRetries")]
        max_retries: Option<u32>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Custom endpoint for this provider, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint.as_str()),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }
}

/// Which retrieval backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalBackend {
    #[default]
    Qdrant,
    Memory,
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrievalConfig {
    pub backend: RetrievalBackend,

    /// Qdrant gRPC URL
    pub url: String,

    /// Qdrant collection name
    pub collection: String,

    /// Payload key holding the language tag
    pub language_field: String,

    /// JSON-lines chunk file for the in-memory backend
    pub path: Option<PathBuf>,

    /// Candidates fetched before MMR selection
    pub fetch_k: usize,

    /// MMR trade-off between relevance (1.0) and diversity (0.0)
    pub lambda_mult: f32,

    /// Embedding provider ("openai", "ollama", "mock")
    pub embedding_provider: String,

    pub embedding_model: String,

    pub embedding_dimensions: usize,

    /// Custom embedding endpoint
    pub embedding_endpoint: Option<String>,

    /// Environment variable holding the embedding API key
    pub api_key_env: String,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: RetrievalBackend::Qdrant,
            url: "http://localhost:6334".to_string(),
            collection: "myscarspecialist".to_string(),
            language_field: "metadata.language".to_string(),
            path: None,
            fetch_k: 20,
            lambda_mult: 0.5,
            embedding_provider: "openai".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
            embedding_dimensions: 3072,
            embedding_endpoint: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout: 30,
        }
    }
}

/// Conversation policy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationConfig {
    /// Chunk budget for the first question
    pub first_turn_chunks: usize,

    /// Chunk budget for each follow-up
    pub follow_up_chunks: usize,

    pub temperature: Option<f32>,

    pub max_tokens: Option<u32>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            first_turn_chunks: 3,
            follow_up_chunks: 2,
            temperature: Some(0.2),
            max_tokens: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    language: Option<String>,
    retrieval: Option<RetrievalConfig>,
    conversation: Option<ConversationConfig>,
    #[serde(default)]
    languages: Vec<Language>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
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
            provider: "openai".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            language: "NL".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            llm: None,
            retrieval: RetrievalConfig::default(),
            conversation: ConversationConfig::default(),
            languages: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and environment variables.
    ///
    /// Equivalent to `load_from(None, None)`.
    ///
    /// # Example
    /// ```no_run
    /// use scarbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration with an explicit workspace and/or config file.
    ///
    /// `workspace` and `config_file` win over `SCARBOT_WORKSPACE` and
    /// `SCARBOT_CONFIG`. Without a config file, `<workspace>/.scarbot/config.yaml`
    /// is read when present.
    ///
    /// Environment variables:
    /// - `SCARBOT_WORKSPACE`: Override workspace path
    /// - `SCARBOT_CONFIG`: Path to config file
    /// - `SCARBOT_PROVIDER`: LLM provider
    /// - `SCARBOT_MODEL`: Model identifier
    /// - `SCARBOT_API_KEY`: API key
    /// - `SCARBOT_LANGUAGE`: Initial session language
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace =
            workspace.or_else(|| std::env::var("SCARBOT_WORKSPACE").ok().map(PathBuf::from));
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("SCARBOT_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.workspace.join(".scarbot/config.yaml"));

        if config.config_file.is_some() || config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("SCARBOT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SCARBOT_MODEL") {
            config.model = model;
        }

        if let Ok(language) = std::env::var("SCARBOT_LANGUAGE") {
            config.language = language;
        }

        config.api_key = std::env::var("SCARBOT_API_KEY").ok();

        if config.log_level.is_none() {
            config.log_level = std::env::var("RUST_LOG").ok();
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

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.provider = llm.active_provider.clone();

            if let Some(provider_config) = llm.providers.get(&llm.active_provider) {
                result.model = provider_config.model().to_string();
            }

            result.llm = Some(llm);
        }

        if let Some(language) = config_file.language {
            result.language = language;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(conversation) = config_file.conversation {
            result.conversation = conversation;
        }

        result.languages.extend(config_file.languages);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables. The
    /// workspace and config file flags select what is loaded, so they go to
    /// `load_from` instead.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        language: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(language) = language {
            self.language = language;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .scarbot directory.
    pub fn scarbot_dir(&self) -> PathBuf {
        self.workspace.join(".scarbot")
    }

    /// Resolve the configured initial language.
    pub fn session_language(&self) -> AppResult<Language> {
        Language::resolve(&self.language, &self.languages)
    }

    /// Get the configuration of a provider, if present in config.yaml.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.as_ref().and_then(|llm| llm.providers.get(provider))
    }

    /// Resolve the API key for an LLM provider.
    ///
    /// `SCARBOT_API_KEY` wins; otherwise the provider's `apiKeyEnv` is read,
    /// falling back to `OPENAI_API_KEY` for OpenAI.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        let env_var = match self.get_provider_config(provider) {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => Some(api_key_env.clone()),
            Some(ProviderConfig::Ollama { .. }) => None,
            None if provider == "openai" => Some("OPENAI_API_KEY".to_string()),
            None => None,
        };

        env_var.and_then(|var| std::env::var(var).ok())
    }

    /// Resolve the API key for the embedding provider.
    pub fn resolve_embedding_api_key(&self) -> Option<String> {
        std::env::var(&self.retrieval.api_key_env)
            .ok()
            .or_else(|| self.api_key.clone())
    }

    /// Validate configuration for the active provider and conversation policy.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.provider.as_str();

        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if provider == "openai" && self.resolve_api_key(provider).is_none() {
            return Err(AppError::Config(
                "No API key found for provider 'openai'. Set SCARBOT_API_KEY or the configured apiKeyEnv".to_string(),
            ));
        }

        if self.conversation.first_turn_chunks == 0 || self.conversation.follow_up_chunks == 0 {
            return Err(AppError::Config(
                "Chunk budgets must be positive".to_string(),
            ));
        }

        if self.retrieval.backend == RetrievalBackend::Memory && self.retrieval.path.is_none() {
            return Err(AppError::Config(
                "The memory retrieval backend requires retrieval.path".to_string(),
            ));
        }

        self.session_language()?;

        Ok(())
    }
}
