//! Configuration system for persona-digest
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_DIGEST_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::persona::PersonaMode;
use crate::publish::DEFAULT_MAX_PERSONAS;

/// Upper bound for `llm.max_retries`
pub const MAX_RETRIES: u32 = 10;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Batch generation settings
    pub generation: GenerationSettings,

    /// Text-generation API settings
    pub llm: LlmSettings,

    /// Summary aggregation settings
    pub aggregate: AggregateSettings,

    /// Publisher output settings
    pub publish: PublishSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Batch generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Root directory scanned for markdown articles
    pub input_dir: String,

    /// Directory receiving one summary record per article
    pub output_dir: String,

    /// Persona selection policy
    pub mode: PersonaMode,

    /// Personas per article in dynamic and mixed modes
    pub persona_count: usize,

    /// Articles processed concurrently
    pub workers: usize,

    /// Maximum number of articles per run (0 = all)
    pub limit: usize,

    /// File names never treated as articles
    pub exclude: Vec<String>,

    /// Characters of the article sent with a summary request
    pub summary_excerpt_chars: usize,

    /// Characters of the article sent with a persona request
    pub persona_excerpt_chars: usize,
}

/// Which text-generation client to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions endpoint
    OpenAi,
    /// Offline scripted generator
    Mock,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Mock => write!(f, "mock"),
        }
    }
}

/// How often the log file rolls over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

/// Text-generation API settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,

    /// API base URL (e.g., "https://api.x.ai/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty string for local servers)
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient failures, at most `MAX_RETRIES`
    pub max_retries: u32,

    pub summary_temperature: f32,
    pub summary_max_tokens: u32,

    pub persona_temperature: f32,
    pub persona_max_tokens: u32,

    /// Output budget when several personas are requested at once
    pub persona_list_max_tokens: u32,
}

// The key must never reach logs or `config show` debug output.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

/// Summary aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateSettings {
    /// Directories scanned for summary records, in merge order
    pub summary_dirs: Vec<String>,
}

/// Publisher output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Markdown document rewritten by merge-index
    pub index_path: String,

    /// HTML gallery output file
    pub gallery_path: String,

    /// Directory receiving the static JSON API
    pub api_dir: String,

    /// Maximum persona bullets appended per index section
    pub max_index_personas: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Log file rollover: hourly, daily or never
    pub rotation: LogRotation,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationSettings::default(),
            llm: LlmSettings::default(),
            aggregate: AggregateSettings::default(),
            publish: PublishSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            input_dir: "./articles".to_string(),
            output_dir: "./summaries".to_string(),
            mode: PersonaMode::Mixed,
            persona_count: 3,
            workers: 3,
            limit: 3,
            exclude: vec!["index.md".to_string()],
            summary_excerpt_chars: 1500,
            persona_excerpt_chars: 800,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            base_url: "https://api.x.ai/v1".to_string(),
            api_key: String::new(),
            model: "grok-3-fast".to_string(),
            timeout_secs: 120,
            max_retries: 2,
            summary_temperature: 0.9,
            summary_max_tokens: 300,
            persona_temperature: 1.0,
            persona_max_tokens: 800,
            persona_list_max_tokens: 1500,
        }
    }
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            summary_dirs: vec!["./summaries".to_string()],
        }
    }
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            index_path: "./articles/index.md".to_string(),
            gallery_path: "./summaries_gallery.html".to_string(),
            api_dir: "./summaries_api".to_string(),
            max_index_personas: DEFAULT_MAX_PERSONAS,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: LogRotation::Daily,
            max_files: 5,
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        let config_file = Self::find_config_file(config_path)?;
        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::ConfigNotFound {
                path: path.clone(),
                source: Some(e),
            })?;
            config = toml::from_str(&content).map_err(|e| Error::ConfigParse {
                message: format!("{}: {}", path.display(), e),
                source: Some(e),
            })?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            } else {
                return Err(Error::config_not_found(path));
            }
        }

        // Search in standard locations
        let search_paths = [
            PathBuf::from("persona-digest.toml"),
            dirs::config_dir()
                .map(|p| p.join("persona-digest").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".persona-digest").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Generation settings
        if let Ok(val) = std::env::var("PERSONA_DIGEST_INPUT_DIR") {
            self.generation.input_dir = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_OUTPUT_DIR") {
            self.generation.output_dir = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_MODE") {
            if let Ok(mode) = val.parse() {
                self.generation.mode = mode;
            }
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_PERSONA_COUNT") {
            if let Ok(n) = val.parse() {
                self.generation.persona_count = n;
            }
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_WORKERS") {
            if let Ok(n) = val.parse() {
                self.generation.workers = n;
            }
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_LIMIT") {
            if let Ok(n) = val.parse() {
                self.generation.limit = n;
            }
        }

        // LLM settings
        if let Ok(val) = std::env::var("PERSONA_DIGEST_PROVIDER") {
            match val.to_lowercase().as_str() {
                "openai" => self.llm.provider = LlmProvider::OpenAi,
                "mock" => self.llm.provider = LlmProvider::Mock,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_BASE_URL") {
            self.llm.base_url = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_API_KEY") {
            self.llm.api_key = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.llm.timeout_secs = n;
            }
        }

        // Aggregate settings
        if let Ok(val) = std::env::var("PERSONA_DIGEST_SUMMARY_DIRS") {
            let dirs: Vec<String> = val
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !dirs.is_empty() {
                self.aggregate.summary_dirs = dirs;
            }
        }

        // Publish settings
        if let Ok(val) = std::env::var("PERSONA_DIGEST_INDEX_PATH") {
            self.publish.index_path = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_GALLERY_PATH") {
            self.publish.gallery_path = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_API_DIR") {
            self.publish.api_dir = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("PERSONA_DIGEST_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_DIGEST_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.generation.input_dir = expand_path(&self.generation.input_dir);
        self.generation.output_dir = expand_path(&self.generation.output_dir);
        self.aggregate.summary_dirs = self
            .aggregate
            .summary_dirs
            .iter()
            .map(|d| expand_path(d))
            .collect();
        self.publish.index_path = expand_path(&self.publish.index_path);
        self.publish.gallery_path = expand_path(&self.publish.gallery_path);
        self.publish.api_dir = expand_path(&self.publish.api_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.generation.workers == 0 {
            return Err(Error::config_field_invalid(
                "generation.workers",
                "workers must be at least 1",
            ));
        }
        if self.generation.persona_count == 0 {
            return Err(Error::config_field_invalid(
                "generation.persona_count",
                "persona_count must be at least 1",
            ));
        }
        if self.generation.summary_excerpt_chars == 0 || self.generation.persona_excerpt_chars == 0 {
            return Err(Error::config_validation(
                "excerpt character budgets must be greater than 0",
            ));
        }
        if self.publish.max_index_personas == 0 {
            return Err(Error::config_field_invalid(
                "publish.max_index_personas",
                "max_index_personas must be at least 1",
            ));
        }

        if self.llm.max_retries > MAX_RETRIES {
            return Err(Error::config_field_invalid(
                "llm.max_retries",
                format!("max_retries must be at most {}", MAX_RETRIES),
            ));
        }

        // Validate API URL
        if self.llm.provider == LlmProvider::OpenAi {
            match url::Url::parse(&self.llm.base_url) {
                Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
                Ok(_) => {
                    return Err(Error::config_field_invalid(
                        "llm.base_url",
                        "base_url must start with http:// or https://",
                    ))
                }
                Err(e) => {
                    return Err(Error::config_field_invalid(
                        "llm.base_url",
                        format!("invalid base_url '{}': {}", self.llm.base_url, e),
                    ))
                }
            }
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Get the article root as a PathBuf
    pub fn input_dir(&self) -> PathBuf {
        PathBuf::from(&self.generation.input_dir)
    }

    /// Get the summary output directory as a PathBuf
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.generation.output_dir)
    }

    /// Summary directories scanned by the aggregator, in merge order
    pub fn summary_dirs(&self) -> Vec<PathBuf> {
        self.aggregate.summary_dirs.iter().map(PathBuf::from).collect()
    }
}

/// Expand ~ and environment variables in paths
pub fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| PathBuf::from("persona-digest.toml"));

    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io_write(parent, e))?;
        }
    }

    fs::write(&config_path, generate_default_config())
        .map_err(|e| Error::io_write(&config_path, e))?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# persona-digest configuration

[generation]
# Root directory scanned for markdown articles
input_dir = "./articles"

# Directory receiving <stem>_<mode>_summaries.json records
output_dir = "./summaries"

# Persona policy: fixed, single, dynamic, mixed
mode = "mixed"

# Personas per article in dynamic and mixed modes
persona_count = 3

# Articles processed concurrently
workers = 3

# Maximum articles per run (0 = all)
limit = 3

# File names never treated as articles
exclude = ["index.md"]

# Characters of article text sent with each request
summary_excerpt_chars = 1500
persona_excerpt_chars = 800

[llm]
# openai (any OpenAI-compatible endpoint) or mock (offline)
provider = "openai"
base_url = "https://api.x.ai/v1"

# Prefer PERSONA_DIGEST_API_KEY over storing the key here
api_key = ""

model = "grok-3-fast"
timeout_secs = 120
max_retries = 2

summary_temperature = 0.9
summary_max_tokens = 300
persona_temperature = 1.0
persona_max_tokens = 800
persona_list_max_tokens = 1500

[aggregate]
# Scanned in order; later directories win on persona name collisions
summary_dirs = ["./summaries"]

[publish]
index_path = "./articles/index.md"
gallery_path = "./summaries_gallery.html"
api_dir = "./summaries_api"

# Persona bullets appended per index section
max_index_personas = 4

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "./logs/persona-digest.log"

# Log file rollover: "hourly", "daily" or "never"
rotation = "daily"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
