//! Configuration management for Mailforge.
//!
//! Handles loading and saving configuration from TOML files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::retry::RetryPolicy;

/// Tones used when the configuration does not name any.
pub const DEFAULT_TONES: [&str; 6] = [
    "friendly and conversational",
    "excited and enthusiastic",
    "professional and informative",
    "urgent and action oriented",
    "empathetic and supportive",
    "playful and humorous",
];

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Campaign generation settings
    pub campaign: CampaignConfig,

    /// Generation provider settings
    pub ai: AiConfig,

    /// Retry policy for nodes that call external services
    pub retry: RetryConfig,

    /// Document store settings
    pub retrieval: RetrievalConfig,

    /// Product catalog offered to the CLI
    pub catalog: Vec<CatalogCategory>,
}

/// Campaign generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    /// Tone rotation, in order
    pub tones: Vec<String>,

    /// Variants requested per tone
    pub variants_per_tone: usize,

    /// QA rejections tolerated for a single variant before the run aborts
    pub max_revisions: u32,

    /// Re-prompts allowed when a generator returns out-of-contract output
    pub contract_attempts: u32,

    /// Directory the report is written to
    pub output_dir: PathBuf,
}

/// Generation provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Provider (ollama, openai)
    pub provider: String,

    /// HTTP timeout for a single provider request
    pub request_timeout_secs: u64,

    /// Ollama-specific settings
    pub ollama: OllamaConfig,

    /// OpenAI-compatible endpoint settings
    pub openai: OpenAIConfig,
}

/// Ollama configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama server URL
    pub base_url: String,

    /// Model to use
    pub model: String,

    /// Model used for query embeddings (Chroma store)
    pub embedding_model: String,
}

/// OpenAI-compatible endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// API base URL (must include the `/v1` suffix)
    pub base_url: String,

    /// Model to use
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

/// Retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per node
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub delay_secs: u64,

    /// Timeout for each attempt (0 disables it)
    pub attempt_timeout_secs: u64,
}

/// Document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Backend (memory, chroma)
    pub backend: String,

    /// Directory with `product_features.json` and `promotions.json` (memory backend).
    /// Defaults to `<config_dir>/mailforge/documents`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_dir: Option<PathBuf>,

    /// Matches requested per query
    pub top_n: usize,

    /// Chroma-specific settings
    pub chroma: ChromaConfig,
}

/// Chroma configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaConfig {
    /// Chroma server URL
    pub base_url: String,

    /// Collection holding product feature documents
    pub product_collection: String,

    /// Collection holding pricing and promotion documents
    pub promotions_collection: String,
}

/// One category of the product catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCategory {
    /// Category name (e.g. "phones")
    pub category: String,

    /// Product names offered in this category
    pub options: Vec<String>,
}

impl CatalogCategory {
    /// Create a catalog category.
    pub fn new(category: impl Into<String>, options: &[&str]) -> Self {
        Self { category: category.into(), options: options.iter().map(|o| o.to_string()).collect() }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.mailforge.toml` in current directory
    /// 2. `~/.config/mailforge/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let local_config = PathBuf::from(".mailforge.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(config_dir) = Self::config_dir() {
            let global_config = config_dir.join("config.toml");
            if global_config.exists() {
                return Self::load_from_file(&global_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the workflow cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.campaign.tones.is_empty() {
            anyhow::bail!("campaign.tones must name at least one tone");
        }
        if self.campaign.tones.iter().any(|t| t.trim().is_empty()) {
            anyhow::bail!("campaign.tones must not contain empty labels");
        }
        if self.campaign.variants_per_tone == 0 {
            anyhow::bail!("campaign.variants_per_tone must be at least 1");
        }
        if self.campaign.contract_attempts == 0 {
            anyhow::bail!("campaign.contract_attempts must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if self.retrieval.top_n == 0 {
            anyhow::bail!("retrieval.top_n must be at least 1");
        }
        Ok(())
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mailforge"))
    }

    /// Look up a product in the catalog, returning its category.
    pub fn find_product(&self, category: &str, name: &str) -> Option<&CatalogCategory> {
        self.catalog
            .iter()
            .find(|c| c.category.eq_ignore_ascii_case(category))
            .filter(|c| c.options.iter().any(|o| o == name))
    }
}

impl RetryConfig {
    /// Convert to the policy attached to external-call nodes.
    pub fn policy(&self) -> RetryPolicy {
        let timeout = (self.attempt_timeout_secs > 0)
            .then(|| Duration::from_secs(self.attempt_timeout_secs));
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
            .with_attempt_timeout(timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            campaign: CampaignConfig::default(),
            ai: AiConfig::default(),
            retry: RetryConfig::default(),
            retrieval: RetrievalConfig::default(),
            catalog: default_catalog(),
        }
    }
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            tones: DEFAULT_TONES.iter().map(|t| t.to_string()).collect(),
            variants_per_tone: 1,
            max_revisions: 5,
            contract_attempts: 3,
            output_dir: PathBuf::from("campaign-output"),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            request_timeout_secs: 120,
            ollama: OllamaConfig::default(),
            openai: OpenAIConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "gemma2:9b-instruct-q8_0".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "gemma2:9b-instruct-q8_0".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, delay_secs: 2, attempt_timeout_secs: 120 }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            documents_dir: Config::config_dir().map(|d| d.join("documents")),
            top_n: 2,
            chroma: ChromaConfig::default(),
        }
    }
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            product_collection: "product_research".to_string(),
            promotions_collection: "product_offers".to_string(),
        }
    }
}

fn default_catalog() -> Vec<CatalogCategory> {
    vec![
        CatalogCategory::new("tablets", &["Tab_A9", "Tab_S9_FE", "Tab_S9"]),
        CatalogCategory::new("phones", &["Galaxy_S24", "Galaxy_Z_Flip_6", "Galaxy_Z_Fold_6"]),
        CatalogCategory::new("watches", &["Watch_FE", "Watch_Ultra", "Watch6", "Watch7"]),
        CatalogCategory::new("tv", &["Samsung_8K_TV", "Crystal_UHD_TV", "OLED_TV"]),
    ]
}
