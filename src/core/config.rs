//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Fields eligible for translation when no allow-list is configured
const DEFAULT_TRANSLATE_FIELDS: &[&str] = &[
    "name",
    "description",
    "description_short",
    "meta_title",
    "meta_description",
    "content",
    "legend",
    "title",
    "value",
    "public_name",
    "head_seo_title",
];

/// Brand names the model must never translate
const DEFAULT_BRAND_TERMS: &[&str] = &["Fluid"];

/// Domain terms with suggested target renderings
const DEFAULT_GLOSSARY: &[(&str, &[&str])] = &[
    ("Controtelaio", &["Counterframe", "Châssis"]),
    ("Cartongesso", &["Drywall", "Plaque de plâtre"]),
];

/// A domain term with suggested renderings in target languages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryTerm {
    /// Source-language term
    pub source: String,
    /// Acceptable renderings, one per common target language
    pub renderings: Vec<String>,
}

/// Configuration for the export translator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub api_key: String,
    pub api_endpoint: String,
    pub model: String,
    pub source_lang: String,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub translate_fields: Vec<String>,
    pub brand_terms: Vec<String>,
    pub glossary: Vec<GlossaryTerm>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GROQ_API_KEY").unwrap_or_default(),
            api_endpoint: std::env::var("API_ENDPOINT").unwrap_or_else(|_| {
                "https://api.groq.com/openai/v1/chat/completions".to_string()
            }),
            model: "llama-3.3-70b-versatile".to_string(),
            source_lang: "Italian".to_string(),
            batch_size: 15,
            max_retries: 3,
            retry_delay_ms: 5000,
            timeout_ms: 30000,
            temperature: 0.1,
            max_tokens: 4000,
            translate_fields: default_translate_fields(),
            brand_terms: default_brand_terms(),
            glossary: default_glossary(),
        }
    }
}

/// Build the default allow-list as owned strings
fn default_translate_fields() -> Vec<String> {
    DEFAULT_TRANSLATE_FIELDS
        .iter()
        .map(|f| f.to_string())
        .collect()
}

/// Build the default brand-term list as owned strings
fn default_brand_terms() -> Vec<String> {
    DEFAULT_BRAND_TERMS.iter().map(|t| t.to_string()).collect()
}

/// Build the default glossary as owned terms
fn default_glossary() -> Vec<GlossaryTerm> {
    DEFAULT_GLOSSARY
        .iter()
        .map(|(source, renderings)| GlossaryTerm {
            source: source.to_string(),
            renderings: renderings.iter().map(|r| r.to_string()).collect(),
        })
        .collect()
}

impl TranslatorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| anyhow::anyhow!("GROQ_API_KEY environment variable is required"))?;

        let api_endpoint = std::env::var("API_ENDPOINT")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1/chat/completions".to_string());

        let model = std::env::var("MODEL_ID")
            .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let source_lang =
            std::env::var("SOURCE_LANG").unwrap_or_else(|_| "Italian".to_string());

        let batch_size = std::env::var("BATCH_SIZE")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<usize>()?;

        let max_retries = std::env::var("MAX_RETRIES")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u32>()?;

        let retry_delay_ms = std::env::var("RETRY_DELAY_MS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u64>()?;

        let timeout_ms = std::env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".to_string())
            .parse::<u64>()?;

        Ok(Self {
            api_key,
            api_endpoint,
            model,
            source_lang,
            batch_size,
            max_retries,
            retry_delay_ms,
            timeout_ms,
            temperature: 0.1,
            max_tokens: 4000,
            translate_fields: Vec::new(),
            brand_terms: Vec::new(),
            glossary: Vec::new(),
        })
    }

    /// Load configuration with the default allow-list, brand terms and glossary
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::from_env()?;

        if config.translate_fields.is_empty() {
            config.translate_fields = default_translate_fields();
            info!(
                "Loaded {} default translatable fields",
                config.translate_fields.len()
            );
        }

        if config.brand_terms.is_empty() {
            config.brand_terms = default_brand_terms();
        }

        if config.glossary.is_empty() {
            config.glossary = default_glossary();
        }

        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            return Err(anyhow::anyhow!("API key is required"));
        }

        if self.api_endpoint.is_empty() {
            return Err(anyhow::anyhow!("API endpoint is required"));
        }

        if self.model.is_empty() {
            return Err(anyhow::anyhow!("Model identifier is required"));
        }

        if self.batch_size == 0 {
            return Err(anyhow::anyhow!("batch_size must be greater than 0"));
        }

        if self.max_retries == 0 {
            return Err(anyhow::anyhow!("max_retries must be greater than 0"));
        }

        if self.translate_fields.is_empty() {
            warn!("No translatable fields configured");
        }

        Ok(())
    }

    /// Check whether a field name is in the translation allow-list
    pub fn is_translatable_field(&self, field: &str) -> bool {
        self.translate_fields.iter().any(|f| f == field)
    }
}
