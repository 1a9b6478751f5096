//! Chat-completion translation client with retry logic

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::TokenCounts;

/// One translated batch: workload key mapped to translated text, plus the
/// token usage the service reported for the request
#[derive(Debug, Clone, Default)]
pub struct BatchTranslation {
    /// Key -> translated text; may cover only part of the request
    pub translations: HashMap<String, String>,
    /// Usage block from the response, when present
    pub usage: Option<TokenCounts>,
}

/// Client that translates key -> text batches in single structured-output
/// requests against an OpenAI-compatible chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatTranslator {
    client: reqwest::Client,
    config: Arc<TranslatorConfig>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<TokenCounts>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

impl ChatTranslator {
    /// Create a new translator client
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate()?;

        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = TranslatorConfig::load()?;
        Self::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate one batch, retrying failed attempts with a fixed delay.
    ///
    /// Each attempt is a full request; any network, API or parse failure is
    /// logged and retried until `max_retries` attempts have been spent, then
    /// the last error is returned for the caller to degrade gracefully.
    pub async fn translate_batch_with_retry(
        &self,
        batch: &[(String, String)],
        target_lang: &str,
    ) -> Result<BatchTranslation> {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for batch of {}", attempt, batch.len());
                sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
            }

            match self.translate_batch(batch, target_lang).await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Batch translated after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    warn!(
                        "Batch attempt {}/{} failed: {}",
                        attempt + 1,
                        self.config.max_retries,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(TranslationError::ConfigError {
            message: "max_retries must be greater than 0".to_string(),
        }))
    }

    /// Translate one batch in a single structured-output request
    pub async fn translate_batch(
        &self,
        batch: &[(String, String)],
        target_lang: &str,
    ) -> Result<BatchTranslation> {
        if batch.is_empty() {
            return Ok(BatchTranslation::default());
        }

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.system_prompt(target_lang),
                },
                ChatMessage {
                    role: "user",
                    content: self.user_prompt(batch, target_lang),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslationError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();

            if status_code == 429 {
                return Err(TranslationError::RateLimitError { retry_after: None });
            }

            return Err(TranslationError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let chat: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| TranslationError::InvalidResponseError {
                    message: e.to_string(),
                })?;

        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No choices in response".to_string(),
            })?;

        let translations = parse_translations(content)?;
        debug!(
            "Received {} translations for batch of {}",
            translations.len(),
            batch.len()
        );

        Ok(BatchTranslation {
            translations,
            usage: chat.usage,
        })
    }

    /// System instruction for the model, built from the configured source
    /// language, brand terms and glossary
    fn system_prompt(&self, target_lang: &str) -> String {
        let mut rules = vec![
            "Return ONLY valid JSON format.".to_string(),
            "Keys must match the input keys EXACTLY.".to_string(),
            "Preserve HTML tags (<p>, <div>, <span>) and structure EXACTLY.".to_string(),
        ];

        if !self.config.brand_terms.is_empty() {
            let terms = self
                .config
                .brand_terms
                .iter()
                .map(|t| format!("'{}'", t))
                .collect::<Vec<_>>()
                .join(", ");
            rules.push(format!(
                "Do not translate proper names {} or model codes.",
                terms
            ));
        }

        if !self.config.glossary.is_empty() {
            let terms = self
                .config
                .glossary
                .iter()
                .map(|term| {
                    let renderings = term
                        .renderings
                        .iter()
                        .map(|r| format!("'{}'", r))
                        .collect::<Vec<_>>()
                        .join("/");
                    format!("'{}' -> {}", term.source, renderings)
                })
                .collect::<Vec<_>>()
                .join(", ");
            rules.push(format!("Keep technical terms accurate (e.g., {}).", terms));
        }

        rules.push("If text is a URL or filename, return it unchanged.".to_string());

        let rules = rules
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a professional technical translator for an e-commerce store.\n\
             Task: Translate the values in the JSON object from {} to {}.\n\
             Strict Rules:\n{}",
            self.config.source_lang, target_lang, rules
        )
    }

    /// User message carrying the batch as a readable JSON object
    fn user_prompt(&self, batch: &[(String, String)], target_lang: &str) -> String {
        let mut payload = serde_json::Map::new();
        for (key, text) in batch {
            payload.insert(key.clone(), Value::String(text.clone()));
        }

        // Map insertion order matches batch order; values stay unescaped so
        // the model sees the source text as written
        let items = serde_json::to_string_pretty(&Value::Object(payload))
            .unwrap_or_else(|_| "{}".to_string());

        format!("Translate these to {}:\n\n{}", target_lang, items)
    }
}

/// Parse the assistant content as a key -> text mapping.
///
/// Entries whose value is not a non-empty string are dropped rather than
/// failing the batch; partial coverage is a partial success.
pub fn parse_translations(content: &str) -> Result<HashMap<String, String>> {
    let object: serde_json::Map<String, Value> =
        serde_json::from_str(content).map_err(|e| TranslationError::InvalidResponseError {
            message: format!("response is not a JSON object: {}", e),
        })?;

    let translations = object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) if !text.is_empty() => Some((key, text)),
            _ => None,
        })
        .collect();

    Ok(translations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_translator() -> ChatTranslator {
        let config = TranslatorConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };
        ChatTranslator::new(config).unwrap()
    }

    #[test]
    fn test_translator_creation() {
        let config = TranslatorConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        };
        assert!(ChatTranslator::new(config).is_ok());
    }

    #[test]
    fn test_translator_creation_requires_api_key() {
        let config = TranslatorConfig {
            api_key: "".to_string(),
            ..Default::default()
        };
        assert!(ChatTranslator::new(config).is_err());
    }

    #[test]
    fn test_parse_translations() {
        let content = r#"{"products::0::name": "Wooden frame", "products::1::name": "Hinge"}"#;
        let translations = parse_translations(content).unwrap();

        assert_eq!(translations.len(), 2);
        assert_eq!(translations["products::0::name"], "Wooden frame");
    }

    #[test]
    fn test_parse_translations_drops_empty_and_non_string() {
        let content = r#"{
            "products::0::name": "Wooden frame",
            "products::1::name": "",
            "products::2::name": 42,
            "products::3::name": null
        }"#;
        let translations = parse_translations(content).unwrap();

        assert_eq!(translations.len(), 1);
        assert!(translations.contains_key("products::0::name"));
    }

    #[test]
    fn test_parse_translations_rejects_non_object() {
        assert!(parse_translations("not json").is_err());
        assert!(parse_translations("[1, 2]").is_err());
    }

    #[test]
    fn test_system_prompt_mentions_languages_and_terms() {
        let translator = test_translator();
        let prompt = translator.system_prompt("French");

        assert!(prompt.contains("Italian"));
        assert!(prompt.contains("French"));
        assert!(prompt.contains("valid JSON"));
        assert!(prompt.contains("'Fluid'"));
        assert!(prompt.contains("'Controtelaio' -> 'Counterframe'/'Châssis'"));
    }

    #[test]
    fn test_user_prompt_keeps_order_and_unicode() {
        let translator = test_translator();
        let batch = vec![
            ("products::0::name".to_string(), "Telaio in legno".to_string()),
            ("products::1::name".to_string(), "Già montato".to_string()),
        ];

        let prompt = translator.user_prompt(&batch, "French");

        assert!(prompt.starts_with("Translate these to French:"));
        assert!(prompt.contains("Già montato"));
        let first = prompt.find("products::0::name").unwrap();
        let second = prompt.find("products::1::name").unwrap();
        assert!(first < second);
    }
}
