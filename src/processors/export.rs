//! Database export processor: field selection, batch dispatch and merge

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::client::ChatTranslator;
use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::models::{Document, FieldRef, Workload, KEY_SEPARATOR};
use crate::core::usage::UsageTracker;

/// Processor that drives an export document through extract -> batch ->
/// translate -> merge, one batch at a time
#[derive(Debug, Clone)]
pub struct ExportProcessor {
    translator: ChatTranslator,
    config: Arc<TranslatorConfig>,
    usage: UsageTracker,
}

impl ExportProcessor {
    /// Create a processor from an explicit configuration
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let translator = ChatTranslator::new(config.clone())?;
        Ok(Self {
            translator,
            config: Arc::new(config),
            usage: UsageTracker::new(),
        })
    }

    /// Create from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = TranslatorConfig::load()?;
        Self::new(config)
    }

    /// Active configuration
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Usage accumulated so far
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    /// Translate one batch and merge the results into the document.
    ///
    /// Returns how many fields were updated. A batch that fails all retries
    /// is logged and degrades to zero updates; the run continues and every
    /// field in the batch keeps its original text.
    pub async fn process_batch(
        &self,
        document: &mut Document,
        batch: &[(String, String)],
        index: &HashMap<String, FieldRef>,
        target_lang: &str,
    ) -> usize {
        match self
            .translator
            .translate_batch_with_retry(batch, target_lang)
            .await
        {
            Ok(outcome) => {
                self.usage.record_success(outcome.usage).await;
                apply_translations(document, index, &outcome.translations)
            }
            Err(e) => {
                warn!(
                    "Batch of {} left untranslated after {} attempts: {}",
                    batch.len(),
                    self.config.max_retries,
                    e
                );
                self.usage.record_failure().await;
                0
            }
        }
    }
}

/// Walk the document in table-then-row-then-field order and flatten every
/// translatable string into a (key, text) workload with its reverse index.
///
/// Fails when a table name contains the key separator, since such a key could
/// not be decomposed back to its origin.
pub fn extract_workload(document: &Document, config: &TranslatorConfig) -> Result<Workload> {
    let mut workload = Workload::default();

    for (table_name, table) in &document.tables {
        if table_name.contains(KEY_SEPARATOR) {
            return Err(TranslationError::InvalidDocument {
                message: format!(
                    "table name `{}` contains the reserved separator `{}`",
                    table_name, KEY_SEPARATOR
                ),
            });
        }

        let rows = match &table.rows {
            Some(rows) => rows,
            None => continue,
        };

        for (row_idx, row) in rows.iter().enumerate() {
            for (field, value) in row {
                let text = match value.as_str() {
                    Some(text) => text,
                    None => continue,
                };

                if !is_translatable(config, field, text) {
                    continue;
                }

                let field_ref = FieldRef::new(table_name.clone(), row_idx, field.clone());
                let key = field_ref.key();
                workload.items.push((key.clone(), text.to_string()));
                workload.index.insert(key, field_ref);
            }
        }
    }

    debug!("Extracted {} translatable items", workload.len());
    Ok(workload)
}

/// Selection predicate for one candidate field value.
///
/// Deliberately a cheap static filter: allow-listed field, string payload,
/// more than one character after trimming, not a URL, not numeric-looking.
fn is_translatable(config: &TranslatorConfig, field: &str, value: &str) -> bool {
    if !config.is_translatable_field(field) {
        return false;
    }

    if value.trim().chars().count() <= 1 {
        return false;
    }

    if value.starts_with("http") {
        return false;
    }

    if looks_numeric(value) {
        return false;
    }

    true
}

/// Prices, quantities and version-like tokens: all digits once `.` is removed
fn looks_numeric(value: &str) -> bool {
    let mut saw_digit = false;
    for c in value.chars() {
        if c == '.' {
            continue;
        }
        if !c.is_ascii_digit() {
            return false;
        }
        saw_digit = true;
    }
    saw_digit
}

/// Merge a translation result mapping into the document.
///
/// Only keys present in the reverse index with a non-empty value are applied;
/// everything else is ignored so a missing translation never blanks a field.
/// Returns the number of fields updated.
pub fn apply_translations(
    document: &mut Document,
    index: &HashMap<String, FieldRef>,
    translations: &HashMap<String, String>,
) -> usize {
    let mut applied = 0;

    for (key, text) in translations {
        if text.is_empty() {
            continue;
        }

        let field_ref = match index.get(key) {
            Some(field_ref) => field_ref,
            None => continue,
        };

        if document.update_field(field_ref, text.clone()) {
            applied += 1;
        }
    }

    applied
}

/// Load an export document from a JSON file
pub async fn load_document(path: &Path) -> Result<Document> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TranslationError::FileError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

    let document: Document = serde_json::from_str(&content)?;
    info!(
        "Loaded {} with {} tables",
        path.display(),
        document.tables.len()
    );
    Ok(document)
}

/// Write the document back as indented JSON, non-ASCII preserved literally
pub async fn save_document(path: &Path, document: &Document) -> Result<()> {
    let content = serde_json::to_string_pretty(document)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TranslationError::FileError {
                    path: parent.display().to_string(),
                    message: e.to_string(),
                })?;
        }
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| TranslationError::FileError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn test_config() -> TranslatorConfig {
        TranslatorConfig {
            api_key: "test_key".to_string(),
            ..Default::default()
        }
    }

    fn sample_document() -> Document {
        serde_json::from_value(json!({
            "products": {
                "engine": "InnoDB",
                "rows": [
                    {
                        "id": 1,
                        "name": "Telaio in legno",
                        "price": "129.99",
                        "link": "https://example.com/telaio",
                        "description": "<p>Telaio robusto per porte scorrevoli</p>"
                    },
                    {"id": 2, "name": "Cerniera già montata", "price": "4.50"}
                ]
            },
            "categories": {
                "rows": [
                    {"title": "Porte e telai", "position": 1}
                ]
            },
            "settings": {
                "charset": "utf8mb4"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_extraction_order_and_index() {
        let document = sample_document();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let keys: Vec<&str> = workload.items.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "products::0::name",
                "products::0::description",
                "products::1::name",
                "categories::0::title",
            ]
        );

        for (key, _) in &workload.items {
            let field_ref = &workload.index[key];
            assert_eq!(&field_ref.key(), key);
        }
    }

    #[test]
    fn test_selection_skips_urls_numbers_and_short_strings() {
        let config = test_config();

        assert!(is_translatable(&config, "name", "Telaio in legno"));
        assert!(is_translatable(
            &config,
            "description",
            "<p>Telaio robusto</p>"
        ));

        // URL passthrough, untrimmed prefix check
        assert!(!is_translatable(&config, "name", "https://example.com"));
        assert!(!is_translatable(&config, "name", "http"));

        // Numeric-looking strings, with or without dots
        assert!(!is_translatable(&config, "name", "129.99"));
        assert!(!is_translatable(&config, "name", "1.2.3"));
        assert!(!is_translatable(&config, "value", "42"));
        // Dots alone are not numeric
        assert!(is_translatable(&config, "name", "..."));

        // Trimmed length must exceed one character
        assert!(!is_translatable(&config, "name", ""));
        assert!(!is_translatable(&config, "name", "x"));
        assert!(!is_translatable(&config, "name", "  x  "));
        assert!(is_translatable(&config, "name", "xy"));

        // Fields outside the allow-list are never candidates
        assert!(!is_translatable(&config, "price", "Telaio in legno"));
    }

    #[test]
    fn test_extraction_skips_non_string_values() {
        let document: Document = serde_json::from_value(json!({
            "products": {
                "rows": [
                    {"name": 42, "title": true, "content": null, "legend": {"a": 1}}
                ]
            }
        }))
        .unwrap();

        let workload = extract_workload(&document, &test_config()).unwrap();
        assert!(workload.is_empty());
    }

    #[test]
    fn test_extraction_rejects_separator_in_table_name() {
        let document: Document = serde_json::from_value(json!({
            "products::archive": {"rows": [{"name": "Telaio in legno"}]}
        }))
        .unwrap();

        let result = extract_workload(&document, &test_config());
        assert!(matches!(
            result,
            Err(TranslationError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_batch_coverage() {
        let document = sample_document();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let batch_size = 3;
        let batches: Vec<_> = workload.items.chunks(batch_size).collect();

        assert_eq!(batches.len(), workload.len().div_ceil(batch_size));
        assert!(batches.iter().all(|b| b.len() <= batch_size));

        let rejoined: Vec<_> = batches.concat();
        assert_eq!(rejoined, workload.items);
    }

    #[test]
    fn test_apply_translations_merges_by_key() {
        let mut document = sample_document();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let mut translations = HashMap::new();
        translations.insert("products::0::name".to_string(), "Cadre en bois".to_string());
        translations.insert("categories::0::title".to_string(), "Portes et cadres".to_string());

        let applied = apply_translations(&mut document, &workload.index, &translations);
        assert_eq!(applied, 2);

        let output = serde_json::to_value(&document).unwrap();
        assert_eq!(output["products"]["rows"][0]["name"], "Cadre en bois");
        assert_eq!(output["categories"]["rows"][0]["title"], "Portes et cadres");
        // Untranslated item keeps its source text
        assert_eq!(output["products"]["rows"][1]["name"], "Cerniera già montata");
    }

    #[test]
    fn test_apply_translations_empty_result_is_non_destructive() {
        let mut document = sample_document();
        let original = serde_json::to_value(&document).unwrap();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let applied = apply_translations(&mut document, &workload.index, &HashMap::new());

        assert_eq!(applied, 0);
        assert_json_eq!(serde_json::to_value(&document).unwrap(), original);
    }

    #[test]
    fn test_apply_translations_ignores_unknown_keys_and_empty_values() {
        let mut document = sample_document();
        let original = serde_json::to_value(&document).unwrap();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let mut translations = HashMap::new();
        translations.insert("products::0::name".to_string(), "".to_string());
        translations.insert("ghosts::0::name".to_string(), "Fantôme".to_string());

        let applied = apply_translations(&mut document, &workload.index, &translations);

        assert_eq!(applied, 0);
        assert_json_eq!(serde_json::to_value(&document).unwrap(), original);
    }

    #[test]
    fn test_structural_preservation_outside_allow_list() {
        let mut document = sample_document();
        let workload = extract_workload(&document, &test_config()).unwrap();

        let mut translations = HashMap::new();
        for (key, _) in &workload.items {
            translations.insert(key.clone(), "translated".to_string());
        }
        apply_translations(&mut document, &workload.index, &translations);

        let output = serde_json::to_value(&document).unwrap();
        // Row counts, order and non-candidate fields are untouched
        assert_eq!(output["products"]["engine"], "InnoDB");
        assert_eq!(output["products"]["rows"].as_array().unwrap().len(), 2);
        assert_eq!(output["products"]["rows"][0]["id"], 1);
        assert_eq!(output["products"]["rows"][0]["price"], "129.99");
        assert_eq!(
            output["products"]["rows"][0]["link"],
            "https://example.com/telaio"
        );
        assert_eq!(output["categories"]["rows"][0]["position"], 1);
        assert_json_eq!(output["settings"], json!({"charset": "utf8mb4"}));
    }

    #[tokio::test]
    async fn test_document_file_round_trip() {
        let document = sample_document();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        save_document(&path, &document).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        // Non-ASCII written literally, not escaped
        assert!(!content.contains("\\u"));

        let reloaded = load_document(&path).await.unwrap();
        assert_json_eq!(
            serde_json::to_value(&reloaded).unwrap(),
            serde_json::to_value(&document).unwrap()
        );
    }

    #[tokio::test]
    async fn test_load_document_missing_file() {
        let result = load_document(Path::new("/nonexistent/export.json")).await;
        assert!(matches!(result, Err(TranslationError::FileError { .. })));
    }
}
