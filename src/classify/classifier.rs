//! Single-call memo classification with structured output

use super::models::{Classification, MemoCategory};
use crate::llm::{CollaboratorError, OutputSchema, TextGenerator};
use crate::metrics::METRICS;
use crate::summary::{ScriptWeightedEstimator, TextChunker, TokenEstimator};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TOOL_NAME: &str = "record_memo_category";

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Content beyond this estimate is cut to its first chunk
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_max_input_tokens() -> usize { 15_000 }
fn default_max_output_tokens() -> u32 { 512 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// Classifier errors
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Content cannot be empty")]
    EmptyInput,

    #[error("Classification failed: {0}")]
    Collaborator(#[from] CollaboratorError),
}

/// Shape the collaborator is asked to return
#[derive(Debug, Deserialize)]
struct RawClassification {
    category: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// Assigns one of the fixed memo categories
pub struct Classifier {
    generator: Arc<dyn TextGenerator>,
    chunker: TextChunker<ScriptWeightedEstimator>,
    config: ClassifierConfig,
    schema: OutputSchema,
}

impl Classifier {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        estimator: ScriptWeightedEstimator,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            generator,
            chunker: TextChunker::new(estimator),
            config,
            schema: classification_schema(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify memo content
    pub async fn classify(&self, content: &str) -> Result<Classification, ClassifyError> {
        if content.trim().is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let bounded = self.bounded_content(content);
        let prompt = build_prompt(&bounded);

        let value = self
            .generator
            .generate_structured(&prompt, &self.schema, self.config.max_output_tokens)
            .await?;

        let raw: RawClassification = serde_json::from_value(value).map_err(|e| {
            CollaboratorError::MalformedResponse(format!("invalid classification object: {}", e))
        })?;

        let category = MemoCategory::from_label(&raw.category).unwrap_or_else(|| {
            warn!("Unknown category label {:?}, falling back to other", raw.category);
            MemoCategory::Other
        });

        let confidence = if raw.confidence.is_finite() {
            raw.confidence.clamp(0.0, 1.0) as f32
        } else {
            0.0
        };

        info!("Memo classified as {} (confidence {:.2})", category, confidence);
        METRICS.record_classification(category.as_str());

        Ok(Classification {
            category,
            confidence,
            reasoning: raw.reasoning.trim().to_string(),
            classified_at: Utc::now(),
        })
    }

    /// Content cut to the first budget-sized chunk when it is too long
    fn bounded_content(&self, content: &str) -> String {
        let estimated = self.chunker.estimator().estimate(content);
        if estimated <= self.config.max_input_tokens {
            return content.to_string();
        }

        debug!(
            "Classifying first chunk only: {} tokens over budget {}",
            estimated, self.config.max_input_tokens
        );
        self.chunker
            .split(content, self.config.max_input_tokens)
            .into_iter()
            .next()
            .map(|chunk| chunk.text)
            .unwrap_or_else(|| content.to_string())
    }
}

fn build_prompt(content: &str) -> String {
    let categories = MemoCategory::ALL
        .iter()
        .map(|c| format!("- {} ({})", c.as_str(), c.korean_label()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Classify the following memo into exactly one of these categories:\n{}\n\n\
        Record the category, your confidence between 0 and 1, and a one-sentence reason \
        written in the memo's language.\n\n\
        Memo:\n{}",
        categories, content
    )
}

fn classification_schema() -> OutputSchema {
    let labels: Vec<&str> = MemoCategory::ALL.iter().map(|c| c.as_str()).collect();

    OutputSchema {
        name: TOOL_NAME.to_string(),
        description: "Record the category assigned to a memo".to_string(),
        schema: json!({
            "type": "object",
            "properties": {
                "category": {"type": "string", "enum": labels},
                "confidence": {"type": "number", "minimum": 0, "maximum": 1},
                "reasoning": {"type": "string"}
            },
            "required": ["category", "confidence", "reasoning"]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StructuredStub {
        value: serde_json::Value,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl StructuredStub {
        fn new(value: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                value,
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for StructuredStub {
        async fn generate(&self, _prompt: &str, _max_output_tokens: u32) -> Result<String, CollaboratorError> {
            Err(CollaboratorError::MalformedResponse("unused".to_string()))
        }

        async fn generate_structured(
            &self,
            prompt: &str,
            schema: &OutputSchema,
            _max_output_tokens: u32,
        ) -> Result<serde_json::Value, CollaboratorError> {
            assert_eq!(schema.name, TOOL_NAME);
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            Ok(self.value.clone())
        }
    }

    fn classifier(stub: Arc<StructuredStub>, config: ClassifierConfig) -> Classifier {
        Classifier::new(stub, ScriptWeightedEstimator::default(), config)
    }

    #[tokio::test]
    async fn test_classify_parses_structured_output() {
        let stub = StructuredStub::new(json!({
            "category": "todo",
            "confidence": 0.92,
            "reasoning": " Contains a shopping task. "
        }));
        let classifier = classifier(stub.clone(), ClassifierConfig::default());

        let result = classifier.classify("Buy milk and eggs tomorrow.").await.unwrap();
        assert_eq!(result.category, MemoCategory::Todo);
        assert!((result.confidence - 0.92).abs() < 1e-6);
        assert_eq!(result.reasoning, "Contains a shopping task.");
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back_to_other() {
        let stub = StructuredStub::new(json!({
            "category": "groceries",
            "confidence": 1.7,
            "reasoning": "n/a"
        }));
        let classifier = classifier(stub, ClassifierConfig::default());

        let result = classifier.classify("Random thought").await.unwrap();
        assert_eq!(result.category, MemoCategory::Other);
        assert_eq!(result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_empty_content_makes_no_call() {
        let stub = StructuredStub::new(json!({}));
        let classifier = classifier(stub.clone(), ClassifierConfig::default());

        assert!(matches!(classifier.classify("  \n").await, Err(ClassifyError::EmptyInput)));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_object_is_malformed() {
        let stub = StructuredStub::new(json!({"confidence": 0.5}));
        let classifier = classifier(stub, ClassifierConfig::default());

        let err = classifier.classify("Plan the sprint").await.unwrap_err();
        assert!(matches!(
            err,
            ClassifyError::Collaborator(CollaboratorError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_long_content_is_bounded_to_first_chunk() {
        let stub = StructuredStub::new(json!({
            "category": "work",
            "confidence": 0.8,
            "reasoning": "Project notes"
        }));
        let config = ClassifierConfig {
            max_input_tokens: 10,
            ..Default::default()
        };
        let classifier = classifier(stub.clone(), config);

        classifier
            .classify("First sentence here. Second sentence there. Third one too.")
            .await
            .unwrap();

        let prompt = stub.last_prompt.lock().unwrap().clone();
        assert!(prompt.contains("First sentence here"));
        assert!(!prompt.contains("Third one too"));
    }

    #[test]
    fn test_prompt_lists_all_categories() {
        let prompt = build_prompt("memo");
        for category in MemoCategory::ALL {
            assert!(prompt.contains(category.as_str()));
            assert!(prompt.contains(category.korean_label()));
        }
    }
}
