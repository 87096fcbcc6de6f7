//! Shared test collaborator

#![allow(dead_code)]

use async_trait::async_trait;
use memora::llm::{CollaboratorError, OutputSchema, TextGenerator};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Counts calls, records prompts and fails on a chosen call
pub struct StubGenerator {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
    final_response: Option<String>,
    structured: Value,
    /// When set, structured calls wait here until released
    hold: Option<Notify>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
            fail_on_call: None,
            final_response: None,
            structured: json!({
                "category": "todo",
                "confidence": 0.9,
                "reasoning": "A shopping task"
            }),
            hold: None,
        }
    }

    /// Fail the call with this zero-based index
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Response for prompts that merge section summaries
    pub fn with_aggregate_response(mut self, response: &str) -> Self {
        self.final_response = Some(response.to_string());
        self
    }

    pub fn with_structured(mut self, value: Value) -> Self {
        self.structured = value;
        self
    }

    /// Block structured calls until `release` is called
    pub fn holding_structured(mut self) -> Self {
        self.hold = Some(Notify::new());
        self
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.notify_waiters();
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn record(&self, prompt: &str) -> Result<usize, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_on_call == Some(call) {
            return Err(CollaboratorError::Api {
                status: 500,
                message: format!("stub failure on call {}", call),
            });
        }
        Ok(call)
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str, _max_output_tokens: u32) -> Result<String, CollaboratorError> {
        let call = self.record(prompt)?;
        if prompt.contains("Section summaries:") {
            if let Some(response) = &self.final_response {
                return Ok(response.clone());
            }
        }
        Ok(format!("- point from call {}", call))
    }

    async fn generate_structured(
        &self,
        prompt: &str,
        _schema: &OutputSchema,
        _max_output_tokens: u32,
    ) -> Result<Value, CollaboratorError> {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        self.record(prompt)?;
        Ok(self.structured.clone())
    }
}
