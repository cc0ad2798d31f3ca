//! LLM Intent Parser - OpenAI-compatible chat completions.
//!
//! Sends the user's sentence with a system prompt listing the record types
//! the actor may read, and expects a JSON object back:
//!
//! ```text
//! {"action": "create", "record_type": "Sales Order", "data": {...}, "filters": {...}}
//! {"reply": "Which customer do you mean?"}
//! ```
//!
//! Markdown code fences around the JSON are tolerated.
//!
//! # Configuration
//!
//! ```ignore
//! let config = LlmIntentConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let parser = LlmIntentParser::new(config, schema)?;
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::foundation::Actor;
use crate::domain::intent::{IntentAction, IntentRequest, ParsedIntent};
use crate::domain::schema::RecordType;
use crate::ports::{IntentError, IntentParser, Operation, PermissionChecker, SchemaProvider};

/// Configuration for the LLM intent parser.
#[derive(Debug, Clone)]
pub struct LlmIntentConfig {
    api_key: Secret<String>,
    pub model: String,
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub timeout: Duration,
    /// Retries on rate limiting and server errors.
    pub max_retries: u32,
}

impl LlmIntentConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// `IntentParser` backed by a chat-completions model.
pub struct LlmIntentParser {
    config: LlmIntentConfig,
    client: Client,
    schema: Arc<dyn SchemaProvider>,
    permissions: Option<Arc<dyn PermissionChecker>>,
}

impl LlmIntentParser {
    pub fn new(config: LlmIntentConfig, schema: Arc<dyn SchemaProvider>) -> Result<Self, IntentError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IntentError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            schema,
            permissions: None,
        })
    }

    /// Only offer record types the actor can read.
    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn readable_record_types(&self, actor: &Actor) -> Result<Vec<RecordType>, IntentError> {
        let all = self
            .schema
            .record_types()
            .await
            .map_err(|e| IntentError::Unavailable(e.to_string()))?;

        let Some(permissions) = &self.permissions else {
            return Ok(all);
        };

        let mut readable = Vec::with_capacity(all.len());
        for record_type in all {
            let allowed = permissions
                .can(actor, &record_type, Operation::Read)
                .await
                .map_err(|e| IntentError::Unavailable(e.to_string()))?;
            if allowed {
                readable.push(record_type);
            }
        }
        Ok(readable)
    }

    async fn send_request(&self, request: &ChatRequest) -> Result<Response, IntentError> {
        let response = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IntentError::Unavailable(format!(
                        "Timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    IntentError::Unavailable(format!("Connection failed: {}", e))
                } else {
                    IntentError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            429 => Err(IntentError::RateLimited),
            400..=499 => Err(IntentError::InvalidResponse(format!(
                "Request rejected with {}: {}",
                status, body
            ))),
            _ => Err(IntentError::Unavailable(format!(
                "Server error {}: {}",
                status, body
            ))),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, IntentError> {
        let mut attempt = 0;
        loop {
            let result = match self.send_request(request).await {
                Ok(response) => response
                    .json::<ChatResponse>()
                    .await
                    .map_err(|e| IntentError::InvalidResponse(e.to_string()))
                    .and_then(|r| {
                        r.choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                IntentError::InvalidResponse("No choices in response".to_string())
                            })
                    }),
                Err(e) => Err(e),
            };

            match result {
                Err(err) if is_retryable(&err) && attempt < self.config.max_retries => {
                    tracing::warn!(attempt, error = %err, "Intent request failed, retrying");
                    // 1s, 2s, 4s, ...
                    sleep(Duration::from_secs(1 << attempt)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn is_retryable(err: &IntentError) -> bool {
    matches!(err, IntentError::RateLimited | IntentError::Unavailable(_))
}

fn system_prompt(record_types: &[RecordType]) -> String {
    let names = record_types
        .iter()
        .map(|rt| format!("- {}", rt))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You turn requests about business records into JSON.\n\
         Record types:\n{names}\n\n\
         Answer with exactly one JSON object and nothing else.\n\
         For a command use: {{\"action\": \"create|list|get|update|delete|help\", \
         \"record_type\": \"<one of the record types>\", \"data\": {{field: value}}, \
         \"filters\": {{field: value}}}}.\n\
         Use snake_case field names. Put the target record's name in filters.name.\n\
         If the request is unclear or not about these records, use: \
         {{\"reply\": \"<short question or answer for the user>\"}}."
    )
}

/// Removes a surrounding markdown code fence, if any.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // Drop the info string ("json") on the opening line
    match inner.find('\n') {
        Some(newline) if !inner[..newline].contains('{') => inner[newline + 1..].trim(),
        _ => inner.trim(),
    }
}

#[derive(Debug, Deserialize)]
struct WireIntent {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    record_type: Option<String>,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    filters: Map<String, Value>,
}

/// Maps the model's answer onto a `ParsedIntent`.
fn interpret(content: &str, record_types: &[RecordType]) -> Result<ParsedIntent, IntentError> {
    let wire: WireIntent = serde_json::from_str(strip_code_fences(content))
        .map_err(|e| IntentError::InvalidResponse(format!("Expected JSON object: {}", e)))?;

    if let Some(reply) = wire.reply.filter(|r| !r.trim().is_empty()) {
        return Ok(ParsedIntent::Clarification(reply));
    }

    let action = wire
        .action
        .as_deref()
        .and_then(IntentAction::parse)
        .ok_or_else(|| IntentError::InvalidResponse(format!("Unknown action: {:?}", wire.action)))?;

    if action == IntentAction::Help {
        return Ok(ParsedIntent::Action(IntentRequest::new(action, None)));
    }

    let requested = wire.record_type.unwrap_or_default();
    let Some(record_type) = record_types.iter().find(|rt| rt.matches(&requested)) else {
        return Ok(ParsedIntent::Clarification(format!(
            "I can't work with \"{}\" records. Available: {}.",
            requested.trim(),
            record_types
                .iter()
                .map(RecordType::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    };

    Ok(ParsedIntent::Action(
        IntentRequest::new(action, Some(record_type.clone()))
            .with_data(wire.data)
            .with_filters(wire.filters),
    ))
}

#[async_trait]
impl IntentParser for LlmIntentParser {
    #[tracing::instrument(skip(self, text, actor), fields(model = %self.config.model))]
    async fn parse(&self, text: &str, actor: &Actor) -> Result<ParsedIntent, IntentError> {
        let record_types = self.readable_record_types(actor).await?;
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(&record_types),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            temperature: Some(0.0),
        };

        let content = self.complete(&request).await?;
        interpret(&content, &record_types)
    }
}

// ----- Chat Completions API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_types() -> Vec<RecordType> {
        vec![
            RecordType::new("Customer").unwrap(),
            RecordType::new("Sales Order").unwrap(),
        ]
    }

    #[test]
    fn config_builder_works() {
        let config = LlmIntentConfig::new("test-key")
            .with_model("local-model")
            .with_base_url("http://localhost:8080/v1/")
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0);

        assert_eq!(config.model, "local-model");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.api_key(), "test-key");
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = LlmIntentConfig::new("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }

    #[test]
    fn system_prompt_lists_record_types() {
        let prompt = system_prompt(&record_types());
        assert!(prompt.contains("- Customer"));
        assert!(prompt.contains("- Sales Order"));
    }

    mod fences {
        use super::*;

        #[test]
        fn strips_json_fence() {
            assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        }

        #[test]
        fn strips_bare_fence() {
            assert_eq!(strip_code_fences("```\n{\"a\":1}```"), "{\"a\":1}");
        }

        #[test]
        fn leaves_plain_json_alone() {
            assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        }
    }

    mod interpretation {
        use super::*;

        #[test]
        fn action_with_data_and_filters() {
            let content = json!({
                "action": "create",
                "record_type": "sales order",
                "data": {"customer": "Acme"}
            })
            .to_string();

            match interpret(&content, &record_types()).unwrap() {
                ParsedIntent::Action(request) => {
                    assert_eq!(request.action, IntentAction::Create);
                    assert_eq!(request.record_type.unwrap().as_str(), "Sales Order");
                    assert_eq!(request.data["customer"], json!("Acme"));
                }
                other => panic!("Expected action, got {:?}", other),
            }
        }

        #[test]
        fn reply_becomes_clarification() {
            let parsed = interpret(r#"{"reply": "Which customer?"}"#, &record_types()).unwrap();
            assert_eq!(parsed, ParsedIntent::Clarification("Which customer?".to_string()));
        }

        #[test]
        fn unknown_record_type_becomes_clarification() {
            let content = r#"{"action": "list", "record_type": "Invoice"}"#;
            match interpret(content, &record_types()).unwrap() {
                ParsedIntent::Clarification(text) => assert!(text.contains("Invoice")),
                other => panic!("Expected clarification, got {:?}", other),
            }
        }

        #[test]
        fn help_needs_no_record_type() {
            let parsed = interpret("```json\n{\"action\": \"help\"}\n```", &record_types()).unwrap();
            assert!(matches!(parsed, ParsedIntent::Action(r) if r.action == IntentAction::Help));
        }

        #[test]
        fn non_json_is_invalid_response() {
            assert!(matches!(
                interpret("Sure! Here you go.", &record_types()),
                Err(IntentError::InvalidResponse(_))
            ));
        }

        #[test]
        fn unknown_action_is_invalid_response() {
            assert!(matches!(
                interpret(r#"{"action": "dance", "record_type": "Customer"}"#, &record_types()),
                Err(IntentError::InvalidResponse(_))
            ));
        }
    }

    #[test]
    fn only_transport_failures_are_retried() {
        assert!(is_retryable(&IntentError::RateLimited));
        assert!(is_retryable(&IntentError::Unavailable("down".into())));
        assert!(!is_retryable(&IntentError::InvalidResponse("bad".into())));
    }
}
