//! Mock Intent Parser for testing.
//!
//! Returns pre-configured intents in order and records every call, so tests
//! can assert whether a message reached the intent parser at all.
//!
//! # Example
//!
//! ```ignore
//! let parser = MockIntentParser::new()
//!     .with_intent(ParsedIntent::Action(request))
//!     .with_error(MockIntentError::Unavailable);
//!
//! handler.handle(cmd).await;
//! assert_eq!(parser.call_count(), 1);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::foundation::{Actor, UserKey};
use crate::domain::intent::ParsedIntent;
use crate::ports::{IntentError, IntentParser};

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockIntentResponse {
    Intent(ParsedIntent),
    Error(MockIntentError),
}

/// Mock error types for failure-path tests.
#[derive(Debug, Clone)]
pub enum MockIntentError {
    Unavailable,
    RateLimited,
    InvalidResponse,
}

impl From<MockIntentError> for IntentError {
    fn from(err: MockIntentError) -> Self {
        match err {
            MockIntentError::Unavailable => IntentError::Unavailable("mock outage".to_string()),
            MockIntentError::RateLimited => IntentError::RateLimited,
            MockIntentError::InvalidResponse => {
                IntentError::InvalidResponse("mock garbage".to_string())
            }
        }
    }
}

/// One recorded `parse` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub text: String,
    pub user: UserKey,
}

/// Mock intent parser.
#[derive(Debug, Clone, Default)]
pub struct MockIntentParser {
    responses: Arc<Mutex<VecDeque<MockIntentResponse>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockIntentParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an intent.
    pub fn with_intent(self, intent: ParsedIntent) -> Self {
        self.push(MockIntentResponse::Intent(intent));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: MockIntentError) -> Self {
        self.push(MockIntentResponse::Error(error));
        self
    }

    /// Queues a response on a shared handle.
    pub fn push(&self, response: MockIntentResponse) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_response(&self) -> MockIntentResponse {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| {
                MockIntentResponse::Intent(ParsedIntent::Clarification(
                    "I didn't understand that.".to_string(),
                ))
            })
    }
}

#[async_trait]
impl IntentParser for MockIntentParser {
    async fn parse(&self, text: &str, actor: &Actor) -> Result<ParsedIntent, IntentError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                text: text.to_string(),
                user: actor.key.clone(),
            });

        match self.next_response() {
            MockIntentResponse::Intent(intent) => Ok(intent),
            MockIntentResponse::Error(err) => Err(err.into()),
        }
    }
}
