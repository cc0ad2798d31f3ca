//! Intent Parser Adapters
//!
//! - **KeywordIntentParser** - Offline rule-based parser
//! - **LlmIntentParser** - OpenAI-compatible chat completions
//! - **MockIntentParser** - Queued responses and a call log, for tests

mod keyword_intent_parser;
mod llm_intent_parser;
mod mock_intent_parser;

pub use keyword_intent_parser::KeywordIntentParser;
pub use llm_intent_parser::{LlmIntentConfig, LlmIntentParser};
pub use mock_intent_parser::{MockIntentError, MockIntentParser, MockIntentResponse, RecordedCall};
