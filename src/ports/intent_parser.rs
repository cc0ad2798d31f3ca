//! Intent Parser Port - Free text to a structured command.

use async_trait::async_trait;

use crate::domain::foundation::Actor;
use crate::domain::intent::ParsedIntent;

/// Errors that can occur while parsing intent
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    #[error("Intent service unavailable: {0}")]
    Unavailable(String),

    #[error("Intent service rate limited")]
    RateLimited,

    #[error("Could not parse intent response: {0}")]
    InvalidResponse(String),
}

/// Port for turning a free-form sentence into an intent
#[async_trait]
pub trait IntentParser: Send + Sync {
    /// Parses one message on behalf of an actor
    ///
    /// # Returns
    /// Either an action request or clarification text for the user
    async fn parse(&self, text: &str, actor: &Actor) -> Result<ParsedIntent, IntentError>;
}
