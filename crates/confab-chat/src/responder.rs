//! Responder seam: the external collaborator that produces the reply turn
//! for a submitted user turn.

use std::time::Duration;

use async_trait::async_trait;

use confab_core::types::Message;

use crate::error::ChatError;

/// Produces a reply for a user message. May take arbitrary latency; a
/// production implementation must also surface errors, which the dispatcher
/// turns into a bot-sender failure message.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, message: &Message) -> Result<String, ChatError>;
}

/// Reference responder: replies after a fixed delay with canned text that
/// acknowledges an attachment when one was sent.
pub struct StubResponder {
    delay: Duration,
}

impl StubResponder {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for StubResponder {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl Responder for StubResponder {
    async fn respond(&self, message: &Message) -> Result<String, ChatError> {
        tokio::time::sleep(self.delay).await;
        let reply = match &message.attachment {
            Some(attachment) => format!(
                "Thanks, I received your file \"{}\". What would you like to know about it?",
                attachment.name
            ),
            None => "Thanks for your message! I'm a placeholder responder, but a real one \
                     would answer you here."
                .to_string(),
        };
        Ok(reply)
    }
}

// =============================================================================
// Tests
// =============================================================================
