//! Serialized submission pipeline.
//!
//! The `busy` flag is a single-slot mutual-exclusion gate: it is claimed
//! before the staged input is read and released only after the reply (or the
//! failure message) has been appended. Submissions are therefore fully
//! serialized; a submit that arrives while one is in flight is rejected
//! without touching any state, and nothing is queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use confab_core::types::Message;

use crate::error::ChatError;
use crate::responder::Responder;
use crate::staging::InputStagingArea;
use crate::store::MessageStore;

/// Bot-sender text appended when the responder fails or times out.
pub const RESPONDER_FAILURE_TEXT: &str =
    "Sorry, I couldn't get a reply for that message. Please try again.";

/// How the reply turn of a submission came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The responder produced a real reply.
    Answered,
    /// The responder failed or timed out; the reply is the failure text.
    Failed(String),
}

/// The two messages appended by one accepted submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub user: Message,
    pub reply: Message,
    pub outcome: ReplyOutcome,
}

/// Consumes the staged input on submit, appends the user turn, and resolves
/// the reply turn through the responder collaborator.
pub struct ResponseDispatcher {
    store: Arc<MessageStore>,
    staging: Arc<InputStagingArea>,
    responder: Arc<dyn Responder>,
    busy: AtomicBool,
    timeout: Duration,
}

impl ResponseDispatcher {
    pub fn new(
        store: Arc<MessageStore>,
        staging: Arc<InputStagingArea>,
        responder: Arc<dyn Responder>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            staging,
            responder,
            busy: AtomicBool::new(false),
            timeout,
        }
    }

    /// Whether a submission is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submit the staged input.
    ///
    /// Preconditions: not busy, and the staging area holds text or an
    /// attachment. A precondition failure rejects the call with zero state
    /// change. On acceptance the user message is appended and staging
    /// cleared before the first await, so the accept phase is atomic with
    /// respect to other handlers; the reply (or the failure message) is
    /// appended before the busy gate reopens, which totally orders every
    /// reply between its own user message and the next accepted submit.
    pub async fn submit(&self) -> Result<SubmitReceipt, ChatError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ChatError::SubmissionInFlight);
        }

        let text = self.staging.text();
        let attachment = self.staging.attachment();
        if text.trim().is_empty() && attachment.is_none() {
            self.busy.store(false, Ordering::SeqCst);
            return Err(ChatError::EmptySubmission);
        }

        let user_text = if text.trim().is_empty() {
            // Attachment-only submit gets a generated placeholder.
            let name = attachment
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or_default();
            format!("Sent file: {}", name)
        } else {
            text
        };

        let user = self.store.append_user(user_text, attachment);
        self.staging.reset_all();
        tracing::info!(
            id = user.id,
            has_attachment = user.attachment.is_some(),
            "Submission accepted"
        );

        let (reply, outcome) =
            match tokio::time::timeout(self.timeout, self.responder.respond(&user)).await {
                Ok(Ok(reply_text)) => {
                    let reply = self.store.append_bot(reply_text);
                    tracing::info!(id = reply.id, "Reply received");
                    (reply, ReplyOutcome::Answered)
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Responder failed");
                    let reply = self.store.append_bot(RESPONDER_FAILURE_TEXT);
                    (reply, ReplyOutcome::Failed(e.to_string()))
                }
                Err(_) => {
                    let e = ChatError::ResponderTimeout(self.timeout.as_secs());
                    tracing::warn!(error = %e, "Responder timed out");
                    let reply = self.store.append_bot(RESPONDER_FAILURE_TEXT);
                    (reply, ReplyOutcome::Failed(e.to_string()))
                }
            };

        // The gate reopens strictly after the reply turn is in the store, so
        // the dispatcher can never wedge and never interleaves round trips.
        self.busy.store(false, Ordering::SeqCst);
        Ok(SubmitReceipt {
            user,
            reply,
            outcome,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confab_core::types::{FileUpload, Language};
    use tokio::sync::Notify;

    use crate::blobs::MemoryBlobStore;

    struct InstantResponder;

    #[async_trait]
    impl Responder for InstantResponder {
        async fn respond(&self, _message: &Message) -> Result<String, ChatError> {
            Ok("instant reply".to_string())
        }
    }

    struct FailingResponder;

    #[async_trait]
    impl Responder for FailingResponder {
        async fn respond(&self, _message: &Message) -> Result<String, ChatError> {
            Err(ChatError::ResponderFailure("backend down".to_string()))
        }
    }

    struct SlowResponder(Duration);

    #[async_trait]
    impl Responder for SlowResponder {
        async fn respond(&self, _message: &Message) -> Result<String, ChatError> {
            tokio::time::sleep(self.0).await;
            Ok("slow reply".to_string())
        }
    }

    /// Responder that blocks until the test releases it.
    struct GatedResponder {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl Responder for GatedResponder {
        async fn respond(&self, _message: &Message) -> Result<String, ChatError> {
            self.release.notified().await;
            Ok("gated reply".to_string())
        }
    }

    fn fixture(
        responder: Arc<dyn Responder>,
    ) -> (Arc<ResponseDispatcher>, Arc<MessageStore>, Arc<InputStagingArea>) {
        let store = Arc::new(MessageStore::with_greeting("greeting"));
        let staging = Arc::new(InputStagingArea::new(
            Arc::new(MemoryBlobStore::new()),
            Language::new("English", "en-US"),
        ));
        let dispatcher = Arc::new(ResponseDispatcher::new(
            store.clone(),
            staging.clone(),
            responder,
            Duration::from_secs(5),
        ));
        (dispatcher, store, staging)
    }

    // ---- Scenario A: text submit round trip ----

    #[tokio::test]
    async fn test_text_submit_round_trip() {
        let (dispatcher, store, staging) = fixture(Arc::new(InstantResponder));
        staging.set_text("Hello");

        let receipt = dispatcher.submit().await.unwrap();
        assert_eq!(receipt.user.id, 2);
        assert!(receipt.user.is_user());
        assert_eq!(receipt.user.text, "Hello");
        assert_eq!(receipt.reply.id, 3);
        assert!(receipt.reply.is_bot());
        assert_eq!(receipt.outcome, ReplyOutcome::Answered);

        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 3);
        assert_eq!(staging.text(), "");
    }

    // ---- Scenario B: attachment-only submit ----

    #[tokio::test]
    async fn test_attachment_only_submit_gets_placeholder() {
        let (dispatcher, _store, staging) = fixture(Arc::new(InstantResponder));
        staging.stage_attachment(&FileUpload::new(
            "report.pdf",
            "application/pdf",
            vec![0u8; 4],
        ));

        let receipt = dispatcher.submit().await.unwrap();
        assert_eq!(receipt.user.text, "Sent file: report.pdf");
        assert!(receipt.user.attachment.is_some());
        assert!(staging.attachment().is_none());
        assert_eq!(staging.text(), "");
    }

    #[tokio::test]
    async fn test_text_with_attachment_keeps_text() {
        let (dispatcher, _store, staging) = fixture(Arc::new(InstantResponder));
        staging.set_text("please review");
        staging.stage_attachment(&FileUpload::new(
            "report.pdf",
            "application/pdf",
            vec![0u8; 4],
        ));

        let receipt = dispatcher.submit().await.unwrap();
        assert_eq!(receipt.user.text, "please review");
        assert_eq!(receipt.user.attachment.unwrap().name, "report.pdf");
    }

    // ---- Empty submission ----

    #[tokio::test]
    async fn test_empty_submission_rejected() {
        let (dispatcher, store, _staging) = fixture(Arc::new(InstantResponder));
        let result = dispatcher.submit().await;
        assert!(matches!(result, Err(ChatError::EmptySubmission)));
        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_only_submission_rejected() {
        let (dispatcher, store, staging) = fixture(Arc::new(InstantResponder));
        staging.set_text("   ");
        let result = dispatcher.submit().await;
        assert!(matches!(result, Err(ChatError::EmptySubmission)));
        assert_eq!(store.len(), 1);
        // The rejection must not clear what was staged.
        assert_eq!(staging.text(), "   ");
    }

    // ---- Submit mutual exclusion ----

    #[tokio::test]
    async fn test_second_submit_while_busy_is_rejected() {
        let release = Arc::new(Notify::new());
        let (dispatcher, store, staging) = fixture(Arc::new(GatedResponder {
            release: release.clone(),
        }));

        staging.set_text("first");
        let in_flight = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit().await })
        };

        // Wait for the in-flight submission to claim the gate.
        for _ in 0..200 {
            if dispatcher.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(dispatcher.is_busy());

        staging.set_text("second");
        let result = dispatcher.submit().await;
        assert!(matches!(result, Err(ChatError::SubmissionInFlight)));
        // Exactly one user message appended; the rejected call changed nothing.
        assert_eq!(store.len(), 2);
        assert_eq!(staging.text(), "second");

        release.notify_one();
        let first = in_flight.await.unwrap().unwrap();
        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 3);

        // The dropped submit is not queued; resubmitting now succeeds.
        let second = dispatcher.submit().await.unwrap();
        assert!(second.user.id > first.reply.id);
    }

    // ---- Reply ordering ----

    #[tokio::test]
    async fn test_reply_ordering_across_submits() {
        let (dispatcher, _store, staging) = fixture(Arc::new(InstantResponder));

        staging.set_text("one");
        let first = dispatcher.submit().await.unwrap();
        staging.set_text("two");
        let second = dispatcher.submit().await.unwrap();

        assert!(first.reply.id > first.user.id);
        assert!(second.user.id > first.reply.id);
        assert!(second.reply.id > second.user.id);
    }

    // ---- Responder failure ----

    #[tokio::test]
    async fn test_responder_failure_appends_error_reply_and_clears_busy() {
        let (dispatcher, store, staging) = fixture(Arc::new(FailingResponder));
        staging.set_text("doomed");

        let receipt = dispatcher.submit().await.unwrap();
        assert!(matches!(receipt.outcome, ReplyOutcome::Failed(_)));
        assert!(receipt.reply.is_bot());
        assert_eq!(receipt.reply.text, RESPONDER_FAILURE_TEXT);
        assert!(!dispatcher.is_busy());
        assert_eq!(store.len(), 3);

        // The dispatcher did not wedge: the next submit goes through.
        staging.set_text("again");
        assert!(dispatcher.submit().await.is_ok());
    }

    #[tokio::test]
    async fn test_responder_timeout_appends_error_reply() {
        let store = Arc::new(MessageStore::with_greeting("greeting"));
        let staging = Arc::new(InputStagingArea::new(
            Arc::new(MemoryBlobStore::new()),
            Language::new("English", "en-US"),
        ));
        let dispatcher = ResponseDispatcher::new(
            store.clone(),
            staging.clone(),
            Arc::new(SlowResponder(Duration::from_secs(10))),
            Duration::from_millis(20),
        );

        staging.set_text("too slow");
        let receipt = dispatcher.submit().await.unwrap();
        match receipt.outcome {
            ReplyOutcome::Failed(reason) => assert!(reason.contains("timed out")),
            other => panic!("Expected Failed outcome, got {:?}", other),
        }
        assert_eq!(receipt.reply.text, RESPONDER_FAILURE_TEXT);
        assert!(!dispatcher.is_busy());
    }

    // ---- Busy gate visibility ----

    #[tokio::test]
    async fn test_busy_spans_the_whole_round_trip() {
        let release = Arc::new(Notify::new());
        let (dispatcher, _store, staging) = fixture(Arc::new(GatedResponder {
            release: release.clone(),
        }));

        assert!(!dispatcher.is_busy());
        staging.set_text("hello");

        let in_flight = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.submit().await })
        };
        for _ in 0..200 {
            if dispatcher.is_busy() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(dispatcher.is_busy());

        release.notify_one();
        in_flight.await.unwrap().unwrap();
        assert!(!dispatcher.is_busy());
    }
}
