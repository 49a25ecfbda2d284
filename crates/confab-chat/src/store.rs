//! Ordered conversation log with monotonic message ids.
//!
//! The id counter is an explicit `AtomicU64`, never derived from the list
//! length: two appends can be scheduled back to back and must still receive
//! distinct, ordered ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use confab_core::types::{Attachment, Message, MessageId, Sender};

/// Owns the ordered conversation log. Leaf component, no dependencies.
///
/// Messages are immutable once appended; `list` hands out snapshots.
pub struct MessageStore {
    messages: Mutex<Vec<Message>>,
    next_id: AtomicU64,
}

impl MessageStore {
    /// Create a store seeded with the greeting as message 1 (sender Bot).
    ///
    /// The id counter starts above the greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let greeting_msg = Message {
            id: 1,
            text: greeting.into(),
            sender: Sender::Bot,
            attachment: None,
            created_at: Utc::now(),
        };
        Self {
            messages: Mutex::new(vec![greeting_msg]),
            next_id: AtomicU64::new(2),
        }
    }

    /// Append a user message, with an optional attachment. Never fails.
    pub fn append_user(
        &self,
        text: impl Into<String>,
        attachment: Option<Attachment>,
    ) -> Message {
        self.append(text.into(), Sender::User, attachment)
    }

    /// Append a bot message. Never fails.
    pub fn append_bot(&self, text: impl Into<String>) -> Message {
        self.append(text.into(), Sender::Bot, None)
    }

    fn append(&self, text: String, sender: Sender, attachment: Option<Attachment>) -> Message {
        // Id allocation happens under the list lock so that ids match append
        // order exactly, even when appends race.
        let mut messages = self.messages.lock().expect("message list mutex poisoned");
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = Message {
            id,
            text,
            sender,
            attachment,
            created_at: Utc::now(),
        };
        messages.push(message.clone());
        tracing::debug!(id, sender = ?sender, "Message appended");
        message
    }

    /// A read-only snapshot of the conversation in append order.
    pub fn list(&self) -> Vec<Message> {
        self.messages
            .lock()
            .expect("message list mutex poisoned")
            .clone()
    }

    /// Number of messages appended so far.
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .expect("message list mutex poisoned")
            .len()
    }

    /// True only for a store that was never seeded, which cannot happen
    /// through the public constructor.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently appended message.
    pub fn last(&self) -> Option<Message> {
        self.messages
            .lock()
            .expect("message list mutex poisoned")
            .last()
            .cloned()
    }

    /// The id the next appended message will receive.
    pub fn next_id(&self) -> MessageId {
        self.next_id.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_is_seeded() {
        let store = MessageStore::with_greeting("Hi! How can I help you today?");
        let messages = store.list();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, 1);
        assert_eq!(messages[0].sender, Sender::Bot);
        assert_eq!(messages[0].text, "Hi! How can I help you today?");
        assert!(messages[0].attachment.is_none());
    }

    #[test]
    fn test_ids_increase_in_append_order() {
        let store = MessageStore::with_greeting("hello");
        let user = store.append_user("first", None);
        let bot = store.append_bot("second");
        let user2 = store.append_user("third", None);

        assert_eq!(user.id, 2);
        assert_eq!(bot.id, 3);
        assert_eq!(user2.id, 4);

        let ids: Vec<_> = store.list().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_counter_independent_of_length() {
        let store = MessageStore::with_greeting("hello");
        assert_eq!(store.next_id(), 2);
        store.append_user("a", None);
        assert_eq!(store.next_id(), 3);
        // The counter only ever moves forward, even though nothing is ever
        // removed here; deriving it from the length would break under races.
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_appends_get_unique_ordered_ids() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MessageStore::with_greeting("hello"));
        let mut handles = Vec::new();

        for i in 0..10 {
            let store_clone = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                store_clone.append_user(format!("message {}", i), None).id
            }));
        }

        let mut ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10, "ids must be unique under concurrency");

        // Stored order must match id order exactly.
        let stored: Vec<_> = store.list().iter().map(|m| m.id).collect();
        let mut sorted = stored.clone();
        sorted.sort_unstable();
        assert_eq!(stored, sorted);
        assert_eq!(stored.len(), 11);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let store = MessageStore::with_greeting("hello");
        let mut snapshot = store.list();
        snapshot.clear();
        // Mutating the snapshot must not touch the store.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_attachment_is_carried() {
        use confab_core::types::{Attachment, ContentRef};

        let store = MessageStore::with_greeting("hello");
        let attachment = Attachment {
            name: "report.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            content_ref: ContentRef::new(),
        };
        let msg = store.append_user("see attached", Some(attachment.clone()));
        assert_eq!(msg.attachment, Some(attachment.clone()));
        assert_eq!(store.last().unwrap().attachment, Some(attachment));
    }

    #[test]
    fn test_bot_messages_have_no_attachment() {
        let store = MessageStore::with_greeting("hello");
        let msg = store.append_bot("reply");
        assert!(msg.attachment.is_none());
    }

    #[test]
    fn test_last_returns_most_recent() {
        let store = MessageStore::with_greeting("hello");
        assert_eq!(store.last().unwrap().id, 1);
        store.append_user("newest", None);
        assert_eq!(store.last().unwrap().text, "newest");
    }

    #[test]
    fn test_store_is_never_empty() {
        let store = MessageStore::with_greeting("hello");
        assert!(!store.is_empty());
    }
}
