//! Conversational interaction controller for Confab.
//!
//! Reconciles typed text, streaming speech transcripts, file attachments,
//! a serialized submission pipeline, and menu-overlay state into a single
//! consistent conversation log. The presentation layer observes state and
//! forwards user gestures as calls; it never receives errors.

pub mod blobs;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod overlay;
pub mod responder;
pub mod staging;
pub mod store;

pub use blobs::{BlobStore, MemoryBlobStore};
pub use controller::ChatController;
pub use dispatcher::{ReplyOutcome, ResponseDispatcher, SubmitReceipt};
pub use error::ChatError;
pub use overlay::{OverlayKind, OverlayRouter, PointerTarget};
pub use responder::{Responder, StubResponder};
pub use staging::InputStagingArea;
pub use store::MessageStore;
