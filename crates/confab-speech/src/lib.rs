//! Speech capture for Confab.
//!
//! Wraps a streaming speech-to-text provider behind a trait seam and drives
//! a small session state machine that writes cumulative transcripts into the
//! staged input text.

pub mod provider;
pub mod session;
pub mod state;

pub use provider::{MockSpeechProvider, SpeechErrorKind, SpeechEvent, SpeechProvider};
pub use session::{SpeechSession, TranscriptSink};
pub use state::{SpeechState, StateMachine};
