pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::ConfabConfig;
pub use error::{ConfabError, Result};
pub use events::ControllerEvent;
pub use types::*;
