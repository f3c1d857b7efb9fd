//! CLI command implementations.

mod chat;
mod config;
mod message;
mod serve;
mod transcript;

pub use chat::run_chat;
pub use config::run_config;
pub use message::run_message;
pub use serve::run_serve;
pub use transcript::run_transcript;
