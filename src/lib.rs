//! Tech Mentor - Technical Learning Assistant Library
//!
//! A thin orchestration layer over an LLM completion endpoint:
//! - Technical Q&A, code explanation, review and debugging help
//! - Learning-path generation and revision
//! - Per-user conversation and learning-path history in flat JSON files
//! - CLI and HTTP front ends over the same facade
//!
//! # Example
//!
//! ```ignore
//! use tech_mentor::config::Config;
//! use tech_mentor::mentor::{AskQuestion, TechMentor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mentor = TechMentor::from_config(&Config::load()?).await?;
//!     let reply = mentor.ask_question("me", AskQuestion::new("What is a trait object?")).await?;
//!     println!("{}", reply.output.answer);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod types;
pub mod error;
pub mod memory;
pub mod agent;
pub mod config;
pub mod security;
pub mod mentor;
pub mod server;
pub mod cli;

// Re-export commonly used types for convenience
pub use agent::{OpenRouterClient, TextCompletion};
pub use config::Config;
pub use error::{MentorError, Result};
pub use memory::{ConversationRecord, LearningPathRecord, RecordStore, Statistics, UserRecord};
pub use mentor::TechMentor;
pub use types::ConversationType;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
