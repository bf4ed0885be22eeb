//! Completion collaborator
//!
//! The facade only needs "prompt in, text out". `OpenRouterClient` is the
//! production implementation; tests substitute their own.

pub mod interactive;
pub mod llm;
pub mod prompts;

use anyhow::Result;
use async_trait::async_trait;

pub use llm::{OpenRouterClient, ProviderConfig, ProviderKind};

/// Asynchronous text completion
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Complete `prompt` under the `system` instructions
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}
