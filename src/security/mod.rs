//! Security module
//!
//! Credential storage for the completion provider: environment variables,
//! the OS keyring, and a permission-restricted fallback file.

pub mod keyring;

use anyhow::Result;

pub use keyring::{Credential, CredentialSource, resolve_credential};

/// Set API key in secure keyring
pub fn set_api_key(key: &str) -> Result<()> {
    keyring::set_api_key(key)
}

/// Get API key from secure keyring
pub fn get_api_key() -> Result<String> {
    keyring::get_api_key()
}

/// Delete API key from keyring
pub fn delete_api_key() -> Result<()> {
    keyring::delete_api_key()
}

/// Check if any credential is configured
pub fn has_api_key() -> bool {
    keyring::has_api_key()
}
