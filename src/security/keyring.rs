//! Keyring integration for secure API key storage
//! Falls back to file storage if keyring is unavailable

use anyhow::{Result, Context};
use std::path::PathBuf;
use std::fs;

use crate::agent::llm::ProviderKind;

const SERVICE_NAME: &str = "tech-mentor";
const API_KEY_USERNAME: &str = "openrouter-api-key";
const API_KEY_FILE: &str = "api_key.txt";

/// Environment variables checked before the keyring, in order
pub const OPENROUTER_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Where a resolved credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Keyring,
}

/// A provider credential ready for the completion client
#[derive(Clone)]
pub struct Credential {
    pub provider: ProviderKind,
    pub api_key: String,
    pub source: CredentialSource,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolve a credential: environment first, then keyring, then the fallback file
pub fn resolve_credential() -> Result<Credential> {
    if let Some(credential) = credential_from_env(|name| std::env::var(name).ok()) {
        return Ok(credential);
    }

    let api_key = get_api_key()?;
    Ok(Credential {
        provider: ProviderKind::OpenRouter,
        api_key,
        source: CredentialSource::Keyring,
    })
}

/// Environment part of credential resolution
pub fn credential_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
    let non_empty = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(api_key) = non_empty(OPENROUTER_KEY_ENV) {
        return Some(Credential {
            provider: ProviderKind::OpenRouter,
            api_key,
            source: CredentialSource::Environment,
        });
    }
    non_empty(OPENAI_KEY_ENV).map(|api_key| Credential {
        provider: ProviderKind::OpenAi,
        api_key,
        source: CredentialSource::Environment,
    })
}

/// Get the path for the fallback API key file
fn api_key_file_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "tech-mentor", "tech-mentor")
        .context("Failed to get project directories")?;
    let dir = base.config_dir();
    fs::create_dir_all(dir).context("Failed to create config directory")?;
    Ok(dir.join(API_KEY_FILE))
}

/// Set API key - tries keyring first, falls back to file
pub fn set_api_key(key: &str) -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.set_password(key).is_ok() {
            // Also save to file as backup in case keyring retrieval fails
            let _ = save_to_file(key);
            return Ok(());
        }
    }

    save_to_file(key)?;
    println!("Note: Using file-based storage (keyring unavailable)");
    Ok(())
}

fn save_to_file(key: &str) -> Result<()> {
    let path = api_key_file_path()?;
    fs::write(&path, key).context("Failed to write API key file")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .context("Failed to set file permissions")?;
    }

    Ok(())
}

/// Get the stored API key - keyring first, then file
pub fn get_api_key() -> Result<String> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if let Ok(key) = entry.get_password() {
            return Ok(key);
        }
    }

    let path = api_key_file_path()?;
    let key = fs::read_to_string(&path).with_context(|| {
        format!(
            "No API key found. Set {} or run 'tech-mentor config --set-api-key YOUR_KEY' first.",
            OPENROUTER_KEY_ENV
        )
    })?;
    Ok(key.trim().to_string())
}

/// Delete API key from both keyring and file
pub fn delete_api_key() -> Result<()> {
    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        let _ = entry.delete_credential();
    }

    let path = api_key_file_path()?;
    if path.exists() {
        fs::remove_file(&path).context("Failed to delete API key file")?;
    }

    Ok(())
}

/// Check if a credential is available from any source
pub fn has_api_key() -> bool {
    if credential_from_env(|name| std::env::var(name).ok()).is_some() {
        return true;
    }

    if let Ok(entry) = keyring::Entry::new(SERVICE_NAME, API_KEY_USERNAME) {
        if entry.get_password().is_ok() {
            return true;
        }
    }

    api_key_file_path().map(|p| p.exists()).unwrap_or(false)
}
