//! Secret resolution: one file per secret in a secrets directory, with
//! `VIGIL_*` environment variables as the fallback.

use std::{fs, io, path::Path, path::PathBuf};

use thiserror::Error;

/// Secret names known to the service.
pub const ALERT_WEBHOOK_URL: &str = "alert_webhook_url";

#[derive(Debug, Error)]
pub enum SecretError {
    #[error("required secret '{name}' not found in {dir} or VIGIL_{env_key}")]
    Missing {
        name: String,
        dir: PathBuf,
        env_key: String,
    },
    #[error("failed to read secret file {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Reads secrets from a directory, falling back to the environment.
pub struct SecretStore {
    dir: PathBuf,
}

impl SecretStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Look up an optional secret. File contents win over the environment;
    /// trailing whitespace is trimmed.
    pub fn get(&self, name: &str) -> Result<Option<String>, SecretError> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim_end().to_string();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed))
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Ok(std::env::var(format!("VIGIL_{}", name.to_uppercase()))
                    .ok()
                    .filter(|v| !v.is_empty()))
            }
            Err(source) => Err(SecretError::Io { path, source }),
        }
    }

    /// Look up a secret that must be present; startup refuses without it.
    pub fn require(&self, name: &str) -> Result<String, SecretError> {
        self.get(name)?.ok_or_else(|| SecretError::Missing {
            name: name.to_string(),
            dir: self.dir.clone(),
            env_key: name.to_uppercase(),
        })
    }
}
