use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "gex-cli";
const TOKEN_FILE: &str = "token";

/// Raised when a command needs a token and none has been saved yet.
#[derive(Debug, thiserror::Error)]
#[error("no GitHub token configured. Run `gex-cli --save-token` first")]
pub struct NotConfigured;

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);
        Ok(Self {
            path: config_dir.join(TOKEN_FILE),
        })
    }

    #[cfg(test)]
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(&self.path, token)
            .with_context(|| format!("Failed to write token file: {}", self.path.display()))?;

        // The token is plaintext at rest; keep it readable by the owner only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600)).with_context(
                || format!("Failed to restrict token file: {}", self.path.display()),
            )?;
        }

        Ok(())
    }

    pub fn load(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(token) => Ok(token.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(NotConfigured.into()),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to read token file: {}", self.path.display())
            }),
        }
    }
}
