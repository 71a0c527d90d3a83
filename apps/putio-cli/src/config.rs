//! CLI configuration.
//!
//! Stored as TOML at `$XDG_CONFIG_HOME/putio/cli.toml`, falling back to
//! `~/.config/putio/cli.toml`:
//!
//! ```toml
//! token = "..."
//!
//! [client]
//! timeout_secs = 60
//! ```

use std::path::{Path, PathBuf};

use putio::ClientConfig;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "PUTIO_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OAuth token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Loads the config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Holds the token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Token to use: `PUTIO_TOKEN` wins over the stored one.
    pub fn token(&self) -> Option<String> {
        resolve_token(self.token.as_deref(), std::env::var(TOKEN_ENV).ok().as_deref())
    }
}

fn resolve_token(stored: Option<&str>, env: Option<&str>) -> Option<String> {
    env.filter(|t| !t.is_empty())
        .or(stored.filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// Returns the default configuration file path.
pub fn default_path() -> anyhow::Result<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = std::env::var_os("HOME")
                .ok_or_else(|| anyhow::anyhow!("neither XDG_CONFIG_HOME nor HOME is set"))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(base.join("putio").join("cli.toml"))
}
