// Config loader: reads `~/.cxrc` into an immutable `Config` value that is
// handed to every later stage. Nothing here touches the network, so a bad
// credential line is always reported before the first request goes out.

use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Base server used for relative paths when no `apiserver` line is present.
pub const DEFAULT_API_SERVER: &str = "https://api.cxense.com";

/// Every API key handed out by the server starts with this marker.
pub const SECRET_PREFIX: &str = "api&";

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CXRC";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please add the line 'authentication <username> <api key>' to {}", .path.display())]
    MissingCredentials { path: PathBuf },

    #[error("Username is not an email address: {0}")]
    InvalidUsername(String),

    #[error("Invalid API key: it must start with 'api&'")]
    InvalidSecret,

    #[error(transparent)]
    Unreadable(#[from] anyhow::Error),
}

/// Username and API key, validated for shape but never checked remotely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: &str, secret: &str) -> Result<Self, ConfigError> {
        if !username.contains('@') {
            return Err(ConfigError::InvalidUsername(username.to_string()));
        }
        if !secret.starts_with(SECRET_PREFIX) {
            return Err(ConfigError::InvalidSecret);
        }
        Ok(Credentials {
            username: username.to_string(),
            secret: secret.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

// The secret must not leak through `{:?}` in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Directives as they appear in the rc file, before validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RcFile {
    pub username: Option<String>,
    pub secret: Option<String>,
    pub apiserver: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl RcFile {
    /// Parse the line-oriented rc format. Unknown directives, wrong field
    /// counts and blank lines are skipped; later lines win.
    pub fn parse(text: &str) -> Self {
        let mut rc = RcFile::default();
        for line in text.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                ["authentication", username, secret] => {
                    rc.username = Some(username.to_string());
                    rc.secret = Some(secret.to_string());
                }
                ["apiserver", url] => rc.apiserver = Some(url.to_string()),
                ["timeout", secs] => match secs.parse::<u64>() {
                    Ok(secs) => rc.timeout_secs = Some(secs),
                    Err(_) => tracing::warn!(value = %secs, "ignoring invalid timeout in config"),
                },
                _ => {}
            }
        }
        rc
    }

    /// Read the rc file at `path`. A file that does not exist reads as empty.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found");
            return Ok(RcFile::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Ok(RcFile::parse(&text))
    }
}

/// Validated configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub apiserver: String,
    /// `None` disables the request timeout.
    pub timeout: Option<Duration>,
}

impl Config {
    /// Load and validate the config at the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        let rc = RcFile::read(&path)?;
        Config::from_rc(rc, &path)
    }

    /// Validate parsed directives. `path` is only used for the error message.
    pub fn from_rc(rc: RcFile, path: &Path) -> Result<Self, ConfigError> {
        let (username, secret) = match (rc.username, rc.secret) {
            (Some(u), Some(s)) => (u, s),
            _ => {
                return Err(ConfigError::MissingCredentials {
                    path: path.to_path_buf(),
                })
            }
        };
        let credentials = Credentials::new(&username, &secret)?;
        let timeout = match rc.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };
        Ok(Config {
            credentials,
            apiserver: rc
                .apiserver
                .unwrap_or_else(|| DEFAULT_API_SERVER.to_string()),
            timeout,
        })
    }

    /// Apply a `--timeout` flag; zero disables the timeout.
    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        match secs {
            Some(0) => self.timeout = None,
            Some(secs) => self.timeout = Some(Duration::from_secs(secs)),
            None => {}
        }
        self
    }
}

/// `$CXRC` if set, otherwise `~/.cxrc`.
pub fn default_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(".cxrc")
}
