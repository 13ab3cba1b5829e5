use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Content repository
    pub github_owner: String,
    pub github_repo: String,
    pub github_token: String,
    /// Branch used only to build public raw-content URLs for uploaded images.
    pub github_branch: String,
    /// API base URL, overridable for tests.
    pub github_api_url: String,

    // Admin gate
    pub admin_password: Option<String>,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            github_owner: required_env("GITHUB_OWNER")?,
            github_repo: required_env("GITHUB_REPO")?,
            github_token: required_env("GITHUB_TOKEN")?,
            github_branch: env_or_default("GITHUB_REPO_BRANCH", "main"),
            github_api_url: env_or_default("GITHUB_API_URL", "https://api.github.com"),
            admin_password: optional_env("ADMIN_PASSWORD"),
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github_owner.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "GITHUB_OWNER".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.github_repo.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "GITHUB_REPO".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.github_token.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "GITHUB_TOKEN".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        if self.github_api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "GITHUB_API_URL".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration pointing at a placeholder repository, for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            github_owner: "test-owner".to_string(),
            github_repo: "test-repo".to_string(),
            github_token: "test-token".to_string(),
            github_branch: "main".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            admin_password: Some("test-password".to_string()),
            web_host: "127.0.0.1".to_string(),
            web_port: 8080,
        }
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
