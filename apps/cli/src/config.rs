use anyhow::Context;
use goalpath_storage_remote::RemoteConfig;

pub const EMAIL_VAR: &str = "GOALPATH_EMAIL";
pub const PASSWORD_VAR: &str = "GOALPATH_PASSWORD";
pub const REFRESH_TOKEN_VAR: &str = "GOALPATH_REFRESH_TOKEN";

/// How the CLI signs in before running a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Credentials {
    Password { email: String, password: String },
    RefreshToken(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub remote: RemoteConfig,
    pub credentials: Option<Credentials>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote = RemoteConfig::from_lookup(&lookup).context("Invalid backend settings")?;
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // A stored refresh token wins over a password.
        let credentials = match (read(REFRESH_TOKEN_VAR), read(EMAIL_VAR), read(PASSWORD_VAR)) {
            (Some(token), _, _) => Some(Credentials::RefreshToken(token)),
            (None, Some(email), Some(password)) => Some(Credentials::Password { email, password }),
            (None, Some(_), None) => anyhow::bail!("{} is set but {} is not", EMAIL_VAR, PASSWORD_VAR),
            _ => None,
        };

        Ok(Self {
            remote,
            credentials,
        })
    }
}
