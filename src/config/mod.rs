use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub mod schema;
pub use schema::{Violation, ENV_SCHEMA};

/// Runtime mode selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Environment::Development),
            "production" => Ok(Environment::Production),
            "test" => Ok(Environment::Test),
            other => Err(format!("unknown environment '{}'", other)),
        }
    }
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OAuthProvider::Google => f.write_str("google"),
            OAuthProvider::GitHub => f.write_str("github"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
}

impl OAuthCredentials {
    pub fn is_complete(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Exactly one half of the pair is set.
    pub fn is_partial(&self) -> bool {
        self.client_id.is_some() != self.client_secret.is_some()
    }
}

/// Outbound e-mail settings. Every field is optional; e-mail is simply
/// disabled when the host or sender address is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_secure: Option<bool>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<Secret>,
    pub from_address: Option<String>,
}

impl EmailConfig {
    pub fn is_enabled(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub port: u16,
    pub database_url: String,
    /// Direct (non-pooled) connection string, used by schema tooling.
    pub direct_url: Option<String>,
    pub auth_url: Url,
    pub auth_secret: Secret,
    pub google: OAuthCredentials,
    pub github: OAuthCredentials,
    pub email: EmailConfig,
}

/// Configuration could not be built; carries every offending field.
#[derive(Debug, Clone, Error)]
#[error("invalid environment variables: {}", summary(.0))]
pub struct ConfigError(pub Vec<Violation>);

fn summary(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.field)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ConfigError {
    pub fn violations(&self) -> &[Violation] {
        &self.0
    }

    /// Operator-facing diagnostic, one line per violation.
    pub fn report(&self) -> String {
        let mut out = String::from("❌ Invalid environment variables:");
        for violation in &self.0 {
            out.push_str(&format!("\n  - {}: {}", violation.field, violation.reason));
        }
        out
    }
}

impl From<Violation> for ConfigError {
    fn from(violation: Violation) -> Self {
        ConfigError(vec![violation])
    }
}

impl From<Vec<Violation>> for ConfigError {
    fn from(violations: Vec<Violation>) -> Self {
        ConfigError(violations)
    }
}

impl Config {
    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = schema::evaluate(ENV_SCHEMA, lookup)?;

        let auth_url = Url::parse(env.required("BETTER_AUTH_URL")?)
            .map_err(|e| Violation::new("BETTER_AUTH_URL", e.to_string()))?;

        Ok(Config {
            environment: env.parsed("NODE_ENV")?.unwrap_or_default(),
            port: env.parsed("PORT")?.unwrap_or(9000),
            database_url: env.required("DATABASE_URL")?.to_string(),
            direct_url: env.owned("DIRECT_URL"),
            auth_url,
            auth_secret: Secret::new(env.required("BETTER_AUTH_SECRET")?),
            google: OAuthCredentials {
                client_id: env.owned("GOOGLE_CLIENT_ID"),
                client_secret: env.owned("GOOGLE_CLIENT_SECRET").map(Secret::new),
            },
            github: OAuthCredentials {
                client_id: env.owned("GITHUB_CLIENT_ID"),
                client_secret: env.owned("GITHUB_CLIENT_SECRET").map(Secret::new),
            },
            email: EmailConfig {
                smtp_host: env.owned("SMTP_HOST"),
                smtp_port: env.parsed("SMTP_PORT")?,
                smtp_secure: env.get("SMTP_SECURE").and_then(schema::parse_bool),
                smtp_user: env.owned("SMTP_USER"),
                smtp_password: env.owned("SMTP_PASS").map(Secret::new),
                from_address: env.owned("EMAIL_FROM"),
            },
        })
    }

    /// Browser origin (`scheme://host[:port]`) of the public auth URL.
    pub fn allowed_origin(&self) -> String {
        self.auth_url.origin().ascii_serialization()
    }

    /// Providers with both client id and secret configured.
    pub fn oauth_providers(&self) -> Vec<OAuthProvider> {
        [
            (OAuthProvider::Google, &self.google),
            (OAuthProvider::GitHub, &self.github),
        ]
        .into_iter()
        .filter(|(_, creds)| creds.is_complete())
        .map(|(provider, _)| provider)
        .collect()
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}
