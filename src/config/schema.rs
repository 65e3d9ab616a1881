//! Declarative environment schema.
//!
//! Every recognised variable is described once as data (name, presence, rule)
//! and the whole table is evaluated in a single pass so that all violations are
//! reported together instead of failing on the first one.

use std::collections::HashMap;
use std::str::FromStr;

use validator::{ValidateEmail, ValidateUrl};

/// Whether a variable must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Falls back to the given value when unset or empty.
    Default(&'static str),
}

/// Validation rule applied to a present value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Text,
    OneOf(&'static [&'static str]),
    Port,
    Bool,
    Url,
    Email,
    MinLength(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub presence: Presence,
    pub rule: Rule,
}

const fn field(name: &'static str, presence: Presence, rule: Rule) -> FieldSpec {
    FieldSpec {
        name,
        presence,
        rule,
    }
}

pub const ENVIRONMENTS: &[&str] = &["development", "production", "test"];

/// Minimum length accepted for the auth signing secret.
pub const MIN_SECRET_LENGTH: usize = 32;

pub const ENV_SCHEMA: &[FieldSpec] = &[
    field("NODE_ENV", Presence::Default("development"), Rule::OneOf(ENVIRONMENTS)),
    field("PORT", Presence::Default("9000"), Rule::Port),
    // Database
    field("DATABASE_URL", Presence::Required, Rule::Text),
    field("DIRECT_URL", Presence::Optional, Rule::Text),
    // Auth
    field("BETTER_AUTH_URL", Presence::Required, Rule::Url),
    field("BETTER_AUTH_SECRET", Presence::Required, Rule::MinLength(MIN_SECRET_LENGTH)),
    // OAuth providers
    field("GOOGLE_CLIENT_ID", Presence::Optional, Rule::Text),
    field("GOOGLE_CLIENT_SECRET", Presence::Optional, Rule::Text),
    field("GITHUB_CLIENT_ID", Presence::Optional, Rule::Text),
    field("GITHUB_CLIENT_SECRET", Presence::Optional, Rule::Text),
    // Email
    field("SMTP_HOST", Presence::Optional, Rule::Text),
    field("SMTP_PORT", Presence::Optional, Rule::Port),
    field("SMTP_SECURE", Presence::Optional, Rule::Bool),
    field("SMTP_USER", Presence::Optional, Rule::Text),
    field("SMTP_PASS", Presence::Optional, Rule::Text),
    field("EMAIL_FROM", Presence::Optional, Rule::Email),
];

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct Violation {
    pub field: &'static str,
    pub reason: String,
}

impl Violation {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Values that passed the schema, defaults already applied.
#[derive(Debug, Clone, Default)]
pub struct ValidatedEnv {
    values: HashMap<&'static str, String>,
}

impl ValidatedEnv {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn required(&self, name: &'static str) -> Result<&str, Violation> {
        self.get(name).ok_or_else(|| Violation::new(name, "Required"))
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.get(name).map(str::to_owned)
    }

    /// Parse a value that the schema has already checked.
    pub fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, Violation>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| raw.parse::<T>().map_err(|e| Violation::new(name, e.to_string())))
            .transpose()
    }
}

/// Evaluate `schema` against `lookup`, collecting every violation.
pub fn evaluate<F>(schema: &[FieldSpec], lookup: F) -> Result<ValidatedEnv, Vec<Violation>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = ValidatedEnv::default();
    let mut violations = Vec::new();

    for spec in schema {
        let raw = lookup(spec.name).filter(|value| !value.trim().is_empty());
        let value = match (raw, spec.presence) {
            (Some(value), _) => value,
            (None, Presence::Default(default)) => default.to_string(),
            (None, Presence::Optional) => continue,
            (None, Presence::Required) => {
                violations.push(Violation::new(spec.name, "Required"));
                continue;
            }
        };

        match check(spec.rule, &value) {
            Ok(()) => {
                env.values.insert(spec.name, value);
            }
            Err(reason) => violations.push(Violation::new(spec.name, reason)),
        }
    }

    if violations.is_empty() {
        Ok(env)
    } else {
        Err(violations)
    }
}

fn check(rule: Rule, value: &str) -> Result<(), String> {
    match rule {
        Rule::Text => Ok(()),
        Rule::OneOf(allowed) => {
            if allowed.contains(&value) {
                Ok(())
            } else {
                let expected = allowed
                    .iter()
                    .map(|v| format!("'{}'", v))
                    .collect::<Vec<_>>()
                    .join(" | ");
                Err(format!(
                    "Invalid enum value. Expected {}, received '{}'",
                    expected, value
                ))
            }
        }
        Rule::Port => value
            .parse::<u16>()
            .map(|_| ())
            .map_err(|_| format!("Expected a port number (0-65535), received '{}'", value)),
        Rule::Bool => parse_bool(value)
            .map(|_| ())
            .ok_or_else(|| format!("Expected a boolean, received '{}'", value)),
        Rule::Url => {
            // Url::parse alone accepts things like "localhost:3000" (scheme "localhost").
            let has_host = url::Url::parse(value)
                .map(|u| u.has_host())
                .unwrap_or(false);
            if value.validate_url() && has_host {
                Ok(())
            } else {
                Err("Invalid url".to_string())
            }
        }
        Rule::Email => {
            if value.validate_email() {
                Ok(())
            } else {
                Err("Invalid email".to_string())
            }
        }
        Rule::MinLength(min) => {
            if value.chars().count() >= min {
                Ok(())
            } else {
                Err(format!("String must contain at least {} character(s)", min))
            }
        }
    }
}

/// Accepts the spellings commonly used for boolean env flags.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
