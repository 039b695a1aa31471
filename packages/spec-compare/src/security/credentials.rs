//! API keys for the search and model services.
//!
//! Keys are wrapped in `secrecy` boxes and render as `[REDACTED]`, so
//! they never show up in `tracing` fields or error messages.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{CompareError, Result};

const REDACTED: &str = "[REDACTED]";

/// An API key that refuses to print itself.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(value.into().into_boxed_str()))
    }

    /// Read a key from the environment.
    ///
    /// Unset and blank variables are both configuration errors; surrounding
    /// whitespace (a common `.env` copy-paste artifact) is trimmed.
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var)
            .map_err(|_| CompareError::Config(format!("{} not set", var)))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(CompareError::Config(format!("{} is empty", var)));
        }
        Ok(Self::new(value))
    }

    /// The raw key, for building a request header or body.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}
