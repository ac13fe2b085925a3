//! Environment variable substitution

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use restbridge_core::RestError;

/// Placeholder syntax: {{ env.VAR_NAME }}
static ENV_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*env\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap()
});

/// Replaces `{{ env.VAR }}` placeholders in configuration text
pub struct EnvSubstitutor {
    /// Fail on missing variables instead of leaving the placeholder
    strict: bool,
}

impl EnvSubstitutor {
    /// Strict substitutor: any missing variable is an error
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Lenient substitutor: missing variables keep their placeholder
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Substitute placeholders, loading `.env` first when present
    pub fn substitute(&self, content: &str) -> Result<String, RestError> {
        let _ = dotenvy::dotenv();

        let mut missing: Vec<String> = Vec::new();
        let result = ENV_PATTERN.replace_all(content, |cap: &Captures| {
            let name = &cap[1];
            match std::env::var(name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing.iter().any(|m| m == name) {
                        missing.push(name.to_string());
                    }
                    cap[0].to_string()
                }
            }
        });

        if self.strict && !missing.is_empty() {
            return Err(RestError::EnvVarNotFound(missing.join(", ")));
        }

        Ok(result.into_owned())
    }

    /// Check if a string contains placeholders
    pub fn has_placeholders(content: &str) -> bool {
        ENV_PATTERN.is_match(content)
    }

    /// Names of all referenced variables, in order of appearance
    pub fn extract_var_names(content: &str) -> Vec<String> {
        ENV_PATTERN
            .captures_iter(content)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}

impl Default for EnvSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}
