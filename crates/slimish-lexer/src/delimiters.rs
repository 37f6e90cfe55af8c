//! Delimiter configuration for the target Jinja environment.
//!
//! A `Delimiters` value is threaded by reference through token construction
//! (where `=expr` shorthand is substituted) and through rendering. There is no
//! process-wide state: documents that need different delimiters use separate
//! `Delimiters` values. A token built under one configuration and rendered
//! under another carries both sets of delimiters in its output.

use serde::Deserialize;

use crate::TokenError;

/// The four delimiter keys a Jinja environment recognizes.
pub const DELIMITER_KEYS: &[&str] = &[
    "block_start_string",
    "block_end_string",
    "variable_start_string",
    "variable_end_string",
];

/// Literal delimiter strings used when substituting and rendering tokens.
///
/// Values are not validated; empty or ambiguous delimiters are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Delimiters {
    pub block_start_string: String,
    pub block_end_string: String,
    pub variable_start_string: String,
    pub variable_end_string: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            block_start_string: "{%".into(),
            block_end_string: "%}".into(),
            variable_start_string: "{{".into(),
            variable_end_string: "}}".into(),
        }
    }
}

impl Delimiters {
    /// Parse a TOML document holding any subset of the four keys.
    /// Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, TokenError> {
        toml::from_str(source).map_err(|e| TokenError::Config {
            message: e.message().to_string(),
        })
    }

    /// Look up a delimiter by its symbolic name.
    pub fn get(&self, key: &str) -> Result<&str, TokenError> {
        match key {
            "block_start_string" => Ok(&self.block_start_string),
            "block_end_string" => Ok(&self.block_end_string),
            "variable_start_string" => Ok(&self.variable_start_string),
            "variable_end_string" => Ok(&self.variable_end_string),
            _ => Err(TokenError::UnknownDelimiter { key: key.into() }),
        }
    }

    /// Override a delimiter by its symbolic name.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), TokenError> {
        let slot = match key {
            "block_start_string" => &mut self.block_start_string,
            "block_end_string" => &mut self.block_end_string,
            "variable_start_string" => &mut self.variable_start_string,
            "variable_end_string" => &mut self.variable_end_string,
            _ => return Err(TokenError::UnknownDelimiter { key: key.into() }),
        };
        *slot = value.into();
        log::debug!("delimiter {key} set to {slot:?}");
        Ok(())
    }
}
