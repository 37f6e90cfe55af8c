//! slimish Lexer
//!
//! Turns indentation-based slimish source into a flat stream of tokens, each of
//! which renders itself back to HTML markup or a Jinja block/output tag.
//! Handles indentation tracking, CSS-selector tag shorthand (`p.intro#main`),
//! the `=expr` value shorthand, and block-tag pairing (`for`/`else`, `if`/`elif`).
//!
//! # Example
//!
//! ```
//! use slimish_lexer::{Delimiters, Scanner};
//!
//! let delims = Delimiters::default();
//! let tokens = Scanner::tokenize("p.intro Hello = name", &delims).unwrap();
//! assert_eq!(
//!     tokens[0].render(&delims),
//!     "<p class=\"intro\">Hello {{ name }}</p>"
//! );
//! ```

pub mod delimiters;
pub mod scanner;
pub mod shorthand;
pub mod token;

pub use delimiters::{Delimiters, DELIMITER_KEYS};
pub use scanner::Scanner;
pub use token::{
    HtmlKind, HtmlTag, IndentKind, IndentToken, JinjaKind, JinjaOutputToken, JinjaToken,
    TextToken, Token, TokenType,
};

/// Scanner error with the offending source line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Scan error at line {line}: {message}")]
pub struct ScanError {
    pub message: String,
    pub line: usize,
}

/// Errors raised by the token model and the delimiter configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenError {
    /// The opener of a `closes` check has no continuation keyword in the pair table.
    #[error("block tag '{tag}' has no continuation keyword")]
    UnpairedTag { tag: String },

    #[error("unknown delimiter key '{key}'")]
    UnknownDelimiter { key: String },

    #[error("invalid delimiter config: {message}")]
    Config { message: String },
}
