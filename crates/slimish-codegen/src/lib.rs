//! slimish Code Generator
//!
//! Compiles slimish source into HTML interleaved with Jinja tags. The
//! scanner produces a flat token stream; the emitter renders each token on
//! its own line, indented by the spacers the stream's `Indent` tokens carry.
//!
//! ```text
//! source → Scanner::tokenize() → Vec<Token> → html::emit() → String
//! ```

pub mod html;

use slimish_lexer::{Delimiters, ScanError, Scanner};

/// Code generation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Compile slimish source into template text using the given delimiters.
pub fn compile(source: &str, delims: &Delimiters) -> Result<String, CodegenError> {
    let tokens = Scanner::tokenize(source, delims)?;
    Ok(html::emit(&tokens, delims))
}
