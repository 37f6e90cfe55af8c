//! Token stream emitter.
//!
//! Writes every content token on its own line. `Indent` tokens push their
//! spacer onto the running indentation and `Unindent` tokens pop it again,
//! so nesting in the output mirrors nesting in the source.

use slimish_lexer::{Delimiters, IndentKind, Token};

/// Render a token stream into output text.
pub fn emit(tokens: &[Token], delims: &Delimiters) -> String {
    let mut out = String::new();
    let mut indent = String::new();

    for token in tokens {
        match token {
            Token::Indent(marker) => match marker.kind {
                IndentKind::Indent => indent.push_str(&marker.render()),
                IndentKind::Unindent => {
                    let spacer = marker.render();
                    if indent.ends_with(&spacer) {
                        indent.truncate(indent.len() - spacer.len());
                    } else {
                        log::warn!(
                            "line {}: unindent {:?} does not match indentation {:?}",
                            marker.lineno,
                            spacer,
                            indent
                        );
                        indent.clear();
                    }
                }
            },
            _ => {
                out.push_str(&indent);
                out.push_str(&token.render(delims));
                out.push('\n');
            }
        }
    }

    log::debug!("emitted {} bytes from {} tokens", out.len(), tokens.len());
    out
}
