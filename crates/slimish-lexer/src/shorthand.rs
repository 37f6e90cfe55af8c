//! Shorthand expansion shared by every token.
//!
//! Two rewrites live here:
//! - value shorthand: `= user.name` becomes `{{ user.name }}`, and an escaped
//!   `\=` becomes a literal `=`;
//! - tag shorthand: `p.intro#main` becomes `p id="main" class="intro"`.
//!
//! Both are total: input that matches no pattern comes back unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::Delimiters;

/// `=`, optional whitespace, then a non-whitespace run.
static DYNAMIC_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\s*(\S+)").expect("dynamic value pattern is valid"));

/// A backslash-escaped `=`, whitespace allowed between the two.
static ESCAPED_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\\s*=").expect("escaped value pattern is valid"));

static ID_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#([^#.]*)").expect("id pattern is valid"));

static CLASS_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.([^#.]*)").expect("class pattern is valid"));

/// Substitute `=value` shorthand with a Jinja output tag, then unescape `\=`.
///
/// The two passes run in this order. A match whose `=` follows a backslash
/// (whitespace allowed in between) is left for the unescape pass, so an
/// escaped `\=` is never treated as a dynamic marker. Whitespace in front of
/// the `=` is kept.
///
/// `"Hello = name"` → `"Hello {{ name }}"`, `"a \= b"` → `"a = b"`.
pub fn substitute_values(text: &str, delims: &Delimiters) -> String {
    let substituted = DYNAMIC_VALUE.replace_all(text, |caps: &Captures| {
        let whole = &caps[0];
        let start = caps.get(0).map_or(0, |m| m.start());
        if text[..start].trim_end().ends_with('\\') {
            return whole.to_string();
        }
        format!(
            "{} {} {}",
            delims.variable_start_string, &caps[1], delims.variable_end_string
        )
    });
    ESCAPED_VALUE.replace_all(&substituted, "=").into_owned()
}

/// Expand CSS-selector tag shorthand into `(short_name, full_name)`.
///
/// `short_name` is the bare element name used for closing tags; `full_name`
/// carries the `id` and then the `class` attribute. A shorthand that starts
/// with `.` or `#` names a `div`. Every `.class` segment is collected in
/// order; only the first `#id` segment is used.
///
/// ```
/// use slimish_lexer::shorthand::expand_tag_name;
///
/// let (short, full) = expand_tag_name("p.intro#main");
/// assert_eq!(short, "p");
/// assert_eq!(full, "p id=\"main\" class=\"intro\"");
/// ```
pub fn expand_tag_name(raw_tag_name: &str) -> (String, String) {
    let raw = raw_tag_name.trim();
    let Some(first_marker) = raw.find(['#', '.']) else {
        return (raw.to_string(), raw.to_string());
    };

    let short_name = if first_marker == 0 {
        "div".to_string()
    } else {
        raw[..first_marker].trim().to_string()
    };

    let mut full_name = short_name.clone();
    if let Some(id) = ID_SEGMENT.captures(raw) {
        full_name.push_str(&format!(" id=\"{}\"", &id[1]));
    }

    let classes: Vec<&str> = CLASS_SEGMENT
        .captures_iter(raw)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();
    if !classes.is_empty() {
        full_name.push_str(&format!(" class=\"{}\"", classes.join(" ")));
    }

    (short_name, full_name)
}
