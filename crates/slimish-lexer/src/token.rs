use crate::shorthand::{expand_tag_name, substitute_values};
use crate::{Delimiters, TokenError};

/// HTML elements rendered as a single self-closing tag.
pub const NO_CONTENT_HTML_TAGS: &[&str] = &["br", "img", "link", "hr", "meta", "input"];

/// Block tags that never open a body and so never get an `end` tag.
pub const NO_CONTENT_JINJA_TAGS: &[&str] = &[
    "include", "extends", "import", "set", "from", "do", "break", "continue",
];

/// Opening block keyword → the keyword that continues its body.
pub const TAG_PAIRS: &[(&str, &str)] = &[("for", "else"), ("if", "elif")];

/// Flat token classification, one entry per token variant and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    HtmlTag,
    HtmlNcTag,
    HtmlTagOpen,
    HtmlTagClose,
    Indent,
    Unindent,
    Text,
    JinjaOpenTag,
    JinjaCloseTag,
    JinjaNcTag,
    JinjaOutputTag,
}

/// A token produced from one line (or line fragment) of slimish source.
///
/// Tokens are immutable once built and render independently of each other.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Html(HtmlTag),
    Indent(IndentToken),
    Text(TextToken),
    Jinja(JinjaToken),
    JinjaOutput(JinjaOutputToken),
}

impl Token {
    pub fn token_type(&self) -> TokenType {
        match self {
            Token::Html(t) => match t.kind {
                HtmlKind::Inline => TokenType::HtmlTag,
                HtmlKind::SelfClosing => TokenType::HtmlNcTag,
                HtmlKind::Open => TokenType::HtmlTagOpen,
                HtmlKind::Close => TokenType::HtmlTagClose,
            },
            Token::Indent(t) => match t.kind {
                IndentKind::Indent => TokenType::Indent,
                IndentKind::Unindent => TokenType::Unindent,
            },
            Token::Text(_) => TokenType::Text,
            Token::Jinja(t) => match t.kind {
                JinjaKind::Open => TokenType::JinjaOpenTag,
                JinjaKind::Close => TokenType::JinjaCloseTag,
                JinjaKind::SelfClosing => TokenType::JinjaNcTag,
            },
            Token::JinjaOutput(_) => TokenType::JinjaOutputTag,
        }
    }

    /// 1-based source line the token came from.
    pub fn lineno(&self) -> usize {
        match self {
            Token::Html(t) => t.lineno,
            Token::Indent(t) => t.lineno,
            Token::Text(t) => t.lineno,
            Token::Jinja(t) => t.lineno,
            Token::JinjaOutput(t) => t.lineno,
        }
    }

    /// Render the token as output text.
    pub fn render(&self, delims: &Delimiters) -> String {
        match self {
            Token::Html(t) => t.render(),
            Token::Indent(t) => t.render(),
            Token::Text(t) => t.render(),
            Token::Jinja(t) => t.render(delims),
            Token::JinjaOutput(t) => t.render(delims),
        }
    }
}

// ---------------------------------------------------------------------------
// HTML tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlKind {
    /// Opening tag whose body follows on indented lines.
    Open,
    Close,
    SelfClosing,
    /// Opening tag, inline content and closing tag on one line.
    Inline,
}

/// An HTML element tag.
///
/// `tag_name` and `full_tag_name` come from the tag shorthand, and the
/// attribute string is built once, at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTag {
    pub kind: HtmlKind,
    pub lineno: usize,
    /// Bare element name, used for the closing tag.
    pub tag_name: String,
    /// Element name followed by the `id`/`class` attributes from the shorthand.
    pub full_tag_name: String,
    /// Pre-rendered ` key="value"` pairs.
    pub attribs: String,
    pub contents: Option<String>,
}

impl HtmlTag {
    /// Build an HTML tag token.
    ///
    /// `contents` is the raw remainder of the line, separator included: its
    /// first character is dropped before `=value` substitution. Attribute
    /// values are substituted too and keep their given order.
    pub fn new(
        kind: HtmlKind,
        lineno: usize,
        raw_tag_name: &str,
        attribs: &[(String, String)],
        contents: Option<&str>,
        delims: &Delimiters,
    ) -> Self {
        let (tag_name, full_tag_name) = expand_tag_name(raw_tag_name);
        let attribs = attribs.iter().fold(String::new(), |acc, (key, value)| {
            format!("{acc} {key}=\"{}\"", substitute_values(value, delims))
        });
        let contents = contents.map(|c| substitute_values(skip_separator(c), delims));

        Self {
            kind,
            lineno,
            tag_name,
            full_tag_name,
            attribs,
            contents,
        }
    }

    /// The closing tag matching this one.
    pub fn closing(&self, lineno: usize) -> Self {
        Self {
            kind: HtmlKind::Close,
            lineno,
            tag_name: self.tag_name.clone(),
            full_tag_name: self.tag_name.clone(),
            attribs: String::new(),
            contents: None,
        }
    }

    pub fn is_no_content(tag_name: &str) -> bool {
        NO_CONTENT_HTML_TAGS.contains(&tag_name)
    }

    pub fn render(&self) -> String {
        match self.kind {
            HtmlKind::Close => format!("</{}>", self.tag_name),
            HtmlKind::SelfClosing => format!("<{}{}/>", self.full_tag_name, self.attribs),
            HtmlKind::Inline => format!(
                "<{}{}>{}</{}>",
                self.full_tag_name,
                self.attribs,
                self.contents.as_deref().unwrap_or_default(),
                self.tag_name
            ),
            HtmlKind::Open => format!("<{}{}>", self.full_tag_name, self.attribs),
        }
    }
}

fn skip_separator(contents: &str) -> &str {
    let mut chars = contents.chars();
    chars.next();
    chars.as_str()
}

// ---------------------------------------------------------------------------
// Indentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentKind {
    Indent,
    Unindent,
}

/// Structural marker: the emitter adds (`Indent`) or removes (`Unindent`)
/// `spacer` from its running indentation.
#[derive(Debug, Clone, PartialEq)]
pub struct IndentToken {
    pub kind: IndentKind,
    pub lineno: usize,
    pub spacer: String,
}

impl IndentToken {
    pub fn new(kind: IndentKind, lineno: usize, spacer: impl Into<String>) -> Self {
        Self {
            kind,
            lineno,
            spacer: spacer.into(),
        }
    }

    pub fn render(&self) -> String {
        self.spacer.clone()
    }
}

// ---------------------------------------------------------------------------
// Text
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub lineno: usize,
    pub text: String,
}

impl TextToken {
    pub fn new(lineno: usize, text: &str, delims: &Delimiters) -> Self {
        Self {
            lineno,
            text: substitute_values(text, delims),
        }
    }

    pub fn render(&self) -> String {
        self.text.clone()
    }
}

// ---------------------------------------------------------------------------
// Jinja block tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JinjaKind {
    Open,
    Close,
    SelfClosing,
}

/// A Jinja block tag such as `{% for x in items %}` or `{% endfor %}`.
#[derive(Debug, Clone, PartialEq)]
pub struct JinjaToken {
    pub kind: JinjaKind,
    pub lineno: usize,
    /// Leading keyword of the directive, trimmed.
    pub tag_name: String,
    /// The directive as written, rendered verbatim for open and self-closing tags.
    pub full_line: String,
}

impl JinjaToken {
    pub fn new(kind: JinjaKind, lineno: usize, tag_name: &str, full_line: &str) -> Self {
        Self {
            kind,
            lineno,
            tag_name: tag_name.trim().to_string(),
            full_line: full_line.to_string(),
        }
    }

    /// The `end<tag>` token closing this block.
    pub fn closing(&self, lineno: usize) -> Self {
        Self {
            kind: JinjaKind::Close,
            lineno,
            tag_name: self.tag_name.clone(),
            full_line: format!("end{}", self.tag_name),
        }
    }

    pub fn is_no_content(tag_name: &str) -> bool {
        NO_CONTENT_JINJA_TAGS.contains(&tag_name.trim())
    }

    /// The block name a closing keyword ends: `endfor` → `for`.
    pub fn ended_tag(keyword: &str) -> Option<&str> {
        keyword.trim().strip_prefix("end").filter(|name| !name.is_empty())
    }

    /// The keyword that continues a block opened by `tag_name`, if any.
    pub fn continuation(tag_name: &str) -> Option<&'static str> {
        let tag_name = tag_name.trim();
        TAG_PAIRS
            .iter()
            .find(|(opener, _)| *opener == tag_name)
            .map(|(_, next)| *next)
    }

    /// Whether this tag is the continuation keyword of `opener` (`else` for a
    /// `for`, `elif` for an `if`).
    ///
    /// The pair table is keyed by the opener's name; an opener with no entry
    /// is an error rather than `false`.
    pub fn closes(&self, opener: &JinjaToken) -> Result<bool, TokenError> {
        let expected =
            Self::continuation(&opener.tag_name).ok_or_else(|| TokenError::UnpairedTag {
                tag: opener.tag_name.clone(),
            })?;
        Ok(expected == self.tag_name.trim())
    }

    pub fn render(&self, delims: &Delimiters) -> String {
        match self.kind {
            JinjaKind::Close => format!(
                "{} end{} {}",
                delims.block_start_string, self.tag_name, delims.block_end_string
            ),
            JinjaKind::Open | JinjaKind::SelfClosing => format!(
                "{} {} {}",
                delims.block_start_string, self.full_line, delims.block_end_string
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Jinja output tags
// ---------------------------------------------------------------------------

/// A Jinja expression tag, `{{ expr }}`.
#[derive(Debug, Clone, PartialEq)]
pub struct JinjaOutputToken {
    pub lineno: usize,
    pub contents: String,
}

impl JinjaOutputToken {
    pub fn new(lineno: usize, contents: &str, delims: &Delimiters) -> Self {
        Self {
            lineno,
            contents: substitute_values(contents, delims),
        }
    }

    pub fn render(&self, delims: &Delimiters) -> String {
        format!(
            "{} {} {}",
            delims.variable_start_string, self.contents, delims.variable_end_string
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d() -> Delimiters {
        Delimiters::default()
    }

    fn html(kind: HtmlKind, tag: &str) -> HtmlTag {
        HtmlTag::new(kind, 1, tag, &[], None, &d())
    }

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn jinja(kind: JinjaKind, tag: &str, line: &str) -> JinjaToken {
        JinjaToken::new(kind, 1, tag, line)
    }

    // =========================================================================
    // HtmlTag
    // =========================================================================

    #[test]
    fn test_html_open_with_shorthand() {
        assert_eq!(
            html(HtmlKind::Open, "div.box#main").render(),
            "<div id=\"main\" class=\"box\">"
        );
    }

    #[test]
    fn test_html_close_uses_short_name() {
        assert_eq!(html(HtmlKind::Close, "div.box#main").render(), "</div>");
    }

    #[test]
    fn test_html_self_closing_with_attribute() {
        let tag = HtmlTag::new(
            HtmlKind::SelfClosing,
            3,
            "img",
            &attrs(&[("src", "=x")]),
            None,
            &d(),
        );
        assert_eq!(tag.render(), "<img src=\"{{ x }}\"/>");
    }

    #[test]
    fn test_html_attributes_keep_order() {
        let tag = HtmlTag::new(
            HtmlKind::Open,
            1,
            "a.nav",
            &attrs(&[("href", "/home"), ("title", "Home"), ("data-id", "= page.id")]),
            None,
            &d(),
        );
        assert_eq!(
            tag.render(),
            "<a class=\"nav\" href=\"/home\" title=\"Home\" data-id=\"{{ page.id }}\">"
        );
    }

    #[test]
    fn test_html_inline_drops_separator_and_substitutes() {
        let tag = HtmlTag::new(HtmlKind::Inline, 1, "p.intro", &[], Some(" Hi = name"), &d());
        assert_eq!(tag.contents.as_deref(), Some("Hi {{ name }}"));
        assert_eq!(tag.render(), "<p class=\"intro\">Hi {{ name }}</p>");
    }

    #[test]
    fn test_html_inline_without_contents() {
        assert_eq!(html(HtmlKind::Inline, "span").render(), "<span></span>");
    }

    #[test]
    fn test_html_closing_from_open() {
        let open = html(HtmlKind::Open, "ul#menu.nav");
        let close = open.closing(9);
        assert_eq!(close.lineno, 9);
        assert_eq!(close.render(), "</ul>");
    }

    #[test]
    fn test_html_no_content_set() {
        for tag in ["br", "img", "link", "hr", "meta", "input"] {
            assert!(HtmlTag::is_no_content(tag), "{tag}");
        }
        assert!(!HtmlTag::is_no_content("div"));
    }

    // =========================================================================
    // Indent / Text / Output
    // =========================================================================

    #[test]
    fn test_indent_renders_spacer() {
        let t = IndentToken::new(IndentKind::Indent, 2, "    ");
        assert_eq!(t.render(), "    ");
        let u = IndentToken::new(IndentKind::Unindent, 5, "  ");
        assert_eq!(Token::Indent(u).token_type(), TokenType::Unindent);
    }

    #[test]
    fn test_text_substituted_at_construction() {
        let t = TextToken::new(4, "Total: = cart.total", &d());
        assert_eq!(t.text, "Total: {{ cart.total }}");
        assert_eq!(t.render(), "Total: {{ cart.total }}");
    }

    #[test]
    fn test_text_escaped_equals() {
        assert_eq!(TextToken::new(1, "a \\= b", &d()).render(), "a = b");
    }

    #[test]
    fn test_output_token() {
        let t = JinjaOutputToken::new(1, "user.name | title", &d());
        assert_eq!(t.render(&d()), "{{ user.name | title }}");
    }

    #[test]
    fn test_output_token_follows_delimiter_changes() {
        let mut delims = d();
        delims.set("variable_start_string", "<<").unwrap();
        delims.set("variable_end_string", ">>").unwrap();
        let custom = JinjaOutputToken::new(1, "x", &delims);
        assert_eq!(custom.render(&delims), "<< x >>");

        let defaults = d();
        let plain = JinjaOutputToken::new(2, "x", &defaults);
        assert_eq!(plain.render(&defaults), "{{ x }}");
    }

    #[test]
    fn test_mixed_delimiters_when_build_and_render_differ() {
        let mut brackets = d();
        brackets.set("variable_start_string", "[[").unwrap();
        brackets.set("variable_end_string", "]]").unwrap();

        let open = jinja(JinjaKind::Open, "if", "if ok");
        let body = Token::Text(TextToken::new(2, "= x", &brackets));
        let tokens = [Token::Jinja(open.clone()), body, Token::Jinja(open.closing(3))];

        let out: Vec<_> = tokens.iter().map(|t| t.render(&d())).collect();
        assert_eq!(out, vec!["{% if ok %}", "[[ x ]]", "{% endif %}"]);
    }

    // =========================================================================
    // JinjaToken
    // =========================================================================

    #[test]
    fn test_jinja_open_renders_full_line() {
        let open = jinja(JinjaKind::Open, "for", "for x in items");
        assert_eq!(open.render(&d()), "{% for x in items %}");
        assert_eq!(open.closing(3).render(&d()), "{% endfor %}");
    }

    #[test]
    fn test_jinja_open_keeps_line_verbatim() {
        let t = jinja(JinjaKind::Open, " if ", "if  a and  b ");
        assert_eq!(t.tag_name, "if");
        assert_eq!(t.render(&d()), "{% if  a and  b  %}");
    }

    #[test]
    fn test_jinja_close_ignores_full_line() {
        let t = jinja(JinjaKind::Close, "block", "block content extra");
        assert_eq!(t.render(&d()), "{% endblock %}");
    }

    #[test]
    fn test_ended_tag() {
        assert_eq!(JinjaToken::ended_tag("endfor"), Some("for"));
        assert_eq!(JinjaToken::ended_tag(" endif "), Some("if"));
        assert_eq!(JinjaToken::ended_tag("end"), None);
        assert_eq!(JinjaToken::ended_tag("for"), None);
    }

    #[test]
    fn test_jinja_self_closing() {
        let t = jinja(JinjaKind::SelfClosing, "include", "include 'nav.html'");
        assert_eq!(t.render(&d()), "{% include 'nav.html' %}");
        assert_eq!(Token::Jinja(t).token_type(), TokenType::JinjaNcTag);
    }

    #[test]
    fn test_jinja_no_content_set() {
        for tag in ["include", "extends", "import", "set", "from", "do", "break", "continue"] {
            assert!(JinjaToken::is_no_content(tag), "{tag}");
        }
        assert!(!JinjaToken::is_no_content("for"));
        assert!(!JinjaToken::is_no_content("block"));
    }

    #[test]
    fn test_jinja_custom_block_delimiters() {
        let mut delims = d();
        delims.set("block_start_string", "<%").unwrap();
        delims.set("block_end_string", "%>").unwrap();
        let t = jinja(JinjaKind::Open, "if", "if ok");
        assert_eq!(t.render(&delims), "<% if ok %>");
        assert_eq!(t.closing(2).render(&delims), "<% endif %>");
    }

    #[test]
    fn test_else_closes_for() {
        let for_tag = jinja(JinjaKind::Open, "for", "for x in xs");
        let else_tag = jinja(JinjaKind::Open, "else", "else");
        assert_eq!(else_tag.closes(&for_tag), Ok(true));
    }

    #[test]
    fn test_elif_closes_if() {
        let if_tag = jinja(JinjaKind::Open, "if", "if a");
        let elif_tag = jinja(JinjaKind::Open, "elif ", "elif b");
        assert_eq!(elif_tag.closes(&if_tag), Ok(true));
    }

    #[test]
    fn test_else_does_not_close_if() {
        let if_tag = jinja(JinjaKind::Open, "if", "if a");
        let else_tag = jinja(JinjaKind::Open, "else", "else");
        assert_eq!(else_tag.closes(&if_tag), Ok(false));
    }

    #[test]
    fn test_closes_is_keyed_by_opener() {
        let for_tag = jinja(JinjaKind::Open, "for", "for x in xs");
        let else_tag = jinja(JinjaKind::Open, "else", "else");
        assert_eq!(
            for_tag.closes(&else_tag),
            Err(TokenError::UnpairedTag { tag: "else".into() })
        );
    }

    #[test]
    fn test_closes_unknown_opener_is_error() {
        let block = jinja(JinjaKind::Open, "block", "block body");
        let else_tag = jinja(JinjaKind::Open, "else", "else");
        assert!(else_tag.closes(&block).is_err());
    }

    // =========================================================================
    // Token
    // =========================================================================

    #[test]
    fn test_token_types() {
        let cases = vec![
            (Token::Html(html(HtmlKind::Inline, "p")), TokenType::HtmlTag),
            (Token::Html(html(HtmlKind::SelfClosing, "br")), TokenType::HtmlNcTag),
            (Token::Html(html(HtmlKind::Open, "div")), TokenType::HtmlTagOpen),
            (Token::Html(html(HtmlKind::Close, "div")), TokenType::HtmlTagClose),
            (
                Token::Indent(IndentToken::new(IndentKind::Indent, 1, "  ")),
                TokenType::Indent,
            ),
            (Token::Text(TextToken::new(1, "hi", &d())), TokenType::Text),
            (
                Token::Jinja(jinja(JinjaKind::Open, "if", "if x")),
                TokenType::JinjaOpenTag,
            ),
            (
                Token::Jinja(jinja(JinjaKind::Close, "if", "if x")),
                TokenType::JinjaCloseTag,
            ),
            (
                Token::JinjaOutput(JinjaOutputToken::new(1, "x", &d())),
                TokenType::JinjaOutputTag,
            ),
        ];
        for (token, expected) in cases {
            assert_eq!(token.token_type(), expected);
        }
    }

    #[test]
    fn test_lineno() {
        let t = Token::Jinja(JinjaToken::new(JinjaKind::Open, 42, "for", "for a in b"));
        assert_eq!(t.lineno(), 42);
    }

    #[test]
    fn test_render_is_repeatable() {
        let delims = d();
        let tokens = vec![
            Token::Html(HtmlTag::new(
                HtmlKind::Inline,
                1,
                "li.item",
                &attrs(&[("title", "=t")]),
                Some(" = label"),
                &delims,
            )),
            Token::Jinja(jinja(JinjaKind::Open, "for", "for t in items")),
            Token::JinjaOutput(JinjaOutputToken::new(1, "t", &delims)),
        ];
        for token in &tokens {
            assert_eq!(token.render(&delims), token.render(&delims));
        }
    }
}
