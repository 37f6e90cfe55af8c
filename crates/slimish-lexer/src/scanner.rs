use crate::shorthand::expand_tag_name;
use crate::token::{
    HtmlKind, HtmlTag, IndentKind, IndentToken, JinjaKind, JinjaOutputToken, JinjaToken,
    TextToken, Token,
};
use crate::{Delimiters, ScanError};

/// Block keywords that form an `if` chain.
const IF_CHAIN: &[&str] = &["if", "elif"];

/// Keywords that are only valid as the continuation of an open block.
const CONTINUATION_KEYWORDS: &[&str] = &["else", "elif"];

/// One classified source line.
enum Line {
    Block(JinjaToken),
    Output(JinjaOutputToken),
    Text(TextToken),
    Element(HtmlTag),
}

/// The token whose closing tag ends a nested region.
enum Opener {
    Html(HtmlTag),
    Jinja(JinjaToken),
}

impl Opener {
    fn closing(&self, lineno: usize) -> Token {
        match self {
            Opener::Html(tag) => Token::Html(tag.closing(lineno)),
            Opener::Jinja(tag) => Token::Jinja(tag.closing(lineno)),
        }
    }
}

/// Indentation of the lines nested under a frame.
struct Nesting {
    width: usize,
    spacer: String,
}

/// A source line that may own nested lines.
struct Frame {
    width: usize,
    lineno: usize,
    nesting: Option<Nesting>,
    opener: Option<Opener>,
    /// Latest keyword of an open block chain (`for`, then `else`).
    block: Option<JinjaToken>,
}

impl Frame {
    fn new(
        width: usize,
        lineno: usize,
        opener: Option<Opener>,
        block: Option<JinjaToken>,
    ) -> Self {
        Self {
            width,
            lineno,
            nesting: None,
            opener,
            block,
        }
    }
}

/// slimish source scanner.
///
/// Walks the source line by line, classifies each line by its leading
/// character and turns it into tokens:
///
/// | Line            | Token                                  |
/// |-----------------|----------------------------------------|
/// | `- for x in xs` | block tag, `end` tag emitted on dedent |
/// | `- endfor`      | closes the open `for` block explicitly |
/// | `= user.name`   | output tag                             |
/// | `\| some text`  | text                                   |
/// | `/ comment`     | nothing                                |
/// | anything else   | HTML element `tag(attrs) content`      |
///
/// Nesting is tracked with a stack of frames, one per open line. Entering a
/// nested region emits an `Indent` token, leaving it emits the matching
/// `Unindent` followed by the owner's closing tag.
pub struct Scanner<'a> {
    source: &'a str,
    delims: &'a Delimiters,
    tokens: Vec<Token>,
    frames: Vec<Frame>,
    root_width: Option<usize>,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, delims: &'a Delimiters) -> Self {
        Self {
            source,
            delims,
            tokens: Vec::new(),
            frames: Vec::new(),
            root_width: None,
            line: 0,
        }
    }

    /// Tokenize the entire source into a vector of tokens.
    pub fn tokenize(source: &str, delims: &Delimiters) -> Result<Vec<Token>, ScanError> {
        let mut scanner = Scanner::new(source, delims);
        scanner.scan_lines()?;
        Ok(scanner.tokens)
    }

    fn scan_lines(&mut self) -> Result<(), ScanError> {
        let source = self.source;
        for (idx, raw) in source.lines().enumerate() {
            self.line = idx + 1;
            self.scan_line(raw)?;
        }

        // Close everything still open at EOF
        self.close_frames(0, None);

        log::debug!("scanned {} lines into {} tokens", self.line, self.tokens.len());
        Ok(())
    }

    fn scan_line(&mut self, raw: &str) -> Result<(), ScanError> {
        let content_start = raw.len() - raw.trim_start_matches(' ').len();
        let (indent, rest) = raw.split_at(content_start);

        if rest.trim().is_empty() {
            return Ok(());
        }
        if rest.starts_with('\t') {
            return Err(self.error("Tabs are not allowed for indentation, use spaces"));
        }

        let Some(line) = self.parse_line(rest.trim_end())? else {
            return Ok(());
        };
        let width = indent.len();

        if let Line::Block(token) = &line {
            if token.kind == JinjaKind::Close {
                return self.end_block(indent, token.clone());
            }
        }

        let next_block = match &line {
            Line::Block(token) => Some(token),
            _ => None,
        };
        let carried = self.close_frames(width, next_block);

        if let Line::Block(token) = &line {
            if carried.is_none() && CONTINUATION_KEYWORDS.contains(&token.tag_name.as_str()) {
                return Err(self.error(format!(
                    "'{}' does not continue an open block",
                    token.tag_name
                )));
            }
        }

        self.enter_line(indent)?;

        let frame = match line {
            Line::Block(token) => {
                let opened = token.kind == JinjaKind::Open;
                let opener = match carried {
                    Some(carried) => Some(carried),
                    None if opened => Some(Opener::Jinja(token.clone())),
                    None => None,
                };
                let block = opened.then(|| token.clone());
                log::trace!("line {}: block tag '{}'", self.line, token.tag_name);
                self.tokens.push(Token::Jinja(token));
                Frame::new(width, self.line, opener, block)
            }
            Line::Element(tag) => {
                let opener = (tag.kind == HtmlKind::Open).then(|| Opener::Html(tag.clone()));
                self.tokens.push(Token::Html(tag));
                Frame::new(width, self.line, opener, None)
            }
            Line::Output(token) => {
                self.tokens.push(Token::JinjaOutput(token));
                Frame::new(width, self.line, None, None)
            }
            Line::Text(token) => {
                self.tokens.push(Token::Text(token));
                Frame::new(width, self.line, None, None)
            }
        };
        self.frames.push(frame);
        Ok(())
    }

    // --- Indentation ---

    /// Pop every frame at `width` or deeper, emitting `Unindent` and closing
    /// tags. When `next` continues the block being closed at exactly `width`
    /// (`else` after `for`), that block's closing tag is withheld and its
    /// opener is returned so the continuation inherits it.
    fn close_frames(&mut self, width: usize, next: Option<&JinjaToken>) -> Option<Opener> {
        while self.frames.last().is_some_and(|f| f.width >= width) {
            let Some(frame) = self.frames.pop() else {
                break;
            };

            if let Some(nesting) = frame.nesting {
                self.tokens.push(Token::Indent(IndentToken::new(
                    IndentKind::Unindent,
                    self.line,
                    nesting.spacer,
                )));
            }

            let continued = frame.width == width
                && match (&frame.block, next) {
                    (Some(open), Some(next)) => continues(open, next),
                    _ => false,
                };
            if continued {
                log::trace!("line {}: block continues", self.line);
                return frame.opener;
            }

            if let Some(opener) = &frame.opener {
                let closing = opener.closing(self.line);
                self.tokens.push(closing);
            }
        }
        None
    }

    /// Handle a hand-written `- end<tag>` line. Deeper levels close as
    /// usual; the block open at the same width must be a `<tag>` block, and
    /// the written tag replaces its automatic closing tag.
    fn end_block(&mut self, indent: &str, token: JinjaToken) -> Result<(), ScanError> {
        let width = indent.len();
        self.close_frames(width + 1, None);

        let closes_open_block = self.frames.last().is_some_and(|frame| {
            frame.width == width
                && matches!(
                    &frame.opener,
                    Some(Opener::Jinja(open)) if open.tag_name == token.tag_name
                )
        });
        if !closes_open_block {
            return Err(self.error(format!(
                "'end{}' does not close an open '{}' block",
                token.tag_name, token.tag_name
            )));
        }

        if let Some(Nesting { spacer, .. }) = self.frames.pop().and_then(|f| f.nesting) {
            self.tokens.push(Token::Indent(IndentToken::new(
                IndentKind::Unindent,
                self.line,
                spacer,
            )));
        }

        self.enter_line(indent)?;
        log::trace!("line {}: explicit end{}", self.line, token.tag_name);
        self.tokens.push(Token::Jinja(token));
        self.frames.push(Frame::new(width, self.line, None, None));
        Ok(())
    }

    /// Attach a line to its parent frame, emitting `Indent` for the first
    /// nested line. Frames at or below the line's width are already closed.
    /// Only lines that open an element or block may own nested lines.
    fn enter_line(&mut self, indent: &str) -> Result<(), ScanError> {
        let width = indent.len();

        if let Some(parent) = self.frames.last() {
            if parent.opener.is_none() {
                return Err(self.error(format!(
                    "Line {} cannot contain nested lines",
                    parent.lineno
                )));
            }
        }

        let spacer = match self.frames.last_mut() {
            Some(parent) => match parent.nesting.as_ref().map(|n| n.width) {
                Some(nested) if nested == width => return Ok(()),
                Some(_) => None,
                None => {
                    let spacer = indent[parent.width..].to_string();
                    parent.nesting = Some(Nesting {
                        width,
                        spacer: spacer.clone(),
                    });
                    Some(spacer)
                }
            },
            None => {
                let root = *self.root_width.get_or_insert(width);
                if root == width {
                    return Ok(());
                }
                None
            }
        };
        let Some(spacer) = spacer else {
            return Err(self.misaligned(width));
        };

        self.tokens.push(Token::Indent(IndentToken::new(
            IndentKind::Indent,
            self.line,
            spacer,
        )));
        Ok(())
    }

    // --- Line classification ---

    /// Classify one trimmed, non-empty line. Comment lines yield `None`.
    fn parse_line(&self, content: &str) -> Result<Option<Line>, ScanError> {
        let Some(first) = content.chars().next() else {
            return Ok(None);
        };
        let rest = &content[first.len_utf8()..];

        match first {
            '/' => Ok(None),
            '-' => {
                let directive = rest.trim();
                let Some(tag_name) = directive.split_whitespace().next() else {
                    return Err(self.error("Empty block tag"));
                };
                let (kind, tag_name) = if let Some(ended) = JinjaToken::ended_tag(tag_name) {
                    (JinjaKind::Close, ended)
                } else if JinjaToken::is_no_content(tag_name) {
                    (JinjaKind::SelfClosing, tag_name)
                } else {
                    (JinjaKind::Open, tag_name)
                };
                Ok(Some(Line::Block(JinjaToken::new(
                    kind, self.line, tag_name, directive,
                ))))
            }
            '=' => {
                let expr = rest.trim();
                if expr.is_empty() {
                    return Err(self.error("Empty output tag"));
                }
                Ok(Some(Line::Output(JinjaOutputToken::new(
                    self.line,
                    expr,
                    self.delims,
                ))))
            }
            '|' => {
                let text = rest.strip_prefix(' ').unwrap_or(rest);
                Ok(Some(Line::Text(TextToken::new(self.line, text, self.delims))))
            }
            _ => self.parse_element(content).map(|tag| Some(Line::Element(tag))),
        }
    }

    /// Parse `tag.class#id(key="value") content`.
    fn parse_element(&self, content: &str) -> Result<HtmlTag, ScanError> {
        let tag_end = content
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(content.len());
        let (tag, mut rest) = content.split_at(tag_end);
        if tag.is_empty() {
            return Err(self.error("Missing tag name"));
        }

        let mut attribs = Vec::new();
        if let Some(list) = rest.strip_prefix('(') {
            let (parsed, remainder) = self.parse_attributes(list)?;
            if !remainder.is_empty() && !remainder.starts_with(char::is_whitespace) {
                return Err(self.error("Expected whitespace after attribute list"));
            }
            attribs = parsed;
            rest = remainder;
        }

        let (short_name, _) = expand_tag_name(tag);
        let has_content = !rest.trim().is_empty();
        let kind = if HtmlTag::is_no_content(&short_name) {
            if has_content {
                log::warn!(
                    "line {}: content after <{short_name}> is dropped",
                    self.line
                );
            }
            HtmlKind::SelfClosing
        } else if has_content {
            HtmlKind::Inline
        } else {
            HtmlKind::Open
        };

        let contents = (kind == HtmlKind::Inline).then_some(rest);
        Ok(HtmlTag::new(
            kind,
            self.line,
            tag,
            &attribs,
            contents,
            self.delims,
        ))
    }

    /// Parse an attribute list up to its closing `)`. Returns the pairs in
    /// source order and the text after the `)`. An attribute without a value
    /// uses its own name (`checked` → `checked="checked"`).
    fn parse_attributes<'s>(
        &self,
        list: &'s str,
    ) -> Result<(Vec<(String, String)>, &'s str), ScanError> {
        let mut attribs = Vec::new();
        let mut pos = 0;

        loop {
            let remaining = list[pos..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
            pos = list.len() - remaining.len();

            if remaining.is_empty() {
                return Err(self.error("Unterminated attribute list"));
            }
            if let Some(after) = remaining.strip_prefix(')') {
                return Ok((attribs, after));
            }

            let key_len = remaining
                .find(|c: char| c == '=' || c == ')' || c == ',' || c.is_whitespace())
                .unwrap_or(remaining.len());
            if key_len == 0 {
                return Err(self.error("Missing attribute name"));
            }
            let key = &remaining[..key_len];
            pos += key_len;

            match list[pos..].strip_prefix('=') {
                Some(value_src) => {
                    let (value, consumed) = self.parse_attribute_value(value_src)?;
                    pos += 1 + consumed;
                    attribs.push((key.to_string(), value));
                }
                None => attribs.push((key.to_string(), key.to_string())),
            }
        }
    }

    /// Parse a quoted or bare attribute value. Returns the value and the
    /// number of bytes consumed.
    fn parse_attribute_value(&self, src: &str) -> Result<(String, usize), ScanError> {
        match src.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &src[1..];
                let Some(end) = body.find(quote) else {
                    return Err(self.error("Unterminated attribute value"));
                };
                Ok((body[..end].to_string(), end + 2))
            }
            _ => {
                let len = src
                    .find(|c: char| c.is_whitespace() || c == ',' || c == ')')
                    .unwrap_or(src.len());
                Ok((src[..len].to_string(), len))
            }
        }
    }

    // --- Helpers ---

    fn misaligned(&self, width: usize) -> ScanError {
        self.error(format!(
            "Indentation does not match any outer level (got {width} spaces)"
        ))
    }

    fn error(&self, message: impl Into<String>) -> ScanError {
        ScanError {
            message: message.into(),
            line: self.line,
        }
    }
}

/// Whether `next` continues the block chain whose latest keyword is `open`.
///
/// Openers listed in the pair table are decided by `JinjaToken::closes`;
/// `else` and `elif` also continue any `if`/`elif` chain.
fn continues(open: &JinjaToken, next: &JinjaToken) -> bool {
    if JinjaToken::continuation(&open.tag_name).is_some() && matches!(next.closes(open), Ok(true))
    {
        return true;
    }
    IF_CHAIN.contains(&open.tag_name.as_str())
        && CONTINUATION_KEYWORDS.contains(&next.tag_name.as_str())
}
