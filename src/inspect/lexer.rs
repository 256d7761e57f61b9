//! Go tokenizer with automatic semicolon insertion.
//!
//! Comments are not part of the token stream; they are collected separately
//! with their line span so the parser can attach doc comments to
//! declarations.

use std::path::Path;
use tracing::warn;

use super::error::ParseError;

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Keywords after which a newline still terminates the statement.
const TERMINATING_KEYWORDS: &[&str] = &["break", "continue", "fallthrough", "return"];

const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

const SINGLE_PUNCT: &str = "+-*/%&|^<>=!()[]{},.:~";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Ident,
    /// Numeric or rune literal
    Literal,
    /// String literal, carrying its decoded value
    Str(String),
    Punct,
    /// Explicit `;` or one inserted at a line end
    Semi,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn is_punct(&self, p: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == p
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == name
    }

    pub fn is_keyword(&self) -> bool {
        self.kind == TokenKind::Ident && KEYWORDS.contains(&self.text.as_str())
    }

    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Semi if self.text == "\n" => "newline".to_string(),
            _ => format!("'{}'", self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Comment {
    /// Comment body without the `//` or `/* */` delimiters
    pub text: String,
    pub line: usize,
    pub end_line: usize,
    /// No code token precedes the comment on its first line
    pub own_line: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Lexed {
    pub tokens: Vec<Token>,
    pub comments: Vec<Comment>,
}

pub(crate) fn tokenize(src: &str, path: &Path) -> Result<Lexed, ParseError> {
    Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        col: 1,
        path,
        out: Lexed::default(),
        line_has_token: false,
    }
    .run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    path: &'a Path,
    out: Lexed,
    line_has_token: bool,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Lexed, ParseError> {
        while let Some(c) = self.peek(0) {
            let (line, col) = (self.line, self.col);
            match c {
                '\n' => {
                    self.insert_semi(line, col);
                    self.bump();
                    self.line_has_token = false;
                }
                ' ' | '\t' | '\r' | '\u{feff}' => {
                    self.bump();
                }
                '/' if self.peek(1) == Some('/') => self.line_comment(),
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '"' => self.interpreted_string()?,
                '`' => self.raw_string()?,
                '\'' => self.rune()?,
                ';' => {
                    self.bump();
                    self.push(TokenKind::Semi, ";".to_string(), line, col);
                }
                c if is_ident_start(c) => self.ident(),
                c if c.is_ascii_digit()
                    || (c == '.' && self.peek(1).is_some_and(|n| n.is_ascii_digit())) =>
                {
                    self.number()
                }
                _ => self.operator()?,
            }
        }
        let (line, col) = (self.line, self.col);
        self.insert_semi(line, col);
        self.out.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line,
            col,
        });
        Ok(self.out)
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = *self.chars.get(self.pos)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn error(&self, line: usize, col: usize, message: impl Into<String>) -> ParseError {
        ParseError::new(self.path, line, col, message)
    }

    fn push(&mut self, kind: TokenKind, text: String, line: usize, col: usize) {
        self.out.tokens.push(Token {
            kind,
            text,
            line,
            col,
        });
        self.line_has_token = true;
    }

    fn needs_semi(&self) -> bool {
        match self.out.tokens.last() {
            Some(t) => match &t.kind {
                TokenKind::Ident => {
                    !KEYWORDS.contains(&t.text.as_str())
                        || TERMINATING_KEYWORDS.contains(&t.text.as_str())
                }
                TokenKind::Literal | TokenKind::Str(_) => true,
                TokenKind::Punct => matches!(t.text.as_str(), ")" | "]" | "}" | "++" | "--"),
                TokenKind::Semi | TokenKind::Eof => false,
            },
            None => false,
        }
    }

    fn insert_semi(&mut self, line: usize, col: usize) {
        if self.needs_semi() {
            self.out.tokens.push(Token {
                kind: TokenKind::Semi,
                text: "\n".to_string(),
                line,
                col,
            });
        }
    }

    fn line_comment(&mut self) {
        let line = self.line;
        let own_line = !self.line_has_token;
        self.bump();
        self.bump();
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text = self.slice(start, self.pos);
        self.out.comments.push(Comment {
            text,
            line,
            end_line: line,
            own_line,
        });
    }

    fn block_comment(&mut self) -> Result<(), ParseError> {
        let (line, col) = (self.line, self.col);
        let own_line = !self.line_has_token;
        self.bump();
        self.bump();
        let start = self.pos;
        loop {
            match self.peek(0) {
                Some('*') if self.peek(1) == Some('/') => break,
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error(line, col, "comment not terminated")),
            }
        }
        let text = self.slice(start, self.pos);
        self.bump();
        self.bump();
        if text.contains('\n') {
            // A multi-line general comment acts like a newline.
            self.insert_semi(line, col);
            self.line_has_token = false;
        }
        self.out.comments.push(Comment {
            text,
            line,
            end_line: self.line,
            own_line,
        });
        Ok(())
    }

    fn interpreted_string(&mut self) -> Result<(), ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('"') => break,
                Some('\\') => {
                    if self.peek(0) == Some('\n') || self.bump().is_none() {
                        return Err(self.error(line, col, "string literal not terminated"));
                    }
                }
                Some('\n') | None => {
                    return Err(self.error(line, col, "string literal not terminated"));
                }
                Some(_) => {}
            }
        }
        let text = self.slice(start, self.pos);
        let inner = &text[1..text.len() - 1];
        let value = unescape(inner, '"').map_err(|m| self.error(line, col, m))?;
        self.push(TokenKind::Str(value), text, line, col);
        Ok(())
    }

    fn raw_string(&mut self) -> Result<(), ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('`') => break,
                Some(_) => {}
                None => return Err(self.error(line, col, "raw string literal not terminated")),
            }
        }
        let text = self.slice(start, self.pos);
        let value = text[1..text.len() - 1].replace('\r', "");
        self.push(TokenKind::Str(value), text, line, col);
        Ok(())
    }

    fn rune(&mut self) -> Result<(), ParseError> {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('\'') => break,
                Some('\\') => {
                    if self.bump().is_none() {
                        return Err(self.error(line, col, "rune literal not terminated"));
                    }
                }
                Some('\n') | None => {
                    return Err(self.error(line, col, "rune literal not terminated"));
                }
                Some(_) => {}
            }
        }
        let text = self.slice(start, self.pos);
        if text.len() <= 2 {
            return Err(self.error(line, col, "empty rune literal"));
        }
        self.push(TokenKind::Literal, text, line, col);
        Ok(())
    }

    fn ident(&mut self) {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_continue) {
            self.bump();
        }
        let text = self.slice(start, self.pos);
        self.push(TokenKind::Ident, text, line, col);
    }

    fn number(&mut self) {
        let (line, col) = (self.line, self.col);
        let start = self.pos;
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
                self.bump();
                if matches!(c, 'e' | 'E' | 'p' | 'P')
                    && matches!(self.peek(0), Some('+') | Some('-'))
                {
                    self.bump();
                }
            } else {
                break;
            }
        }
        let text = self.slice(start, self.pos);
        self.push(TokenKind::Literal, text, line, col);
    }

    fn operator(&mut self) -> Result<(), ParseError> {
        let (line, col) = (self.line, self.col);
        for len in [3usize, 2] {
            if self.pos + len <= self.chars.len() {
                let candidate = self.slice(self.pos, self.pos + len);
                if OPERATORS.contains(&candidate.as_str()) {
                    for _ in 0..len {
                        self.bump();
                    }
                    self.push(TokenKind::Punct, candidate, line, col);
                    return Ok(());
                }
            }
        }
        match self.bump() {
            Some(c) if SINGLE_PUNCT.contains(c) => {
                self.push(TokenKind::Punct, c.to_string(), line, col);
                Ok(())
            }
            Some(c) => Err(self.error(line, col, format!("unexpected character {c:?}"))),
            None => Err(self.error(line, col, "unexpected end of file")),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Decode the body of a Go interpreted string (or rune) literal.
///
/// `quote` is the delimiter that may appear escaped in this literal kind.
/// Byte escapes that do not form valid UTF-8 are replaced with U+FFFD and
/// logged.
pub(crate) fn unescape(inner: &str, quote: char) -> Result<String, String> {
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    let mut buf = [0u8; 4];
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let esc = chars
            .next()
            .ok_or_else(|| "escape sequence not terminated".to_string())?;
        let simple = match esc {
            'a' => Some('\u{07}'),
            'b' => Some('\u{08}'),
            'f' => Some('\u{0C}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'v' => Some('\u{0B}'),
            '\\' => Some('\\'),
            q if q == quote => Some(q),
            _ => None,
        };
        if let Some(s) = simple {
            out.extend_from_slice(s.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match esc {
            'x' => {
                let byte = take_digits(&mut chars, 2, 16)?;
                out.push(byte as u8);
            }
            '0'..='7' => {
                let rest = take_digits(&mut chars, 2, 8)?;
                let value = (esc as u32 - '0' as u32) * 64 + rest;
                if value > 255 {
                    return Err("octal escape value > 255".to_string());
                }
                out.push(value as u8);
            }
            'u' | 'U' => {
                let width = if esc == 'u' { 4 } else { 8 };
                let code = take_digits(&mut chars, width, 16)?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| "escape sequence is invalid Unicode code point".to_string())?;
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            other => return Err(format!("unknown escape sequence '\\{other}'")),
        }
    }
    match String::from_utf8(out) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(
                literal = %inner,
                offset = e.utf8_error().valid_up_to(),
                "string literal escapes are not valid UTF-8; replacing invalid bytes"
            );
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

fn take_digits(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    count: usize,
    radix: u32,
) -> Result<u32, String> {
    let mut value = 0u32;
    for _ in 0..count {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(radix))
            .ok_or_else(|| "illegal character in escape sequence".to_string())?;
        value = value * radix + digit;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn kinds(src: &str) -> Vec<String> {
        tokenize(src, Path::new("test.go"))
            .unwrap()
            .tokens
            .iter()
            .map(|t| match t.kind {
                TokenKind::Semi => ";".to_string(),
                TokenKind::Eof => "EOF".to_string(),
                _ => t.text.clone(),
            })
            .collect()
    }

    #[test]
    fn test_semicolon_insertion() {
        assert_eq!(
            kinds("package v0\n\ntype A struct {\n\tName string\n}\n"),
            vec![
                "package", "v0", ";", "type", "A", "struct", "{", "Name", "string", ";", "}",
                ";", "EOF"
            ]
        );
        // no insertion after an opening brace or a non-terminating keyword
        assert_eq!(kinds("struct\n{"), vec!["struct", "{", "EOF"]);
        assert_eq!(kinds("return\n"), vec!["return", ";", "EOF"]);
    }

    #[test]
    fn test_comments_collected_separately() {
        let lexed = tokenize(
            "// Doc line\n// threeport-sdk:reconciler\ntype A int // trailing\n",
            Path::new("t.go"),
        )
        .unwrap();
        assert_eq!(lexed.comments.len(), 3);
        assert!(lexed.comments[0].own_line);
        assert_eq!(lexed.comments[1].text, " threeport-sdk:reconciler");
        assert!(!lexed.comments[2].own_line);
        assert!(lexed.tokens.iter().all(|t| !t.text.contains("trailing")));
    }

    #[test]
    fn test_string_literals() {
        let lexed = tokenize(r#"`json:"name"` "a\"b\n" 'x'"#, Path::new("t.go")).unwrap();
        assert_eq!(lexed.tokens[0].kind, TokenKind::Str("json:\"name\"".to_string()));
        assert_eq!(lexed.tokens[1].kind, TokenKind::Str("a\"b\n".to_string()));
        assert_eq!(lexed.tokens[2].kind, TokenKind::Literal);
    }

    #[test]
    fn test_unterminated_literals_fail() {
        let err = tokenize("var s = \"abc\n", Path::new("bad.go")).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("not terminated"));

        let err = tokenize("/* open", Path::new("bad.go")).unwrap_err();
        assert!(err.message.contains("comment not terminated"));

        let err = tokenize("var s = `open", Path::new("bad.go")).unwrap_err();
        assert!(err.message.contains("raw string"));
    }

    #[test]
    fn test_operators_longest_match() {
        assert_eq!(kinds("a := b...\n"), vec!["a", ":=", "b", "...", "EOF"]);
        assert_eq!(kinds("x <<= 2"), vec!["x", "<<=", "2", ";", "EOF"]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("type A @", Path::new("bad.go")).unwrap_err();
        assert_eq!(err.column, 8);
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb", '"').unwrap(), "a\tb");
        assert_eq!(unescape(r"\x41\101é", '"').unwrap(), "AAé");
        assert_eq!(unescape(r"\xc3\xa9\303\251", '"').unwrap(), "éé");
        assert!(unescape(r"\q", '"').is_err());
        assert!(unescape(r"\", '"').is_err());
    }

    #[test]
    fn test_unescape_invalid_utf8_bytes_are_replaced() {
        assert_eq!(unescape(r"a\xffb", '"').unwrap(), "a\u{FFFD}b");
        assert_eq!(unescape(r"\303", '"').unwrap(), "\u{FFFD}");
    }
}
