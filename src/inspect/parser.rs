//! Declaration-level Go parser.
//!
//! Only what the model builder needs is parsed in depth: the package clause,
//! type declarations and struct bodies. Imports, functions, variables and
//! constants are skipped with delimiter balancing, which still rejects
//! unbalanced or mismatched brackets.

use std::path::Path;

use super::error::ParseError;
use super::facts::{FieldFacts, Marker, SourceFacts, TypeFacts};
use super::lexer::{tokenize, Comment, Token, TokenKind};
use super::tag::{parse_struct_tag, TagMap};

/// Parse Go source text into struct-level facts.
///
/// # Errors
///
/// Returns a [`ParseError`] with the position of the first syntax problem.
pub fn parse_go_source(src: &str, path: &Path) -> Result<SourceFacts, ParseError> {
    let lexed = tokenize(src, path)?;
    Parser {
        tokens: &lexed.tokens,
        comments: &lexed.comments,
        pos: 0,
        path,
    }
    .file()
}

struct Parser<'a> {
    tokens: &'a [Token],
    comments: &'a [Comment],
    pos: usize,
    path: &'a Path,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &'a Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn advance(&mut self) -> &'a Token {
        let tok = self.peek();
        if tok.kind != TokenKind::Eof {
            self.pos += 1;
        }
        tok
    }

    fn error_at(&self, tok: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(self.path, tok.line, tok.col, message)
    }

    fn expect_ident(&mut self, what: &str) -> Result<&'a Token, ParseError> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident && !tok.is_keyword() {
            self.advance();
            Ok(tok)
        } else {
            Err(self.error_at(tok, format!("expected {what}, found {}", tok.describe())))
        }
    }

    fn expect_punct(&mut self, p: &str) -> Result<&'a Token, ParseError> {
        let tok = self.peek();
        if tok.is_punct(p) {
            self.advance();
            Ok(tok)
        } else {
            Err(self.error_at(tok, format!("expected '{p}', found {}", tok.describe())))
        }
    }

    fn skip_semis(&mut self) {
        while self.peek().kind == TokenKind::Semi {
            self.advance();
        }
    }

    fn end_of_decl(&mut self) -> Result<(), ParseError> {
        let tok = self.peek();
        match tok.kind {
            TokenKind::Semi => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(self.error_at(
                tok,
                format!("expected ';' or newline after declaration, found {}", tok.describe()),
            )),
        }
    }

    fn file(mut self) -> Result<SourceFacts, ParseError> {
        self.skip_semis();
        let kw = self.peek();
        if !kw.is_ident("package") {
            return Err(self.error_at(
                kw,
                format!("expected 'package' clause, found {}", kw.describe()),
            ));
        }
        self.advance();
        let package = self.expect_ident("package name")?.text.clone();
        self.end_of_decl()?;

        let mut types = Vec::new();
        loop {
            self.skip_semis();
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Ident
                    if matches!(tok.text.as_str(), "import" | "var" | "const" | "func") =>
                {
                    self.advance();
                    self.skip_decl()?;
                }
                TokenKind::Ident if tok.text == "type" => self.type_decl(&mut types)?,
                _ => {
                    return Err(self.error_at(
                        tok,
                        format!("expected declaration, found {}", tok.describe()),
                    ))
                }
            }
        }

        Ok(SourceFacts {
            path: self.path.to_path_buf(),
            package,
            types,
        })
    }

    /// Doc comment group ending on the line right before `line`.
    fn doc_before(&self, line: usize) -> String {
        let mut group: Vec<&Comment> = Vec::new();
        let mut expected_end = line.saturating_sub(1);
        for c in self.comments.iter().rev() {
            if c.end_line >= line && group.is_empty() {
                continue;
            }
            if c.end_line != expected_end || !c.own_line {
                break;
            }
            group.push(c);
            expected_end = c.line.saturating_sub(1);
        }
        group
            .iter()
            .rev()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn track_delimiter(&self, tok: &'a Token, stack: &mut Vec<&'a Token>) -> Result<(), ParseError> {
        match tok.text.as_str() {
            "(" | "[" | "{" => stack.push(tok),
            ")" | "]" | "}" => {
                let open = stack
                    .pop()
                    .ok_or_else(|| self.error_at(tok, format!("unexpected '{}'", tok.text)))?;
                if closing_for(&open.text) != tok.text {
                    return Err(self.error_at(
                        tok,
                        format!(
                            "mismatched '{}': '{}' opened at line {} column {}",
                            tok.text, open.text, open.line, open.col
                        ),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn unclosed(&self, stack: &[&'a Token], eof: &Token) -> ParseError {
        match stack.last() {
            Some(open) => self.error_at(open, format!("unclosed '{}'", open.text)),
            None => self.error_at(eof, "unexpected end of file"),
        }
    }

    /// Skip an import, var, const or func declaration.
    fn skip_decl(&mut self) -> Result<(), ParseError> {
        let mut stack: Vec<&'a Token> = Vec::new();
        loop {
            let tok = self.peek();
            match tok.kind {
                TokenKind::Eof if stack.is_empty() => return Ok(()),
                TokenKind::Eof => return Err(self.unclosed(&stack, tok)),
                TokenKind::Semi if stack.is_empty() => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Punct => self.track_delimiter(tok, &mut stack)?,
                _ => {}
            }
            self.advance();
        }
    }

    fn type_decl(&mut self, types: &mut Vec<TypeFacts>) -> Result<(), ParseError> {
        let kw = self.advance();
        let decl_doc = self.doc_before(kw.line);

        if !self.peek().is_punct("(") {
            self.type_spec(&decl_doc, false, types)?;
            return self.end_of_decl();
        }

        self.advance();
        loop {
            self.skip_semis();
            let tok = self.peek();
            if tok.is_punct(")") {
                self.advance();
                break;
            }
            if tok.kind == TokenKind::Eof {
                return Err(self.error_at(kw, "unclosed type declaration group"));
            }
            let spec_doc = self.doc_before(tok.line);
            let doc = format!("{decl_doc}\n{spec_doc}");
            self.type_spec(&doc, true, types)?;

            let next = self.peek();
            if next.kind == TokenKind::Semi {
                self.advance();
            } else if !next.is_punct(")") {
                return Err(self.error_at(
                    next,
                    format!("expected ';' or ')' in type group, found {}", next.describe()),
                ));
            }
        }
        self.end_of_decl()
    }

    fn type_spec(
        &mut self,
        doc: &str,
        grouped: bool,
        types: &mut Vec<TypeFacts>,
    ) -> Result<(), ParseError> {
        let name = self.expect_ident("type name")?;
        if self.peek().is_punct("[") && self.at_type_params() {
            self.collect_balanced()?;
        }
        if self.peek().is_punct("=") {
            self.advance();
        }

        if self.peek().is_ident("struct") && self.peek_at(1).is_punct("{") {
            self.advance();
            let fields = self.struct_body()?;
            types.push(TypeFacts::new(
                name.text.clone(),
                name.line,
                Marker::scan(doc),
                fields,
            ));
            Ok(())
        } else {
            self.skip_type(grouped)
        }
    }

    /// `[T any]` after a type name, as opposed to an array length `[N]`.
    fn at_type_params(&self) -> bool {
        self.peek_at(1).kind == TokenKind::Ident && !self.peek_at(2).is_punct("]")
    }

    fn skip_type(&mut self, grouped: bool) -> Result<(), ParseError> {
        let mut stack: Vec<&'a Token> = Vec::new();
        loop {
            let tok = self.peek();
            if stack.is_empty()
                && (matches!(tok.kind, TokenKind::Semi | TokenKind::Eof)
                    || (grouped && tok.is_punct(")")))
            {
                return Ok(());
            }
            if tok.kind == TokenKind::Eof {
                return Err(self.unclosed(&stack, tok));
            }
            if tok.kind == TokenKind::Punct {
                self.track_delimiter(tok, &mut stack)?;
            }
            self.advance();
        }
    }

    /// Consume a bracketed token run starting at the current opener and
    /// return its source text.
    fn collect_balanced(&mut self) -> Result<String, ParseError> {
        let mut stack: Vec<&'a Token> = Vec::new();
        let mut parts: Vec<&'a Token> = Vec::new();
        loop {
            let tok = self.peek();
            if tok.kind == TokenKind::Eof {
                return Err(self.unclosed(&stack, tok));
            }
            if tok.kind == TokenKind::Punct {
                self.track_delimiter(tok, &mut stack)?;
            }
            parts.push(tok);
            self.advance();
            if stack.is_empty() {
                return Ok(join_tokens(&parts));
            }
        }
    }

    fn struct_body(&mut self) -> Result<Vec<FieldFacts>, ParseError> {
        let open = self.expect_punct("{")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            let tok = self.peek();
            if tok.is_punct("}") {
                self.advance();
                return Ok(fields);
            }
            if tok.kind == TokenKind::Eof {
                return Err(self.error_at(open, "unclosed struct type"));
            }
            self.field_decl(&mut fields)?;

            let next = self.peek();
            if next.kind == TokenKind::Semi {
                self.advance();
            } else if !next.is_punct("}") {
                return Err(self.error_at(
                    next,
                    format!("expected ';' or '}}' after field, found {}", next.describe()),
                ));
            }
        }
    }

    fn field_decl(&mut self, fields: &mut Vec<FieldFacts>) -> Result<(), ParseError> {
        let first = self.peek();
        if first.is_punct("*") {
            self.advance();
            let (name, type_text) = self.embedded_type_name()?;
            let tags = self.field_tag();
            fields.push(field(name, true, format!("*{type_text}"), tags));
            return Ok(());
        }
        if first.kind != TokenKind::Ident || first.is_keyword() {
            return Err(self.error_at(
                first,
                format!(
                    "expected field name or embedded type, found {}",
                    first.describe()
                ),
            ));
        }

        let next = self.peek_at(1);
        let embedded = next.is_punct(".")
            || next.is_punct("}")
            || matches!(next.kind, TokenKind::Semi | TokenKind::Str(_))
            || (next.is_punct("[") && self.at_generic_embedded());
        if embedded {
            let (name, type_text) = self.embedded_type_name()?;
            let tags = self.field_tag();
            fields.push(field(name, true, type_text, tags));
            return Ok(());
        }

        let mut names = vec![self.advance().text.clone()];
        while self.peek().is_punct(",") {
            self.advance();
            names.push(self.expect_ident("field name")?.text.clone());
        }
        let type_text = self.field_type()?;
        if type_text.is_empty() {
            let tok = self.peek();
            return Err(self.error_at(tok, format!("missing type for field '{}'", names[0])));
        }
        let tags = self.field_tag();
        for name in names {
            fields.push(field(name, false, type_text.clone(), tags.clone()));
        }
        Ok(())
    }

    /// `Embedded[T]` followed by the end of the field, as opposed to
    /// `Field []T` or `Field [N]T`.
    fn at_generic_embedded(&self) -> bool {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(self.pos + 1) {
            match t.kind {
                TokenKind::Eof => return false,
                TokenKind::Punct if matches!(t.text.as_str(), "[" | "(" | "{") => depth += 1,
                TokenKind::Punct if matches!(t.text.as_str(), "]" | ")" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        // an empty `[]` is a slice type
                        if i == self.pos + 2 {
                            return false;
                        }
                        let after = &self.tokens[(i + 1).min(self.tokens.len() - 1)];
                        return matches!(
                            after.kind,
                            TokenKind::Semi | TokenKind::Str(_) | TokenKind::Eof
                        ) || after.is_punct("}");
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn embedded_type_name(&mut self) -> Result<(String, String), ParseError> {
        let first = self.expect_ident("embedded type name")?;
        let mut name = first.text.clone();
        let mut text = first.text.clone();
        if self.peek().is_punct(".") {
            self.advance();
            let second = self.expect_ident("qualified type name")?;
            name = second.text.clone();
            text = format!("{text}.{}", second.text);
        }
        if self.peek().is_punct("[") {
            text.push_str(&self.collect_balanced()?);
        }
        Ok((name, text))
    }

    fn field_type(&mut self) -> Result<String, ParseError> {
        let mut stack: Vec<&'a Token> = Vec::new();
        let mut parts: Vec<&'a Token> = Vec::new();
        loop {
            let tok = self.peek();
            if stack.is_empty()
                && (matches!(tok.kind, TokenKind::Semi | TokenKind::Str(_)) || tok.is_punct("}"))
            {
                break;
            }
            if tok.kind == TokenKind::Eof {
                return Err(self.unclosed(&stack, tok));
            }
            if tok.kind == TokenKind::Punct {
                self.track_delimiter(tok, &mut stack)?;
            }
            parts.push(tok);
            self.advance();
        }
        Ok(join_tokens(&parts))
    }

    fn field_tag(&mut self) -> TagMap {
        match &self.peek().kind {
            TokenKind::Str(value) => {
                self.advance();
                parse_struct_tag(value)
            }
            _ => TagMap::new(),
        }
    }
}

fn field(name: String, embedded: bool, type_expr: String, tags: TagMap) -> FieldFacts {
    let exported = name.chars().next().is_some_and(char::is_uppercase);
    FieldFacts {
        name,
        embedded,
        type_expr,
        exported,
        tags,
    }
}

fn closing_for(open: &str) -> &'static str {
    match open {
        "(" => ")",
        "[" => "]",
        _ => "}",
    }
}

/// Rebuild compact source text from tokens (`map[string]*v0.Common`).
fn join_tokens(tokens: &[&Token]) -> String {
    let is_word = |t: &Token| {
        matches!(
            t.kind,
            TokenKind::Ident | TokenKind::Literal | TokenKind::Str(_)
        )
    };
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for t in tokens {
        if let Some(p) = prev {
            if (is_word(p) && is_word(t))
                || p.is_punct(",")
                || p.kind == TokenKind::Semi
                || (p.is_punct(")") && is_word(t))
            {
                out.push(' ');
            }
        }
        match t.kind {
            TokenKind::Semi => out.push(';'),
            _ => out.push_str(&t.text),
        }
        prev = Some(t);
    }
    out
}
