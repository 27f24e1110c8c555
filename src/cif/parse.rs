//! CIF/STAR text parser.
//!
//! Parses CIF or STAR text into a [`Document`] of categories. Handles all
//! value forms: unquoted, single/double-quoted, and semicolon text fields.
//! Tag and category names keep their original case.

use super::dom::{Block, Document, Value};

/// Errors that can occur during CIF/STAR parsing. Positions are 1-based
/// line numbers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CifParseError {
    #[error("unterminated quoted string at line {0}")]
    UnterminatedQuote(usize),
    #[error("unterminated semicolon text field at line {0}")]
    UnterminatedTextField(usize),
    #[error("expected value at line {0}")]
    ExpectedValue(usize),
    #[error("the number of values for loop starting at line {0} is not a multiple of the number of columns")]
    LoopValueCount(usize),
}

/// Parse a CIF/STAR text string into a [`Document`].
pub fn parse(input: &str) -> Result<Document, CifParseError> {
    Parser::new(input).parse_document()
}

/// Split `_cat.field` into `("cat", "field")`. Tags without a dot are their
/// own category with an empty field name.
fn split_tag(tag: &str) -> (&str, &str) {
    let tag = tag.strip_prefix('_').unwrap_or(tag);
    tag.split_once('.').unwrap_or((tag, ""))
}

#[derive(Debug)]
enum Token {
    DataBlock(String),
    LoopStart,
    SaveStart(String),
    SaveEnd,
    Tag(String),
    Val(Value),
    Eof,
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    token_start: usize,
    at_line_start: bool,
    pending: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            token_start: 0,
            at_line_start: true,
            pending: None,
        }
    }

    fn line_at(&self, offset: usize) -> usize {
        1 + self.bytes[..offset.min(self.bytes.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }

    fn next(&mut self) -> Result<Token, CifParseError> {
        if let Some(t) = self.pending.take() {
            return Ok(t);
        }
        self.scan_token()
    }

    fn push_back(&mut self, token: Token) {
        debug_assert!(self.pending.is_none());
        self.pending = Some(token);
    }

    // --- Tokenizer ---

    fn skip_whitespace_and_comments(&mut self) {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\r' => self.pos += 1,
                b'\n' => {
                    self.pos += 1;
                    self.at_line_start = true;
                }
                b'#' => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self) -> Result<Token, CifParseError> {
        self.skip_whitespace_and_comments();
        self.token_start = self.pos;
        if self.pos >= self.bytes.len() {
            return Ok(Token::Eof);
        }

        let b = self.bytes[self.pos];

        // Semicolon text field (only valid at line start)
        if b == b';' && self.at_line_start {
            return self.scan_semicolon_text();
        }

        self.at_line_start = false;

        if b == b'\'' || b == b'"' {
            return self.scan_quoted(b);
        }

        let start = self.pos;
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if c.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        Ok(classify_unquoted(&self.input[start..self.pos]))
    }

    fn scan_quoted(&mut self, quote: u8) -> Result<Token, CifParseError> {
        let start = self.pos;
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() || self.bytes[self.pos] == b'\n' {
                return Err(CifParseError::UnterminatedQuote(self.line_at(start)));
            }
            // closing quote must be followed by whitespace or EOF
            if self.bytes[self.pos] == quote
                && (self.pos + 1 >= self.bytes.len()
                    || self.bytes[self.pos + 1].is_ascii_whitespace())
            {
                let val = self.input[start + 1..self.pos].to_string();
                self.pos += 1;
                return Ok(Token::Val(Value::Str(val)));
            }
            self.pos += 1;
        }
    }

    fn scan_semicolon_text(&mut self) -> Result<Token, CifParseError> {
        let start = self.pos;
        self.pos += 1;
        self.at_line_start = false;
        let content_start = self.pos;

        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                self.pos += 1;
            }
            if self.pos >= self.bytes.len() {
                return Err(CifParseError::UnterminatedTextField(self.line_at(start)));
            }
            self.pos += 1;

            if self.pos < self.bytes.len() && self.bytes[self.pos] == b';' {
                // Content excludes the line break before the closing ;
                let mut content_end = self.pos - 1;
                if content_end > content_start && self.bytes[content_end - 1] == b'\r' {
                    content_end -= 1;
                }
                let text = self.input[content_start..content_end].to_string();
                self.pos += 1;
                return Ok(Token::Val(Value::Str(text)));
            }
        }
    }

    // --- Structure parsing ---

    fn parse_document(&mut self) -> Result<Document, CifParseError> {
        let mut blocks = Vec::new();
        loop {
            match self.next()? {
                Token::Eof => break,
                Token::DataBlock(name) => blocks.push(self.parse_block(name, false)?),
                _ => {} // skip tokens before first data block
            }
        }
        Ok(Document { blocks })
    }

    fn parse_block(&mut self, header: String, in_frame: bool) -> Result<Block, CifParseError> {
        let mut block = Block::new(header);

        loop {
            let token = self.next()?;
            match token {
                Token::Eof | Token::DataBlock(_) => {
                    self.push_back(token);
                    break;
                }
                Token::LoopStart => self.parse_loop(&mut block)?,
                Token::SaveStart(frame) if !in_frame => {
                    let frame = self.parse_block(frame, true)?;
                    block.save_frames.push(frame);
                }
                Token::SaveStart(_) => {
                    self.push_back(token);
                    break;
                }
                Token::SaveEnd if in_frame => break,
                Token::SaveEnd => {}
                Token::Tag(tag) => self.parse_single(&mut block, tag)?,
                Token::Val(_) => {} // stray value, skip
            }
        }

        Ok(block)
    }

    fn expect_value(&mut self) -> Result<Value, CifParseError> {
        match self.next()? {
            Token::Val(v) => Ok(v),
            other => {
                let line = self.line_at(self.token_start);
                self.push_back(other);
                Err(CifParseError::ExpectedValue(line))
            }
        }
    }

    /// Consecutive key-value pairs of one category become a single-row
    /// category.
    fn parse_single(&mut self, block: &mut Block, tag: String) -> Result<(), CifParseError> {
        let (category, field) = split_tag(&tag);
        let flat = !tag.contains('.');
        let mut fields = vec![(field.to_string(), vec![self.expect_value()?])];

        if !flat {
            loop {
                match self.next()? {
                    Token::Tag(next) if next.contains('.') && split_tag(&next).0 == category => {
                        let (_, field) = split_tag(&next);
                        fields.push((field.to_string(), vec![self.expect_value()?]));
                    }
                    other => {
                        self.push_back(other);
                        break;
                    }
                }
            }
        }

        block.add_fields(category, 1, fields);
        Ok(())
    }

    fn parse_loop(&mut self, block: &mut Block) -> Result<(), CifParseError> {
        let loop_line = self.line_at(self.token_start);
        let mut tags = Vec::new();
        let mut values = Vec::new();

        loop {
            match self.next()? {
                Token::Tag(t) => tags.push(t),
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }

        loop {
            match self.next()? {
                Token::Val(v) => values.push(v),
                other => {
                    self.push_back(other);
                    break;
                }
            }
        }

        if tags.is_empty() {
            return Ok(());
        }
        if values.len() % tags.len() != 0 {
            return Err(CifParseError::LoopValueCount(loop_line));
        }

        let row_count = values.len() / tags.len();
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(row_count); tags.len()];
        for (i, v) in values.into_iter().enumerate() {
            columns[i % tags.len()].push(v);
        }

        // Loop columns are grouped by category, preserving tag order.
        let mut groups: Vec<(&str, Vec<(String, Vec<Value>)>)> = Vec::new();
        for (tag, column) in tags.iter().zip(columns) {
            let (category, field) = split_tag(tag);
            match groups.iter_mut().find(|(c, _)| *c == category) {
                Some((_, fields)) => fields.push((field.to_string(), column)),
                None => groups.push((category, vec![(field.to_string(), column)])),
            }
        }
        for (category, fields) in groups {
            block.add_fields(category, row_count, fields);
        }
        Ok(())
    }
}

fn classify_unquoted(s: &str) -> Token {
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("data_") {
        Token::DataBlock(s[5..].to_string())
    } else if lower == "loop_" {
        Token::LoopStart
    } else if lower.starts_with("save_") {
        if s.len() == 5 {
            Token::SaveEnd
        } else {
            Token::SaveStart(s[5..].to_string())
        }
    } else if s.starts_with('_') {
        Token::Tag(s.to_string())
    } else if s == "." {
        Token::Val(Value::Inapplicable)
    } else if s == "?" {
        Token::Val(Value::Unknown)
    } else {
        Token::Val(Value::Str(s.to_string()))
    }
}
