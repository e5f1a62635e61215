//! Lexical statement splitter
//!
//! Walks the input once, left to right, tracking a single lexical state. Only a
//! `;` seen in `Normal` state ends a statement; quotes, dollar-quoted bodies and
//! comments make it inert.

use std::fmt;
use std::sync::LazyLock;

use pgprof_core::{PgprofError, Result};
use regex::Regex;

/// Matches a dollar-quote tag (`$$`, `$body$`) at the start of the haystack
static DOLLAR_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$[A-Za-z0-9_]*\$").expect("valid regex"));

/// Current lexical mode of the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
enum LexState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
    /// Inside a dollar-quoted body; carries the full tag including both `$`
    DollarQuoted(String),
}

/// Kind of region that was still open when the input ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionKind {
    SingleQuote,
    DoubleQuote,
    BlockComment,
    DollarQuote(String),
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::SingleQuote => write!(f, "single-quoted string"),
            RegionKind::DoubleQuote => write!(f, "double-quoted identifier"),
            RegionKind::BlockComment => write!(f, "block comment"),
            RegionKind::DollarQuote(tag) => write!(f, "dollar-quoted string {}", tag),
        }
    }
}

/// An unterminated region and the byte offset where it was opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnterminatedRegion {
    pub kind: RegionKind,
    pub offset: usize,
}

impl fmt::Display for UnterminatedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unterminated {} starting at byte {}", self.kind, self.offset)
    }
}

/// A statement extracted from the input, numbered from 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub index: usize,
    pub text: String,
}

/// Lazy iterator over the statements of a SQL script.
///
/// Each yielded statement is trimmed and non-empty. Comments are removed; a
/// space replaces a comment that directly follows a non-whitespace character.
pub struct StatementSplitter<'a> {
    text: &'a str,
    pos: usize,
    state: LexState,
    buf: String,
    region_start: usize,
    unterminated: Option<UnterminatedRegion>,
    finished: bool,
}

impl<'a> StatementSplitter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            state: LexState::Normal,
            buf: String::new(),
            region_start: 0,
            unterminated: None,
            finished: false,
        }
    }

    /// The region left open at end of input, once the iterator is exhausted
    pub fn unterminated(&self) -> Option<&UnterminatedRegion> {
        self.unterminated.as_ref()
    }

    fn enter(&mut self, state: LexState) {
        self.region_start = self.pos;
        self.state = state;
    }

    /// Keeps `a--b` from fusing into `ab` once the comment is dropped
    fn separate_comment(&mut self) {
        if self.buf.chars().last().is_some_and(|c| !c.is_whitespace()) {
            self.buf.push(' ');
        }
    }

    fn take_statement(&mut self) -> Option<String> {
        let statement = self.buf.trim().to_string();
        self.buf.clear();
        (!statement.is_empty()).then_some(statement)
    }

    fn finish(&mut self) -> Option<String> {
        self.finished = true;

        let kind = match &self.state {
            LexState::Normal | LexState::LineComment => None,
            LexState::SingleQuoted => Some(RegionKind::SingleQuote),
            LexState::DoubleQuoted => Some(RegionKind::DoubleQuote),
            LexState::BlockComment => Some(RegionKind::BlockComment),
            LexState::DollarQuoted(tag) => Some(RegionKind::DollarQuote(tag.clone())),
        };
        if let Some(kind) = kind {
            let region = UnterminatedRegion {
                kind,
                offset: self.region_start,
            };
            tracing::warn!(region = %region, "SQL input ended inside an open region");
            self.unterminated = Some(region);
        }

        self.take_statement()
    }

    /// Advances over one lexical step. Returns a statement when a top-level `;`
    /// closes a non-empty one.
    fn step(&mut self) -> Option<String> {
        let text = self.text;
        let rest = &text[self.pos..];
        let ch = rest.chars().next()?;

        match &self.state {
            LexState::LineComment => {
                if ch == '\n' {
                    self.state = LexState::Normal;
                }
                self.pos += ch.len_utf8();
            }
            LexState::BlockComment => {
                if rest.starts_with("*/") {
                    self.state = LexState::Normal;
                    self.pos += 2;
                } else {
                    self.pos += ch.len_utf8();
                }
            }
            LexState::DollarQuoted(tag) => {
                if rest.starts_with(tag.as_str()) {
                    let len = tag.len();
                    self.buf.push_str(&rest[..len]);
                    self.pos += len;
                    self.state = LexState::Normal;
                } else {
                    self.buf.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
            LexState::SingleQuoted | LexState::DoubleQuoted => {
                let quote = if self.state == LexState::SingleQuoted {
                    '\''
                } else {
                    '"'
                };
                if ch == quote {
                    // A doubled quote is an escaped literal quote
                    if rest[1..].starts_with(quote) {
                        self.buf.push(quote);
                        self.buf.push(quote);
                        self.pos += 2;
                        return None;
                    }
                    self.state = LexState::Normal;
                }
                self.buf.push(ch);
                self.pos += ch.len_utf8();
            }
            LexState::Normal => return self.step_normal(rest, ch),
        }

        None
    }

    fn step_normal(&mut self, rest: &'a str, ch: char) -> Option<String> {
        if rest.starts_with("--") {
            self.separate_comment();
            self.enter(LexState::LineComment);
            self.pos += 2;
            return None;
        }

        if rest.starts_with("/*") {
            self.separate_comment();
            self.enter(LexState::BlockComment);
            self.pos += 2;
            return None;
        }

        if ch == '$'
            && let Some(tag) = DOLLAR_TAG_REGEX.find(rest)
        {
            let tag = tag.as_str().to_string();
            self.buf.push_str(&tag);
            self.enter(LexState::DollarQuoted(tag.clone()));
            self.pos += tag.len();
            return None;
        }

        match ch {
            '\'' => self.enter(LexState::SingleQuoted),
            '"' => self.enter(LexState::DoubleQuoted),
            ';' => {
                self.pos += 1;
                return self.take_statement();
            }
            _ => {}
        }

        self.buf.push(ch);
        self.pos += ch.len_utf8();
        None
    }
}

impl Iterator for StatementSplitter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }

        while self.pos < self.text.len() {
            if let Some(statement) = self.step() {
                return Some(statement);
            }
        }

        self.finish()
    }
}

/// Numbers already-split statement texts from 1
pub fn number_statements<I>(texts: I) -> impl Iterator<Item = Statement>
where
    I: IntoIterator<Item = String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Statement { index: i + 1, text })
}

/// Iterates the statements of `text`, numbered from 1
pub fn statements(text: &str) -> impl Iterator<Item = Statement> + '_ {
    number_statements(StatementSplitter::new(text))
}

/// Splits a SQL script into trimmed, non-empty statements.
///
/// Input that ends inside an open quote, block comment or dollar-quoted body is
/// tolerated: the buffered remainder becomes the last statement and a warning
/// is logged.
pub fn split_statements(text: &str) -> Vec<String> {
    StatementSplitter::new(text).collect()
}

/// Like [`split_statements`], but an unterminated region is a `Lexical` error
pub fn split_statements_strict(text: &str) -> Result<Vec<String>> {
    let mut splitter = StatementSplitter::new(text);
    let statements: Vec<String> = splitter.by_ref().collect();

    match splitter.unterminated() {
        Some(region) => Err(PgprofError::Lexical(region.to_string())),
        None => Ok(statements),
    }
}
