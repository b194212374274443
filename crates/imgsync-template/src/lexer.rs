//! Tokenization of variable references in template strings.
//!
//! A reference is the sigil `$` followed by up to two opening brackets
//! (`[`, `(` or `{`), an identifier made of `[A-Za-z0-9_-]`, and as many
//! closing brackets as were opened. Offsets are counted in characters, not
//! bytes.
//!
//! The scanner is a small state machine:
//!
//! ```text
//! Scanning --'$'--> InBracketOpen --> InIdentifier --> InBracketClose --> Scanning
//!                                          |
//!                                          +--(empty identifier)--> Scanning
//! ```

use imgsync_common::constants::TEMPLATE_SIGIL;
use imgsync_common::error::{ImgsyncError, LexErrorKind, Result};

/// Maximum number of brackets that may wrap one identifier.
pub const MAX_BRACKET_DEPTH: usize = 2;

const OPENERS: [char; 3] = ['[', '(', '{'];
const CLOSERS: [char; 3] = [']', ')', '}'];

/// A variable reference found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Offset of the sigil.
    pub start: usize,
    /// Offset of the last consumed character (inclusive).
    pub end: usize,
    /// Number of brackets consumed on each side.
    pub bracket_depth: usize,
    /// Captured identifier.
    pub name: String,
}

impl Token {
    /// Returns the exact slice of `text` this token spans, sigil included.
    #[must_use]
    pub fn source_text(&self, text: &str) -> String {
        text.chars()
            .skip(self.start)
            .take(self.end + 1 - self.start)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum State {
    Scanning,
    InBracketOpen {
        sigil: usize,
        depth: usize,
        opener: Option<char>,
    },
    InIdentifier {
        sigil: usize,
        depth: usize,
        opener: Option<char>,
        name_start: usize,
    },
    InBracketClose {
        sigil: usize,
        depth: usize,
        opener: Option<char>,
        name_start: usize,
        name_end: usize,
        closed: usize,
    },
}

/// Lazy token stream over one template.
///
/// Yields `Err` at most once; the stream is exhausted afterwards.
///
/// A sigil not followed by an identifier is plain text and scanning resumes
/// right after it, so `$$name` yields one reference starting at the second
/// `$`.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    strict: bool,
    state: State,
    finished: bool,
}

impl Lexer {
    /// Creates a lexer over `text`.
    ///
    /// In strict mode every bracket around an identifier must be of the
    /// kind established by the first opener.
    #[must_use]
    pub fn new(text: &str, strict: bool) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            strict,
            state: State::Scanning,
            finished: false,
        }
    }

    fn fail(&mut self, kind: LexErrorKind) -> Option<Result<Token>> {
        self.finished = true;
        Some(Err(ImgsyncError::Lex {
            kind,
            position: self.pos,
        }))
    }

    fn step(&mut self) -> Option<Result<Token>> {
        loop {
            match self.state {
                State::Scanning => {
                    let offset = self.chars[self.pos..]
                        .iter()
                        .position(|&c| c == TEMPLATE_SIGIL)?;
                    let sigil = self.pos + offset;
                    self.pos = sigil + 1;
                    self.state = State::InBracketOpen {
                        sigil,
                        depth: 0,
                        opener: None,
                    };
                }
                State::InBracketOpen {
                    sigil,
                    depth,
                    opener,
                } => match self.chars.get(self.pos).copied() {
                    Some(c) if depth < MAX_BRACKET_DEPTH && OPENERS.contains(&c) => {
                        if self.strict {
                            if let Some(expected) = opener.filter(|&o| o != c) {
                                return self.fail(LexErrorKind::BracketMismatch {
                                    expected,
                                    found: c,
                                });
                            }
                        }
                        self.pos += 1;
                        self.state = State::InBracketOpen {
                            sigil,
                            depth: depth + 1,
                            opener: opener.or(Some(c)),
                        };
                    }
                    _ => {
                        self.state = State::InIdentifier {
                            sigil,
                            depth,
                            opener,
                            name_start: self.pos,
                        };
                    }
                },
                State::InIdentifier {
                    sigil,
                    depth,
                    opener,
                    name_start,
                } => {
                    while self.chars.get(self.pos).is_some_and(|&c| is_ident_char(c)) {
                        self.pos += 1;
                    }
                    if self.pos == name_start {
                        self.pos = sigil + 1;
                        self.state = State::Scanning;
                        continue;
                    }
                    self.state = State::InBracketClose {
                        sigil,
                        depth,
                        opener,
                        name_start,
                        name_end: self.pos,
                        closed: 0,
                    };
                }
                State::InBracketClose {
                    sigil,
                    depth,
                    opener,
                    name_start,
                    name_end,
                    closed,
                } => {
                    if closed == depth {
                        self.state = State::Scanning;
                        return Some(Ok(Token {
                            start: sigil,
                            end: self.pos - 1,
                            bracket_depth: depth,
                            name: self.chars[name_start..name_end].iter().collect(),
                        }));
                    }
                    match self.chars.get(self.pos).copied() {
                        Some(c) if CLOSERS.contains(&c) => {
                            if self.strict {
                                if let Some(expected) =
                                    opener.map(closer_for).filter(|&e| e != c)
                                {
                                    return self.fail(LexErrorKind::ClosingMismatch {
                                        expected,
                                        found: c,
                                    });
                                }
                            }
                            self.pos += 1;
                            self.state = State::InBracketClose {
                                sigil,
                                depth,
                                opener,
                                name_start,
                                name_end,
                                closed: closed + 1,
                            };
                        }
                        found => return self.fail(LexErrorKind::Unterminated { found }),
                    }
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = self.step();
        if item.is_none() {
            self.finished = true;
        }
        item
    }
}

impl std::iter::FusedIterator for Lexer {}

const fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn closer_for(opener: char) -> char {
    OPENERS
        .iter()
        .position(|&o| o == opener)
        .map_or(opener, |i| CLOSERS[i])
}

/// Tokenizes `text` into variable references.
///
/// # Errors
///
/// Returns [`ImgsyncError::Lex`] if a bracketed reference is not closed, or,
/// in strict mode, if bracket kinds do not match.
pub fn tokenize(text: &str, strict: bool) -> Result<Vec<Token>> {
    Lexer::new(text, strict).collect()
}
