use miette::SourceSpan;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub slice: &'a str,
    pub offset: usize,
    pub kind: TokenKind,
}

impl<'a> Token<'a> {
    pub fn span(&self) -> SourceSpan {
        (self.offset, self.slice.len()).into()
    }
}

impl<'a> std::fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Integer,
    Plus,
    Minus,
    LeftParen,
    RightParen,
}

/// Scans source text into tokens, one lexeme per call to `next`.
///
/// Anything that is not an ASCII digit, `+`, `-`, `(` or `)` is skipped
/// without producing a token or an error, so whitespace needs no special case.
#[derive(Debug)]
pub struct Lexer<'a> {
    rest: &'a str,
    byte: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            rest: input,
            byte: 0,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut chars = self.rest.chars();
            let c = chars.next()?;
            let offset = self.byte;
            let slice = &self.rest[..c.len_utf8()];
            let c_onwards = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            let make_token = |kind: TokenKind| {
                Some(Token {
                    slice,
                    offset,
                    kind,
                })
            };

            match c {
                '(' => return make_token(TokenKind::LeftParen),
                ')' => return make_token(TokenKind::RightParen),
                '+' => return make_token(TokenKind::Plus),
                '-' => return make_token(TokenKind::Minus),
                '0'..='9' => {
                    let end = c_onwards
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(c_onwards.len());
                    let literal = &c_onwards[..end];

                    let extra_byte = literal.len() - c.len_utf8();
                    self.byte += extra_byte;
                    self.rest = &self.rest[extra_byte..];

                    return Some(Token {
                        slice: literal,
                        offset,
                        kind: TokenKind::Integer,
                    });
                }
                c => {
                    trace!(offset, character = ?c, "skipping unrecognized character");
                    continue;
                }
            }
        }
    }
}

/// Collects every token of `input` in source order.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
