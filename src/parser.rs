use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::{debug, trace};

use crate::lexer::{Token, TokenKind};

#[derive(Diagnostic, Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unclosed parenthesis")]
    #[diagnostic(code(paren_calc::parse::unclosed_paren), help("add a matching `)`"))]
    UnclosedParen {
        #[label("opened here")]
        span: SourceSpan,
    },

    #[error("unmatched closing parenthesis")]
    #[diagnostic(code(paren_calc::parse::unmatched_paren))]
    UnmatchedCloseParen {
        #[label("nothing to close")]
        span: SourceSpan,
    },

    #[error("integer literal `{literal}` does not fit in 64 bits")]
    #[diagnostic(code(paren_calc::parse::integer_range))]
    IntegerOutOfRange {
        literal: String,
        #[label("this numeric literal")]
        span: SourceSpan,
    },

    #[error("expression nested deeper than {limit} levels")]
    #[diagnostic(code(paren_calc::parse::too_deep), help("raise or remove --max-depth"))]
    NestingTooDeep {
        limit: usize,
        #[label("this exceeds the limit")]
        span: SourceSpan,
    },

    #[error("token {kind:?} is not an operator")]
    #[diagnostic(
        code(paren_calc::internal),
        help("only `+` and `-` map to operations; reaching this is a parser bug")
    )]
    NotAnOperator {
        kind: TokenKind,
        #[label("here")]
        span: SourceSpan,
    },
}

impl ParseError {
    /// True for invariant violations inside the parser, false for bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, ParseError::NotAnOperator { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Addition,
    Subtraction,
}

impl TryFrom<TokenKind> for Operation {
    type Error = TokenKind;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        match kind {
            TokenKind::Plus => Ok(Operation::Addition),
            TokenKind::Minus => Ok(Operation::Subtraction),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Operation::Addition => "+",
                Operation::Subtraction => "-",
            }
        )
    }
}

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Integer(i64),
    Binary(BinaryOperation),
}

/// Two operand slots and the operator combining them.
///
/// Slots left empty by the parser stay `None`; evaluation reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryOperation {
    pub op: Option<Operation>,
    pub left: Option<Box<Element>>,
    pub right: Option<Box<Element>>,
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Integer(n) => write!(f, "{}", n),
            Element::Binary(binary) => write!(f, "{}", binary),
        }
    }
}

impl std::fmt::Display for BinaryOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        match &self.left {
            Some(left) => write!(f, "{}", left)?,
            None => write!(f, "?")?,
        }
        match &self.op {
            Some(op) => write!(f, " {} ", op)?,
            None => write!(f, " ? ")?,
        }
        match &self.right {
            Some(right) => write!(f, "{}", right)?,
            None => write!(f, "?")?,
        }
        write!(f, ")")
    }
}

/// How a region with more than one operator is grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// Later operators and operands overwrite the pending ones, so `1+2-3`
    /// becomes `1 - 3`.
    #[default]
    TwoSlot,
    /// A full pair is folded into the left slot when another operator
    /// arrives, so `1+2-3` becomes `(1 + 2) - 3`.
    LeftFold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub grouping: Grouping,
    /// Deepest nesting accepted, counting both parentheses and left-fold
    /// chains; `None` accepts any depth.
    pub max_depth: Option<usize>,
}

/// Call-local accumulator for one parenthesised region.
///
/// Heights count `BinaryOperation` levels below each slot so folded chains
/// are held to the same nesting limit as parentheses.
struct Slots {
    grouping: Grouping,
    op: Option<Operation>,
    left: Option<(Element, usize)>,
    right: Option<(Element, usize)>,
}

impl Slots {
    fn new(grouping: Grouping) -> Self {
        Self {
            grouping,
            op: None,
            left: None,
            right: None,
        }
    }

    fn push_operand(&mut self, element: Element, height: usize) {
        if self.left.is_none() {
            self.left = Some((element, height));
        } else {
            self.right = Some((element, height));
        }
    }

    /// Records the pending operator, returning the new left height if a
    /// complete pair was folded first.
    fn set_operator(&mut self, op: Operation) -> Option<usize> {
        let mut folded_height = None;
        if self.grouping == Grouping::LeftFold && self.right.is_some() {
            let (left, left_height) = split(self.left.take());
            let (right, right_height) = split(self.right.take());
            let height = 1 + left_height.max(right_height);
            let folded = BinaryOperation {
                op: self.op,
                left,
                right,
            };
            self.left = Some((Element::Binary(folded), height));
            folded_height = Some(height);
        }
        self.op = Some(op);
        folded_height
    }

    fn finish(self) -> (Element, usize) {
        let (left, left_height) = split(self.left);
        let (right, right_height) = split(self.right);
        let tree = Element::Binary(BinaryOperation {
            op: self.op,
            left,
            right,
        });
        (tree, 1 + left_height.max(right_height))
    }
}

fn split(slot: Option<(Element, usize)>) -> (Option<Box<Element>>, usize) {
    match slot {
        Some((element, height)) => (Some(Box::new(element)), height),
        None => (None, 0),
    }
}

/// Index of the `)` closing the `(` at `open`, found by depth counting.
fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open + 1) {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen if depth == 0 => return Some(i),
            TokenKind::RightParen => depth -= 1,
            _ => {}
        }
    }
    None
}

pub struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    options: ParseOptions,
}

impl<'t, 'a> Parser<'t, 'a> {
    pub fn new(tokens: &'t [Token<'a>]) -> Self {
        Self::with_options(tokens, ParseOptions::default())
    }

    pub fn with_options(tokens: &'t [Token<'a>], options: ParseOptions) -> Self {
        Self { tokens, options }
    }

    pub fn parse(&self) -> Result<Element, ParseError> {
        debug!(tokens = self.tokens.len(), options = ?self.options, "parsing");
        let (tree, _) = self.parse_region(self.tokens, 0)?;
        Ok(tree)
    }

    fn check_depth(&self, depth: usize, token: &Token<'a>) -> Result<(), ParseError> {
        match self.options.max_depth {
            Some(limit) if depth > limit => Err(ParseError::NestingTooDeep {
                limit,
                span: token.span(),
            }),
            _ => Ok(()),
        }
    }

    /// Parses one region, returning its tree and height.
    fn parse_region(
        &self,
        tokens: &[Token<'a>],
        depth: usize,
    ) -> Result<(Element, usize), ParseError> {
        let mut slots = Slots::new(self.options.grouping);

        let mut i = 0;
        while i < tokens.len() {
            let token = tokens[i];
            match token.kind {
                TokenKind::Integer => {
                    let value = token.slice.parse::<i64>().map_err(|_| {
                        ParseError::IntegerOutOfRange {
                            literal: token.slice.to_string(),
                            span: token.span(),
                        }
                    })?;
                    slots.push_operand(Element::Integer(value), 0);
                }
                TokenKind::LeftParen => {
                    let close = matching_paren(tokens, i)
                        .ok_or(ParseError::UnclosedParen { span: token.span() })?;
                    self.check_depth(depth + 1, &token)?;

                    trace!(depth = depth + 1, len = close - i - 1, "entering nested region");
                    let (inner, height) = self.parse_region(&tokens[i + 1..close], depth + 1)?;
                    slots.push_operand(inner, height);
                    i = close;
                }
                TokenKind::RightParen => {
                    return Err(ParseError::UnmatchedCloseParen { span: token.span() });
                }
                kind => {
                    let op = Operation::try_from(kind).map_err(|kind| {
                        ParseError::NotAnOperator {
                            kind,
                            span: token.span(),
                        }
                    })?;
                    if let Some(height) = slots.set_operator(op) {
                        self.check_depth(depth + height, &token)?;
                    }
                }
            }
            i += 1;
        }

        Ok(slots.finish())
    }
}

/// Parses a token sequence with the default options.
pub fn parse(tokens: &[Token<'_>]) -> Result<Element, ParseError> {
    Parser::new(tokens).parse()
}
