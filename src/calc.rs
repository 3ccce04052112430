use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::{
    evaluator::EvalError,
    lexer::lex,
    parser::{ParseError, ParseOptions, Parser},
};

#[derive(Diagnostic, Debug, Error, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Eval(#[from] EvalError),
}

/// Lexes, parses and evaluates `input` in one go.
pub fn calc_eval(input: &str, options: ParseOptions) -> Result<i64, CalcError> {
    let tokens = lex(input);
    let tree = Parser::with_options(&tokens, options).parse()?;
    debug!(%tree, "evaluating");
    Ok(tree.value()?)
}

/// The two lines the demo prints: the token stream joined without
/// separators, then `<input> = <value>`.
pub fn transcript(input: &str, options: ParseOptions) -> Result<[String; 2], CalcError> {
    let tokens: String = lex(input).iter().map(|t| t.to_string()).collect();
    let value = calc_eval(input, options)?;
    Ok([tokens, format!("{input} = {value}")])
}
