use miette::Diagnostic;
use thiserror::Error;

use crate::parser::{BinaryOperation, Element, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Diagnostic, Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("invalid expression: missing {side} operand")]
    #[diagnostic(code(paren_calc::eval::missing_operand))]
    MissingOperand { side: Side },

    #[error("invalid expression: missing operator")]
    #[diagnostic(
        code(paren_calc::eval::missing_operator),
        help("every group needs exactly two operands joined by `+` or `-`")
    )]
    MissingOperator,

    #[error("integer overflow evaluating {lhs} {op} {rhs}")]
    #[diagnostic(code(paren_calc::eval::overflow))]
    Overflow { op: Operation, lhs: i64, rhs: i64 },
}

impl Operation {
    pub fn apply(self, lhs: i64, rhs: i64) -> Result<i64, EvalError> {
        let result = match self {
            Operation::Addition => lhs.checked_add(rhs),
            Operation::Subtraction => lhs.checked_sub(rhs),
        };
        result.ok_or(EvalError::Overflow { op: self, lhs, rhs })
    }
}

impl Element {
    /// Folds the tree into a single integer.
    ///
    /// Recursion depth follows tree depth: parenthesis nesting plus the
    /// length of left-fold chains. Trees parsed without `max_depth` can
    /// exhaust the stack on hostile input.
    pub fn value(&self) -> Result<i64, EvalError> {
        match self {
            Element::Integer(n) => Ok(*n),
            Element::Binary(binary) => binary.value(),
        }
    }
}

impl BinaryOperation {
    pub fn value(&self) -> Result<i64, EvalError> {
        let left = self
            .left
            .as_deref()
            .ok_or(EvalError::MissingOperand { side: Side::Left })?
            .value()?;
        let op = self.op.ok_or(EvalError::MissingOperator)?;
        let right = self
            .right
            .as_deref()
            .ok_or(EvalError::MissingOperand { side: Side::Right })?
            .value()?;

        op.apply(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lexer::lex, parser::parse};

    fn eval_input(input: &str) -> Result<i64, EvalError> {
        parse(&lex(input)).unwrap().value()
    }

    #[test]
    fn test_literal() {
        assert_eq!(Element::Integer(9).value(), Ok(9));
    }

    #[test]
    fn test_add_and_subtract() {
        assert_eq!(eval_input("12+7"), Ok(19));
        assert_eq!(eval_input("12 - 7"), Ok(5));
        assert_eq!(eval_input("7-12"), Ok(-5));
    }

    #[test]
    fn test_nested_expression() {
        assert_eq!(eval_input("((13+4)-(12+1)) + (12+7)"), Ok(23));
    }

    #[test]
    fn test_two_slot_chain() {
        assert_eq!(eval_input("1+2+3"), Ok(4));
        assert_eq!(eval_input("1+2-3"), Ok(-2));
    }

    #[test]
    fn test_empty_tree_is_invalid() {
        assert_eq!(
            eval_input(""),
            Err(EvalError::MissingOperand { side: Side::Left })
        );
    }

    #[test]
    fn test_single_literal_is_invalid() {
        assert_eq!(eval_input("42"), Err(EvalError::MissingOperator));
        assert_eq!(eval_input("(5)+1"), Err(EvalError::MissingOperator));
    }

    #[test]
    fn test_trailing_operator_is_invalid() {
        assert_eq!(
            eval_input("1+"),
            Err(EvalError::MissingOperand { side: Side::Right })
        );
    }

    #[test]
    fn test_leading_operator() {
        // the first operand always lands in the left slot
        assert_eq!(
            eval_input("+1"),
            Err(EvalError::MissingOperand { side: Side::Right })
        );
    }

    #[test]
    fn test_overflow() {
        let tree = Element::Binary(BinaryOperation {
            op: Some(Operation::Addition),
            left: Some(Box::new(Element::Integer(i64::MAX))),
            right: Some(Box::new(Element::Integer(1))),
        });
        assert_eq!(
            tree.value(),
            Err(EvalError::Overflow {
                op: Operation::Addition,
                lhs: i64::MAX,
                rhs: 1,
            })
        );
    }

    #[test]
    fn test_value_is_idempotent() {
        let tree = parse(&lex("(100-(3+4))+1")).unwrap();
        let first = tree.value();
        assert_eq!(first, Ok(94));
        assert_eq!(tree.value(), first);
        assert_eq!(tree.value(), first);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EvalError::MissingOperand { side: Side::Right }.to_string(),
            "invalid expression: missing right operand"
        );
        assert_eq!(
            EvalError::Overflow {
                op: Operation::Subtraction,
                lhs: i64::MIN,
                rhs: 1
            }
            .to_string(),
            format!("integer overflow evaluating {} - 1", i64::MIN)
        );
    }
}
