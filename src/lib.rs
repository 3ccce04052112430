pub mod calc;
pub mod evaluator;
pub mod lexer;
pub mod parser;


pub use calc::*;
pub use lexer::*;
