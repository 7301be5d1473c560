pub mod lexer;
pub mod matcher;
pub mod token;
pub mod value_parser;

pub use lexer::Lexer;
pub use matcher::{FunctionMatcher, OperatorMatcher};
pub use token::{LiteralStyle, Token};
