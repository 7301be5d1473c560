pub mod evaluator;
pub mod functions;
pub mod operators;
pub mod path;
pub mod validator;

pub use evaluator::evaluate;
pub use functions::FunctionCatalog;
pub use operators::{OperatorCatalog, OperatorType};
pub use validator::Validator;
