//! A tree-walking interpreter for the wamon scripting language.
//!
//! Source text becomes tokens, tokens become an abstract syntax tree grouped
//! into a package unit, the unit is semantically validated, and the validated
//! tree is executed directly. The embedder flow is:
//!
//! ```ignore
//! let tokens = Scanner::new().scan(script)?;
//! let pu = merge_package_units(vec![parse(&tokens)?])?;
//! TypeChecker::new(&pu).check_all()?;
//! let mut interpreter = Interpreter::new(pu)?;
//! let result = interpreter.call_function_by_name("main$my_func", vec![])?;
//! ```

pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod package_unit;
pub mod parser;
pub mod typechecker;
pub mod types;

pub use interpreter::{
    new_ref, variable_factory, Interpreter, RuntimeError, Value, ValueCategory, VarRef, Variable,
};
pub use lexer::{LexError, Scanner, Token};
pub use package_unit::{merge_package_units, PackageUnit};
pub use parser::{parse, ParseError};
pub use typechecker::{TypeChecker, TypeError};
pub use types::Type;
