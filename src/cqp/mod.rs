//! Compiler for the corpus engine's pattern-matching query language.

pub mod compiler;
pub mod interval;
pub mod options;

pub use self::compiler::{
    compile_criteria, compile_expression, compile_pattern, compile_sequence, value_expression,
};
pub use self::interval::interval_pattern;
pub use self::options::{Criteria, OptValue, QueryOpts};
