//! Integer calculator: a finite-state tokenizer, a recursive-descent parser
//! and a tracing tree-walking evaluator.
//!
//! ```
//! let mut out = Vec::new();
//! let value = calculator::execute_to("2+3*5", &mut out).unwrap();
//! assert_eq!(value, 17);
//! ```

use std::io::Write;

use miette::IntoDiagnostic;

pub mod ast;
pub mod eval;
pub mod lex;
pub mod parse;

pub use ast::Ast;
pub use eval::{EvalError, Evaluator};
pub use lex::{Lexer, TokenReader};
pub use parse::{Parser, SyntaxError};

/// Headroom left on the stack before a recursive step switches to a fresh
/// segment. Nesting depth is bounded only by memory.
pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;
pub(crate) const STACK_GROWTH: usize = 1024 * 1024;

/// Parses `script` as a program.
pub fn parse(script: &str) -> Result<Ast<'_>, SyntaxError> {
    Parser::new(script).parse_program()
}

/// Evaluates `ast`, writing the trace to `out`.
pub fn evaluate<W: Write>(ast: &Ast<'_>, out: W) -> Result<i64, EvalError> {
    Evaluator::new(out).evaluate(ast)
}

/// Runs the whole pipeline, printing the tree and the trace to stdout.
pub fn execute(script: &str) -> miette::Result<i64> {
    execute_to(script, std::io::stdout().lock())
}

/// Runs the whole pipeline: parse, dump the tree to `out`, then evaluate with
/// the trace going to `out` as well. Nothing is written when parsing fails.
pub fn execute_to<W: Write>(script: &str, mut out: W) -> miette::Result<i64> {
    let ast = parse(script)?;
    write!(out, "{}", ast.dump()).into_diagnostic()?;
    let value = evaluate(&ast, &mut out)?;
    Ok(value)
}
