use std::{io::Write, num::ParseIntError};

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::ast::{Ast, AstNode, AstNodeKind, NodeId};

#[derive(Error, Debug, Diagnostic)]
pub enum EvalError {
    #[error("division by zero: `{dividend} / 0`")]
    #[diagnostic(code(calculator::eval::division_by_zero))]
    DivisionByZero { dividend: i64 },

    #[error("integer literal `{literal}` does not fit in 64 bits")]
    #[diagnostic(code(calculator::eval::invalid_literal))]
    InvalidLiteral {
        literal: String,
        #[source]
        source: ParseIntError,
    },

    #[error("integer overflow in `{lhs} {operator} {rhs}`")]
    #[diagnostic(code(calculator::eval::overflow))]
    Overflow {
        lhs: i64,
        operator: String,
        rhs: i64,
    },

    #[error("malformed {kind} node: {reason}")]
    #[diagnostic(code(calculator::eval::malformed_node))]
    MalformedNode {
        kind: AstNodeKind,
        reason: &'static str,
    },

    #[error("failed to write evaluation trace")]
    #[diagnostic(code(calculator::eval::trace))]
    Trace(#[from] std::io::Error),
}

/// Tree-walking evaluator. Every visited node writes a `Calculating:` line
/// before its children are reduced and a `Result:` line after, indented one
/// tab per level.
pub struct Evaluator<W> {
    out: W,
    indent: String,
}

impl<W: Write> Evaluator<W> {
    pub fn new(out: W) -> Self {
        Evaluator {
            out,
            indent: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn evaluate(&mut self, ast: &Ast<'_>) -> Result<i64, EvalError> {
        let Some(root) = ast.root() else {
            return Ok(0);
        };
        self.indent.clear();
        let value = self.eval_node(ast, root)?;
        debug!(value, "evaluated tree");
        Ok(value)
    }

    fn eval_node(&mut self, ast: &Ast<'_>, id: NodeId) -> Result<i64, EvalError> {
        stacker::maybe_grow(crate::STACK_RED_ZONE, crate::STACK_GROWTH, || {
            self.reduce(ast, id)
        })
    }

    fn reduce(&mut self, ast: &Ast<'_>, id: NodeId) -> Result<i64, EvalError> {
        let node = ast.node(id);
        writeln!(self.out, "{}Calculating: {}", self.indent, node.kind)?;

        let result = match node.kind {
            AstNodeKind::Program => {
                let mut result = 0;
                self.indent.push('\t');
                for &child in node.children() {
                    result = self.eval_node(ast, child)?;
                }
                self.indent.pop();
                result
            }
            AstNodeKind::Additive => {
                let (lhs, rhs) = self.operands(ast, node)?;
                let value = match node.text {
                    "+" => lhs.checked_add(rhs),
                    "-" => lhs.checked_sub(rhs),
                    _ => return Err(unknown_operator(node)),
                };
                value.ok_or_else(|| overflow(lhs, node.text, rhs))?
            }
            AstNodeKind::Multiplicative => {
                let (lhs, rhs) = self.operands(ast, node)?;
                match node.text {
                    "*" => lhs
                        .checked_mul(rhs)
                        .ok_or_else(|| overflow(lhs, node.text, rhs))?,
                    "/" if rhs == 0 => return Err(EvalError::DivisionByZero { dividend: lhs }),
                    "/" => lhs
                        .checked_div(rhs)
                        .ok_or_else(|| overflow(lhs, node.text, rhs))?,
                    _ => return Err(unknown_operator(node)),
                }
            }
            AstNodeKind::IntLiteral => {
                node.text
                    .parse::<i64>()
                    .map_err(|source| EvalError::InvalidLiteral {
                        literal: node.text.to_string(),
                        source,
                    })?
            }
            // no variable environment: everything else reduces to zero
            AstNodeKind::Identifier
            | AstNodeKind::IntDeclaration
            | AstNodeKind::Assignment
            | AstNodeKind::Primary
            | AstNodeKind::Expression => 0,
        };

        writeln!(self.out, "{}Result: {result}", self.indent)?;
        Ok(result)
    }

    fn operands(&mut self, ast: &Ast<'_>, node: &AstNode<'_>) -> Result<(i64, i64), EvalError> {
        let &[lhs, rhs] = node.children() else {
            return Err(EvalError::MalformedNode {
                kind: node.kind,
                reason: "expected exactly two operands",
            });
        };
        self.indent.push('\t');
        let lhs = self.eval_node(ast, lhs)?;
        let rhs = self.eval_node(ast, rhs)?;
        self.indent.pop();
        Ok((lhs, rhs))
    }
}

fn overflow(lhs: i64, operator: &str, rhs: i64) -> EvalError {
    EvalError::Overflow {
        lhs,
        operator: operator.to_string(),
        rhs,
    }
}

fn unknown_operator(node: &AstNode<'_>) -> EvalError {
    EvalError::MalformedNode {
        kind: node.kind,
        reason: "unknown operator",
    }
}
