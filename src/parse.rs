use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    Lexer,
    ast::{Ast, AstNodeKind, NodeId},
    lex::{Token, TokenKind, TokenReader},
};

/// The first structural failure met while parsing. Parsing stops there.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("intDeclaration: variable name expected after `int`")]
    #[diagnostic(
        code(calculator::parse::missing_identifier),
        help("declarations look like `int a;` or `int a = 1;`")
    )]
    MissingIdentifier,

    #[error("intDeclaration: invalid variable initialization, expecting an expression")]
    #[diagnostic(
        code(calculator::parse::missing_initializer),
        help("put an expression after `=`")
    )]
    MissingInitializer,

    #[error("intDeclaration: invalid statement, expecting semicolon")]
    #[diagnostic(
        code(calculator::parse::missing_semicolon),
        help("end the declaration with `;`")
    )]
    MissingSemicolon,

    #[error("additive: invalid additive expression, expecting the right part of `{operator}`")]
    #[diagnostic(
        code(calculator::parse::missing_additive_operand),
        help("remove the trailing `{operator}` or add an operand after it")
    )]
    MissingAdditiveOperand { operator: String },

    #[error(
        "multiplicative: invalid multiplicative expression, expecting the right part of `{operator}`"
    )]
    #[diagnostic(
        code(calculator::parse::missing_multiplicative_operand),
        help("remove the trailing `{operator}` or add an operand after it")
    )]
    MissingMultiplicativeOperand { operator: String },

    #[error("primary: expecting right parenthesis")]
    #[diagnostic(
        code(calculator::parse::missing_right_paren),
        help("close the group with `)`")
    )]
    MissingRightParen,

    #[error("primary: unexpected token `{found}`, expecting a literal, identifier or `(`")]
    #[diagnostic(code(calculator::parse::unexpected_token))]
    UnexpectedToken { found: String },
}

impl SyntaxError {
    /// Name of the grammar rule that detected the error.
    pub fn rule(&self) -> &'static str {
        match self {
            SyntaxError::MissingIdentifier
            | SyntaxError::MissingInitializer
            | SyntaxError::MissingSemicolon => "intDeclaration",
            SyntaxError::MissingAdditiveOperand { .. } => "additive",
            SyntaxError::MissingMultiplicativeOperand { .. } => "multiplicative",
            SyntaxError::MissingRightParen | SyntaxError::UnexpectedToken { .. } => "primary",
        }
    }
}

/// Recursive-descent parser pulling tokens from a [`TokenReader`].
///
/// ```text
/// program        := additive
/// additive       := multiplicative ( ('+'|'-') additive )?
/// multiplicative := primary ( ('*'|'/') multiplicative )?
/// primary        := IntLiteral | Identifier | '(' additive ')'
/// intDeclaration := 'int' Identifier ( '=' additive )? ';'
/// ```
///
/// Binary rules recurse into themselves for the right operand, so chains
/// group to the right: `10-5-2` is `10-(5-2)`.
pub struct Parser<'de> {
    tokens: TokenReader<'de>,
    ast: Ast<'de>,
}

impl<'de> Parser<'de> {
    pub fn new(input: &'de str) -> Self {
        Parser::from_tokens(Lexer::new(input).tokenize())
    }

    pub fn from_tokens(tokens: TokenReader<'de>) -> Self {
        Parser {
            tokens,
            ast: Ast::default(),
        }
    }

    /// The cursor, positioned after whatever the last parse consumed.
    pub fn tokens(&self) -> &TokenReader<'de> {
        &self.tokens
    }

    /// Parses a program: a `Program` node over one additive expression.
    ///
    /// Tokens left after the expression are not an error; they stay in
    /// [`Parser::tokens`].
    pub fn parse_program(&mut self) -> Result<Ast<'de>, SyntaxError> {
        self.ast = Ast::default();
        let program = self.ast.add_node(AstNodeKind::Program, "");
        if let Some(child) = self.additive()? {
            self.ast.add_child(program, child);
        }

        let ast = self.finish(program);
        debug!(
            nodes = ast.len(),
            leftover = self.tokens.len() - self.tokens.position(),
            "parsed program"
        );
        Ok(ast)
    }

    /// Parses `int name ( = additive )? ;`. Returns `None` without consuming
    /// anything when the next token is not `int`.
    pub fn parse_int_declaration(&mut self) -> Result<Option<Ast<'de>>, SyntaxError> {
        self.ast = Ast::default();
        Ok(self.int_declaration()?.map(|node| self.finish(node)))
    }

    /// Parses a bare additive expression. `None` on an exhausted stream.
    pub fn parse_additive(&mut self) -> Result<Option<Ast<'de>>, SyntaxError> {
        self.ast = Ast::default();
        Ok(self.additive()?.map(|node| self.finish(node)))
    }

    fn finish(&mut self, root: NodeId) -> Ast<'de> {
        self.ast.set_root(root);
        std::mem::take(&mut self.ast)
    }

    fn int_declaration(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        trace!("intDeclaration");
        if self.read_if(&[TokenKind::Int]).is_none() {
            return Ok(None);
        }

        let Some(name) = self.read_if(&[TokenKind::Ident]) else {
            return Err(SyntaxError::MissingIdentifier);
        };
        let node = self.ast.add_node(AstNodeKind::IntDeclaration, name.literal);

        if self.read_if(&[TokenKind::Equal]).is_some() {
            let Some(initializer) = self.additive()? else {
                return Err(SyntaxError::MissingInitializer);
            };
            self.ast.add_child(node, initializer);
        }

        if self.read_if(&[TokenKind::Semicolon]).is_none() {
            return Err(SyntaxError::MissingSemicolon);
        }
        Ok(Some(node))
    }

    fn additive(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        stacker::maybe_grow(crate::STACK_RED_ZONE, crate::STACK_GROWTH, || {
            self.additive_rule()
        })
    }

    fn additive_rule(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        trace!("additive");
        let Some(lhs) = self.multiplicative()? else {
            return Ok(None);
        };
        let Some(op) = self.read_if(&[TokenKind::Plus, TokenKind::Minus]) else {
            return Ok(Some(lhs));
        };
        let Some(rhs) = self.additive()? else {
            return Err(SyntaxError::MissingAdditiveOperand {
                operator: op.literal.to_string(),
            });
        };

        Ok(Some(self.binary(AstNodeKind::Additive, op, lhs, rhs)))
    }

    fn multiplicative(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        stacker::maybe_grow(crate::STACK_RED_ZONE, crate::STACK_GROWTH, || {
            self.multiplicative_rule()
        })
    }

    fn multiplicative_rule(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        trace!("multiplicative");
        let Some(lhs) = self.primary()? else {
            return Ok(None);
        };
        let Some(op) = self.read_if(&[TokenKind::Star, TokenKind::Slash]) else {
            return Ok(Some(lhs));
        };
        let Some(rhs) = self.multiplicative()? else {
            return Err(SyntaxError::MissingMultiplicativeOperand {
                operator: op.literal.to_string(),
            });
        };

        Ok(Some(self.binary(AstNodeKind::Multiplicative, op, lhs, rhs)))
    }

    fn primary(&mut self) -> Result<Option<NodeId>, SyntaxError> {
        trace!("primary");
        let Some(&token) = self.tokens.peek() else {
            return Ok(None);
        };

        match token.kind {
            TokenKind::IntLiteral => {
                self.tokens.read();
                Ok(Some(self.ast.add_node(AstNodeKind::IntLiteral, token.literal)))
            }
            TokenKind::Ident => {
                self.tokens.read();
                Ok(Some(self.ast.add_node(AstNodeKind::Identifier, token.literal)))
            }
            TokenKind::LeftParen => {
                self.tokens.read();
                let Some(inner) = self.additive()? else {
                    return Err(SyntaxError::MissingRightParen);
                };
                if self.read_if(&[TokenKind::RightParen]).is_none() {
                    return Err(SyntaxError::MissingRightParen);
                }
                Ok(Some(inner))
            }
            _ => Err(SyntaxError::UnexpectedToken {
                found: token.literal.to_string(),
            }),
        }
    }

    fn binary(&mut self, kind: AstNodeKind, op: Token<'de>, lhs: NodeId, rhs: NodeId) -> NodeId {
        let node = self.ast.add_node(kind, op.literal);
        self.ast.add_child(node, lhs);
        self.ast.add_child(node, rhs);
        node
    }

    /// Reads the next token if its kind is one of `kinds`.
    fn read_if(&mut self, kinds: &[TokenKind]) -> Option<Token<'de>> {
        match self.tokens.peek() {
            Some(token) if kinds.contains(&token.kind) => self.tokens.read(),
            _ => None,
        }
    }
}
