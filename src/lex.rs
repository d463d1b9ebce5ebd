use std::fmt::Display;

use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    EqualEqual,
    Equal,
    Plus,
    PlusPlus,
    PlusEqual,
    Minus,
    MinusMinus,
    MinusEqual,
    Star,
    StarEqual,
    Slash,
    SlashEqual,
    LeftParen,
    RightParen,
    Semicolon,
    Ident,
    IntLiteral,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Int => "INT",
            TokenKind::Greater => "GREATER",
            TokenKind::GreaterEqual => "GREATER_EQUAL",
            TokenKind::Less => "LESS",
            TokenKind::LessEqual => "LESS_EQUAL",
            TokenKind::EqualEqual => "EQUAL_EQUAL",
            TokenKind::Equal => "EQUAL",
            TokenKind::Plus => "PLUS",
            TokenKind::PlusPlus => "PLUS_PLUS",
            TokenKind::PlusEqual => "PLUS_EQUAL",
            TokenKind::Minus => "MINUS",
            TokenKind::MinusMinus => "MINUS_MINUS",
            TokenKind::MinusEqual => "MINUS_EQUAL",
            TokenKind::Star => "STAR",
            TokenKind::StarEqual => "STAR_EQUAL",
            TokenKind::Slash => "SLASH",
            TokenKind::SlashEqual => "SLASH_EQUAL",
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Ident => "IDENTIFIER",
            TokenKind::IntLiteral => "INT_LITERAL",
        };
        f.write_str(name)
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\t{}", self.literal, self.kind)
    }
}

/// States of the scanner. `IfEqualElse` carries the kind the pending
/// one-character operator becomes when the next character is `=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DfaState {
    Initial,
    Ident,
    Int1,
    Int2,
    Int3,
    IntLiteral,
    IfEqualElse(TokenKind),
    Complete,
}

/// Finite-state scanner. Runs over the whole input in one pass and hands the
/// resulting tokens over in a [`TokenReader`].
///
/// The scanner never fails: characters outside the language are dropped.
pub struct Lexer<'de> {
    whole: &'de str,
    start: usize,
    pending: Option<TokenKind>,
    tokens: Vec<Token<'de>>,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            whole: input,
            start: 0,
            pending: None,
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> TokenReader<'de> {
        let whole = self.whole;
        let mut state = DfaState::Initial;

        for (at, c) in whole.char_indices() {
            state = match state {
                DfaState::Initial | DfaState::Complete => self.init_token(at, c),
                DfaState::Ident => {
                    if c.is_ascii_alphanumeric() {
                        DfaState::Ident
                    } else {
                        self.init_token(at, c)
                    }
                }
                DfaState::Int1 => match c {
                    'n' => DfaState::Int2,
                    c if c.is_ascii_alphanumeric() => DfaState::Ident,
                    c => self.init_token(at, c),
                },
                DfaState::Int2 => match c {
                    't' => DfaState::Int3,
                    c if c.is_ascii_alphanumeric() => DfaState::Ident,
                    c => self.init_token(at, c),
                },
                DfaState::Int3 => {
                    if c.is_ascii_alphanumeric() {
                        DfaState::Ident
                    } else {
                        self.pending = Some(TokenKind::Int);
                        self.init_token(at, c)
                    }
                }
                DfaState::IntLiteral => {
                    if c.is_ascii_digit() {
                        DfaState::IntLiteral
                    } else {
                        self.init_token(at, c)
                    }
                }
                DfaState::IfEqualElse(compound) => {
                    if c == '=' {
                        self.pending = Some(compound);
                        DfaState::Complete
                    } else {
                        self.init_token(at, c)
                    }
                }
            };
        }

        // end of input behaves like a trailing blank
        if state == DfaState::Int3 {
            self.pending = Some(TokenKind::Int);
        }
        self.finish(whole.len());

        debug!(tokens = self.tokens.len(), "tokenized input");
        TokenReader::new(self.tokens)
    }

    /// Finalizes the pending lexeme, if any, and dispatches `c` from the
    /// initial state.
    fn init_token(&mut self, at: usize, c: char) -> DfaState {
        self.finish(at);

        let (state, kind) = match c {
            'i' => (DfaState::Int1, TokenKind::Ident),
            c if c.is_ascii_alphabetic() => (DfaState::Ident, TokenKind::Ident),
            c if c.is_ascii_digit() => (DfaState::IntLiteral, TokenKind::IntLiteral),
            '>' => (
                DfaState::IfEqualElse(TokenKind::GreaterEqual),
                TokenKind::Greater,
            ),
            '<' => (DfaState::IfEqualElse(TokenKind::LessEqual), TokenKind::Less),
            '=' => (DfaState::IfEqualElse(TokenKind::EqualEqual), TokenKind::Equal),
            '+' => (DfaState::IfEqualElse(TokenKind::PlusEqual), TokenKind::Plus),
            '-' => (DfaState::IfEqualElse(TokenKind::MinusEqual), TokenKind::Minus),
            '*' => (DfaState::IfEqualElse(TokenKind::StarEqual), TokenKind::Star),
            '/' => (DfaState::IfEqualElse(TokenKind::SlashEqual), TokenKind::Slash),
            ';' => (DfaState::Complete, TokenKind::Semicolon),
            '(' => (DfaState::Complete, TokenKind::LeftParen),
            ')' => (DfaState::Complete, TokenKind::RightParen),
            c if c.is_whitespace() => return DfaState::Initial,
            c => {
                trace!(character = ?c, offset = at, "skipping unrecognized character");
                return DfaState::Initial;
            }
        };

        self.start = at;
        self.pending = Some(kind);
        state
    }

    fn finish(&mut self, end: usize) {
        let whole = self.whole;
        if let Some(kind) = self.pending.take() {
            self.tokens.push(Token {
                kind,
                literal: &whole[self.start..end],
            });
        }
    }
}

/// Read position over a finished token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReader<'de> {
    tokens: Vec<Token<'de>>,
    position: usize,
}

impl<'de> TokenReader<'de> {
    pub fn new(tokens: Vec<Token<'de>>) -> Self {
        TokenReader {
            tokens,
            position: 0,
        }
    }

    /// Returns the token under the cursor and moves past it.
    pub fn read(&mut self) -> Option<Token<'de>> {
        let token = self.tokens.get(self.position).copied()?;
        self.position += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&Token<'de>> {
        self.tokens.get(self.position)
    }

    pub fn unread(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position`, clamped to the end of the sequence.
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.tokens.len());
    }

    pub fn tokens(&self) -> &[Token<'de>] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Display for TokenReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "text\ttype")?;
        for token in &self.tokens {
            writeln!(f, "{token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> Vec<(TokenKind, &str)> {
        Lexer::new(input)
            .tokenize()
            .tokens()
            .iter()
            .map(|token| (token.kind, token.literal))
            .collect()
    }

    #[test]
    fn declaration_with_initializer() {
        assert_eq!(
            scan("int age = 45;"),
            vec![
                (TokenKind::Int, "int"),
                (TokenKind::Ident, "age"),
                (TokenKind::Equal, "="),
                (TokenKind::IntLiteral, "45"),
                (TokenKind::Semicolon, ";"),
            ]
        );
    }

    #[test]
    fn relational_operators() {
        assert_eq!(
            scan("age >= 410;"),
            vec![
                (TokenKind::Ident, "age"),
                (TokenKind::GreaterEqual, ">="),
                (TokenKind::IntLiteral, "410"),
                (TokenKind::Semicolon, ";"),
            ]
        );
        assert_eq!(
            scan("a<b<=c>d==e"),
            vec![
                (TokenKind::Ident, "a"),
                (TokenKind::Less, "<"),
                (TokenKind::Ident, "b"),
                (TokenKind::LessEqual, "<="),
                (TokenKind::Ident, "c"),
                (TokenKind::Greater, ">"),
                (TokenKind::Ident, "d"),
                (TokenKind::EqualEqual, "=="),
                (TokenKind::Ident, "e"),
            ]
        );
    }

    #[test]
    fn keyword_prefix_reverts_to_identifier() {
        assert_eq!(scan("intA = 67;")[0], (TokenKind::Ident, "intA"));
        assert_eq!(scan("integer"), vec![(TokenKind::Ident, "integer")]);
        assert_eq!(scan("int2"), vec![(TokenKind::Ident, "int2")]);
        assert_eq!(scan("in"), vec![(TokenKind::Ident, "in")]);
        assert_eq!(scan("i"), vec![(TokenKind::Ident, "i")]);
        assert_eq!(scan("ix"), vec![(TokenKind::Ident, "ix")]);
        assert_eq!(scan("pint"), vec![(TokenKind::Ident, "pint")]);
    }

    #[test]
    fn keyword_terminated_by_any_non_alphanumeric() {
        assert_eq!(scan("int"), vec![(TokenKind::Int, "int")]);
        assert_eq!(
            scan("int;"),
            vec![(TokenKind::Int, "int"), (TokenKind::Semicolon, ";")]
        );
        assert_eq!(
            scan("int(x)"),
            vec![
                (TokenKind::Int, "int"),
                (TokenKind::LeftParen, "("),
                (TokenKind::Ident, "x"),
                (TokenKind::RightParen, ")"),
            ]
        );
    }

    #[test]
    fn compound_assignment_operators() {
        assert_eq!(
            scan("x+=1-=2*=3/=4"),
            vec![
                (TokenKind::Ident, "x"),
                (TokenKind::PlusEqual, "+="),
                (TokenKind::IntLiteral, "1"),
                (TokenKind::MinusEqual, "-="),
                (TokenKind::IntLiteral, "2"),
                (TokenKind::StarEqual, "*="),
                (TokenKind::IntLiteral, "3"),
                (TokenKind::SlashEqual, "/="),
                (TokenKind::IntLiteral, "4"),
            ]
        );
    }

    #[test]
    fn doubled_operators_are_separate_tokens() {
        assert_eq!(
            scan("++--"),
            vec![
                (TokenKind::Plus, "+"),
                (TokenKind::Plus, "+"),
                (TokenKind::Minus, "-"),
                (TokenKind::Minus, "-"),
            ]
        );
        assert_eq!(
            scan("==="),
            vec![(TokenKind::EqualEqual, "=="), (TokenKind::Equal, "=")]
        );
    }

    #[test]
    fn arithmetic_expression() {
        let kinds: Vec<_> = scan("1 * 4 * (1+2);").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::Star,
                TokenKind::IntLiteral,
                TokenKind::Star,
                TokenKind::LeftParen,
                TokenKind::IntLiteral,
                TokenKind::Plus,
                TokenKind::IntLiteral,
                TokenKind::RightParen,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn digits_only_input_is_one_literal() {
        for input in ["0", "7", "42", "0007", "12345678901234567890"] {
            assert_eq!(scan(input), vec![(TokenKind::IntLiteral, input)]);
        }
    }

    #[test]
    fn generated_digit_strings_are_one_literal() {
        for n in 0..2_000u64 {
            for input in [n.to_string(), format!("{n:08}"), n.to_string().repeat(5)] {
                assert_eq!(scan(&input), vec![(TokenKind::IntLiteral, input.as_str())]);
            }
        }
    }

    #[test]
    fn literal_followed_by_letters_splits() {
        assert_eq!(
            scan("12ab"),
            vec![(TokenKind::IntLiteral, "12"), (TokenKind::Ident, "ab")]
        );
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(
            scan("2 $ 3 # @ é"),
            vec![(TokenKind::IntLiteral, "2"), (TokenKind::IntLiteral, "3")]
        );
        assert_eq!(
            scan("a$b"),
            vec![(TokenKind::Ident, "a"), (TokenKind::Ident, "b")]
        );
    }

    #[test]
    fn whitespace_only_input_is_empty() {
        assert!(Lexer::new(" \t\n ").tokenize().is_empty());
        assert!(Lexer::new("").tokenize().is_empty());
    }

    #[test]
    fn reader_peek_does_not_advance() {
        let mut reader = Lexer::new("int a;").tokenize();
        assert_eq!(reader.peek().map(|t| t.kind), Some(TokenKind::Int));
        assert_eq!(reader.peek().map(|t| t.kind), Some(TokenKind::Int));
        assert_eq!(reader.position(), 0);

        assert_eq!(reader.read().map(|t| t.literal), Some("int"));
        assert_eq!(reader.read().map(|t| t.literal), Some("a"));
        assert_eq!(reader.read().map(|t| t.literal), Some(";"));
        assert_eq!(reader.read(), None);
        assert_eq!(reader.peek(), None);
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn reader_rewinds() {
        let mut reader = Lexer::new("1 + 2").tokenize();
        reader.unread();
        assert_eq!(reader.position(), 0);

        reader.read();
        reader.read();
        let saved = reader.position();
        reader.read();
        reader.unread();
        assert_eq!(reader.position(), saved);
        assert_eq!(reader.peek().map(|t| t.literal), Some("2"));

        reader.set_position(0);
        assert_eq!(reader.peek().map(|t| t.literal), Some("1"));

        reader.set_position(100);
        assert_eq!(reader.position(), reader.len());
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn token_table() {
        let reader = Lexer::new("a >= 1;").tokenize();
        assert_eq!(
            reader.to_string(),
            "text\ttype\na\tIDENTIFIER\n>=\tGREATER_EQUAL\n1\tINT_LITERAL\n;\tSEMICOLON\n"
        );
    }
}
