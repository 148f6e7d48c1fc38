//! Hand-written single-pass tokenizer for the policy DSL.
//!
//! Tokens: quoted strings (`"..."` or `'...'`), numbers, identifiers and dotted
//! field paths, case-insensitive keywords, comparison and logical operators,
//! punctuation `( ) { } : ,` and the `=>` arrow. `#` starts a comment that runs
//! to the end of the line. The stream always ends with [`TokenKind::Eof`].

use std::fmt;

use serde_json::Number;
use tracing::{Level, instrument, trace};

use crate::error::PolicyParseError;
use crate::types::ConditionOperator;

/// Boolean connective between conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "and"),
            LogicalOperator::Or => write!(f, "or"),
            LogicalOperator::Not => write!(f, "not"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Bare word or dotted path, e.g. `resource.attributes.owner`.
    Identifier(String),
    /// Quoted string with escapes already resolved.
    String(String),
    Number(Number),
    Boolean(bool),
    Operator(ConditionOperator),
    Logical(LogicalOperator),
    LParen,
    RParen,
    LBrace,
    RBrace,
    Colon,
    Comma,
    Arrow,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::String(s) => write!(f, "string {:?}", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::Boolean(b) => write!(f, "boolean {}", b),
            TokenKind::Operator(op) => write!(f, "operator '{}'", op),
            TokenKind::Logical(op) => write!(f, "logical operator '{}'", op),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Arrow => write!(f, "'=>'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the 1-based position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// Tokenize DSL source text.
///
/// Fails on the first unrecognized character, malformed number or unterminated
/// string; nothing is skipped silently.
#[instrument(level = Level::TRACE)]
pub fn tokenize(source: &str) -> Result<Vec<Token>, PolicyParseError> {
    let tokens = Lexer::new(source).run()?;
    trace!(count = tokens.len(), "tokenized");
    Ok(tokens)
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn run(mut self) -> Result<Vec<Token>, PolicyParseError> {
        let mut tokens = Vec::new();

        while let Some(ch) = self.peek() {
            let (line, column) = (self.line, self.column);

            if ch.is_whitespace() {
                self.bump();
                continue;
            }

            if ch == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.bump();
                }
                continue;
            }

            let kind = match ch {
                '"' | '\'' => self.string(ch, line, column)?,
                c if c.is_ascii_digit() => self.number(line, column)?,
                c if c.is_alphabetic() || c == '_' => self.word(),
                _ => self.symbol(ch, line, column)?,
            };
            tokens.push(Token { kind, line, column });
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            line: self.line,
            column: self.column,
        });
        Ok(tokens)
    }

    fn string(
        &mut self,
        quote: char,
        line: usize,
        column: usize,
    ) -> Result<TokenKind, PolicyParseError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(PolicyParseError::UnterminatedString { line, column });
            };
            if c == quote {
                return Ok(TokenKind::String(value));
            }
            if c != '\\' {
                value.push(c);
                continue;
            }
            let Some(escaped) = self.bump() else {
                return Err(PolicyParseError::UnterminatedString { line, column });
            };
            match escaped {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                '\\' | '"' | '\'' => value.push(escaped),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
        }
    }

    fn number(&mut self, line: usize, column: usize) -> Result<TokenKind, PolicyParseError> {
        let mut literal = String::new();
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
            self.bump();
        }

        let invalid = || PolicyParseError::InvalidNumber {
            literal: literal.clone(),
            line,
            column,
        };

        if !literal.contains('.')
            && let Ok(n) = literal.parse::<u64>()
        {
            return Ok(TokenKind::Number(Number::from(n)));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(TokenKind::Number)
            .ok_or_else(invalid)
    }

    fn word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self
            .peek()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '.')
        {
            word.push(c);
            self.bump();
        }

        match word.to_ascii_lowercase().as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            "and" => TokenKind::Logical(LogicalOperator::And),
            "or" => TokenKind::Logical(LogicalOperator::Or),
            "not" => TokenKind::Logical(LogicalOperator::Not),
            "in" => TokenKind::Operator(ConditionOperator::In),
            "nin" => TokenKind::Operator(ConditionOperator::Nin),
            "contains" => TokenKind::Operator(ConditionOperator::Contains),
            "matches" => TokenKind::Operator(ConditionOperator::Matches),
            "exists" => TokenKind::Operator(ConditionOperator::Exists),
            _ => TokenKind::Identifier(word),
        }
    }

    fn symbol(
        &mut self,
        ch: char,
        line: usize,
        column: usize,
    ) -> Result<TokenKind, PolicyParseError> {
        let next = self.peek_next();
        let (kind, width) = match (ch, next) {
            ('=', Some('=')) => (TokenKind::Operator(ConditionOperator::Eq), 2),
            ('=', Some('>')) => (TokenKind::Arrow, 2),
            ('!', Some('=')) => (TokenKind::Operator(ConditionOperator::Ne), 2),
            ('!', _) => (TokenKind::Logical(LogicalOperator::Not), 1),
            ('>', Some('=')) => (TokenKind::Operator(ConditionOperator::Gte), 2),
            ('>', _) => (TokenKind::Operator(ConditionOperator::Gt), 1),
            ('<', Some('=')) => (TokenKind::Operator(ConditionOperator::Lte), 2),
            ('<', _) => (TokenKind::Operator(ConditionOperator::Lt), 1),
            ('&', Some('&')) => (TokenKind::Logical(LogicalOperator::And), 2),
            ('|', Some('|')) => (TokenKind::Logical(LogicalOperator::Or), 2),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('{', _) => (TokenKind::LBrace, 1),
            ('}', _) => (TokenKind::RBrace, 1),
            (':', _) => (TokenKind::Colon, 1),
            (',', _) => (TokenKind::Comma, 1),
            _ => return Err(PolicyParseError::UnexpectedCharacter { ch, line, column }),
        };
        for _ in 0..width {
            self.bump();
        }
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Identifier(name.to_string())
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   \n\t "), vec![TokenKind::Eof]);
        assert_eq!(kinds("# only a comment"), vec![TokenKind::Eof]);
    }

    #[test]
    fn simple_condition() {
        assert_eq!(
            kinds(r#"actor.type == "user""#),
            vec![
                ident("actor.type"),
                TokenKind::Operator(ConditionOperator::Eq),
                TokenKind::String("user".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("== != >= <= && || =>"),
            vec![
                TokenKind::Operator(ConditionOperator::Eq),
                TokenKind::Operator(ConditionOperator::Ne),
                TokenKind::Operator(ConditionOperator::Gte),
                TokenKind::Operator(ConditionOperator::Lte),
                TokenKind::Logical(LogicalOperator::And),
                TokenKind::Logical(LogicalOperator::Or),
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn single_char_operators_and_punctuation() {
        assert_eq!(
            kinds("> < ! ( ) { } : ,"),
            vec![
                TokenKind::Operator(ConditionOperator::Gt),
                TokenKind::Operator(ConditionOperator::Lt),
                TokenKind::Logical(LogicalOperator::Not),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Colon,
                TokenKind::Comma,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(
            kinds("TRUE False AND or Not IN Contains MATCHES exists nin"),
            vec![
                TokenKind::Boolean(true),
                TokenKind::Boolean(false),
                TokenKind::Logical(LogicalOperator::And),
                TokenKind::Logical(LogicalOperator::Or),
                TokenKind::Logical(LogicalOperator::Not),
                TokenKind::Operator(ConditionOperator::In),
                TokenKind::Operator(ConditionOperator::Contains),
                TokenKind::Operator(ConditionOperator::Matches),
                TokenKind::Operator(ConditionOperator::Exists),
                TokenKind::Operator(ConditionOperator::Nin),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_still_an_identifier() {
        assert_eq!(kinds("android"), vec![ident("android"), TokenKind::Eof]);
        assert_eq!(kinds("index"), vec![ident("index"), TokenKind::Eof]);
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("42 3.5"),
            vec![
                TokenKind::Number(Number::from(42u64)),
                TokenKind::Number(Number::from_f64(3.5).unwrap()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn malformed_number_is_an_error() {
        let err = tokenize("x > 1.2.3").unwrap_err();
        assert!(matches!(err, PolicyParseError::InvalidNumber { ref literal, .. } if literal == "1.2.3"));
        assert_eq!(err.position(), (1, 5));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\nb\t\\ \"q\" \'s\'""#),
            vec![TokenKind::String("a\nb\t\\ \"q\" 's'".into()), TokenKind::Eof]
        );
        assert_eq!(
            kinds(r"'it\'s'"),
            vec![TokenKind::String("it's".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_escape_keeps_backslash() {
        assert_eq!(
            kinds(r#""\d+""#),
            vec![TokenKind::String(r"\d+".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("# leading\nrole == 'admin' # trailing\n"),
            vec![
                ident("role"),
                TokenKind::Operator(ConditionOperator::Eq),
                TokenKind::String("admin".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("a ==\n  'b'").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 3));
        assert_eq!((tokens[2].line, tokens[2].column), (2, 3));
    }

    #[test]
    fn error_unexpected_character() {
        let err = tokenize("x == 1\ny @ 2").unwrap_err();
        assert_eq!(
            err,
            PolicyParseError::UnexpectedCharacter {
                ch: '@',
                line: 2,
                column: 3
            }
        );
    }

    #[test]
    fn error_lone_equals() {
        let err = tokenize("x = 1").unwrap_err();
        assert!(matches!(err, PolicyParseError::UnexpectedCharacter { ch: '=', .. }));
        assert!(err.help().is_some());
    }

    #[test]
    fn error_unterminated_string() {
        let err = tokenize("name == 'abc").unwrap_err();
        assert_eq!(err, PolicyParseError::UnterminatedString { line: 1, column: 9 });
        assert!(tokenize(r#""ends with backslash\"#).is_err());
    }

    proptest! {
        #[test]
        fn never_panics(source in "\\PC{0,64}") {
            let _ = tokenize(&source);
        }

        #[test]
        fn successful_streams_end_with_eof(source in "[a-z0-9 .=<>!&|()'\"#]{0,48}") {
            if let Ok(tokens) = tokenize(&source) {
                prop_assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
            }
        }
    }
}
