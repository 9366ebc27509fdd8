use logos::Logos;

use super::span::Location;
use crate::error::{Error, Result};

/// Token types for the assembly listing format
#[derive(Logos, Debug, PartialEq, Clone)]
pub enum Token {
    /// Mnemonics, label names, class names, member references and descriptors
    #[regex(r#"[A-Za-z_$<(\[][^ \t\r\n:"]*"#)]
    Word,
    /// `.catch`, `.line`, `.var`, ...
    #[regex(r"\.[a-z]+")]
    Directive,
    #[token(":")]
    Colon,

    // Literals
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r"-?[0-9]+")]
    IntegerLiteral,
    #[regex(r"-?[0-9]+[lL]")]
    LongLiteral,
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[fF]")]
    #[regex(r"-?(NaN|Infinity)[fF]", priority = 10)]
    FloatLiteral,
    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[dD]")]
    #[regex(r"-?(NaN|Infinity)[dD]", priority = 10)]
    DoubleLiteral,

    #[regex(r"\r?\n")]
    Newline,

    // Comments and whitespace
    #[regex(r"#[^\n]*")]
    HashComment,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"[ \t\r]+")]
    Whitespace,
}

impl Token {
    /// Check if this token is a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::StringLiteral
                | Token::IntegerLiteral
                | Token::LongLiteral
                | Token::FloatLiteral
                | Token::DoubleLiteral
        )
    }

    /// Check if this token carries no meaning for the parser
    pub fn is_trivia(&self) -> bool {
        matches!(self, Token::Whitespace | Token::HashComment | Token::LineComment)
    }
}

/// Lexical token with location information
#[derive(Debug, Clone)]
pub struct LexicalToken {
    pub token: Token,
    pub lexeme: String,
    pub location: Location,
}

impl LexicalToken {
    pub fn new(token: Token, lexeme: String, location: Location) -> Self {
        Self { token, lexeme, location }
    }

    /// Get the token type
    pub fn token_type(&self) -> &Token {
        &self.token
    }

    /// Get the lexeme (actual text)
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    /// Get the location
    pub fn location(&self) -> Location {
        self.location
    }

    /// Check if this token matches the given token type
    pub fn is(&self, token_type: &Token) -> bool {
        &self.token == token_type
    }
}

/// Lexer for assembly listings
pub struct Lexer<'a> {
    lexer: logos::Lexer<'a, Token>,
    location: Location,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Token::lexer(source),
            location: Location::start(),
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Result<LexicalToken>> {
        let token = self.lexer.next()?;
        let lexeme = self.lexer.slice();
        let location = self.location;
        self.location.advance_str(lexeme);

        match token {
            Ok(token) => Some(Ok(LexicalToken::new(token, lexeme.to_string(), location))),
            Err(()) => Some(Err(Error::lexical_error(
                location.line,
                location.column,
                format!("unexpected input '{}'", lexeme.escape_debug()),
            ))),
        }
    }

    /// Get all tokens from the source, skipping whitespace and comments
    pub fn tokenize(mut self) -> Result<Vec<LexicalToken>> {
        let mut tokens = Vec::new();

        while let Some(result) = self.next_token() {
            let token = result?;
            if !token.token.is_trivia() {
                tokens.push(token);
            }
        }

        Ok(tokens)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<LexicalToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .expect("Failed to tokenize")
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_lexer_instruction_line() {
        let tokens = kinds("invokevirtual java/io/PrintStream/println (Ljava/lang/String;)V\n");
        assert_eq!(tokens, vec![Token::Word, Token::Word, Token::Word, Token::Newline]);
    }

    #[test]
    fn test_lexer_label_binding() {
        let tokens = Lexer::new("Lloop:").tokenize().expect("Failed to tokenize");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme(), "Lloop");
        assert!(tokens[1].is(&Token::Colon));
    }

    #[test]
    fn test_lexer_literals() {
        let tokens = kinds(r#"42 -7 5L 1.5f 2.0 3d "hi \"there\"""#);
        assert_eq!(
            tokens,
            vec![
                Token::IntegerLiteral,
                Token::IntegerLiteral,
                Token::LongLiteral,
                Token::FloatLiteral,
                Token::DoubleLiteral,
                Token::DoubleLiteral,
                Token::StringLiteral,
            ]
        );
    }

    #[test]
    fn test_lexer_comments() {
        let tokens = kinds("# a comment\n    nop // trailing\n");
        assert_eq!(tokens, vec![Token::Newline, Token::Word, Token::Newline]);
    }

    #[test]
    fn test_lexer_directive_and_locations() {
        let tokens = Lexer::new("\n  .line 12").tokenize().expect("Failed to tokenize");
        assert!(tokens[1].is(&Token::Directive));
        assert_eq!(tokens[1].location(), Location::new(2, 3, 3));
        assert_eq!(tokens[2].lexeme(), "12");
    }

    #[test]
    fn test_lexer_reports_position_of_bad_input() {
        match Lexer::new("nop\n  @").tokenize() {
            Err(Error::Lexical { line, column, .. }) => assert_eq!((line, column), (2, 3)),
            other => panic!("expected lexical error, got {:?}", other),
        }
    }
}
