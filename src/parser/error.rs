use super::span::Location;
use crate::error::Error;
use std::fmt;

#[derive(Debug, Clone)]
pub enum ParseError {
    /// Unexpected token encountered
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    /// Line ended before the instruction was complete
    UnexpectedEndOfLine {
        expected: String,
        location: Location,
    },

    /// Invalid syntax
    InvalidSyntax {
        message: String,
        location: Location,
    },
}

impl ParseError {
    /// Create a new unexpected token error
    pub fn unexpected_token(expected: &str, found: &str, location: Location) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.to_string(),
            location,
        }
    }

    /// Create a new unexpected end of line error
    pub fn unexpected_end_of_line(expected: &str, location: Location) -> Self {
        ParseError::UnexpectedEndOfLine {
            expected: expected.to_string(),
            location,
        }
    }

    /// Create a new invalid syntax error
    pub fn invalid_syntax(message: impl Into<String>, location: Location) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            location,
        }
    }

    /// Get the location of the error
    pub fn location(&self) -> Location {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedEndOfLine { location, .. }
            | ParseError::InvalidSyntax { location, .. } => *location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedToken { expected, found, location } => {
                write!(f, "Expected {} but found '{}' at {}", expected, found, location)
            }
            ParseError::UnexpectedEndOfLine { expected, location } => {
                write!(f, "Unexpected end of line, expected {} at {}", expected, location)
            }
            ParseError::InvalidSyntax { message, location } => {
                write!(f, "Invalid syntax: {} at {}", message, location)
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(parse_error: ParseError) -> Self {
        let location = parse_error.location();
        let message = match parse_error {
            ParseError::UnexpectedToken { expected, found, .. } => {
                format!("expected {}, found '{}'", expected, found)
            }
            ParseError::UnexpectedEndOfLine { expected, .. } => {
                format!("unexpected end of line, expected {}", expected)
            }
            ParseError::InvalidSyntax { message, .. } => message,
        };
        Error::parse_error(location.line, location.column, message)
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;
