use thiserror::Error;

/// Result type for codetrans operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the listing front end, descriptor parsing and element construction.
///
/// The transforms themselves never fail; they degrade precision instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lexical error at line {line}, column {column}: {message}")]
    Lexical {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid descriptor '{descriptor}': {message}")]
    Descriptor { descriptor: String, message: String },

    #[error("Opcode {opcode} is not a valid {expected} instruction")]
    InvalidOpcode { opcode: String, expected: &'static str },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a parse error with location information
    pub fn parse_error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a lexical error with location information
    pub fn lexical_error(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::Lexical {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a descriptor error
    pub fn descriptor_error(descriptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Descriptor {
            descriptor: descriptor.into(),
            message: message.into(),
        }
    }

    pub fn invalid_opcode(opcode: impl std::fmt::Display, expected: &'static str) -> Self {
        Self::InvalidOpcode {
            opcode: opcode.to_string(),
            expected,
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }
}
