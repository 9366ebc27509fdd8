//! Parser module for assembly listings
//!
//! This module handles lexical analysis and parsing of textual listings into
//! [`CodeElement`] streams, and printing streams back to listing text.

pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod span;

pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, LexicalToken, Token};
pub use parser::Parser;
pub use printer::ListingPrinter;
pub use span::Location;

use std::path::Path;

use crate::codegen::builder::CodeBuilder;
use crate::codegen::element::CodeElement;
use crate::error::Result;

/// Parse listing source, allocating its labels through `builder`
pub fn parse_listing(source: &str, builder: &mut dyn CodeBuilder) -> Result<Vec<CodeElement>> {
    parser::parse(source, builder)
}

/// Read and parse a listing file
pub fn parse_listing_file(path: impl AsRef<Path>, builder: &mut dyn CodeBuilder) -> Result<Vec<CodeElement>> {
    let source = std::fs::read_to_string(path)?;
    parse_listing(&source, builder)
}
