//! Code transforms for JVM method bodies
//!
//! Two transforms over decoded instruction streams, plus the plumbing around them:
//!
//! - **codegen**: the element model (opcodes, labels, [`CodeElement`](codegen::CodeElement)),
//!   the builder/transform pipeline, [`CodeRelabeler`](codegen::CodeRelabeler) and
//!   [`CodeStackTracker`](codegen::CodeStackTracker)
//! - **parser**: a textual listing format for element streams (lexer, parser, printer)
//! - **bin**: the `codetrans` command line driver
//!
//! ## Example
//!
//! ```
//! use codetrans::codegen::{apply_transform, CodeBuffer, CodeStackTracker};
//! use codetrans::parser::parse_listing;
//!
//! let mut buffer = CodeBuffer::new();
//! let elements = parse_listing("iconst_1\ndup\niadd\nireturn\n", &mut buffer)?;
//! let mut tracker = CodeStackTracker::new();
//! apply_transform(&mut tracker, elements);
//! assert_eq!(tracker.max_stack_size(), Some(2));
//! # Ok::<(), codetrans::Error>(())
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod parser;

pub use config::Config;
pub use error::{Error, Result};
