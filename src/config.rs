//! Settings shared by the command line driver and library callers

use log::LevelFilter;

use crate::codegen::type_kind::OperandKind;
use crate::error::{Error, Result};

/// Configuration for tracking and relabeling runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Operand stack content at entry, bottom first
    pub initial_stack: Vec<OperandKind>,
    /// Number of relabeled copies to inject
    pub copies: usize,
    /// How many times `-v` was given
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_stack: Vec::new(),
            copies: 1,
            verbosity: 0,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_stack(mut self, kinds: Vec<OperandKind>) -> Self {
        self.initial_stack = kinds;
        self
    }

    /// Set the entry stack from concatenated field descriptors, e.g. `"ILjava/lang/String;J"`
    pub fn with_initial_stack_descriptor(mut self, descriptors: &str) -> Result<Self> {
        self.initial_stack = OperandKind::parse_sequence(descriptors)?;
        Ok(self)
    }

    pub fn with_copies(mut self, copies: usize) -> Result<Self> {
        if copies == 0 {
            return Err(Error::config_error("at least one copy is required"));
        }
        self.copies = copies;
        Ok(self)
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Default log filter when `RUST_LOG` is unset
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
