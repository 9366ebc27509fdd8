// Common test utilities
#![allow(dead_code)]

use std::collections::HashMap;

use codetrans::codegen::{CodeBuffer, CodeElement, CodeStackTracker, Label, OperandKind};
use codetrans::parser::Parser;

/// Parse a listing, returning its elements and the labels by listing name
pub fn parse_with_labels(source: &str) -> (Vec<CodeElement>, HashMap<String, Label>) {
    let mut buffer = CodeBuffer::new();
    let mut parser = Parser::new(source, &mut buffer).expect("Failed to lex listing");
    let elements = parser.parse().expect("Failed to parse listing");
    let labels = parser.labels().clone();
    (elements, labels)
}

pub fn parse(source: &str) -> Vec<CodeElement> {
    parse_with_labels(source).0
}

/// Track a listing from an empty stack
pub fn track(source: &str) -> CodeStackTracker {
    track_from(&[], source)
}

pub fn track_from(initial: &[OperandKind], source: &str) -> CodeStackTracker {
    let mut tracker = CodeStackTracker::with_initial_stack(initial);
    for element in parse(source) {
        tracker.track(&element);
    }
    tracker
}

/// Current stack bottom first, `None` when unknown
pub fn stack_kinds(tracker: &CodeStackTracker) -> Option<Vec<OperandKind>> {
    tracker.current_stack().map(|stack| stack.to_vec())
}
