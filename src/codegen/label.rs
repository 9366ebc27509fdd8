//! Branch target labels

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

// 64 bits cannot wrap within a process lifetime, so ids never repeat.
static NEXT_LABEL_ID: AtomicU64 = AtomicU64::new(1);

/// An opaque, identity-comparable branch target.
///
/// Two labels are equal only if they came from the same allocation; there is no way
/// to build a label equal to another one from its parts. Labels are handed out by a
/// [`CodeBuilder`](crate::codegen::builder::CodeBuilder) and are cheap to copy, hash
/// and compare.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    id: u64,
}

impl Label {
    /// Allocate a label distinct from every label allocated before it in this process.
    ///
    /// Code builders call this from [`CodeBuilder::new_label`](crate::codegen::builder::CodeBuilder::new_label);
    /// transforms should go through the builder instead.
    pub fn fresh() -> Self {
        Label {
            id: NEXT_LABEL_ID.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label#{}", self.id)
    }
}
