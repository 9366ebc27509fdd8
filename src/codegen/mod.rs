//! Code model and code transforms
//!
//! This module holds the decoded representation of a method body (opcodes,
//! labels, [`CodeElement`]s), the builder/transform pipeline that elements flow
//! through, and the two transforms built on it: [`CodeRelabeler`] and
//! [`CodeStackTracker`].

pub mod builder;
pub mod descriptor;
pub mod element;
pub mod label;
pub mod opcode_enum;
pub mod relabel;
pub mod stack;
pub mod stack_tracker;
pub mod type_kind;

// Re-export commonly used types
pub use builder::{apply_transform, transforming, Chained, ChainedCodeBuilder, CodeBuffer, CodeBuilder, CodeTransform};
pub use descriptor::{FieldDescriptor, MethodDescriptor};
pub use element::{CodeElement, ConstantValue, PrimitiveArrayType, SwitchCase, MAX_TABLE_SWITCH_CASES};
pub use label::Label;
pub use opcode_enum::{Opcode, OpcodeKind};
pub use relabel::{CodeRelabeler, LabelMap, LabelMapping, MappingFn};
pub use stack::Stack;
pub use stack_tracker::{CodeStackTracker, StackState};
pub use type_kind::OperandKind;
