//! Label relabeling transform
//!
//! [`CodeRelabeler`] re-emits every element with each label passed through a
//! mapping. With a fresh memo map per application, the same block can be injected
//! any number of times and every copy gets its own, disjoint set of labels.

use std::collections::HashMap;

use log::debug;

use crate::codegen::builder::{CodeBuilder, CodeTransform};
use crate::codegen::element::CodeElement;
use crate::codegen::label::Label;

/// Memo map from original labels to their replacements
pub type LabelMap = HashMap<Label, Label>;

/// Strategy that decides which label replaces an original one
pub trait LabelMapping {
    fn relabel(&mut self, label: Label, builder: &mut dyn CodeBuilder) -> Label;
}

/// Memoized: the first sighting of a label allocates a fresh one from the builder
impl LabelMapping for LabelMap {
    fn relabel(&mut self, label: Label, builder: &mut dyn CodeBuilder) -> Label {
        *self.entry(label).or_insert_with(|| {
            let fresh = builder.new_label();
            debug!("relabel {:?} -> {:?}", label, fresh);
            fresh
        })
    }
}

impl<M: LabelMapping + ?Sized> LabelMapping for &mut M {
    fn relabel(&mut self, label: Label, builder: &mut dyn CodeBuilder) -> Label {
        (**self).relabel(label, builder)
    }
}

/// Adapter for a mapping closure
pub struct MappingFn<F>(F);

impl<F> LabelMapping for MappingFn<F>
where
    F: FnMut(Label, &mut dyn CodeBuilder) -> Label,
{
    fn relabel(&mut self, label: Label, builder: &mut dyn CodeBuilder) -> Label {
        (self.0)(label, builder)
    }
}

/// Transform that substitutes every label-valued field of every element
pub struct CodeRelabeler<M: LabelMapping = LabelMap> {
    mapping: M,
}

impl CodeRelabeler<LabelMap> {
    /// Relabeler with its own empty memo map
    pub fn new() -> Self {
        Self { mapping: LabelMap::new() }
    }
}

impl Default for CodeRelabeler<LabelMap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: LabelMapping> CodeRelabeler<M> {
    /// Relabeler over an existing mapping; pass `&mut map` to share it with other relabelers
    pub fn with_map(mapping: M) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &M {
        &self.mapping
    }

    pub fn into_mapping(self) -> M {
        self.mapping
    }

    pub fn relabel(&mut self, label: Label, builder: &mut dyn CodeBuilder) -> Label {
        self.mapping.relabel(label, builder)
    }

    fn replace(&mut self, label: &mut Label, builder: &mut dyn CodeBuilder) {
        *label = self.mapping.relabel(*label, builder);
    }
}

impl<F> CodeRelabeler<MappingFn<F>>
where
    F: FnMut(Label, &mut dyn CodeBuilder) -> Label,
{
    /// Relabeler driven by an arbitrary mapping function
    pub fn from_fn(f: F) -> Self {
        Self { mapping: MappingFn(f) }
    }
}

impl<M: LabelMapping> CodeTransform for CodeRelabeler<M> {
    fn accept(&mut self, builder: &mut dyn CodeBuilder, mut element: CodeElement) {
        match &mut element {
            CodeElement::Branch { target, .. } => self.replace(target, builder),
            CodeElement::TableSwitch { default_target, cases, .. }
            | CodeElement::LookupSwitch { default_target, cases } => {
                self.replace(default_target, builder);
                for case in cases.iter_mut() {
                    self.replace(&mut case.target, builder);
                }
            }
            CodeElement::LabelTarget(label) => self.replace(label, builder),
            CodeElement::ExceptionCatch { try_start, try_end, handler, .. } => {
                self.replace(try_start, builder);
                self.replace(try_end, builder);
                self.replace(handler, builder);
            }
            CodeElement::LocalVariable { start, end, .. }
            | CodeElement::LocalVariableType { start, end, .. }
            | CodeElement::CharacterRange { start, end, .. } => {
                self.replace(start, builder);
                self.replace(end, builder);
            }
            CodeElement::Nop
            | CodeElement::Constant { .. }
            | CodeElement::Load { .. }
            | CodeElement::Store { .. }
            | CodeElement::Increment { .. }
            | CodeElement::ArrayLoad(_)
            | CodeElement::ArrayStore(_)
            | CodeElement::Stack(_)
            | CodeElement::Operator(_)
            | CodeElement::Convert(_)
            | CodeElement::Return(_)
            | CodeElement::Field { .. }
            | CodeElement::Invoke { .. }
            | CodeElement::InvokeDynamic { .. }
            | CodeElement::NewObject { .. }
            | CodeElement::NewPrimitiveArray(_)
            | CodeElement::NewReferenceArray { .. }
            | CodeElement::NewMultiArray { .. }
            | CodeElement::Throw
            | CodeElement::TypeCheck { .. }
            | CodeElement::Monitor(_)
            | CodeElement::LineNumber(_)
            | CodeElement::Attribute { .. } => {}
        }

        builder.with(element);
    }
}
