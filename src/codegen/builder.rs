//! Code builders, code transforms and their composition
//!
//! A [`CodeBuilder`] is the sink a method body is emitted into. A [`CodeTransform`]
//! sits in front of a builder: it receives each element together with the builder
//! and decides what to forward. Transforms compose with [`CodeTransform::and_then`],
//! and [`transforming`] routes a block of emission through a transform.

use log::trace;

use crate::codegen::element::CodeElement;
use crate::codegen::label::Label;
use crate::codegen::opcode_enum::Opcode;
use crate::error::Result;

/// Sink for code elements and source of fresh labels
pub trait CodeBuilder {
    /// Emit one element
    fn with(&mut self, element: CodeElement);

    /// Allocate a label that is not yet bound anywhere
    fn new_label(&mut self) -> Label {
        Label::fresh()
    }

    /// Bind `label` at the current position
    fn label_binding(&mut self, label: Label) {
        self.with(CodeElement::LabelTarget(label));
    }

    /// Allocate a label and bind it at the current position
    fn new_bound_label(&mut self) -> Label {
        let label = self.new_label();
        self.label_binding(label);
        label
    }

    fn branch(&mut self, opcode: Opcode, target: Label) -> Result<()> {
        self.with(CodeElement::branch(opcode, target)?);
        Ok(())
    }

    fn goto_(&mut self, target: Label) {
        self.with(CodeElement::Branch {
            opcode: Opcode::Goto,
            target,
        });
    }

    fn exception_catch(&mut self, try_start: Label, try_end: Label, handler: Label, catch_type: Option<&str>) {
        self.with(CodeElement::ExceptionCatch {
            try_start,
            try_end,
            handler,
            catch_type: catch_type.map(str::to_string),
        });
    }

    /// Emit every element of `elements` in order
    fn emit_all(&mut self, elements: Vec<CodeElement>) {
        for element in elements {
            self.with(element);
        }
    }
}

/// A per-element rewrite applied while emitting into a builder
pub trait CodeTransform {
    /// Consume one element, emitting whatever it becomes into `builder`
    fn accept(&mut self, builder: &mut dyn CodeBuilder, element: CodeElement);

    /// Called before the first element is seen
    fn at_start(&mut self, _builder: &mut dyn CodeBuilder) {}

    /// Called after the last element has been seen
    fn at_end(&mut self, _builder: &mut dyn CodeBuilder) {}

    /// Run `self` first and feed its output through `next`
    fn and_then<T: CodeTransform>(self, next: T) -> Chained<Self, T>
    where
        Self: Sized,
    {
        Chained { first: self, second: next }
    }
}

impl<T: CodeTransform + ?Sized> CodeTransform for &mut T {
    fn accept(&mut self, builder: &mut dyn CodeBuilder, element: CodeElement) {
        (**self).accept(builder, element);
    }

    fn at_start(&mut self, builder: &mut dyn CodeBuilder) {
        (**self).at_start(builder);
    }

    fn at_end(&mut self, builder: &mut dyn CodeBuilder) {
        (**self).at_end(builder);
    }
}

/// Two transforms applied in sequence
pub struct Chained<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chained<A, B> {
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: CodeTransform, B: CodeTransform> CodeTransform for Chained<A, B> {
    fn accept(&mut self, builder: &mut dyn CodeBuilder, element: CodeElement) {
        let mut downstream = ChainedCodeBuilder::new(builder, &mut self.second);
        self.first.accept(&mut downstream, element);
    }

    fn at_start(&mut self, builder: &mut dyn CodeBuilder) {
        let mut downstream = ChainedCodeBuilder::new(builder, &mut self.second);
        self.first.at_start(&mut downstream);
        self.second.at_start(builder);
    }

    fn at_end(&mut self, builder: &mut dyn CodeBuilder) {
        let mut downstream = ChainedCodeBuilder::new(builder, &mut self.second);
        self.first.at_end(&mut downstream);
        self.second.at_end(builder);
    }
}

/// Builder that routes every element through a transform into another builder.
///
/// Labels are allocated by the downstream builder.
pub struct ChainedCodeBuilder<'a, T: CodeTransform + ?Sized> {
    downstream: &'a mut dyn CodeBuilder,
    transform: &'a mut T,
}

impl<'a, T: CodeTransform + ?Sized> ChainedCodeBuilder<'a, T> {
    pub fn new(downstream: &'a mut dyn CodeBuilder, transform: &'a mut T) -> Self {
        Self { downstream, transform }
    }
}

impl<'a, T: CodeTransform + ?Sized> CodeBuilder for ChainedCodeBuilder<'a, T> {
    fn with(&mut self, element: CodeElement) {
        self.transform.accept(&mut *self.downstream, element);
    }

    fn new_label(&mut self) -> Label {
        self.downstream.new_label()
    }
}

/// Emit through `transform` into `builder` for the duration of `handler`.
///
/// The transform's start and end hooks run around the handler, so a transform that
/// keeps per-block state (such as a relabeler's memo map) sees exactly one block.
pub fn transforming<T, F>(builder: &mut dyn CodeBuilder, transform: &mut T, handler: F)
where
    T: CodeTransform + ?Sized,
    F: FnOnce(&mut dyn CodeBuilder),
{
    transform.at_start(builder);
    {
        let mut chained = ChainedCodeBuilder::new(&mut *builder, &mut *transform);
        handler(&mut chained);
    }
    transform.at_end(builder);
}

/// A builder that records every element it receives
#[derive(Debug, Default, Clone)]
pub struct CodeBuffer {
    elements: Vec<CodeElement>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[CodeElement] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<CodeElement> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl CodeBuilder for CodeBuffer {
    fn with(&mut self, element: CodeElement) {
        trace!("emit {:?}", element);
        self.elements.push(element);
    }
}

/// Run `transform` over `elements` into a fresh [`CodeBuffer`] and return what came out
pub fn apply_transform<T: CodeTransform + ?Sized>(transform: &mut T, elements: Vec<CodeElement>) -> Vec<CodeElement> {
    let mut buffer = CodeBuffer::new();
    transforming(&mut buffer, transform, |b| b.emit_all(elements));
    buffer.into_elements()
}
