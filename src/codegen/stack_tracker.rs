/*!
 * Symbolic operand stack tracking
 *
 * `CodeStackTracker` follows the operand stack through a method body as it is
 * emitted and keeps the largest depth seen. Branch, switch and handler targets
 * get a snapshot of the stack recorded against their label; binding the label
 * later restores it. Code after `goto`, `return`, `athrow` or a switch has no
 * known stack until such a label is bound.
 *
 * The tracker never fails. Malformed input (underflow, unknown entry points)
 * costs precision: the current stack becomes unknown, and a push while it is
 * unknown makes the maximum depth unknown for good.
 */

use std::collections::HashMap;

use log::{debug, trace};

use crate::codegen::builder::{CodeBuilder, CodeTransform};
use crate::codegen::element::CodeElement;
use crate::codegen::label::Label;
use crate::codegen::opcode_enum::Opcode;
use crate::codegen::stack::Stack;
use crate::codegen::type_kind::OperandKind;

/// Contents of the current-stack register
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackState {
    Known(Stack),
    /// No path with a known stack reaches this point
    Unknown,
}

impl StackState {
    pub fn is_known(&self) -> bool {
        matches!(self, StackState::Known(_))
    }
}

/// Operand stack tracker, usable standalone or as a [`CodeTransform`]
#[derive(Debug)]
pub struct CodeStackTracker {
    current: StackState,
    max_depth: Option<usize>,
    targets: HashMap<Label, Stack>,
}

impl Default for CodeStackTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeStackTracker {
    /// Tracker starting from an empty operand stack
    pub fn new() -> Self {
        Self::with_initial_stack(&[])
    }

    /// Tracker starting from `initial`, listed bottom first
    pub fn with_initial_stack(initial: &[OperandKind]) -> Self {
        let stack = Stack::from_bottom_up(initial);
        Self {
            max_depth: Some(stack.depth()),
            current: StackState::Known(stack),
            targets: HashMap::new(),
        }
    }

    /// The live stack, `None` while it is unknown
    pub fn current_stack(&self) -> Option<Stack> {
        match &self.current {
            StackState::Known(stack) => Some(stack.clone()),
            StackState::Unknown => None,
        }
    }

    /// Largest depth seen so far, `None` once it can no longer be determined
    pub fn max_stack_size(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn state(&self) -> &StackState {
        &self.current
    }

    pub fn is_reachable(&self) -> bool {
        self.current.is_known()
    }

    /// Snapshot recorded for `label` and not yet consumed by its binding
    pub fn stack_at(&self, label: Label) -> Option<&Stack> {
        self.targets.get(&label)
    }

    /// Apply the stack effect of `element`
    pub fn track(&mut self, element: &CodeElement) {
        trace!("track {:?} on {:?}", element, self.current);
        match element {
            CodeElement::Nop
            | CodeElement::Increment { .. }
            | CodeElement::LocalVariable { .. }
            | CodeElement::LocalVariableType { .. }
            | CodeElement::CharacterRange { .. }
            | CodeElement::LineNumber(_)
            | CodeElement::Attribute { .. } => {}

            CodeElement::Constant { value, .. } => self.push(value.kind()),
            CodeElement::Load { opcode, .. } => self.push_kind_of(*opcode),
            CodeElement::Store { .. } | CodeElement::Monitor(_) => self.pop_n(1),
            CodeElement::ArrayLoad(opcode) => {
                self.pop_n(2);
                self.push_kind_of(*opcode);
            }
            CodeElement::ArrayStore(_) => self.pop_n(3),
            CodeElement::Stack(opcode) => self.shuffle(*opcode),
            CodeElement::Operator(opcode) => {
                self.pop_n(if opcode.is_unary_operator() { 1 } else { 2 });
                self.push_kind_of(*opcode);
            }
            CodeElement::Convert(opcode) => {
                self.pop_n(1);
                self.push_kind_of(*opcode);
            }

            CodeElement::Field { opcode, descriptor, .. } => match opcode {
                Opcode::Getstatic => self.push(descriptor.kind()),
                Opcode::Getfield => {
                    self.pop_n(1);
                    self.push(descriptor.kind());
                }
                Opcode::Putstatic => self.pop_n(1),
                Opcode::Putfield => self.pop_n(2),
                other => self.unsupported(*other),
            },
            CodeElement::Invoke { opcode, descriptor, .. } => {
                self.pop_n(descriptor.params().len());
                if *opcode != Opcode::Invokestatic {
                    self.pop_n(1);
                }
                self.push(descriptor.return_kind());
            }
            CodeElement::InvokeDynamic { descriptor, .. } => {
                self.pop_n(descriptor.params().len());
                self.push(descriptor.return_kind());
            }

            CodeElement::NewObject { .. } => self.push(OperandKind::Reference),
            CodeElement::NewPrimitiveArray(_) | CodeElement::NewReferenceArray { .. } => {
                self.pop_n(1);
                self.push(OperandKind::Reference);
            }
            CodeElement::NewMultiArray { dimensions, .. } => {
                self.pop_n(usize::from(*dimensions));
                self.push(OperandKind::Reference);
            }
            CodeElement::TypeCheck { opcode, .. } => {
                self.pop_n(1);
                self.push(if *opcode == Opcode::Instanceof {
                    OperandKind::Int
                } else {
                    OperandKind::Reference
                });
            }

            CodeElement::Branch { opcode, target } => {
                if opcode.is_unconditional_branch() {
                    self.record(*target);
                    self.lose("unconditional branch");
                } else {
                    self.pop_n(opcode.branch_operands());
                    self.record(*target);
                }
            }
            CodeElement::TableSwitch { default_target, cases, .. }
            | CodeElement::LookupSwitch { default_target, cases } => {
                self.pop_n(1);
                self.record(*default_target);
                for case in cases {
                    self.record(case.target);
                }
                self.lose("switch");
            }
            CodeElement::Return(_) => self.lose("return"),
            CodeElement::Throw => self.lose("athrow"),

            CodeElement::ExceptionCatch { handler, .. } => {
                let entry = Stack::from_bottom_up(&[OperandKind::Reference]);
                debug!("handler {:?} entered with {}", handler, entry);
                self.targets.insert(*handler, entry);
            }
            CodeElement::LabelTarget(label) => self.bind(*label),
        }
    }

    fn push(&mut self, kind: OperandKind) {
        if kind == OperandKind::Void {
            return;
        }
        match &mut self.current {
            StackState::Known(stack) => {
                stack.push(kind);
                let depth = stack.depth();
                self.raise_max(depth);
            }
            StackState::Unknown => self.poison_max(),
        }
    }

    fn push_kind_of(&mut self, opcode: Opcode) {
        match opcode.type_kind() {
            Some(kind) => self.push(kind),
            None => self.unsupported(opcode),
        }
    }

    fn pop_n(&mut self, n: usize) {
        for _ in 0..n {
            let StackState::Known(stack) = &mut self.current else {
                return;
            };
            if stack.pop().is_none() {
                self.lose("operand stack underflow");
                return;
            }
        }
    }

    /// Fork the current stack into the side table at `label`; last write wins
    fn record(&mut self, label: Label) {
        if let StackState::Known(stack) = &self.current {
            trace!("record {} at {:?}", stack, label);
            self.targets.insert(label, stack.clone());
        }
    }

    fn bind(&mut self, label: Label) {
        if let Some(stack) = self.targets.remove(&label) {
            trace!("bind {:?} restores {}", label, stack);
            let depth = stack.depth();
            self.current = StackState::Known(stack);
            self.raise_max(depth);
        }
    }

    fn lose(&mut self, reason: &str) {
        if self.current.is_known() {
            debug!("stack unknown after {}", reason);
        }
        self.current = StackState::Unknown;
    }

    fn unsupported(&mut self, opcode: Opcode) {
        debug!("no stack effect for {} in this position", opcode);
        self.lose("unsupported instruction");
    }

    fn raise_max(&mut self, depth: usize) {
        if let Some(max) = &mut self.max_depth {
            *max = (*max).max(depth);
        }
    }

    fn poison_max(&mut self) {
        if self.max_depth.take().is_some() {
            debug!("push on unknown stack, max stack size is now unknown");
        }
    }

    fn shuffle(&mut self, opcode: Opcode) {
        let grows = !matches!(opcode, Opcode::Pop | Opcode::Pop2 | Opcode::Swap);
        match &mut self.current {
            StackState::Known(stack) => match permute(stack, opcode) {
                Some(()) => {
                    let depth = stack.depth();
                    self.raise_max(depth);
                }
                None => self.lose("malformed stack operation"),
            },
            StackState::Unknown if grows => self.poison_max(),
            StackState::Unknown => {}
        }
    }
}

fn push_all(stack: &mut Stack, kinds: &[OperandKind]) {
    for &kind in kinds {
        stack.push(kind);
    }
}

/// Rearrange the top entries of `stack` as `opcode` does. Each case follows the
/// forms of the JVM instruction set, chosen by the slot size of the entries on
/// top. All pops happen before any push, so the resulting depth is the peak.
/// `None` on underflow, leaving `stack` partially popped.
fn permute(stack: &mut Stack, opcode: Opcode) -> Option<()> {
    use Opcode::*;
    match opcode {
        Pop => {
            stack.pop()?;
        }
        Pop2 => {
            let v1 = stack.pop()?;
            if !v1.is_wide() {
                stack.pop()?;
            }
        }
        Dup => {
            let v1 = stack.peek()?;
            stack.push(v1);
        }
        DupX1 => {
            let v1 = stack.pop()?;
            let v2 = stack.pop()?;
            push_all(stack, &[v1, v2, v1]);
        }
        DupX2 => {
            let v1 = stack.pop()?;
            let v2 = stack.pop()?;
            if v2.is_wide() {
                push_all(stack, &[v1, v2, v1]);
            } else {
                let v3 = stack.pop()?;
                push_all(stack, &[v1, v3, v2, v1]);
            }
        }
        Dup2 => {
            let v1 = stack.pop()?;
            if v1.is_wide() {
                push_all(stack, &[v1, v1]);
            } else {
                let v2 = stack.pop()?;
                push_all(stack, &[v2, v1, v2, v1]);
            }
        }
        Dup2X1 => {
            let v1 = stack.pop()?;
            let v2 = stack.pop()?;
            if v1.is_wide() {
                push_all(stack, &[v1, v2, v1]);
            } else {
                let v3 = stack.pop()?;
                push_all(stack, &[v2, v1, v3, v2, v1]);
            }
        }
        Dup2X2 => {
            let v1 = stack.pop()?;
            let v2 = stack.pop()?;
            match (v1.is_wide(), v2.is_wide()) {
                (true, true) => push_all(stack, &[v1, v2, v1]),
                (true, false) => {
                    let v3 = stack.pop()?;
                    push_all(stack, &[v1, v3, v2, v1]);
                }
                (false, _) => {
                    let v3 = stack.pop()?;
                    if v3.is_wide() {
                        push_all(stack, &[v2, v1, v3, v2, v1]);
                    } else {
                        let v4 = stack.pop()?;
                        push_all(stack, &[v2, v1, v4, v3, v2, v1]);
                    }
                }
            }
        }
        Swap => {
            let v1 = stack.pop()?;
            let v2 = stack.pop()?;
            push_all(stack, &[v1, v2]);
        }
        _ => return None,
    }
    Some(())
}

impl CodeTransform for CodeStackTracker {
    fn accept(&mut self, builder: &mut dyn CodeBuilder, element: CodeElement) {
        builder.with(element.clone());
        self.track(&element);
    }
}
