/*!
 * Persistent operand stack snapshots
 *
 * A snapshot is a singly linked list of operand kinds, top first. Cells are
 * reference counted and never mutated, so cloning a snapshot (a "fork") is a
 * pointer copy and every fork shares its tail with the snapshot it came from.
 */

use std::fmt;
use std::rc::Rc;

use crate::codegen::type_kind::OperandKind;

#[derive(Debug)]
struct Item {
    kind: OperandKind,
    next: Option<Rc<Item>>,
}

/// Immutable operand stack content with its entry count and slot depth
#[derive(Clone, Default)]
pub struct Stack {
    top: Option<Rc<Item>>,
    count: usize,
    depth: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from kinds listed bottom first
    pub fn from_bottom_up(kinds: &[OperandKind]) -> Self {
        let mut stack = Stack::new();
        for &kind in kinds {
            stack.push(kind);
        }
        stack
    }

    /// Number of logical entries
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sum of the slot sizes of all entries
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn peek(&self) -> Option<OperandKind> {
        self.top.as_ref().map(|item| item.kind)
    }

    /// Push an entry. `Void` occupies no slot and is ignored.
    pub fn push(&mut self, kind: OperandKind) {
        if kind == OperandKind::Void {
            return;
        }
        self.top = Some(Rc::new(Item {
            kind,
            next: self.top.take(),
        }));
        self.count += 1;
        self.depth += kind.slot_size();
    }

    /// Pop the top entry; `None` when the snapshot is empty
    pub fn pop(&mut self) -> Option<OperandKind> {
        let item = self.top.take()?;
        self.top = item.next.clone();
        self.count -= 1;
        self.depth -= item.kind.slot_size();
        Some(item.kind)
    }

    /// Whether two snapshots share the same top cell
    pub fn shares_with(&self, other: &Stack) -> bool {
        match (&self.top, &other.top) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Iterate over the entries, top first
    pub fn iter(&self) -> StackIter<'_> {
        StackIter {
            current: self.top.as_deref(),
        }
    }

    /// Entries bottom first, the order in which they were pushed
    pub fn to_vec(&self) -> Vec<OperandKind> {
        let mut kinds: Vec<OperandKind> = self.iter().collect();
        kinds.reverse();
        kinds
    }
}

/// Iterator over a [`Stack`], top entry first
pub struct StackIter<'a> {
    current: Option<&'a Item>,
}

impl<'a> Iterator for StackIter<'a> {
    type Item = OperandKind;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.current?;
        self.current = item.next.as_deref();
        Some(item.kind)
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = OperandKind;
    type IntoIter = StackIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for Stack {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.depth == other.depth
            && (self.shares_with(other) || self.iter().eq(other.iter()))
    }
}

impl Eq for Stack {}

impl Drop for Stack {
    // Unlink uniquely owned cells iteratively so long stacks don't recurse on drop.
    fn drop(&mut self) {
        let mut next = self.top.take();
        while let Some(item) = next {
            match Rc::try_unwrap(item) {
                Ok(mut item) => next = item.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stack{}", self)
    }
}

/// Bottom-first, e.g. `[A, I, J]` with `J` on top
impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, kind) in self.to_vec().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind.descriptor_char())?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperandKind::*;

    #[test]
    fn test_push_pop_tracks_count_and_depth() {
        let mut s = Stack::new();
        s.push(Int);
        s.push(Long);
        s.push(Void);
        assert_eq!(s.len(), 2);
        assert_eq!(s.depth(), 3);
        assert_eq!(s.pop(), Some(Long));
        assert_eq!(s.depth(), 1);
        assert_eq!(s.pop(), Some(Int));
        assert_eq!(s.pop(), None);
        assert!(s.is_empty());
    }

    #[test]
    fn test_fork_shares_structure_and_is_independent() {
        let base = Stack::from_bottom_up(&[Reference, Int]);
        let mut fork = base.clone();
        assert!(fork.shares_with(&base));

        fork.pop();
        fork.push(Double);
        assert_eq!(base.to_vec(), vec![Reference, Int]);
        assert_eq!(fork.to_vec(), vec![Reference, Double]);
        assert_eq!(fork.depth(), 3);
    }

    #[test]
    fn test_iteration_order() {
        let s = Stack::from_bottom_up(&[Int, Float, Reference]);
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![Reference, Float, Int]);
        assert_eq!(s.to_string(), "[I, F, A]");
    }

    #[test]
    fn test_equality_is_structural() {
        let a = Stack::from_bottom_up(&[Int, Long]);
        let b = Stack::from_bottom_up(&[Int, Long]);
        assert_eq!(a, b);
        assert_ne!(a, Stack::from_bottom_up(&[Long, Int]));
    }

    #[test]
    fn test_deep_stack_drops_without_recursion() {
        let mut s = Stack::new();
        for _ in 0..200_000 {
            s.push(Int);
        }
        drop(s);
    }
}
