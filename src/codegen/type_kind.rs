//! Operand kinds as they live on the JVM operand stack

use std::fmt;

use crate::error::{Error, Result};

/// Value category of an operand stack entry.
///
/// Sub-int descriptor types (`B`, `C`, `S`, `Z`) are widened to [`OperandKind::Int`]
/// before they reach the stack, matching how the VM stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Void,
}

impl OperandKind {
    /// Number of stack slots an entry of this kind occupies
    pub fn slot_size(self) -> usize {
        match self {
            OperandKind::Long | OperandKind::Double => 2,
            OperandKind::Void => 0,
            _ => 1,
        }
    }

    /// Whether this is a computational type of category 2 (long, double)
    pub fn is_wide(self) -> bool {
        self.slot_size() == 2
    }

    /// Map a descriptor's leading character to its stack kind.
    ///
    /// `L` and `[` both yield [`OperandKind::Reference`]; the caller is responsible
    /// for skipping the rest of an object or array descriptor.
    pub fn from_descriptor_char(ch: char) -> Option<Self> {
        match ch {
            'I' | 'B' | 'C' | 'S' | 'Z' => Some(OperandKind::Int),
            'J' => Some(OperandKind::Long),
            'F' => Some(OperandKind::Float),
            'D' => Some(OperandKind::Double),
            'L' | '[' => Some(OperandKind::Reference),
            'V' => Some(OperandKind::Void),
            _ => None,
        }
    }

    /// Parse a sequence of field descriptors such as `"IJLjava/lang/String;"`
    /// into the kinds they denote, in order.
    pub fn parse_sequence(descriptors: &str) -> Result<Vec<OperandKind>> {
        let mut kinds = Vec::new();
        let mut rest = descriptors;
        while !rest.is_empty() {
            let (kind, len) = crate::codegen::descriptor::parse_field_type(rest)
                .map_err(|message| Error::descriptor_error(descriptors, message))?;
            if kind == OperandKind::Void {
                return Err(Error::descriptor_error(descriptors, "void is not a value type"));
            }
            kinds.push(kind);
            rest = &rest[len..];
        }
        Ok(kinds)
    }

    /// Single-letter form used in listings and stack dumps
    pub fn descriptor_char(self) -> char {
        match self {
            OperandKind::Int => 'I',
            OperandKind::Long => 'J',
            OperandKind::Float => 'F',
            OperandKind::Double => 'D',
            OperandKind::Reference => 'A',
            OperandKind::Void => 'V',
        }
    }
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperandKind::Int => "int",
            OperandKind::Long => "long",
            OperandKind::Float => "float",
            OperandKind::Double => "double",
            OperandKind::Reference => "reference",
            OperandKind::Void => "void",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_sizes() {
        assert_eq!(OperandKind::Int.slot_size(), 1);
        assert_eq!(OperandKind::Reference.slot_size(), 1);
        assert_eq!(OperandKind::Long.slot_size(), 2);
        assert_eq!(OperandKind::Double.slot_size(), 2);
        assert_eq!(OperandKind::Void.slot_size(), 0);
    }

    #[test]
    fn test_sub_int_types_widen_to_int() {
        for ch in ['B', 'C', 'S', 'Z', 'I'] {
            assert_eq!(OperandKind::from_descriptor_char(ch), Some(OperandKind::Int));
        }
        assert_eq!(OperandKind::from_descriptor_char('Q'), None);
    }

    #[test]
    fn test_parse_sequence() {
        let kinds = OperandKind::parse_sequence("IJLjava/lang/String;[[D").unwrap();
        assert_eq!(
            kinds,
            vec![OperandKind::Int, OperandKind::Long, OperandKind::Reference, OperandKind::Reference]
        );
        assert!(OperandKind::parse_sequence("IV").is_err());
        assert!(OperandKind::parse_sequence("Ljava/lang/String").is_err());
    }
}
