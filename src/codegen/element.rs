//! Decoded code elements: instructions and pseudo-instructions of a method body
//!
//! A method body is a stream of [`CodeElement`]s. Instructions carry their
//! [`Opcode`]; pseudo-instructions (label bindings, exception regions, debug
//! tables) carry the labels they refer to. The enum is closed so every transform
//! matches it exhaustively.

use crate::codegen::descriptor::{FieldDescriptor, MethodDescriptor};
use crate::codegen::label::Label;
use crate::codegen::opcode_enum::{Opcode, OpcodeKind};
use crate::codegen::type_kind::OperandKind;
use crate::error::{Error, Result};

/// Value pushed by a constant instruction
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Class(String),
}

impl ConstantValue {
    pub fn kind(&self) -> OperandKind {
        match self {
            ConstantValue::Int(_) => OperandKind::Int,
            ConstantValue::Long(_) => OperandKind::Long,
            ConstantValue::Float(_) => OperandKind::Float,
            ConstantValue::Double(_) => OperandKind::Double,
            ConstantValue::Null | ConstantValue::String(_) | ConstantValue::Class(_) => {
                OperandKind::Reference
            }
        }
    }
}

/// Element type of a `newarray` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveArrayType {
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl PrimitiveArrayType {
    /// The `atype` operand encoding of `newarray` (JVMS 6.5)
    pub fn atype(self) -> u8 {
        match self {
            PrimitiveArrayType::Boolean => 4,
            PrimitiveArrayType::Char => 5,
            PrimitiveArrayType::Float => 6,
            PrimitiveArrayType::Double => 7,
            PrimitiveArrayType::Byte => 8,
            PrimitiveArrayType::Short => 9,
            PrimitiveArrayType::Int => 10,
            PrimitiveArrayType::Long => 11,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveArrayType::Boolean => "boolean",
            PrimitiveArrayType::Char => "char",
            PrimitiveArrayType::Float => "float",
            PrimitiveArrayType::Double => "double",
            PrimitiveArrayType::Byte => "byte",
            PrimitiveArrayType::Short => "short",
            PrimitiveArrayType::Int => "int",
            PrimitiveArrayType::Long => "long",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let ty = match name {
            "boolean" => PrimitiveArrayType::Boolean,
            "char" => PrimitiveArrayType::Char,
            "float" => PrimitiveArrayType::Float,
            "double" => PrimitiveArrayType::Double,
            "byte" => PrimitiveArrayType::Byte,
            "short" => PrimitiveArrayType::Short,
            "int" => PrimitiveArrayType::Int,
            "long" => PrimitiveArrayType::Long,
            _ => return None,
        };
        Some(ty)
    }
}

/// Widest `tableswitch` range: jump offsets are 4 bytes and a method body is at
/// most 65535 bytes long.
pub const MAX_TABLE_SWITCH_CASES: usize = 16_383;

/// One `case` arm of a switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchCase {
    pub value: i32,
    pub target: Label,
}

impl SwitchCase {
    pub fn new(value: i32, target: Label) -> Self {
        Self { value, target }
    }
}

/// A single decoded construct of a method body
#[derive(Debug, Clone, PartialEq)]
pub enum CodeElement {
    // Instructions
    Nop,
    Constant { opcode: Opcode, value: ConstantValue },
    Load { opcode: Opcode, slot: u16 },
    Store { opcode: Opcode, slot: u16 },
    Increment { slot: u16, constant: i16 },
    ArrayLoad(Opcode),
    ArrayStore(Opcode),
    Stack(Opcode),
    Operator(Opcode),
    Convert(Opcode),
    Branch { opcode: Opcode, target: Label },
    TableSwitch {
        low: i32,
        high: i32,
        default_target: Label,
        cases: Vec<SwitchCase>,
    },
    LookupSwitch {
        default_target: Label,
        cases: Vec<SwitchCase>,
    },
    Return(Opcode),
    Field {
        opcode: Opcode,
        owner: String,
        name: String,
        descriptor: FieldDescriptor,
    },
    Invoke {
        opcode: Opcode,
        owner: String,
        name: String,
        descriptor: MethodDescriptor,
    },
    InvokeDynamic { name: String, descriptor: MethodDescriptor },
    NewObject { class: String },
    NewPrimitiveArray(PrimitiveArrayType),
    NewReferenceArray { component: String },
    NewMultiArray { array_type: String, dimensions: u8 },
    Throw,
    TypeCheck { opcode: Opcode, class: String },
    Monitor(Opcode),

    // Pseudo-instructions
    LabelTarget(Label),
    ExceptionCatch {
        try_start: Label,
        try_end: Label,
        handler: Label,
        /// `None` catches everything (`finally` and friends)
        catch_type: Option<String>,
    },
    LocalVariable {
        slot: u16,
        name: String,
        descriptor: String,
        start: Label,
        end: Label,
    },
    LocalVariableType {
        slot: u16,
        name: String,
        signature: String,
        start: Label,
        end: Label,
    },
    CharacterRange {
        start: Label,
        end: Label,
        range_start: i32,
        range_end: i32,
        flags: u16,
    },
    LineNumber(u16),
    /// Any other code attribute, forwarded opaquely
    Attribute { name: String, data: Vec<u8> },
}

fn expect_kind(opcode: Opcode, kind: OpcodeKind, expected: &'static str) -> Result<()> {
    if opcode.kind() == kind {
        Ok(())
    } else {
        Err(Error::invalid_opcode(opcode, expected))
    }
}

impl CodeElement {
    /// Constant push. The value must agree with what the opcode can push.
    pub fn constant(opcode: Opcode, value: ConstantValue) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Constant, "constant")?;
        let fits = match (opcode, &value) {
            (Opcode::AconstNull, ConstantValue::Null) => true,
            (Opcode::Bipush, ConstantValue::Int(v)) => i8::try_from(*v).is_ok(),
            (Opcode::Sipush, ConstantValue::Int(v)) => i16::try_from(*v).is_ok(),
            (Opcode::Ldc | Opcode::LdcW, v) => matches!(
                v,
                ConstantValue::Int(_)
                    | ConstantValue::Float(_)
                    | ConstantValue::String(_)
                    | ConstantValue::Class(_)
            ),
            (Opcode::Ldc2W, v) => matches!(v, ConstantValue::Long(_) | ConstantValue::Double(_)),
            (op, v) => intrinsic_constant(op).as_ref() == Some(v),
        };
        if !fits {
            return Err(Error::invalid_opcode(opcode, "constant for this value"));
        }
        Ok(CodeElement::Constant { opcode, value })
    }

    /// Constant push whose value is implied by the opcode (`iconst_2`, `dconst_1`, ...)
    pub fn intrinsic_constant(opcode: Opcode) -> Result<Self> {
        let value = intrinsic_constant(opcode)
            .ok_or_else(|| Error::invalid_opcode(opcode, "intrinsic constant"))?;
        Ok(CodeElement::Constant { opcode, value })
    }

    /// Local load; slot-encoding opcodes (`iload_1`) must agree with `slot`
    pub fn load(opcode: Opcode, slot: u16) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Load, "load")?;
        check_slot(opcode, slot)?;
        Ok(CodeElement::Load { opcode, slot })
    }

    pub fn store(opcode: Opcode, slot: u16) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Store, "store")?;
        check_slot(opcode, slot)?;
        Ok(CodeElement::Store { opcode, slot })
    }

    pub fn array_load(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::ArrayLoad, "array load")?;
        Ok(CodeElement::ArrayLoad(opcode))
    }

    pub fn array_store(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::ArrayStore, "array store")?;
        Ok(CodeElement::ArrayStore(opcode))
    }

    pub fn stack(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Stack, "stack")?;
        Ok(CodeElement::Stack(opcode))
    }

    pub fn operator(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Operator, "operator")?;
        Ok(CodeElement::Operator(opcode))
    }

    pub fn convert(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Convert, "conversion")?;
        Ok(CodeElement::Convert(opcode))
    }

    pub fn branch(opcode: Opcode, target: Label) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Branch, "branch")?;
        Ok(CodeElement::Branch { opcode, target })
    }

    pub fn return_(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Return, "return")?;
        Ok(CodeElement::Return(opcode))
    }

    pub fn monitor(opcode: Opcode) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Monitor, "monitor")?;
        Ok(CodeElement::Monitor(opcode))
    }

    pub fn type_check(opcode: Opcode, class: impl Into<String>) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::TypeCheck, "type check")?;
        Ok(CodeElement::TypeCheck { opcode, class: class.into() })
    }

    pub fn field(
        opcode: Opcode,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: &str,
    ) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Field, "field access")?;
        Ok(CodeElement::Field {
            opcode,
            owner: owner.into(),
            name: name.into(),
            descriptor: FieldDescriptor::parse(descriptor)?,
        })
    }

    pub fn invoke(
        opcode: Opcode,
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: &str,
    ) -> Result<Self> {
        expect_kind(opcode, OpcodeKind::Invoke, "invoke")?;
        Ok(CodeElement::Invoke {
            opcode,
            owner: owner.into(),
            name: name.into(),
            descriptor: MethodDescriptor::parse(descriptor)?,
        })
    }

    pub fn invoke_dynamic(name: impl Into<String>, descriptor: &str) -> Result<Self> {
        Ok(CodeElement::InvokeDynamic {
            name: name.into(),
            descriptor: MethodDescriptor::parse(descriptor)?,
        })
    }

    /// `tableswitch` over `low..=high`; `cases` may be sparse
    pub fn table_switch(low: i32, high: i32, default_target: Label, cases: Vec<SwitchCase>) -> Result<Self> {
        if high < low {
            return Err(Error::invalid_opcode(Opcode::Tableswitch, "switch with low <= high"));
        }
        let width = i64::from(high) - i64::from(low) + 1;
        if width > MAX_TABLE_SWITCH_CASES as i64 {
            return Err(Error::invalid_opcode(Opcode::Tableswitch, "switch that fits in a method body"));
        }
        if cases.iter().any(|c| c.value < low || c.value > high) {
            return Err(Error::invalid_opcode(Opcode::Tableswitch, "switch with cases inside low..=high"));
        }
        Ok(CodeElement::TableSwitch { low, high, default_target, cases })
    }

    pub fn lookup_switch(default_target: Label, cases: Vec<SwitchCase>) -> Self {
        CodeElement::LookupSwitch { default_target, cases }
    }

    /// The opcode of an instruction, `None` for pseudo-instructions
    pub fn opcode(&self) -> Option<Opcode> {
        let op = match self {
            CodeElement::Nop => Opcode::Nop,
            CodeElement::Constant { opcode, .. }
            | CodeElement::Load { opcode, .. }
            | CodeElement::Store { opcode, .. }
            | CodeElement::Branch { opcode, .. }
            | CodeElement::Field { opcode, .. }
            | CodeElement::Invoke { opcode, .. }
            | CodeElement::TypeCheck { opcode, .. } => *opcode,
            CodeElement::ArrayLoad(opcode)
            | CodeElement::ArrayStore(opcode)
            | CodeElement::Stack(opcode)
            | CodeElement::Operator(opcode)
            | CodeElement::Convert(opcode)
            | CodeElement::Return(opcode)
            | CodeElement::Monitor(opcode) => *opcode,
            CodeElement::Increment { .. } => Opcode::Iinc,
            CodeElement::TableSwitch { .. } => Opcode::Tableswitch,
            CodeElement::LookupSwitch { .. } => Opcode::Lookupswitch,
            CodeElement::InvokeDynamic { .. } => Opcode::Invokedynamic,
            CodeElement::NewObject { .. } => Opcode::New,
            CodeElement::NewPrimitiveArray(_) => Opcode::Newarray,
            CodeElement::NewReferenceArray { .. } => Opcode::Anewarray,
            CodeElement::NewMultiArray { .. } => Opcode::Multianewarray,
            CodeElement::Throw => Opcode::Athrow,
            CodeElement::LabelTarget(_)
            | CodeElement::ExceptionCatch { .. }
            | CodeElement::LocalVariable { .. }
            | CodeElement::LocalVariableType { .. }
            | CodeElement::CharacterRange { .. }
            | CodeElement::LineNumber(_)
            | CodeElement::Attribute { .. } => return None,
        };
        Some(op)
    }

    pub fn is_pseudo(&self) -> bool {
        self.opcode().is_none()
    }

    /// Every label this element mentions, in field order
    pub fn labels(&self) -> Vec<Label> {
        match self {
            CodeElement::Branch { target, .. } => vec![*target],
            CodeElement::TableSwitch { default_target, cases, .. }
            | CodeElement::LookupSwitch { default_target, cases } => std::iter::once(*default_target)
                .chain(cases.iter().map(|c| c.target))
                .collect(),
            CodeElement::LabelTarget(label) => vec![*label],
            CodeElement::ExceptionCatch { try_start, try_end, handler, .. } => {
                vec![*try_start, *try_end, *handler]
            }
            CodeElement::LocalVariable { start, end, .. }
            | CodeElement::LocalVariableType { start, end, .. }
            | CodeElement::CharacterRange { start, end, .. } => vec![*start, *end],
            _ => Vec::new(),
        }
    }
}

fn intrinsic_constant(opcode: Opcode) -> Option<ConstantValue> {
    let value = match opcode {
        Opcode::AconstNull => ConstantValue::Null,
        Opcode::IconstM1 => ConstantValue::Int(-1),
        Opcode::Iconst0 => ConstantValue::Int(0),
        Opcode::Iconst1 => ConstantValue::Int(1),
        Opcode::Iconst2 => ConstantValue::Int(2),
        Opcode::Iconst3 => ConstantValue::Int(3),
        Opcode::Iconst4 => ConstantValue::Int(4),
        Opcode::Iconst5 => ConstantValue::Int(5),
        Opcode::Lconst0 => ConstantValue::Long(0),
        Opcode::Lconst1 => ConstantValue::Long(1),
        Opcode::Fconst0 => ConstantValue::Float(0.0),
        Opcode::Fconst1 => ConstantValue::Float(1.0),
        Opcode::Fconst2 => ConstantValue::Float(2.0),
        Opcode::Dconst0 => ConstantValue::Double(0.0),
        Opcode::Dconst1 => ConstantValue::Double(1.0),
        _ => return None,
    };
    Some(value)
}

fn check_slot(opcode: Opcode, slot: u16) -> Result<()> {
    match opcode.implicit_slot() {
        Some(implied) if implied != slot => {
            Err(Error::invalid_opcode(opcode, "local access for this slot"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_validation() {
        assert!(CodeElement::constant(Opcode::Bipush, ConstantValue::Int(100)).is_ok());
        assert!(CodeElement::constant(Opcode::Bipush, ConstantValue::Int(300)).is_err());
        assert!(CodeElement::constant(Opcode::Ldc2W, ConstantValue::Long(7)).is_ok());
        assert!(CodeElement::constant(Opcode::Ldc, ConstantValue::Long(7)).is_err());
        assert!(CodeElement::constant(Opcode::Iconst3, ConstantValue::Int(3)).is_ok());
        assert!(CodeElement::constant(Opcode::Iconst3, ConstantValue::Int(4)).is_err());
        assert!(CodeElement::constant(Opcode::Iadd, ConstantValue::Int(4)).is_err());
    }

    #[test]
    fn test_family_checks() {
        assert!(CodeElement::load(Opcode::Iload1, 1).is_ok());
        assert!(CodeElement::load(Opcode::Iload1, 2).is_err());
        assert!(CodeElement::load(Opcode::Istore, 2).is_err());
        assert!(CodeElement::branch(Opcode::Iadd, Label::fresh()).is_err());
        assert!(CodeElement::stack(Opcode::Dup2X1).is_ok());
        assert!(CodeElement::invoke(Opcode::Invokestatic, "A", "m", "(I").is_err());
    }

    #[test]
    fn test_labels_of_switch() {
        let (d, a, b) = (Label::fresh(), Label::fresh(), Label::fresh());
        let sw = CodeElement::lookup_switch(d, vec![SwitchCase::new(1, a), SwitchCase::new(9, b)]);
        assert_eq!(sw.labels(), vec![d, a, b]);
        assert_eq!(sw.opcode(), Some(Opcode::Lookupswitch));
        assert!(CodeElement::LabelTarget(d).is_pseudo());
    }

    #[test]
    fn test_table_switch_bounds() {
        let d = Label::fresh();
        assert!(CodeElement::table_switch(0, 2, d, vec![SwitchCase::new(3, d)]).is_err());
        assert!(CodeElement::table_switch(2, 0, d, vec![]).is_err());
        assert!(CodeElement::table_switch(0, 2, d, vec![SwitchCase::new(1, d)]).is_ok());
        assert!(CodeElement::table_switch(0, i32::MAX, d, vec![]).is_err());
        assert!(CodeElement::table_switch(i32::MIN, i32::MAX, d, vec![]).is_err());
        assert!(CodeElement::table_switch(-1, MAX_TABLE_SWITCH_CASES as i32 - 2, d, vec![]).is_ok());
        assert!(CodeElement::table_switch(-1, MAX_TABLE_SWITCH_CASES as i32 - 1, d, vec![]).is_err());
    }
}
