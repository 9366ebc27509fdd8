//! Java bytecode opcode enumeration for type-safe instruction handling
//!
//! Every opcode a [`CodeElement`](crate::codegen::element::CodeElement) can carry is
//! listed once below with its byte value, mnemonic and instruction family.
//! `wide`, `jsr`/`ret` and the reserved opcodes have no element form and are absent.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::codegen::type_kind::OperandKind;
use crate::error::{Error, Result};

/// Instruction family an opcode belongs to; mirrors the element variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeKind {
    Nop,
    Constant,
    Load,
    Store,
    Increment,
    ArrayLoad,
    ArrayStore,
    Stack,
    Operator,
    Convert,
    Branch,
    TableSwitch,
    LookupSwitch,
    Return,
    Field,
    Invoke,
    InvokeDynamic,
    NewObject,
    NewPrimitiveArray,
    NewReferenceArray,
    NewMultiArray,
    Throw,
    TypeCheck,
    Monitor,
}

macro_rules! define_opcodes {
    ($($variant:ident = $byte:literal, $mnemonic:literal, $kind:ident;)*) => {
        /// Java bytecode opcode
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($variant,)*
        }

        impl Opcode {
            /// Every opcode, in byte order
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            /// Get the bytecode value for this opcode
            pub fn to_byte(self) -> u8 {
                match self {
                    $(Opcode::$variant => $byte,)*
                }
            }

            /// Lower-case mnemonic as printed by javap
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $mnemonic,)*
                }
            }

            pub fn kind(self) -> OpcodeKind {
                match self {
                    $(Opcode::$variant => OpcodeKind::$kind,)*
                }
            }
        }
    };
}

define_opcodes! {
    Nop = 0x00, "nop", Nop;
    AconstNull = 0x01, "aconst_null", Constant;
    IconstM1 = 0x02, "iconst_m1", Constant;
    Iconst0 = 0x03, "iconst_0", Constant;
    Iconst1 = 0x04, "iconst_1", Constant;
    Iconst2 = 0x05, "iconst_2", Constant;
    Iconst3 = 0x06, "iconst_3", Constant;
    Iconst4 = 0x07, "iconst_4", Constant;
    Iconst5 = 0x08, "iconst_5", Constant;
    Lconst0 = 0x09, "lconst_0", Constant;
    Lconst1 = 0x0a, "lconst_1", Constant;
    Fconst0 = 0x0b, "fconst_0", Constant;
    Fconst1 = 0x0c, "fconst_1", Constant;
    Fconst2 = 0x0d, "fconst_2", Constant;
    Dconst0 = 0x0e, "dconst_0", Constant;
    Dconst1 = 0x0f, "dconst_1", Constant;
    Bipush = 0x10, "bipush", Constant;
    Sipush = 0x11, "sipush", Constant;
    Ldc = 0x12, "ldc", Constant;
    LdcW = 0x13, "ldc_w", Constant;
    Ldc2W = 0x14, "ldc2_w", Constant;

    Iload = 0x15, "iload", Load;
    Lload = 0x16, "lload", Load;
    Fload = 0x17, "fload", Load;
    Dload = 0x18, "dload", Load;
    Aload = 0x19, "aload", Load;
    Iload0 = 0x1a, "iload_0", Load;
    Iload1 = 0x1b, "iload_1", Load;
    Iload2 = 0x1c, "iload_2", Load;
    Iload3 = 0x1d, "iload_3", Load;
    Lload0 = 0x1e, "lload_0", Load;
    Lload1 = 0x1f, "lload_1", Load;
    Lload2 = 0x20, "lload_2", Load;
    Lload3 = 0x21, "lload_3", Load;
    Fload0 = 0x22, "fload_0", Load;
    Fload1 = 0x23, "fload_1", Load;
    Fload2 = 0x24, "fload_2", Load;
    Fload3 = 0x25, "fload_3", Load;
    Dload0 = 0x26, "dload_0", Load;
    Dload1 = 0x27, "dload_1", Load;
    Dload2 = 0x28, "dload_2", Load;
    Dload3 = 0x29, "dload_3", Load;
    Aload0 = 0x2a, "aload_0", Load;
    Aload1 = 0x2b, "aload_1", Load;
    Aload2 = 0x2c, "aload_2", Load;
    Aload3 = 0x2d, "aload_3", Load;

    Iaload = 0x2e, "iaload", ArrayLoad;
    Laload = 0x2f, "laload", ArrayLoad;
    Faload = 0x30, "faload", ArrayLoad;
    Daload = 0x31, "daload", ArrayLoad;
    Aaload = 0x32, "aaload", ArrayLoad;
    Baload = 0x33, "baload", ArrayLoad;
    Caload = 0x34, "caload", ArrayLoad;
    Saload = 0x35, "saload", ArrayLoad;

    Istore = 0x36, "istore", Store;
    Lstore = 0x37, "lstore", Store;
    Fstore = 0x38, "fstore", Store;
    Dstore = 0x39, "dstore", Store;
    Astore = 0x3a, "astore", Store;
    Istore0 = 0x3b, "istore_0", Store;
    Istore1 = 0x3c, "istore_1", Store;
    Istore2 = 0x3d, "istore_2", Store;
    Istore3 = 0x3e, "istore_3", Store;
    Lstore0 = 0x3f, "lstore_0", Store;
    Lstore1 = 0x40, "lstore_1", Store;
    Lstore2 = 0x41, "lstore_2", Store;
    Lstore3 = 0x42, "lstore_3", Store;
    Fstore0 = 0x43, "fstore_0", Store;
    Fstore1 = 0x44, "fstore_1", Store;
    Fstore2 = 0x45, "fstore_2", Store;
    Fstore3 = 0x46, "fstore_3", Store;
    Dstore0 = 0x47, "dstore_0", Store;
    Dstore1 = 0x48, "dstore_1", Store;
    Dstore2 = 0x49, "dstore_2", Store;
    Dstore3 = 0x4a, "dstore_3", Store;
    Astore0 = 0x4b, "astore_0", Store;
    Astore1 = 0x4c, "astore_1", Store;
    Astore2 = 0x4d, "astore_2", Store;
    Astore3 = 0x4e, "astore_3", Store;

    Iastore = 0x4f, "iastore", ArrayStore;
    Lastore = 0x50, "lastore", ArrayStore;
    Fastore = 0x51, "fastore", ArrayStore;
    Dastore = 0x52, "dastore", ArrayStore;
    Aastore = 0x53, "aastore", ArrayStore;
    Bastore = 0x54, "bastore", ArrayStore;
    Castore = 0x55, "castore", ArrayStore;
    Sastore = 0x56, "sastore", ArrayStore;

    Pop = 0x57, "pop", Stack;
    Pop2 = 0x58, "pop2", Stack;
    Dup = 0x59, "dup", Stack;
    DupX1 = 0x5a, "dup_x1", Stack;
    DupX2 = 0x5b, "dup_x2", Stack;
    Dup2 = 0x5c, "dup2", Stack;
    Dup2X1 = 0x5d, "dup2_x1", Stack;
    Dup2X2 = 0x5e, "dup2_x2", Stack;
    Swap = 0x5f, "swap", Stack;

    Iadd = 0x60, "iadd", Operator;
    Ladd = 0x61, "ladd", Operator;
    Fadd = 0x62, "fadd", Operator;
    Dadd = 0x63, "dadd", Operator;
    Isub = 0x64, "isub", Operator;
    Lsub = 0x65, "lsub", Operator;
    Fsub = 0x66, "fsub", Operator;
    Dsub = 0x67, "dsub", Operator;
    Imul = 0x68, "imul", Operator;
    Lmul = 0x69, "lmul", Operator;
    Fmul = 0x6a, "fmul", Operator;
    Dmul = 0x6b, "dmul", Operator;
    Idiv = 0x6c, "idiv", Operator;
    Ldiv = 0x6d, "ldiv", Operator;
    Fdiv = 0x6e, "fdiv", Operator;
    Ddiv = 0x6f, "ddiv", Operator;
    Irem = 0x70, "irem", Operator;
    Lrem = 0x71, "lrem", Operator;
    Frem = 0x72, "frem", Operator;
    Drem = 0x73, "drem", Operator;
    Ineg = 0x74, "ineg", Operator;
    Lneg = 0x75, "lneg", Operator;
    Fneg = 0x76, "fneg", Operator;
    Dneg = 0x77, "dneg", Operator;
    Ishl = 0x78, "ishl", Operator;
    Lshl = 0x79, "lshl", Operator;
    Ishr = 0x7a, "ishr", Operator;
    Lshr = 0x7b, "lshr", Operator;
    Iushr = 0x7c, "iushr", Operator;
    Lushr = 0x7d, "lushr", Operator;
    Iand = 0x7e, "iand", Operator;
    Land = 0x7f, "land", Operator;
    Ior = 0x80, "ior", Operator;
    Lor = 0x81, "lor", Operator;
    Ixor = 0x82, "ixor", Operator;
    Lxor = 0x83, "lxor", Operator;
    Iinc = 0x84, "iinc", Increment;

    I2l = 0x85, "i2l", Convert;
    I2f = 0x86, "i2f", Convert;
    I2d = 0x87, "i2d", Convert;
    L2i = 0x88, "l2i", Convert;
    L2f = 0x89, "l2f", Convert;
    L2d = 0x8a, "l2d", Convert;
    F2i = 0x8b, "f2i", Convert;
    F2l = 0x8c, "f2l", Convert;
    F2d = 0x8d, "f2d", Convert;
    D2i = 0x8e, "d2i", Convert;
    D2l = 0x8f, "d2l", Convert;
    D2f = 0x90, "d2f", Convert;
    I2b = 0x91, "i2b", Convert;
    I2c = 0x92, "i2c", Convert;
    I2s = 0x93, "i2s", Convert;

    Lcmp = 0x94, "lcmp", Operator;
    Fcmpl = 0x95, "fcmpl", Operator;
    Fcmpg = 0x96, "fcmpg", Operator;
    Dcmpl = 0x97, "dcmpl", Operator;
    Dcmpg = 0x98, "dcmpg", Operator;

    Ifeq = 0x99, "ifeq", Branch;
    Ifne = 0x9a, "ifne", Branch;
    Iflt = 0x9b, "iflt", Branch;
    Ifge = 0x9c, "ifge", Branch;
    Ifgt = 0x9d, "ifgt", Branch;
    Ifle = 0x9e, "ifle", Branch;
    IfIcmpeq = 0x9f, "if_icmpeq", Branch;
    IfIcmpne = 0xa0, "if_icmpne", Branch;
    IfIcmplt = 0xa1, "if_icmplt", Branch;
    IfIcmpge = 0xa2, "if_icmpge", Branch;
    IfIcmpgt = 0xa3, "if_icmpgt", Branch;
    IfIcmple = 0xa4, "if_icmple", Branch;
    IfAcmpeq = 0xa5, "if_acmpeq", Branch;
    IfAcmpne = 0xa6, "if_acmpne", Branch;
    Goto = 0xa7, "goto", Branch;

    Tableswitch = 0xaa, "tableswitch", TableSwitch;
    Lookupswitch = 0xab, "lookupswitch", LookupSwitch;

    Ireturn = 0xac, "ireturn", Return;
    Lreturn = 0xad, "lreturn", Return;
    Freturn = 0xae, "freturn", Return;
    Dreturn = 0xaf, "dreturn", Return;
    Areturn = 0xb0, "areturn", Return;
    Return = 0xb1, "return", Return;

    Getstatic = 0xb2, "getstatic", Field;
    Putstatic = 0xb3, "putstatic", Field;
    Getfield = 0xb4, "getfield", Field;
    Putfield = 0xb5, "putfield", Field;

    Invokevirtual = 0xb6, "invokevirtual", Invoke;
    Invokespecial = 0xb7, "invokespecial", Invoke;
    Invokestatic = 0xb8, "invokestatic", Invoke;
    Invokeinterface = 0xb9, "invokeinterface", Invoke;
    Invokedynamic = 0xba, "invokedynamic", InvokeDynamic;

    New = 0xbb, "new", NewObject;
    Newarray = 0xbc, "newarray", NewPrimitiveArray;
    Anewarray = 0xbd, "anewarray", NewReferenceArray;
    Arraylength = 0xbe, "arraylength", Operator;
    Athrow = 0xbf, "athrow", Throw;
    Checkcast = 0xc0, "checkcast", TypeCheck;
    Instanceof = 0xc1, "instanceof", TypeCheck;
    Monitorenter = 0xc2, "monitorenter", Monitor;
    Monitorexit = 0xc3, "monitorexit", Monitor;
    Multianewarray = 0xc5, "multianewarray", NewMultiArray;
    Ifnull = 0xc6, "ifnull", Branch;
    Ifnonnull = 0xc7, "ifnonnull", Branch;
    GotoW = 0xc8, "goto_w", Branch;
}

static BY_MNEMONIC: Lazy<HashMap<&'static str, Opcode>> =
    Lazy::new(|| Opcode::ALL.iter().map(|&op| (op.mnemonic(), op)).collect());

impl Opcode {
    /// Look up an opcode by its javap mnemonic
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        BY_MNEMONIC.get(mnemonic).copied()
    }

    /// Check if this opcode is an unconditional branch
    pub fn is_unconditional_branch(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::GotoW)
    }

    /// Number of operand stack entries a branch tests and consumes
    pub fn branch_operands(self) -> usize {
        match self {
            Opcode::IfIcmpeq | Opcode::IfIcmpne | Opcode::IfIcmplt | Opcode::IfIcmpge
            | Opcode::IfIcmpgt | Opcode::IfIcmple | Opcode::IfAcmpeq | Opcode::IfAcmpne => 2,
            Opcode::Goto | Opcode::GotoW => 0,
            _ => 1,
        }
    }

    /// Slot encoded in the opcode itself (`iload_2`, `astore_0`, ...)
    pub fn implicit_slot(self) -> Option<u16> {
        use Opcode::*;
        match self {
            Iload0 | Lload0 | Fload0 | Dload0 | Aload0 | Istore0 | Lstore0 | Fstore0 | Dstore0 | Astore0 => Some(0),
            Iload1 | Lload1 | Fload1 | Dload1 | Aload1 | Istore1 | Lstore1 | Fstore1 | Dstore1 | Astore1 => Some(1),
            Iload2 | Lload2 | Fload2 | Dload2 | Aload2 | Istore2 | Lstore2 | Fstore2 | Dstore2 | Astore2 => Some(2),
            Iload3 | Lload3 | Fload3 | Dload3 | Aload3 | Istore3 | Lstore3 | Fstore3 | Dstore3 | Astore3 => Some(3),
            _ => None,
        }
    }

    /// Whether an operator opcode takes a single operand
    pub fn is_unary_operator(self) -> bool {
        matches!(
            self,
            Opcode::Ineg | Opcode::Lneg | Opcode::Fneg | Opcode::Dneg | Opcode::Arraylength
        )
    }

    /// Operand kind moved by this opcode.
    ///
    /// For loads, stores, array access, constants with a fixed type and returns this is
    /// the value's kind; for operators it is the result kind; for conversions it is
    /// the target kind. `None` for opcodes whose kind comes from an operand
    /// (`ldc`, field and invoke instructions) or that move no typed value.
    pub fn type_kind(self) -> Option<OperandKind> {
        use Opcode::*;
        use OperandKind::*;
        let kind = match self {
            AconstNull => Reference,
            IconstM1 | Iconst0 | Iconst1 | Iconst2 | Iconst3 | Iconst4 | Iconst5 | Bipush | Sipush => Int,
            Lconst0 | Lconst1 => Long,
            Fconst0 | Fconst1 | Fconst2 => Float,
            Dconst0 | Dconst1 => Double,

            Iload | Iload0 | Iload1 | Iload2 | Iload3 => Int,
            Lload | Lload0 | Lload1 | Lload2 | Lload3 => Long,
            Fload | Fload0 | Fload1 | Fload2 | Fload3 => Float,
            Dload | Dload0 | Dload1 | Dload2 | Dload3 => Double,
            Aload | Aload0 | Aload1 | Aload2 | Aload3 => Reference,
            Istore | Istore0 | Istore1 | Istore2 | Istore3 => Int,
            Lstore | Lstore0 | Lstore1 | Lstore2 | Lstore3 => Long,
            Fstore | Fstore0 | Fstore1 | Fstore2 | Fstore3 => Float,
            Dstore | Dstore0 | Dstore1 | Dstore2 | Dstore3 => Double,
            Astore | Astore0 | Astore1 | Astore2 | Astore3 => Reference,

            Iaload | Baload | Caload | Saload | Iastore | Bastore | Castore | Sastore => Int,
            Laload | Lastore => Long,
            Faload | Fastore => Float,
            Daload | Dastore => Double,
            Aaload | Aastore => Reference,

            Iadd | Isub | Imul | Idiv | Irem | Ineg | Ishl | Ishr | Iushr | Iand | Ior | Ixor => Int,
            Ladd | Lsub | Lmul | Ldiv | Lrem | Lneg | Lshl | Lshr | Lushr | Land | Lor | Lxor => Long,
            Fadd | Fsub | Fmul | Fdiv | Frem | Fneg => Float,
            Dadd | Dsub | Dmul | Ddiv | Drem | Dneg => Double,
            Lcmp | Fcmpl | Fcmpg | Dcmpl | Dcmpg | Arraylength => Int,

            I2l | F2l | D2l => Long,
            I2f | L2f | D2f => Float,
            I2d | L2d | F2d => Double,
            L2i | F2i | D2i | I2b | I2c | I2s => Int,

            Ireturn => Int,
            Lreturn => Long,
            Freturn => Float,
            Dreturn => Double,
            Areturn => Reference,
            Return => Void,

            _ => return None,
        };
        Some(kind)
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.to_byte() == byte)
            .ok_or_else(|| Error::invalid_opcode(format!("0x{:02x}", byte), "supported"))
    }
}

impl FromStr for Opcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Opcode::from_mnemonic(s).ok_or_else(|| Error::invalid_opcode(s, "known"))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
