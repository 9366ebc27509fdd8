//! Field and method descriptors, reduced to the operand kinds they move

use std::fmt;
use std::str::FromStr;

use crate::codegen::type_kind::OperandKind;
use crate::error::{Error, Result};

/// Parse one field type at the start of `desc`, returning its kind and byte length.
pub(crate) fn parse_field_type(desc: &str) -> std::result::Result<(OperandKind, usize), String> {
    let bytes = desc.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() && bytes[pos] == b'[' {
        pos += 1;
    }
    if pos > 255 {
        return Err("array type has more than 255 dimensions".to_string());
    }
    let Some(&lead) = bytes.get(pos) else {
        return Err("unexpected end of descriptor".to_string());
    };
    match lead {
        b'L' => {
            let end = desc[pos..]
                .find(';')
                .ok_or_else(|| "unterminated class type".to_string())?;
            if end == 1 {
                return Err("empty class name".to_string());
            }
            Ok((OperandKind::Reference, pos + end + 1))
        }
        b'V' if pos > 0 => Err("array of void".to_string()),
        _ => {
            let kind = OperandKind::from_descriptor_char(lead as char)
                .ok_or_else(|| format!("unknown type character '{}'", lead as char))?;
            if pos > 0 {
                Ok((OperandKind::Reference, pos + 1))
            } else {
                Ok((kind, 1))
            }
        }
    }
}

/// A parsed field descriptor such as `Ljava/io/PrintStream;`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    raw: String,
    kind: OperandKind,
}

impl FieldDescriptor {
    pub fn parse(desc: &str) -> Result<Self> {
        let (kind, len) =
            parse_field_type(desc).map_err(|message| Error::descriptor_error(desc, message))?;
        if len != desc.len() {
            return Err(Error::descriptor_error(desc, "trailing characters after field type"));
        }
        if kind == OperandKind::Void {
            return Err(Error::descriptor_error(desc, "field cannot be void"));
        }
        Ok(Self { raw: desc.to_string(), kind })
    }

    pub fn kind(&self) -> OperandKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for FieldDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A parsed method descriptor such as `(ILjava/lang/String;)J`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    raw: String,
    params: Vec<OperandKind>,
    ret: OperandKind,
}

impl MethodDescriptor {
    pub fn parse(desc: &str) -> Result<Self> {
        let err = |message: &str| Error::descriptor_error(desc, message);
        let body = desc.strip_prefix('(').ok_or_else(|| err("expected '('"))?;
        let close = body.find(')').ok_or_else(|| err("expected ')'"))?;

        let mut params = Vec::new();
        let mut rest = &body[..close];
        while !rest.is_empty() {
            let (kind, len) = parse_field_type(rest).map_err(|m| err(&m))?;
            if kind == OperandKind::Void {
                return Err(err("parameter cannot be void"));
            }
            params.push(kind);
            rest = &rest[len..];
        }

        let ret_desc = &body[close + 1..];
        let (ret, len) = parse_field_type(ret_desc).map_err(|m| err(&m))?;
        if len != ret_desc.len() {
            return Err(err("trailing characters after return type"));
        }

        Ok(Self { raw: desc.to_string(), params, ret })
    }

    /// Parameter kinds, first declared parameter first
    pub fn params(&self) -> &[OperandKind] {
        &self.params
    }

    pub fn return_kind(&self) -> OperandKind {
        self.ret
    }

    /// Total argument slots, not counting a receiver
    pub fn param_slots(&self) -> usize {
        self.params.iter().map(|k| k.slot_size()).sum()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for MethodDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
