//! Renders element streams as listing text that [`parse`](super::parser::parse) reads back

use std::collections::HashMap;
use std::fmt::Write;

use crate::codegen::builder::CodeBuilder;
use crate::codegen::element::{CodeElement, ConstantValue};
use crate::codegen::label::Label;
use crate::codegen::opcode_enum::Opcode;

/// Listing writer; also a [`CodeBuilder`], so a transform can emit straight into it.
///
/// Labels are named `L0`, `L1`, ... in order of first appearance.
#[derive(Debug, Default)]
pub struct ListingPrinter {
    output: String,
    names: HashMap<Label, String>,
}

impl ListingPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `elements` with a fresh label naming
    pub fn render(elements: &[CodeElement]) -> String {
        let mut printer = Self::new();
        for element in elements {
            printer.print(element);
        }
        printer.finish()
    }

    pub fn label_name(&mut self, label: Label) -> String {
        let next = self.names.len();
        self.names
            .entry(label)
            .or_insert_with(|| format!("L{}", next))
            .clone()
    }

    /// Append one element as a line
    pub fn print(&mut self, element: &CodeElement) {
        let line = self.format_element(element);
        self.output.push_str(&line);
        self.output.push('\n');
    }

    pub fn as_str(&self) -> &str {
        &self.output
    }

    pub fn finish(self) -> String {
        self.output
    }

    /// One listing line, without the trailing newline
    pub fn format_element(&mut self, element: &CodeElement) -> String {
        if let CodeElement::LabelTarget(label) = element {
            return format!("{}:", self.label_name(*label));
        }
        format!("    {}", self.format_body(element))
    }

    fn format_body(&mut self, element: &CodeElement) -> String {
        match element {
            CodeElement::Nop => "nop".to_string(),
            CodeElement::Constant { opcode, value } => match opcode {
                Opcode::Bipush | Opcode::Sipush | Opcode::Ldc | Opcode::LdcW | Opcode::Ldc2W => {
                    format!("{} {}", opcode, format_constant(value))
                }
                _ => opcode.to_string(),
            },
            CodeElement::Load { opcode, slot } | CodeElement::Store { opcode, slot } => {
                if opcode.implicit_slot().is_some() {
                    opcode.to_string()
                } else {
                    format!("{} {}", opcode, slot)
                }
            }
            CodeElement::Increment { slot, constant } => format!("iinc {} {}", slot, constant),
            CodeElement::ArrayLoad(opcode)
            | CodeElement::ArrayStore(opcode)
            | CodeElement::Stack(opcode)
            | CodeElement::Operator(opcode)
            | CodeElement::Convert(opcode)
            | CodeElement::Return(opcode)
            | CodeElement::Monitor(opcode) => opcode.to_string(),
            CodeElement::Branch { opcode, target } => format!("{} {}", opcode, self.label_name(*target)),
            CodeElement::TableSwitch { low, high, default_target, cases } => {
                let mut line = format!("tableswitch {}", low);
                for value in *low..=*high {
                    let target = cases
                        .iter()
                        .find(|case| case.value == value)
                        .map_or(*default_target, |case| case.target);
                    let _ = write!(line, " {}", self.label_name(target));
                }
                let _ = write!(line, " default {}", self.label_name(*default_target));
                line
            }
            CodeElement::LookupSwitch { default_target, cases } => {
                let mut line = "lookupswitch".to_string();
                for case in cases {
                    let _ = write!(line, " {} {}", case.value, self.label_name(case.target));
                }
                let _ = write!(line, " default {}", self.label_name(*default_target));
                line
            }
            CodeElement::Field { opcode, owner, name, descriptor } => {
                format!("{} {}/{} {}", opcode, owner, name, descriptor)
            }
            CodeElement::Invoke { opcode, owner, name, descriptor } => {
                format!("{} {}/{} {}", opcode, owner, name, descriptor)
            }
            CodeElement::InvokeDynamic { name, descriptor } => format!("invokedynamic {} {}", name, descriptor),
            CodeElement::NewObject { class } => format!("new {}", class),
            CodeElement::NewPrimitiveArray(array_type) => format!("newarray {}", array_type.name()),
            CodeElement::NewReferenceArray { component } => format!("anewarray {}", component),
            CodeElement::NewMultiArray { array_type, dimensions } => {
                format!("multianewarray {} {}", array_type, dimensions)
            }
            CodeElement::Throw => "athrow".to_string(),
            CodeElement::TypeCheck { opcode, class } => format!("{} {}", opcode, class),

            CodeElement::LabelTarget(label) => format!("{}:", self.label_name(*label)),
            CodeElement::ExceptionCatch { try_start, try_end, handler, catch_type } => format!(
                ".catch {} {} {} {}",
                self.label_name(*try_start),
                self.label_name(*try_end),
                self.label_name(*handler),
                catch_type.as_deref().unwrap_or("any")
            ),
            CodeElement::LocalVariable { slot, name, descriptor, start, end } => format!(
                ".var {} {} {} {} {}",
                slot,
                name,
                descriptor,
                self.label_name(*start),
                self.label_name(*end)
            ),
            CodeElement::LocalVariableType { slot, name, signature, start, end } => format!(
                ".vartype {} {} {} {} {}",
                slot,
                name,
                signature,
                self.label_name(*start),
                self.label_name(*end)
            ),
            CodeElement::CharacterRange { start, end, range_start, range_end, flags } => format!(
                ".range {} {} {} {} {}",
                self.label_name(*start),
                self.label_name(*end),
                range_start,
                range_end,
                flags
            ),
            CodeElement::LineNumber(line) => format!(".line {}", line),
            CodeElement::Attribute { name, data } => {
                let hex: String = data.iter().map(|byte| format!("{:02x}", byte)).collect();
                format!(".attribute {} \"{}\"", name, hex)
            }
        }
    }
}

impl CodeBuilder for ListingPrinter {
    fn with(&mut self, element: CodeElement) {
        self.print(&element);
    }
}

fn format_constant(value: &ConstantValue) -> String {
    match value {
        ConstantValue::Null => "null".to_string(),
        ConstantValue::Int(v) => v.to_string(),
        ConstantValue::Long(v) => format!("{}L", v),
        ConstantValue::Float(v) if !v.is_finite() => format!("{}f", non_finite(f64::from(*v))),
        ConstantValue::Float(v) => format!("{:?}f", v),
        ConstantValue::Double(v) if !v.is_finite() => format!("{}d", non_finite(*v)),
        ConstantValue::Double(v) => {
            let text = format!("{:?}", v);
            if text.contains('.') {
                text
            } else {
                text + "d"
            }
        }
        ConstantValue::String(s) => quote(s),
        ConstantValue::Class(name) => name.clone(),
    }
}

/// `NaN`, `Infinity` or `-Infinity`, the spellings the lexer reads back
fn non_finite(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::element::SwitchCase;

    #[test]
    fn test_labels_named_in_first_appearance_order() {
        let (a, b) = (Label::fresh(), Label::fresh());
        let text = ListingPrinter::render(&[
            CodeElement::Branch { opcode: Opcode::Ifeq, target: b },
            CodeElement::LabelTarget(a),
            CodeElement::LabelTarget(b),
        ]);
        assert_eq!(text, "    ifeq L0\nL1:\nL0:\n");
    }

    #[test]
    fn test_sparse_table_switch_fills_default() {
        let (d, x) = (Label::fresh(), Label::fresh());
        let sw = CodeElement::table_switch(0, 2, d, vec![SwitchCase::new(1, x)]).expect("valid switch");
        assert_eq!(ListingPrinter::render(&[sw]), "    tableswitch 0 L0 L1 L0 default L0\n");
    }

    #[test]
    fn test_constants() {
        let text = ListingPrinter::render(&[
            CodeElement::Constant { opcode: Opcode::Iconst2, value: ConstantValue::Int(2) },
            CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::Float(1.0) },
            CodeElement::Constant { opcode: Opcode::Ldc2W, value: ConstantValue::Double(1e300) },
            CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::String("say \"hi\"".into()) },
        ]);
        assert_eq!(text, "    iconst_2\n    ldc 1.0f\n    ldc2_w 1e300d\n    ldc \"say \\\"hi\\\"\"\n");
    }

    #[test]
    fn test_non_finite_constants() {
        let text = ListingPrinter::render(&[
            CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::Float(f32::NAN) },
            CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::Float(f32::NEG_INFINITY) },
            CodeElement::Constant { opcode: Opcode::Ldc2W, value: ConstantValue::Double(f64::INFINITY) },
        ]);
        assert_eq!(text, "    ldc NaNf\n    ldc -Infinityf\n    ldc2_w Infinityd\n");
    }
}
