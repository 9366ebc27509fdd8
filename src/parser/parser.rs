//! Parser implementation for assembly listings
//!
//! A listing has one element per line: a label binding (`name:`), an instruction
//! (`mnemonic operands...`) or a directive (`.catch`, `.line`, ...). Label names
//! are resolved to [`Label`]s allocated through the supplied code builder, one
//! label per distinct name.

use std::collections::HashMap;
use std::str::FromStr;

use log::debug;

use super::error::ParseError;
use super::lexer::{Lexer, LexicalToken, Token};
use super::span::Location;
use crate::codegen::builder::CodeBuilder;
use crate::codegen::element::{CodeElement, ConstantValue, PrimitiveArrayType, SwitchCase};
use crate::codegen::label::Label;
use crate::codegen::opcode_enum::{Opcode, OpcodeKind};
use crate::error::Result;

/// Parser for assembly listings
pub struct Parser<'b> {
    tokens: Vec<LexicalToken>,
    current: usize,
    builder: &'b mut dyn CodeBuilder,
    labels: HashMap<String, Label>,
}

impl<'b> Parser<'b> {
    /// Create a new parser from listing source
    pub fn new(source: &str, builder: &'b mut dyn CodeBuilder) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            current: 0,
            builder,
            labels: HashMap::new(),
        })
    }

    /// Parse every line into its element
    pub fn parse(&mut self) -> Result<Vec<CodeElement>> {
        let mut elements = Vec::new();
        while !self.is_at_end() {
            if self.match_token(&Token::Newline) {
                continue;
            }
            elements.push(self.parse_line()?);
            self.end_line()?;
        }
        debug!("parsed {} elements, {} labels", elements.len(), self.labels.len());
        Ok(elements)
    }

    /// Labels allocated so far, by listing name
    pub fn labels(&self) -> &HashMap<String, Label> {
        &self.labels
    }

    // Helper methods
    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&LexicalToken> {
        self.tokens.get(self.current)
    }

    fn check(&self, token_type: &Token) -> bool {
        self.peek().map_or(false, |token| token.is(token_type))
    }

    fn match_token(&mut self, token_type: &Token) -> bool {
        if self.check(token_type) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn here(&self) -> Location {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|token| token.location)
            .unwrap_or_default()
    }

    /// Next token on the current line
    fn next_operand(&mut self, expected: &str) -> Result<LexicalToken> {
        match self.peek() {
            Some(token) if !token.is(&Token::Newline) => {
                let token = token.clone();
                self.current += 1;
                Ok(token)
            }
            _ => Err(ParseError::unexpected_end_of_line(expected, self.here()).into()),
        }
    }

    fn expect(&mut self, token_type: &Token, expected: &str) -> Result<LexicalToken> {
        let token = self.next_operand(expected)?;
        if token.is(token_type) {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(expected, &token.lexeme, token.location).into())
        }
    }

    fn end_line(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(token) if token.is(&Token::Newline) => {
                self.current += 1;
                Ok(())
            }
            Some(token) => Err(ParseError::unexpected_token("end of line", &token.lexeme, token.location).into()),
        }
    }

    fn word(&mut self, expected: &str) -> Result<String> {
        Ok(self.expect(&Token::Word, expected)?.lexeme)
    }

    fn integer<T: TryFrom<i64>>(&mut self, expected: &str) -> Result<T> {
        let token = self.expect(&Token::IntegerLiteral, expected)?;
        let value: i64 = number(&token, &token.lexeme)?;
        T::try_from(value).map_err(|_| {
            ParseError::invalid_syntax(format!("{} {} is out of range", expected, value), token.location).into()
        })
    }

    fn label_named(&mut self, name: &str) -> Label {
        if let Some(&label) = self.labels.get(name) {
            return label;
        }
        let label = self.builder.new_label();
        self.labels.insert(name.to_string(), label);
        label
    }

    fn label_operand(&mut self, expected: &str) -> Result<Label> {
        let name = self.word(expected)?;
        Ok(self.label_named(&name))
    }

    /// `owner/name` of a field or method reference
    fn member_ref(&mut self) -> Result<(String, String)> {
        let token = self.expect(&Token::Word, "member reference")?;
        match token.lexeme.rsplit_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner.to_string(), name.to_string())),
            _ => Err(ParseError::invalid_syntax(
                format!("member reference '{}' is not of the form owner/name", token.lexeme),
                token.location,
            )
            .into()),
        }
    }

    fn parse_line(&mut self) -> Result<CodeElement> {
        let token = self.next_operand("instruction")?;
        match token.token {
            Token::Directive => self.parse_directive(&token),
            Token::Word if self.check(&Token::Colon) => {
                self.current += 1;
                Ok(CodeElement::LabelTarget(self.label_named(&token.lexeme)))
            }
            Token::Word => self.parse_instruction(&token),
            _ => Err(ParseError::unexpected_token("instruction, directive or label", &token.lexeme, token.location).into()),
        }
    }

    fn parse_instruction(&mut self, token: &LexicalToken) -> Result<CodeElement> {
        let opcode = Opcode::from_mnemonic(&token.lexeme).ok_or_else(|| {
            ParseError::invalid_syntax(format!("unknown instruction '{}'", token.lexeme), token.location)
        })?;

        let element = match opcode.kind() {
            OpcodeKind::Nop => CodeElement::Nop,
            OpcodeKind::Constant => self.parse_constant(opcode)?,
            OpcodeKind::Load => {
                let slot = self.slot_operand(opcode)?;
                CodeElement::load(opcode, slot)?
            }
            OpcodeKind::Store => {
                let slot = self.slot_operand(opcode)?;
                CodeElement::store(opcode, slot)?
            }
            OpcodeKind::Increment => CodeElement::Increment {
                slot: self.integer("local slot")?,
                constant: self.integer("increment")?,
            },
            OpcodeKind::ArrayLoad => CodeElement::array_load(opcode)?,
            OpcodeKind::ArrayStore => CodeElement::array_store(opcode)?,
            OpcodeKind::Stack => CodeElement::stack(opcode)?,
            OpcodeKind::Operator => CodeElement::operator(opcode)?,
            OpcodeKind::Convert => CodeElement::convert(opcode)?,
            OpcodeKind::Branch => {
                let target = self.label_operand("branch target")?;
                CodeElement::branch(opcode, target)?
            }
            OpcodeKind::TableSwitch => self.parse_table_switch()?,
            OpcodeKind::LookupSwitch => self.parse_lookup_switch()?,
            OpcodeKind::Return => CodeElement::return_(opcode)?,
            OpcodeKind::Field => {
                let (owner, name) = self.member_ref()?;
                let descriptor = self.word("field descriptor")?;
                CodeElement::field(opcode, owner, name, &descriptor)?
            }
            OpcodeKind::Invoke => {
                let (owner, name) = self.member_ref()?;
                let descriptor = self.word("method descriptor")?;
                CodeElement::invoke(opcode, owner, name, &descriptor)?
            }
            OpcodeKind::InvokeDynamic => {
                let name = self.word("call site name")?;
                let descriptor = self.word("method descriptor")?;
                CodeElement::invoke_dynamic(name, &descriptor)?
            }
            OpcodeKind::NewObject => CodeElement::NewObject {
                class: self.word("class name")?,
            },
            OpcodeKind::NewPrimitiveArray => {
                let ty = self.expect(&Token::Word, "primitive type")?;
                let array_type = PrimitiveArrayType::from_name(&ty.lexeme).ok_or_else(|| {
                    ParseError::unexpected_token("primitive type", &ty.lexeme, ty.location)
                })?;
                CodeElement::NewPrimitiveArray(array_type)
            }
            OpcodeKind::NewReferenceArray => CodeElement::NewReferenceArray {
                component: self.word("component class")?,
            },
            OpcodeKind::NewMultiArray => {
                let array_type = self.word("array type")?;
                let location = self.here();
                let dimensions: u8 = self.integer("dimensions")?;
                if dimensions == 0 {
                    return Err(ParseError::invalid_syntax("multianewarray needs at least one dimension", location).into());
                }
                CodeElement::NewMultiArray { array_type, dimensions }
            }
            OpcodeKind::Throw => CodeElement::Throw,
            OpcodeKind::TypeCheck => {
                let class = self.word("class name")?;
                CodeElement::type_check(opcode, class)?
            }
            OpcodeKind::Monitor => CodeElement::monitor(opcode)?,
        };
        Ok(element)
    }

    fn slot_operand(&mut self, opcode: Opcode) -> Result<u16> {
        match opcode.implicit_slot() {
            Some(slot) => Ok(slot),
            None => self.integer("local slot"),
        }
    }

    fn parse_constant(&mut self, opcode: Opcode) -> Result<CodeElement> {
        match opcode {
            Opcode::Bipush | Opcode::Sipush => {
                let value = self.integer("integer constant")?;
                CodeElement::constant(opcode, ConstantValue::Int(value))
            }
            Opcode::Ldc | Opcode::LdcW | Opcode::Ldc2W => {
                let value = self.constant_value(opcode == Opcode::Ldc2W)?;
                CodeElement::constant(opcode, value)
            }
            _ => CodeElement::intrinsic_constant(opcode),
        }
    }

    /// Operand of `ldc`; a bare integer is a `long` for the two-slot form.
    /// `NaN` and `Infinity` spellings parse through `f32`/`f64` `FromStr`.
    fn constant_value(&mut self, wide: bool) -> Result<ConstantValue> {
        let token = self.next_operand("constant")?;
        let text = token.lexeme.as_str();
        let value = match token.token {
            Token::IntegerLiteral if wide => ConstantValue::Long(number(&token, text)?),
            Token::IntegerLiteral => ConstantValue::Int(number(&token, text)?),
            Token::LongLiteral => ConstantValue::Long(number(&token, &text[..text.len() - 1])?),
            Token::FloatLiteral => ConstantValue::Float(number(&token, &text[..text.len() - 1])?),
            Token::DoubleLiteral => {
                ConstantValue::Double(number(&token, text.trim_end_matches(|c| c == 'd' || c == 'D'))?)
            }
            Token::StringLiteral => ConstantValue::String(unescape(&token)?),
            Token::Word => ConstantValue::Class(token.lexeme.clone()),
            _ => return Err(ParseError::unexpected_token("constant", text, token.location).into()),
        };
        Ok(value)
    }

    /// `tableswitch low T0 T1 ... default D`
    fn parse_table_switch(&mut self) -> Result<CodeElement> {
        let location = self.here();
        let low: i32 = self.integer("low index")?;
        let mut targets = Vec::new();
        loop {
            let name = self.word("case target or 'default'")?;
            if name == "default" {
                break;
            }
            targets.push(self.label_named(&name));
        }
        let default_target = self.label_operand("default target")?;

        let high = i32::try_from(targets.len())
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|n| low.checked_add(n))
            .ok_or_else(|| ParseError::invalid_syntax("tableswitch needs between one and i32::MAX cases", location))?;
        let cases = (low..=high)
            .zip(targets)
            .map(|(value, target)| SwitchCase::new(value, target))
            .collect();
        CodeElement::table_switch(low, high, default_target, cases)
    }

    /// `lookupswitch V0 T0 V1 T1 ... default D`
    fn parse_lookup_switch(&mut self) -> Result<CodeElement> {
        let mut cases = Vec::new();
        loop {
            let token = self.next_operand("case value or 'default'")?;
            match token.token {
                Token::Word if token.lexeme == "default" => break,
                Token::IntegerLiteral => {
                    let value = number(&token, &token.lexeme)?;
                    let target = self.label_operand("case target")?;
                    cases.push(SwitchCase::new(value, target));
                }
                _ => {
                    return Err(ParseError::unexpected_token("case value or 'default'", &token.lexeme, token.location).into())
                }
            }
        }
        let default_target = self.label_operand("default target")?;
        Ok(CodeElement::lookup_switch(default_target, cases))
    }

    fn parse_directive(&mut self, token: &LexicalToken) -> Result<CodeElement> {
        let element = match token.lexeme.as_str() {
            ".catch" => {
                let try_start = self.label_operand("try start")?;
                let try_end = self.label_operand("try end")?;
                let handler = self.label_operand("handler")?;
                let catch_type = self.word("catch type or 'any'")?;
                CodeElement::ExceptionCatch {
                    try_start,
                    try_end,
                    handler,
                    catch_type: if catch_type == "any" { None } else { Some(catch_type) },
                }
            }
            ".line" => CodeElement::LineNumber(self.integer("line number")?),
            ".var" => CodeElement::LocalVariable {
                slot: self.integer("local slot")?,
                name: self.word("variable name")?,
                descriptor: self.word("field descriptor")?,
                start: self.label_operand("scope start")?,
                end: self.label_operand("scope end")?,
            },
            ".vartype" => CodeElement::LocalVariableType {
                slot: self.integer("local slot")?,
                name: self.word("variable name")?,
                signature: self.word("signature")?,
                start: self.label_operand("scope start")?,
                end: self.label_operand("scope end")?,
            },
            ".range" => CodeElement::CharacterRange {
                start: self.label_operand("range start label")?,
                end: self.label_operand("range end label")?,
                range_start: self.integer("range start")?,
                range_end: self.integer("range end")?,
                flags: self.integer("flags")?,
            },
            ".attribute" => {
                let name = self.word("attribute name")?;
                let data = self.expect(&Token::StringLiteral, "hex data")?;
                let hex = unescape(&data)?;
                CodeElement::Attribute {
                    name,
                    data: decode_hex(&hex).ok_or_else(|| {
                        ParseError::invalid_syntax(format!("'{}' is not hex data", hex), data.location)
                    })?,
                }
            }
            other => {
                return Err(ParseError::invalid_syntax(format!("unknown directive '{}'", other), token.location).into())
            }
        };
        Ok(element)
    }
}

fn number<N: FromStr>(token: &LexicalToken, text: &str) -> Result<N> {
    text.parse().map_err(|_| {
        ParseError::invalid_syntax(format!("'{}' is not a valid number here", token.lexeme), token.location).into()
    })
}

/// Strip the quotes of a string literal and resolve its escapes
fn unescape(token: &LexicalToken) -> Result<String> {
    let body = &token.lexeme[1..token.lexeme.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('\\') => '\\',
            Some('"') => '"',
            Some(other) => {
                return Err(ParseError::invalid_syntax(format!("unknown escape '\\{}'", other), token.location).into())
            }
            None => return Err(ParseError::invalid_syntax("dangling escape", token.location).into()),
        };
        out.push(escaped);
    }
    Ok(out)
}

fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Parse listing source, allocating its labels through `builder`
pub fn parse(source: &str, builder: &mut dyn CodeBuilder) -> Result<Vec<CodeElement>> {
    Parser::new(source, builder)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::builder::CodeBuffer;
    use crate::error::Error;

    fn parse_one(source: &str) -> CodeElement {
        let mut buffer = CodeBuffer::new();
        let mut elements = parse(source, &mut buffer).expect("Failed to parse");
        assert_eq!(elements.len(), 1, "{:?}", elements);
        elements.remove(0)
    }

    #[test]
    fn test_parse_short_forms_and_operands() {
        assert_eq!(parse_one("iload_2"), CodeElement::Load { opcode: Opcode::Iload2, slot: 2 });
        assert_eq!(parse_one("astore 7"), CodeElement::Store { opcode: Opcode::Astore, slot: 7 });
        assert_eq!(parse_one("iinc 1 -1"), CodeElement::Increment { slot: 1, constant: -1 });
        assert_eq!(
            parse_one("ldc2_w 5"),
            CodeElement::Constant { opcode: Opcode::Ldc2W, value: ConstantValue::Long(5) }
        );
        assert_eq!(
            parse_one(r#"ldc "a\tb""#),
            CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::String("a\tb".into()) }
        );
    }

    #[test]
    fn test_labels_are_shared_by_name() {
        let mut buffer = CodeBuffer::new();
        let elements = parse("Ltop:\n  goto Ltop\n", &mut buffer).expect("Failed to parse");
        match (&elements[0], &elements[1]) {
            (CodeElement::LabelTarget(a), CodeElement::Branch { target: b, .. }) => assert_eq!(a, b),
            other => panic!("unexpected elements {:?}", other),
        }
    }

    #[test]
    fn test_table_switch_is_dense_from_low() {
        let mut buffer = CodeBuffer::new();
        let mut parser = Parser::new("tableswitch 3 La Lb default Lc", &mut buffer).expect("Failed to lex");
        let elements = parser.parse().expect("Failed to parse");
        let labels = parser.labels();
        assert_eq!(
            elements,
            vec![CodeElement::TableSwitch {
                low: 3,
                high: 4,
                default_target: labels["Lc"],
                cases: vec![SwitchCase::new(3, labels["La"]), SwitchCase::new(4, labels["Lb"])],
            }]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        let mut buffer = CodeBuffer::new();
        match parse("nop\n  frobnicate", &mut buffer) {
            Err(Error::Parse { line, column, .. }) => assert_eq!((line, column), (2, 3)),
            other => panic!("expected parse error, got {:?}", other),
        }
        match parse("nop nop", &mut buffer) {
            Err(Error::Parse { line, column, .. }) => assert_eq!((line, column), (1, 5)),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert!(matches!(parse("bipush", &mut buffer), Err(Error::Parse { .. })));
        assert!(matches!(parse("bipush 1000", &mut buffer), Err(Error::InvalidOpcode { .. })));
        assert!(matches!(parse("getstatic A/f Q", &mut buffer), Err(Error::Descriptor { .. })));
    }
}
