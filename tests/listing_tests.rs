mod common;

use std::io::Write;

use codetrans::codegen::{
    apply_transform, transforming, CodeBuffer, CodeBuilder, CodeElement, CodeRelabeler, ConstantValue, Opcode,
};
use codetrans::parser::{parse_listing, parse_listing_file, ListingPrinter};
use codetrans::Error;
use common::parse;
use tempfile::NamedTempFile;

const LOOP: &str = concat!(
    "    .catch L0 L1 L2 java/io/IOException\n",
    "\
L0:
    .line 12
    iconst_0
    istore_1
L3:
    iload_1
    bipush 10
    if_icmpge L1
    aload_0
    iload_1
    invokevirtual Worker/step (I)V
    iinc 1 1
    goto L3
L1:
    return
L2:
    astore_2
    getstatic java/lang/System/err Ljava/io/PrintStream;
    aload_2
    invokevirtual java/io/IOException/getMessage ()Ljava/lang/String;
    invokevirtual java/io/PrintStream/println (Ljava/lang/String;)V
    return
"
);

#[test]
fn canonical_listing_prints_back_unchanged() {
    let elements = parse(LOOP);
    assert_eq!(ListingPrinter::render(&elements), LOOP);
}

#[test]
fn constants_survive_printing() {
    let source = "    aconst_null
    iconst_m1
    sipush -300
    ldc 2.5f
    ldc \"tab\\there\"
    ldc java/lang/String
    ldc2_w 7L
    ldc2_w 0.125
    lconst_1
    dconst_0
";
    let elements = parse(source);
    assert_eq!(ListingPrinter::render(&elements), source);
}

#[test]
fn non_finite_constants_survive_printing() {
    let elements = vec![
        CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::Float(f32::NAN) },
        CodeElement::Constant { opcode: Opcode::Ldc, value: ConstantValue::Float(f32::NEG_INFINITY) },
        CodeElement::Constant { opcode: Opcode::Ldc2W, value: ConstantValue::Double(f64::INFINITY) },
        CodeElement::Constant { opcode: Opcode::Ldc2W, value: ConstantValue::Double(f64::NAN) },
    ];
    let printed = ListingPrinter::render(&elements);
    let reparsed = parse(&printed);

    assert!(matches!(&reparsed[0], CodeElement::Constant { value: ConstantValue::Float(v), .. } if v.is_nan()));
    assert_eq!(reparsed[1], elements[1]);
    assert_eq!(reparsed[2], elements[2]);
    assert!(matches!(&reparsed[3], CodeElement::Constant { value: ConstantValue::Double(v), .. } if v.is_nan()));
    assert_eq!(ListingPrinter::render(&reparsed), printed);
}

#[test]
fn parse_listing_file_reads_from_disk() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    write!(file, "{}", LOOP).expect("Failed to write listing");

    let mut buffer = CodeBuffer::new();
    let elements = parse_listing_file(file.path(), &mut buffer).expect("Failed to parse file");
    assert_eq!(elements.len(), parse(LOOP).len());
    assert_eq!(ListingPrinter::render(&elements), LOOP);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let result = parse_listing_file(dir.path().join("absent.jasm"), &mut CodeBuffer::new());
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn errors_carry_positions() {
    let mut buffer = CodeBuffer::new();
    match parse_listing("    iconst_1\n    frobnicate 3\n", &mut buffer) {
        Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
    match parse_listing("    iload\n", &mut buffer) {
        Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(parse_listing("    ldc \"open\n", &mut buffer).is_err());
}

#[test]
fn printer_as_transform_sink() {
    let block = parse(LOOP);
    let mut printer = ListingPrinter::new();
    for _ in 0..2 {
        let mut relabeler = CodeRelabeler::new();
        transforming(&mut printer, &mut relabeler, |b: &mut dyn CodeBuilder| b.emit_all(block.clone()));
    }
    let text = printer.finish();

    let mut buffer = CodeBuffer::new();
    let reparsed = parse_listing(&text, &mut buffer).expect("Failed to reparse injected listing");
    assert_eq!(reparsed.len(), 2 * block.len());
    let bound = reparsed.iter().filter(|e| matches!(e, CodeElement::LabelTarget(_))).count();
    assert_eq!(bound, 8);
}

#[test]
fn relabeled_listing_prints_identically() {
    let input = parse(LOOP);
    let output = apply_transform(&mut CodeRelabeler::new(), input);
    assert_eq!(ListingPrinter::render(&output), LOOP);
}
