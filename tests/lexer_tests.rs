use codetrans::parser::lexer::Token;
use codetrans::parser::{Lexer, Location};

#[test]
fn lexer_mnemonics_and_references() {
    let source = "invokespecial java/lang/Object/<init> ()V";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    assert_eq!(tokens.len(), 3);
    assert!(tokens.iter().all(|t| t.is(&Token::Word)));
    assert_eq!(tokens[1].lexeme(), "java/lang/Object/<init>");
    assert_eq!(tokens[2].lexeme(), "()V");
}

#[test]
fn lexer_descriptors_stay_whole() {
    let source = "anewarray [Ljava/lang/String;\n.vartype 1 xs Ljava/util/List<TT;>; L0 L1";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    assert_eq!(tokens.len(), 9);
    assert_eq!(tokens[1].lexeme(), "[Ljava/lang/String;");
    assert!(tokens[2].is(&Token::Newline));
    assert!(tokens[3].is(&Token::Directive));
    assert!(tokens[4].is(&Token::IntegerLiteral));
    assert_eq!(tokens[6].lexeme(), "Ljava/util/List<TT;>;");
}

#[test]
fn lexer_switch_line() {
    let source = "lookupswitch -1 Lneg 0 Lzero default Lother";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    let kinds: Vec<&Token> = tokens.iter().map(|t| t.token_type()).collect();
    assert_eq!(
        kinds,
        vec![
            &Token::Word,
            &Token::IntegerLiteral,
            &Token::Word,
            &Token::IntegerLiteral,
            &Token::Word,
            &Token::Word,
            &Token::Word,
        ]
    );
    assert_eq!(tokens[1].lexeme(), "-1");
}

#[test]
fn lexer_numeric_suffixes() {
    let source = "-9L 0.5F 1.0e10 2D -3.25";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    assert!(tokens[0].is(&Token::LongLiteral));
    assert!(tokens[1].is(&Token::FloatLiteral));
    assert!(tokens[2].is(&Token::DoubleLiteral));
    assert!(tokens[3].is(&Token::DoubleLiteral));
    assert!(tokens[4].is(&Token::DoubleLiteral));
    assert!(tokens.iter().all(|t| t.token_type().is_literal()));
}

#[test]
fn lexer_non_finite_literals() {
    let source = "NaNf -Infinityf Infinityd NaNd NaNfield";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    assert!(tokens[0].is(&Token::FloatLiteral));
    assert!(tokens[1].is(&Token::FloatLiteral));
    assert!(tokens[2].is(&Token::DoubleLiteral));
    assert!(tokens[3].is(&Token::DoubleLiteral));
    assert!(tokens[4].is(&Token::Word));
}

#[test]
fn lexer_windows_line_endings() {
    let source = "nop\r\nL1:\r\n    return\r\n";
    let lexer = Lexer::new(source);
    let tokens = lexer.tokenize().expect("Failed to tokenize");

    assert_eq!(tokens.len(), 7);
    assert!(tokens[1].is(&Token::Newline));
    assert_eq!(tokens[2].location(), Location::new(2, 1, 5));
    assert_eq!(tokens[5].location().line, 3);
}

#[test]
fn lexer_iterator_keeps_trivia() {
    let lexer = Lexer::new("nop # done");
    let tokens: Vec<Token> = lexer.map(|t| t.expect("Failed to lex").token).collect();
    assert_eq!(tokens, vec![Token::Word, Token::Whitespace, Token::HashComment]);
}
