use basalt_common::diagnostics::{
    Diagnostic, DiagnosticConsumer, DiagnosticKind, NullDiagnosticConsumer,
};
use basalt_common::source::SourceBuffer;
use basalt_lexer::{Token, TokenKind, TokenizedBuffer};
use num_bigint::BigUint;
use serde::Serialize;

/// A human-readable representation of a token for comparisons.
#[derive(Serialize, Debug, PartialEq)]
struct TokenSnapshot {
    kind: String,
    line: usize,
    column: usize,
    indent: usize,
    text: String,
}

#[derive(Default)]
struct CollectingConsumer {
    collected: Vec<Diagnostic>,
}

impl DiagnosticConsumer for CollectingConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.collected.push(diagnostic);
    }
}

fn lex_snapshot(source_text: &str) -> Vec<TokenSnapshot> {
    let source = SourceBuffer::from_text("test.bas", source_text.to_string());
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    buffer
        .tokens()
        .map(|token| TokenSnapshot {
            kind: buffer.kind(token).name().to_string(),
            line: buffer.token_line_number(token),
            column: buffer.column_number(token),
            indent: buffer.indent_column_number(buffer.line(token)),
            text: buffer.token_text(token).to_string(),
        })
        .collect()
}

fn lex_kinds(source_text: &str) -> (Vec<TokenKind>, Vec<DiagnosticKind>) {
    let source = SourceBuffer::from_text("test.bas", source_text.to_string());
    let mut consumer = CollectingConsumer::default();
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    (
        buffer.tokens().map(|t| buffer.kind(t)).collect(),
        consumer.collected.iter().map(|d| d.kind).collect(),
    )
}

#[test]
fn integer_literals_across_lines() {
    let snapshots = lex_snapshot("12-578\n  1  2");
    let expected = serde_json::json!([
        { "kind": "IntegerLiteral", "line": 1, "column": 1, "indent": 1, "text": "12" },
        { "kind": "Minus", "line": 1, "column": 3, "indent": 1, "text": "-" },
        { "kind": "IntegerLiteral", "line": 1, "column": 4, "indent": 1, "text": "578" },
        { "kind": "IntegerLiteral", "line": 2, "column": 3, "indent": 3, "text": "1" },
        { "kind": "IntegerLiteral", "line": 2, "column": 6, "indent": 3, "text": "2" },
        { "kind": "EndOfFile", "line": 2, "column": 7, "indent": 3, "text": "" },
    ]);
    assert_eq!(serde_json::to_value(&snapshots).unwrap(), expected);

    let source = SourceBuffer::from_text("test.bas", "12-578\n  1  2");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    let values: Vec<BigUint> = buffer
        .tokens()
        .filter(|&t| buffer.kind(t) == TokenKind::IntegerLiteral)
        .map(|t| buffer.integer_literal(t).clone())
        .collect();
    assert_eq!(
        values,
        vec![
            BigUint::from(12u32),
            BigUint::from(578u32),
            BigUint::from(1u32),
            BigUint::from(2u32)
        ]
    );
    assert!(!buffer.has_errors());
}

#[test]
fn nested_groups_match_pairwise() {
    let source = SourceBuffer::from_text("test.bas", "((()()))");
    let mut consumer = CollectingConsumer::default();
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    assert!(consumer.collected.is_empty());
    assert!(!buffer.has_errors());

    let expected_pairs = [(0, 7), (1, 6), (2, 3), (4, 5)];
    for (open, close) in expected_pairs {
        let open = Token::new(open);
        let close = Token::new(close);
        assert_eq!(buffer.matched_closing_token(open), close);
        assert_eq!(buffer.matched_opening_token(close), open);
        assert!(open < close);
        assert!(!buffer.is_recovery_token(open));
        assert!(!buffer.is_recovery_token(close));
    }
}

#[test]
fn bracket_recovery_fabricates_closers() {
    let source = SourceBuffer::from_text("test.bas", ")({)");
    let mut consumer = CollectingConsumer::default();
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let kinds: Vec<TokenKind> = buffer.tokens().map(|t| buffer.kind(t)).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Error,
            TokenKind::OpenParen,
            TokenKind::OpenCurlyBrace,
            TokenKind::CloseCurlyBrace,
            TokenKind::CloseParen,
            TokenKind::EndOfFile,
        ]
    );

    // The lone `)` keeps its source text.
    assert_eq!(buffer.token_text(Token::new(0)), ")");
    // The fabricated `}` is a recovery token linked to its opener.
    assert!(buffer.is_recovery_token(Token::new(3)));
    assert_eq!(buffer.matched_opening_token(Token::new(3)), Token::new(2));
    assert_eq!(buffer.matched_closing_token(Token::new(2)), Token::new(3));
    // The final `)` matches the real opener.
    assert!(!buffer.is_recovery_token(Token::new(4)));
    assert_eq!(buffer.matched_opening_token(Token::new(4)), Token::new(1));

    let kinds: Vec<DiagnosticKind> = consumer.collected.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        vec![DiagnosticKind::UnmatchedClosing, DiagnosticKind::MismatchedClosing]
    );
    assert!(buffer.has_errors());
}

#[test]
fn unclosed_groups_are_closed_at_end_of_file() {
    let (kinds, diagnostics) = lex_kinds("({[");
    assert_eq!(
        kinds,
        vec![
            TokenKind::OpenParen,
            TokenKind::OpenCurlyBrace,
            TokenKind::OpenSquareBracket,
            TokenKind::CloseSquareBracket,
            TokenKind::CloseCurlyBrace,
            TokenKind::CloseParen,
            TokenKind::EndOfFile,
        ]
    );
    assert_eq!(diagnostics.len(), 3);
    assert!(diagnostics.iter().all(|&k| k == DiagnosticKind::MismatchedClosing));
}

#[test]
fn hex_literal_value() {
    let source = SourceBuffer::from_text("test.bas", "0xFFFF_FFFF");
    let mut consumer = CollectingConsumer::default();
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    assert!(consumer.collected.is_empty());
    assert_eq!(buffer.kind(Token::new(0)), TokenKind::IntegerLiteral);
    assert_eq!(
        buffer.integer_literal(Token::new(0)),
        &BigUint::from(4294967295u64)
    );
}

#[test]
fn empty_digit_sequence_is_an_error_token() {
    let (kinds, diagnostics) = lex_kinds("0x");
    assert_eq!(kinds, vec![TokenKind::Error, TokenKind::EndOfFile]);
    assert_eq!(diagnostics, vec![DiagnosticKind::EmptyDigitSequence]);
}

#[test]
fn multi_line_string_value_and_lines() {
    let source = SourceBuffer::from_text("test.bas", "'''\n  hello\n  '''");
    let mut consumer = CollectingConsumer::default();
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    assert!(consumer.collected.is_empty());

    let token = Token::new(0);
    assert_eq!(buffer.kind(token), TokenKind::StringLiteral);
    assert_eq!(buffer.string_literal(token), "hello\n");
    assert_eq!(buffer.token_line_number(token), 1);

    // The EOF token lands on the literal's final line.
    let eof = Token::new(1);
    assert_eq!(buffer.kind(eof), TokenKind::EndOfFile);
    assert_eq!(buffer.token_line_number(eof), 3);
}

#[test]
fn unterminated_string_does_not_stop_lexing() {
    let (kinds, diagnostics) = lex_kinds("\"abc\nvar");
    assert_eq!(
        kinds,
        vec![TokenKind::Error, TokenKind::Var, TokenKind::EndOfFile]
    );
    assert_eq!(diagnostics, vec![DiagnosticKind::UnterminatedString]);
}

#[test]
fn keywords_identifiers_and_type_literals() {
    let source = SourceBuffer::from_text("test.bas", "fn F(x: i32) -> u64; frobnicate f0");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let kinds: Vec<TokenKind> = buffer.tokens().map(|t| buffer.kind(t)).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Fn,
            TokenKind::Identifier,
            TokenKind::OpenParen,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::IntegerTypeLiteral,
            TokenKind::CloseParen,
            TokenKind::MinusGreater,
            TokenKind::UnsignedIntegerTypeLiteral,
            TokenKind::Semi,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::EndOfFile,
        ]
    );

    let i32_token = Token::new(5);
    assert_eq!(buffer.type_literal_size(i32_token), &BigUint::from(32u32));
    assert_eq!(buffer.token_text(i32_token), "i32");

    let u64_token = Token::new(8);
    assert_eq!(buffer.type_literal_size(u64_token), &BigUint::from(64u32));

    // `f0` has a leading zero suffix, so it stays an identifier.
    assert_eq!(buffer.kind(Token::new(11)), TokenKind::Identifier);
}

#[test]
fn identifiers_are_interned() {
    let source = SourceBuffer::from_text("test.bas", "alpha beta alpha");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let ids: Vec<_> = buffer
        .tokens()
        .filter(|&t| buffer.kind(t) == TokenKind::Identifier)
        .map(|t| buffer.identifier(t))
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], ids[2]);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(buffer.identifier_text(ids[0]), "alpha");
    assert_eq!(buffer.identifier_text(ids[1]), "beta");
}

#[test]
fn comments_are_skipped_with_diagnostics() {
    let (kinds, diagnostics) = lex_kinds("// ok\nvar x // trailing\n//bad\n");
    assert_eq!(
        kinds,
        vec![
            TokenKind::Var,
            TokenKind::Identifier,
            TokenKind::EndOfFile
        ]
    );
    assert_eq!(
        diagnostics,
        vec![
            DiagnosticKind::TrailingComment,
            DiagnosticKind::NoWhitespaceAfterCommentIntroducer
        ]
    );
}

#[test]
fn unrecognized_characters_form_one_error_token() {
    let (kinds, diagnostics) = lex_kinds("$$$ var");
    assert_eq!(kinds, vec![TokenKind::Error, TokenKind::Var, TokenKind::EndOfFile]);
    assert_eq!(diagnostics, vec![DiagnosticKind::UnrecognizedCharacters]);
}

#[test]
fn token_lines_never_decrease() {
    let source = SourceBuffer::from_text(
        "test.bas",
        "var a = 1;\nfn F() {\n  return a;\n}\n",
    );
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let mut previous = 0;
    for token in buffer.tokens() {
        let line = buffer.token_line_number(token);
        assert!(line >= previous, "line numbers must be non-decreasing");
        previous = line;
    }
}

#[test]
fn token_text_matches_source_positions() {
    let text = "fn F(x: i32) -> u64 {\n  return x * 2;\n}\n";
    let source = SourceBuffer::from_text("test.bas", text);
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    assert!(!buffer.has_errors());

    // Every non-synthetic token's reconstructed text sits at its
    // recorded source position, so the token stream tiles the source.
    for token in buffer.tokens() {
        if buffer.kind(token) == TokenKind::EndOfFile || buffer.is_recovery_token(token)
        {
            continue;
        }
        let token_text = buffer.token_text(token);
        let line_start = {
            let line = buffer.line(token);
            let line_number = buffer.line_number(line);
            text.split_inclusive('\n')
                .take(line_number - 1)
                .map(str::len)
                .sum::<usize>()
        };
        let start = line_start + buffer.column_number(token) - 1;
        assert_eq!(&text[start..start + token_text.len()], token_text);
    }
}

#[test]
fn integer_round_trip_below_u64_max() {
    for value in [0u64, 1, 7, 42, 1_000_000, u64::MAX] {
        let text = value.to_string();
        let source = SourceBuffer::from_text("test.bas", text);
        let mut consumer = NullDiagnosticConsumer;
        let buffer = TokenizedBuffer::lex(&source, &mut consumer);
        assert_eq!(buffer.kind(Token::new(0)), TokenKind::IntegerLiteral);
        assert_eq!(buffer.integer_literal(Token::new(0)), &BigUint::from(value));
    }
}

#[test]
fn token_dump_format() {
    let source = SourceBuffer::from_text("test.bas", "12-578\n  1  2");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let mut dump = String::new();
    buffer.print(&mut dump).unwrap();
    insta::assert_snapshot!(dump, @r"
- filename: test.bas
  tokens: [
    { index: 0, kind: 'IntegerLiteral', line: 1, column: 1, indent: 1, spelling: '12', value: `12` },
    { index: 1, kind:          'Minus', line: 1, column: 3, indent: 1, spelling: '-' },
    { index: 2, kind: 'IntegerLiteral', line: 1, column: 4, indent: 1, spelling: '578', value: `578`, has_trailing_space: true },
    { index: 3, kind: 'IntegerLiteral', line: 2, column: 3, indent: 3, spelling: '1', value: `1`, has_trailing_space: true },
    { index: 4, kind: 'IntegerLiteral', line: 2, column: 6, indent: 3, spelling: '2', value: `2` },
    { index: 5, kind:      'EndOfFile', line: 2, column: 7, indent: 3, spelling: '' },
  ]
");
}

#[test]
fn bracket_dump_records_pairings() {
    let source = SourceBuffer::from_text("test.bas", "()");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);

    let mut dump = String::new();
    buffer.print(&mut dump).unwrap();
    assert!(dump.contains("closing_token: 1"));
    assert!(dump.contains("opening_token: 0"));
}

#[test]
fn expected_parse_tree_size_sums_contributions() {
    let source = SourceBuffer::from_text("test.bas", "x;");
    let mut consumer = NullDiagnosticConsumer;
    let buffer = TokenizedBuffer::lex(&source, &mut consumer);
    // x contributes 1, `;` contributes 2, EOF contributes 1.
    assert_eq!(buffer.expected_parse_tree_size(), 4);
}
