//! The tokenized buffer: the lexer's immutable output.
//!
//! Tokens, lines, and identifiers are 32-bit handles into vectors owned
//! by the buffer. Literal values live in append-only side tables;
//! matched bracket pairs are cross-linked through the token records.

use std::fmt::Write as _;

use basalt_common::define_index_type;
use basalt_common::diagnostics::{
    DiagnosticEmitter, DiagnosticLocation, DiagnosticLocationTranslator,
};
use basalt_common::source::SourceBuffer;
use basalt_common::strings::is_decimal_digit;
use num_bigint::{BigInt, BigUint};
use rustc_hash::FxHashMap;

use crate::numeric_literal::NumericLiteral;
use crate::string_literal::StringLiteral;
use crate::token_kind::TokenKind;

define_index_type! {
    /// A lexed token. Tokens from the same buffer compare by stream
    /// position; tokens from different buffers do not compare
    /// meaningfully.
    pub struct Token
}

define_index_type! {
    /// A lexed line.
    pub struct Line
}

define_index_type! {
    /// An interned identifier.
    pub struct Identifier
}

impl Identifier {
    /// Sentinel for token records that carry no identifier.
    pub const INVALID: Identifier = Identifier::from_raw(u32::MAX);
}

/// The value of a real literal: `mantissa * base^exponent` with
/// `base` 10 (decimal) or 2 (binary and hexadecimal sources).
#[derive(Clone, Copy, Debug)]
pub struct RealLiteralValue<'a> {
    pub mantissa: &'a BigUint,
    pub exponent: &'a BigInt,
    pub is_decimal: bool,
}

impl std::fmt::Display for RealLiteralValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}*{}^{}",
            self.mantissa,
            if self.is_decimal { 10 } else { 2 },
            self.exponent
        )
    }
}

/// Per-token payload beyond the kind and position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum TokenPayload {
    #[default]
    None,
    Identifier(Identifier),
    /// Index into the integer literal table (integer literals and
    /// sized type literal suffixes).
    IntegerIndex(u32),
    /// Index into the real literal table.
    RealIndex(u32),
    /// Index into the string literal table.
    StringIndex(u32),
    ClosingToken(Token),
    OpeningToken(Token),
    /// Source length of an `Error` token.
    ErrorLength(u32),
}

/// Information about a single token.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TokenInfo {
    pub(crate) kind: TokenKind,
    pub(crate) has_trailing_space: bool,
    pub(crate) is_recovery: bool,
    pub(crate) token_line: Line,
    /// Zero-based byte column within the line.
    pub(crate) column: u32,
    pub(crate) payload: TokenPayload,
}

impl TokenInfo {
    pub(crate) fn new(kind: TokenKind, token_line: Line, column: u32) -> Self {
        Self {
            kind,
            has_trailing_space: false,
            is_recovery: false,
            token_line,
            column,
            payload: TokenPayload::None,
        }
    }
}

/// Length sentinel for a line still being lexed.
pub(crate) const LINE_UNLEXED: u32 = u32::MAX;

/// Information about a single source line.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LineInfo {
    /// Zero-based byte offset of the line start in the source.
    pub(crate) start: usize,
    /// Byte length, or [`LINE_UNLEXED`] while the line is open.
    pub(crate) length: u32,
    /// Zero-based byte column of the first non-whitespace token.
    pub(crate) indent: u32,
}

impl LineInfo {
    pub(crate) const fn new(start: usize) -> Self {
        Self { start, length: LINE_UNLEXED, indent: 0 }
    }
}

/// A source buffer lexed into a token stream.
pub struct TokenizedBuffer<'s> {
    pub(crate) source: &'s SourceBuffer,
    pub(crate) token_infos: Vec<TokenInfo>,
    pub(crate) line_infos: Vec<LineInfo>,
    pub(crate) identifier_texts: Vec<&'s str>,
    pub(crate) identifier_map: FxHashMap<&'s str, Identifier>,
    pub(crate) integer_literals: Vec<BigUint>,
    pub(crate) real_literals: Vec<(BigUint, BigInt, bool)>,
    pub(crate) string_literals: Vec<String>,
    pub(crate) expected_parse_tree_size: usize,
    pub(crate) has_errors: bool,
}

impl<'s> TokenizedBuffer<'s> {
    pub(crate) fn new(source: &'s SourceBuffer) -> Self {
        Self {
            source,
            token_infos: Vec::new(),
            line_infos: Vec::new(),
            identifier_texts: Vec::new(),
            identifier_map: FxHashMap::default(),
            integer_literals: Vec::new(),
            real_literals: Vec::new(),
            string_literals: Vec::new(),
            expected_parse_tree_size: 0,
            has_errors: false,
        }
    }

    pub(crate) fn add_token(&mut self, info: TokenInfo) -> Token {
        self.expected_parse_tree_size += info.kind.expected_parse_tree_size();
        self.token_infos.push(info);
        Token::new(self.token_infos.len() - 1)
    }

    pub(crate) fn add_line(&mut self, info: LineInfo) -> Line {
        self.line_infos.push(info);
        Line::new(self.line_infos.len() - 1)
    }

    pub(crate) fn token_info(&self, token: Token) -> &TokenInfo {
        &self.token_infos[token.index()]
    }

    pub(crate) fn line_info(&self, line: Line) -> &LineInfo {
        &self.line_infos[line.index()]
    }

    /// Byte offset of the token's first character in the source.
    pub(crate) fn token_start(&self, token: Token) -> usize {
        let info = self.token_info(token);
        self.line_info(info.token_line).start + info.column as usize
    }

    // ── Public accessors ───────────────────────────────────────────────

    pub fn filename(&self) -> &str {
        self.source.filename()
    }

    /// The number of tokens in the buffer.
    pub fn size(&self) -> usize {
        self.token_infos.len()
    }

    /// All tokens, in source order.
    pub fn tokens(&self) -> impl DoubleEndedIterator<Item = Token> + ExactSizeIterator {
        (0..self.token_infos.len()).map(Token::new)
    }

    /// Whether any lexing error was detected.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// The number of parse tree nodes expected for this buffer's
    /// tokens; the parser reserves this up front.
    pub fn expected_parse_tree_size(&self) -> usize {
        self.expected_parse_tree_size
    }

    pub fn kind(&self, token: Token) -> TokenKind {
        self.token_info(token).kind
    }

    pub fn line(&self, token: Token) -> Line {
        self.token_info(token).token_line
    }

    /// One-based line number.
    pub fn line_number(&self, line: Line) -> usize {
        line.index() + 1
    }

    /// One-based line number of the token.
    pub fn token_line_number(&self, token: Token) -> usize {
        self.line_number(self.line(token))
    }

    /// One-based column number.
    pub fn column_number(&self, token: Token) -> usize {
        self.token_info(token).column as usize + 1
    }

    /// One-based indent column of the line's first token.
    pub fn indent_column_number(&self, line: Line) -> usize {
        self.line_info(line).indent as usize + 1
    }

    /// The token's source text, reconstructed on demand.
    pub fn token_text(&self, token: Token) -> &'s str {
        let info = self.token_info(token);
        let fixed = info.kind.fixed_spelling();
        if !fixed.is_empty() {
            return fixed;
        }

        match info.kind {
            TokenKind::Error => {
                let start = self.token_start(token);
                let TokenPayload::ErrorLength(length) = info.payload else {
                    debug_assert!(false, "error token without a length");
                    return "";
                };
                &self.source.text()[start..start + length as usize]
            }
            TokenKind::IntegerLiteral | TokenKind::RealLiteral => {
                let start = self.token_start(token);
                match NumericLiteral::lex(&self.source.text()[start..]) {
                    Some(relexed) => relexed.text(),
                    None => {
                        debug_assert!(false, "could not reform numeric literal");
                        ""
                    }
                }
            }
            TokenKind::StringLiteral => {
                let start = self.token_start(token);
                match StringLiteral::lex(&self.source.text()[start..]) {
                    Some(relexed) => relexed.text(),
                    None => {
                        debug_assert!(false, "could not reform string literal");
                        ""
                    }
                }
            }
            kind if kind.is_sized_type_literal() => {
                let start = self.token_start(token);
                let text = &self.source.text()[start..];
                let digits = text[1..]
                    .bytes()
                    .take_while(|&b| is_decimal_digit(b))
                    .count();
                &text[..1 + digits]
            }
            TokenKind::EndOfFile => "",
            _ => {
                debug_assert!(
                    info.kind == TokenKind::Identifier,
                    "only identifiers have stored text"
                );
                match info.payload {
                    TokenPayload::Identifier(id) => self.identifier_text(id),
                    _ => "",
                }
            }
        }
    }

    /// The interned identifier of an `Identifier` token.
    pub fn identifier(&self, token: Token) -> Identifier {
        match self.token_info(token).payload {
            TokenPayload::Identifier(id) => id,
            _ => {
                debug_assert!(false, "token must be an identifier");
                Identifier::INVALID
            }
        }
    }

    pub fn identifier_text(&self, id: Identifier) -> &'s str {
        self.identifier_texts[id.index()]
    }

    /// The value of an `IntegerLiteral` token.
    pub fn integer_literal(&self, token: Token) -> &BigUint {
        debug_assert_eq!(self.kind(token), TokenKind::IntegerLiteral);
        match self.token_info(token).payload {
            TokenPayload::IntegerIndex(index) => &self.integer_literals[index as usize],
            _ => panic!("token must be an integer literal"),
        }
    }

    /// The value of a `RealLiteral` token.
    pub fn real_literal(&self, token: Token) -> RealLiteralValue<'_> {
        debug_assert_eq!(self.kind(token), TokenKind::RealLiteral);
        match self.token_info(token).payload {
            TokenPayload::RealIndex(index) => {
                let (mantissa, exponent, is_decimal) =
                    &self.real_literals[index as usize];
                RealLiteralValue { mantissa, exponent, is_decimal: *is_decimal }
            }
            _ => panic!("token must be a real literal"),
        }
    }

    /// The decoded value of a `StringLiteral` token.
    pub fn string_literal(&self, token: Token) -> &str {
        debug_assert_eq!(self.kind(token), TokenKind::StringLiteral);
        match self.token_info(token).payload {
            TokenPayload::StringIndex(index) => &self.string_literals[index as usize],
            _ => panic!("token must be a string literal"),
        }
    }

    /// The size suffix of a sized type literal token (`i32` -> 32).
    pub fn type_literal_size(&self, token: Token) -> &BigUint {
        debug_assert!(self.kind(token).is_sized_type_literal());
        match self.token_info(token).payload {
            TokenPayload::IntegerIndex(index) => &self.integer_literals[index as usize],
            _ => panic!("token must be a sized type literal"),
        }
    }

    /// The closing token matched with the given opening token.
    pub fn matched_closing_token(&self, opening_token: Token) -> Token {
        debug_assert!(self.kind(opening_token).is_opening_symbol());
        match self.token_info(opening_token).payload {
            TokenPayload::ClosingToken(token) => token,
            _ => panic!("opening token has no matched closing token"),
        }
    }

    /// The opening token matched with the given closing token.
    pub fn matched_opening_token(&self, closing_token: Token) -> Token {
        debug_assert!(self.kind(closing_token).is_closing_symbol());
        match self.token_info(closing_token).payload {
            TokenPayload::OpeningToken(token) => token,
            _ => panic!("closing token has no matched opening token"),
        }
    }

    pub fn has_leading_whitespace(&self, token: Token) -> bool {
        token.index() == 0
            || self.token_infos[token.index() - 1].has_trailing_space
    }

    pub fn has_trailing_whitespace(&self, token: Token) -> bool {
        self.token_info(token).has_trailing_space
    }

    /// Whether the token was fabricated during error recovery rather
    /// than lexed from source.
    pub fn is_recovery_token(&self, token: Token) -> bool {
        self.token_info(token).is_recovery
    }

    /// Resolves a byte offset to a diagnostic location.
    ///
    /// `last_line_lexed_to_column` supports translation while lexing is
    /// still in progress: when the offset lands past the last recorded
    /// line's extent, translation scans forward from the last known
    /// point instead of trusting the (incomplete) line table.
    pub(crate) fn source_location(
        &self,
        offset: usize,
        last_line_lexed_to_column: Option<u32>,
    ) -> DiagnosticLocation {
        translate_source_location(
            self.source,
            &self.line_infos,
            last_line_lexed_to_column,
            offset,
        )
    }

    // ── Printing ───────────────────────────────────────────────────────

    /// Renders the buffer as a YAML-like token dump.
    pub fn print(&self, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        writeln!(out, "- filename: {}", self.filename())?;
        writeln!(out, "  tokens: [")?;

        let mut widths = PrintWidths::default();
        widths.index = decimal_width(self.token_infos.len());
        for token in self.tokens() {
            widths.widen(&self.token_print_widths(token));
        }

        for token in self.tokens() {
            write!(out, "    ")?;
            self.print_token_with_widths(out, token, &widths)?;
            writeln!(out, ",")?;
        }
        writeln!(out, "  ]")
    }

    /// Prints one token without buffer-wide field alignment.
    pub fn print_token(
        &self,
        out: &mut impl std::fmt::Write,
        token: Token,
    ) -> std::fmt::Result {
        self.print_token_with_widths(out, token, &self.token_print_widths(token))
    }

    fn token_print_widths(&self, token: Token) -> PrintWidths {
        PrintWidths {
            index: decimal_width(token.index()),
            kind: self.kind(token).name().len(),
            line: decimal_width(self.token_line_number(token)),
            column: decimal_width(self.column_number(token)),
            indent: decimal_width(self.indent_column_number(self.line(token))),
        }
    }

    fn print_token_with_widths(
        &self,
        out: &mut impl std::fmt::Write,
        token: Token,
        widths: &PrintWidths,
    ) -> std::fmt::Result {
        let info = self.token_info(token);
        let quoted_kind = format!("'{}'", info.kind.name());
        write!(
            out,
            "{{ index: {index:>iw$}, kind: {kind:>kw$}, line: {line:>lw$}, column: {column:>cw$}, indent: {indent:>dw$}, spelling: '{text}'",
            index = token.index(),
            iw = widths.index,
            kind = quoted_kind,
            kw = widths.kind + 2,
            line = self.token_line_number(token),
            lw = widths.line,
            column = self.column_number(token),
            cw = widths.column,
            indent = self.indent_column_number(self.line(token)),
            dw = widths.indent,
            text = self.token_text(token),
        )?;

        match info.kind {
            TokenKind::Identifier => {
                write!(out, ", identifier: {}", self.identifier(token).raw())?
            }
            TokenKind::IntegerLiteral => {
                write!(out, ", value: `{}`", self.integer_literal(token))?
            }
            TokenKind::RealLiteral => {
                write!(out, ", value: `{}`", self.real_literal(token))?
            }
            TokenKind::StringLiteral => {
                write!(out, ", value: `{}`", self.string_literal(token))?
            }
            kind if kind.is_opening_symbol() => write!(
                out,
                ", closing_token: {}",
                self.matched_closing_token(token).raw()
            )?,
            kind if kind.is_closing_symbol() => write!(
                out,
                ", opening_token: {}",
                self.matched_opening_token(token).raw()
            )?,
            _ => {}
        }

        if info.has_trailing_space {
            write!(out, ", has_trailing_space: true")?;
        }
        if info.is_recovery {
            write!(out, ", recovery: true")?;
        }

        write!(out, " }}")
    }
}

impl std::fmt::Display for TokenizedBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rendered = String::new();
        self.print(&mut rendered)?;
        f.write_str(&rendered)
    }
}

#[derive(Default)]
struct PrintWidths {
    index: usize,
    kind: usize,
    line: usize,
    column: usize,
    indent: usize,
}

impl PrintWidths {
    fn widen(&mut self, other: &PrintWidths) {
        self.index = self.index.max(other.index);
        self.kind = self.kind.max(other.kind);
        self.line = self.line.max(other.line);
        self.column = self.column.max(other.column);
        self.indent = self.indent.max(other.indent);
    }
}

fn decimal_width(mut n: usize) -> usize {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Shared byte-offset-to-location translation over a (possibly still
/// growing) line table.
pub(crate) fn translate_source_location(
    source: &SourceBuffer,
    line_infos: &[LineInfo],
    last_line_lexed_to_column: Option<u32>,
    offset: usize,
) -> DiagnosticLocation {
    let text = source.text();
    debug_assert!(offset <= text.len(), "location not within buffer");

    let after = line_infos.partition_point(|line| line.start <= offset);
    let incomplete_line_info =
        last_line_lexed_to_column.is_some() && after == line_infos.len();

    debug_assert!(after > 0, "location precedes the start of the first line");
    let line_index = after.saturating_sub(1);
    let mut line_number = line_index;
    let mut column_number = offset - line_infos[line_index].start;

    // Past the last fully lexed point, the line table cannot be
    // trusted; scan forward from the last known extent instead.
    if incomplete_line_info {
        let last_column = last_line_lexed_to_column.unwrap_or(0) as usize;
        if column_number > last_column {
            column_number = last_column;
            let bytes = text.as_bytes();
            for i in (line_infos[line_index].start + last_column)..offset {
                if bytes[i] == b'\n' {
                    line_number += 1;
                    column_number = 0;
                } else {
                    column_number += 1;
                }
            }
        }
    }

    DiagnosticLocation {
        file_name: source.filename().to_string(),
        line_number: (line_number + 1) as u32,
        column_number: (column_number + 1) as u32,
    }
}

/// Translates `Token` handles for diagnostics raised by the parser.
pub struct TokenLocationTranslator<'a, 's> {
    buffer: &'a TokenizedBuffer<'s>,
}

impl<'a, 's> TokenLocationTranslator<'a, 's> {
    pub fn new(buffer: &'a TokenizedBuffer<'s>) -> Self {
        Self { buffer }
    }
}

impl DiagnosticLocationTranslator<Token> for TokenLocationTranslator<'_, '_> {
    fn get_location(&self, token: Token) -> DiagnosticLocation {
        self.buffer.source_location(self.buffer.token_start(token), None)
    }
}

/// Emitter anchored on token handles.
pub type TokenDiagnosticEmitter<'t, 'c> = DiagnosticEmitter<'t, 'c, Token>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_widths() {
        assert_eq!(decimal_width(0), 1);
        assert_eq!(decimal_width(9), 1);
        assert_eq!(decimal_width(10), 2);
        assert_eq!(decimal_width(99), 2);
        assert_eq!(decimal_width(100), 3);
    }

    #[test]
    fn translate_locations_with_complete_line_table() {
        let source = SourceBuffer::from_text("t.bas", "ab\ncd\n");
        let lines = [
            LineInfo { start: 0, length: 2, indent: 0 },
            LineInfo { start: 3, length: 2, indent: 0 },
        ];
        let loc = translate_source_location(&source, &lines, None, 0);
        assert_eq!((loc.line_number, loc.column_number), (1, 1));
        let loc = translate_source_location(&source, &lines, None, 1);
        assert_eq!((loc.line_number, loc.column_number), (1, 2));
        let loc = translate_source_location(&source, &lines, None, 4);
        assert_eq!((loc.line_number, loc.column_number), (2, 2));
    }

    #[test]
    fn translate_scans_past_unlexed_lines() {
        let source = SourceBuffer::from_text("t.bas", "ab\ncd\nef");
        // Only the first line is recorded, lexed through column 2.
        let lines = [LineInfo::new(0)];
        let loc = translate_source_location(&source, &lines, Some(2), 7);
        assert_eq!((loc.line_number, loc.column_number), (3, 2));
    }
}
