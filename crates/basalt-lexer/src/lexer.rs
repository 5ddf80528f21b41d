//! The lexing loop.
//!
//! Each step skips whitespace and comments, then dispatches on the
//! first byte of the remaining text through a 256-entry table to one
//! specialised routine. Every routine consumes a prefix of the text and
//! produces exactly one token; no error aborts lexing.

use basalt_common::diagnostics::{
    Diagnostic, DiagnosticConsumer, DiagnosticKind, ErrorTrackingDiagnosticConsumer,
};
use basalt_common::source::SourceBuffer;
use basalt_common::strings::{is_alpha, is_space};
use num_bigint::BigUint;

use crate::helpers::can_lex_integer;
use crate::numeric_literal::{NumericLiteral, NumericValue, Radix};
use crate::string_literal::StringLiteral;
use crate::token_kind::TokenKind;
use crate::tokenized_buffer::{
    translate_source_location, Identifier, Line, LineInfo, Token, TokenInfo,
    TokenPayload, TokenizedBuffer,
};

/// What the first byte of the remaining text selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dispatch {
    /// No token can start here; lex an error run.
    Invalid,
    Symbol,
    Numeric,
    StringIntro,
    Word,
}

static DISPATCH_TABLE: [Dispatch; 256] = build_dispatch_table();

const fn build_dispatch_table() -> [Dispatch; 256] {
    let mut table = [Dispatch::Invalid; 256];

    let mut b = b'0';
    while b <= b'9' {
        table[b as usize] = Dispatch::Numeric;
        b += 1;
    }

    table[b'"' as usize] = Dispatch::StringIntro;
    table[b'\'' as usize] = Dispatch::StringIntro;
    table[b'#' as usize] = Dispatch::StringIntro;

    let mut b = b'a';
    while b <= b'z' {
        table[b as usize] = Dispatch::Word;
        b += 1;
    }
    let mut b = b'A';
    while b <= b'Z' {
        table[b as usize] = Dispatch::Word;
        b += 1;
    }
    table[b'_' as usize] = Dispatch::Word;
    // Non-ASCII bytes are provisionally treated as identifier
    // characters; no Unicode identifier rules are applied yet.
    let mut b = 0x80;
    while b <= 0xFF {
        table[b] = Dispatch::Word;
        b += 1;
    }

    let mut i = 0;
    while i < TokenKind::SYMBOL_TOKENS.len() {
        let spelling = TokenKind::SYMBOL_TOKENS[i].fixed_spelling();
        table[spelling.as_bytes()[0] as usize] = Dispatch::Symbol;
        i += 1;
    }

    table
}

/// Shortcut for symbols whose byte cannot begin any longer symbol.
static ONE_CHAR_SYMBOLS: [Option<TokenKind>; 256] = build_one_char_symbols();

const fn build_one_char_symbols() -> [Option<TokenKind>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < TokenKind::SYMBOL_TOKENS.len() {
        let kind = TokenKind::SYMBOL_TOKENS[i];
        if kind.is_one_char_symbol() {
            table[kind.fixed_spelling().as_bytes()[0] as usize] = Some(kind);
        }
        i += 1;
    }
    table
}

/// Classifies `[A-Za-z0-9_]` plus provisional non-ASCII bytes.
static IDENTIFIER_BYTES: [bool; 256] = build_identifier_bytes();

const fn build_identifier_bytes() -> [bool; 256] {
    let mut table = [false; 256];
    let mut b: usize = 0;
    while b < 256 {
        table[b] = (b as u8).is_ascii_alphanumeric() || b == b'_' as usize || b >= 0x80;
        b += 1;
    }
    table
}

/// Length of the identifier prefix of `text`.
fn scan_identifier_prefix(text: &str) -> usize {
    text.bytes()
        .position(|b| !IDENTIFIER_BYTES[b as usize])
        .unwrap_or(text.len())
}

/// Emits lexing diagnostics at source byte offsets.
///
/// Carries just enough of the buffer under construction to translate
/// offsets, including the scan-forward fallback for the line still
/// being lexed.
pub struct LexerDiagnosticEmitter<'a, 'c> {
    source: &'a SourceBuffer,
    line_infos: &'a [LineInfo],
    last_line_lexed_to_column: Option<u32>,
    consumer: &'c mut dyn DiagnosticConsumer,
}

impl<'a, 'c> LexerDiagnosticEmitter<'a, 'c> {
    pub(crate) fn emit(&mut self, offset: usize, kind: DiagnosticKind, message: String) {
        let location = translate_source_location(
            self.source,
            self.line_infos,
            self.last_line_lexed_to_column,
            offset,
        );
        self.consumer.handle_diagnostic(Diagnostic {
            kind,
            level: kind.level(),
            location,
            message,
        });
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        source: &'a SourceBuffer,
        consumer: &'c mut dyn DiagnosticConsumer,
    ) -> Self {
        static INITIAL_LINE: [LineInfo; 1] = [LineInfo::new(0)];
        Self {
            source,
            line_infos: &INITIAL_LINE,
            last_line_lexed_to_column: Some(0),
            consumer,
        }
    }
}

struct Lexer<'s, 'c> {
    buffer: TokenizedBuffer<'s>,
    consumer: ErrorTrackingDiagnosticConsumer<'c>,
    text: &'s str,
    pos: usize,
    current_line: Line,
    current_column: u32,
    set_indent: bool,
    open_groups: Vec<Token>,
}

impl<'s> TokenizedBuffer<'s> {
    /// Lexes a source buffer into a tokenized buffer.
    pub fn lex(
        source: &'s SourceBuffer,
        consumer: &mut dyn DiagnosticConsumer,
    ) -> TokenizedBuffer<'s> {
        let mut buffer = TokenizedBuffer::new(source);
        let first_line = buffer.add_line(LineInfo::new(0));
        let mut lexer = Lexer {
            buffer,
            consumer: ErrorTrackingDiagnosticConsumer::new(consumer),
            text: source.text(),
            pos: 0,
            current_line: first_line,
            current_column: 0,
            set_indent: false,
            open_groups: Vec::new(),
        };

        while lexer.skip_whitespace() {
            let byte = lexer.text.as_bytes()[lexer.pos];
            let formed = match DISPATCH_TABLE[byte as usize] {
                Dispatch::Symbol => lexer.lex_symbol_token(),
                Dispatch::Word => lexer.lex_keyword_or_identifier(),
                Dispatch::Numeric => lexer.lex_numeric_literal(),
                Dispatch::StringIntro => lexer.lex_string_literal(),
                Dispatch::Invalid => false,
            };
            if !formed {
                lexer.lex_error();
            }
        }

        lexer.close_invalid_open_groups(TokenKind::Error);
        lexer.add_end_of_file_token();

        let Lexer { mut buffer, consumer, .. } = lexer;
        buffer.has_errors |= consumer.seen_error();
        buffer
    }
}

impl<'s, 'c> Lexer<'s, 'c> {
    fn line_info_mut(&mut self, line: Line) -> &mut LineInfo {
        &mut self.buffer.line_infos[line.index()]
    }

    fn emit(&mut self, offset: usize, kind: DiagnosticKind, message: String) {
        let location = translate_source_location(
            self.buffer.source,
            &self.buffer.line_infos,
            Some(self.current_column),
            offset,
        );
        self.consumer.handle_diagnostic(Diagnostic {
            kind,
            level: kind.level(),
            location,
            message,
        });
    }

    fn emit_at_token(&mut self, token: Token, kind: DiagnosticKind, message: String) {
        let offset = self.buffer.token_start(token);
        self.emit(offset, kind, message);
    }

    /// An emitter for the literal value computations, carved out of the
    /// parts of the lexer they need.
    fn literal_emitter(&mut self) -> LexerDiagnosticEmitter<'_, '_> {
        LexerDiagnosticEmitter {
            source: self.buffer.source,
            line_infos: &self.buffer.line_infos,
            last_line_lexed_to_column: Some(self.current_column),
            consumer: &mut self.consumer,
        }
    }

    /// Closes the current line record and opens the next.
    fn handle_newline(&mut self) {
        let line = self.current_line;
        let column = self.current_column;
        let start = {
            let info = self.line_info_mut(line);
            info.length = column;
            info.start + column as usize + 1
        };
        self.current_line = self.buffer.add_line(LineInfo::new(start));
        self.current_column = 0;
        self.set_indent = false;
    }

    fn close_final_line(&mut self) {
        let line = self.current_line;
        let column = self.current_column;
        self.line_info_mut(line).length = column;
    }

    fn note_whitespace(&mut self) {
        if let Some(last) = self.buffer.token_infos.last_mut() {
            last.has_trailing_space = true;
        }
    }

    fn set_indent_if_needed(&mut self, column: u32) {
        if !self.set_indent {
            let line = self.current_line;
            self.line_info_mut(line).indent = column;
            self.set_indent = true;
        }
    }

    /// Skips whitespace and comments. Returns false once the text is
    /// exhausted.
    fn skip_whitespace(&mut self) -> bool {
        let whitespace_start = self.pos;
        let bytes = self.text.as_bytes();

        loop {
            if self.text[self.pos..].starts_with("//") {
                // A comment must be the only non-whitespace on its line.
                if self.set_indent {
                    self.emit(
                        self.pos,
                        DiagnosticKind::TrailingComment,
                        "Trailing comments are not permitted.".to_string(),
                    );
                }
                // The introducer must be followed by whitespace or EOF.
                if self.pos + 2 < bytes.len() && !is_space(bytes[self.pos + 2]) {
                    self.emit(
                        self.pos + 2,
                        DiagnosticKind::NoWhitespaceAfterCommentIntroducer,
                        "Whitespace is required after '//'.".to_string(),
                    );
                }
                while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                    self.current_column += 1;
                    self.pos += 1;
                }
                if self.pos == bytes.len() {
                    break;
                }
            }

            match bytes.get(self.pos) {
                None => break,
                Some(b'\n') => {
                    self.pos += 1;
                    if self.pos == bytes.len() {
                        break;
                    }
                    self.handle_newline();
                }
                Some(b' ') | Some(b'\t') => {
                    self.current_column += 1;
                    self.pos += 1;
                }
                Some(_) => {
                    if whitespace_start != self.pos {
                        self.note_whitespace();
                    }
                    return true;
                }
            }
        }

        self.close_final_line();
        if whitespace_start != self.pos {
            self.note_whitespace();
        }
        false
    }

    fn lex_numeric_literal(&mut self) -> bool {
        let text: &'s str = self.text;
        let Some(literal) = NumericLiteral::lex(&text[self.pos..]) else {
            return false;
        };

        let int_column = self.current_column;
        let token_start = self.pos;
        let token_size = literal.text().len();
        self.current_column += token_size as u32;
        self.pos += token_size;
        self.set_indent_if_needed(int_column);

        let value = {
            let mut emitter = self.literal_emitter();
            literal.compute_value(&mut emitter, token_start)
        };

        let line = self.current_line;
        match value {
            NumericValue::Integer(value) => {
                let index = self.buffer.integer_literals.len() as u32;
                self.buffer.integer_literals.push(value);
                let mut info = TokenInfo::new(TokenKind::IntegerLiteral, line, int_column);
                info.payload = TokenPayload::IntegerIndex(index);
                self.buffer.add_token(info);
            }
            NumericValue::Real { radix, mantissa, exponent } => {
                let index = self.buffer.real_literals.len() as u32;
                self.buffer
                    .real_literals
                    .push((mantissa, exponent, radix == Radix::Decimal));
                let mut info = TokenInfo::new(TokenKind::RealLiteral, line, int_column);
                info.payload = TokenPayload::RealIndex(index);
                self.buffer.add_token(info);
            }
            NumericValue::UnrecoverableError => {
                let mut info = TokenInfo::new(TokenKind::Error, line, int_column);
                info.payload = TokenPayload::ErrorLength(token_size as u32);
                self.buffer.add_token(info);
            }
        }
        true
    }

    fn lex_string_literal(&mut self) -> bool {
        let text: &'s str = self.text;
        let Some(literal) = StringLiteral::lex(&text[self.pos..]) else {
            return false;
        };

        let token_start = self.pos;
        if literal.uses_double_quotes() {
            self.emit(
                token_start,
                DiagnosticKind::MultiLineStringWithDoubleQuotes,
                "Use `'''` rather than `\"\"\"` for multi-line string literals."
                    .to_string(),
            );
        }

        let string_line = self.current_line;
        let string_column = self.current_column;
        let literal_size = literal.text().len();
        self.pos += literal_size;
        self.set_indent_if_needed(string_column);

        if !literal.is_multi_line() {
            self.current_column += literal_size as u32;
        } else {
            // Walk the literal to keep the line table and columns in
            // step; continued lines indent at the string's column.
            for byte in literal.text().bytes() {
                if byte == b'\n' {
                    self.handle_newline();
                    let line = self.current_line;
                    self.line_info_mut(line).indent = string_column;
                    self.set_indent = true;
                } else {
                    self.current_column += 1;
                }
            }
        }

        if literal.is_terminated() {
            let value = {
                let mut emitter = self.literal_emitter();
                literal.compute_value(&mut emitter, token_start)
            };
            let index = self.buffer.string_literals.len() as u32;
            self.buffer.string_literals.push(value);
            let mut info =
                TokenInfo::new(TokenKind::StringLiteral, string_line, string_column);
            info.payload = TokenPayload::StringIndex(index);
            self.buffer.add_token(info);
        } else {
            self.emit(
                token_start,
                DiagnosticKind::UnterminatedString,
                "String is missing a terminator.".to_string(),
            );
            let mut info = TokenInfo::new(TokenKind::Error, string_line, string_column);
            info.payload = TokenPayload::ErrorLength(literal_size as u32);
            self.buffer.add_token(info);
        }
        true
    }

    fn lex_symbol_token(&mut self) -> bool {
        let byte = self.text.as_bytes()[self.pos];
        let kind = match ONE_CHAR_SYMBOLS[byte as usize] {
            Some(kind) => kind,
            None => {
                let rest = &self.text[self.pos..];
                match TokenKind::SYMBOL_TOKENS
                    .iter()
                    .copied()
                    .find(|kind| rest.starts_with(kind.fixed_spelling()))
                {
                    Some(kind) => kind,
                    None => return false,
                }
            }
        };

        self.set_indent_if_needed(self.current_column);
        self.close_invalid_open_groups(kind);

        let location_offset = self.pos;
        let spelling_len = kind.fixed_spelling().len();
        let line = self.current_line;
        let token = self
            .buffer
            .add_token(TokenInfo::new(kind, line, self.current_column));
        self.current_column += spelling_len as u32;
        self.pos += spelling_len;

        if kind.is_opening_symbol() {
            self.open_groups.push(token);
            return true;
        }

        if !kind.is_closing_symbol() {
            return true;
        }

        let Some(opening_token) = self.open_groups.pop() else {
            let info = &mut self.buffer.token_infos[token.index()];
            info.kind = TokenKind::Error;
            info.payload = TokenPayload::ErrorLength(spelling_len as u32);
            self.emit(
                location_offset,
                DiagnosticKind::UnmatchedClosing,
                "Closing symbol without a corresponding opening symbol.".to_string(),
            );
            return true;
        };

        self.buffer.token_infos[opening_token.index()].payload =
            TokenPayload::ClosingToken(token);
        self.buffer.token_infos[token.index()].payload =
            TokenPayload::OpeningToken(opening_token);
        true
    }

    /// Pops mismatched open groups before `kind` is lexed, fabricating
    /// a recovery closer for each. Passing `Error` closes everything,
    /// which is how EOF drains the stack.
    fn close_invalid_open_groups(&mut self, kind: TokenKind) {
        if !kind.is_closing_symbol() && kind != TokenKind::Error {
            return;
        }

        while let Some(&opening_token) = self.open_groups.last() {
            let opening_kind = self.buffer.kind(opening_token);
            if kind == opening_kind.closing_symbol() {
                return;
            }

            self.open_groups.pop();
            self.emit_at_token(
                opening_token,
                DiagnosticKind::MismatchedClosing,
                "Closing symbol does not match most recent opening symbol.".to_string(),
            );

            debug_assert!(!self.buffer.token_infos.is_empty(), "must have a prior opening token");
            let prev_token = Token::new(self.buffer.token_infos.len() - 1);
            let has_trailing_space = self.buffer.has_trailing_whitespace(prev_token);

            let line = self.current_line;
            let mut info =
                TokenInfo::new(opening_kind.closing_symbol(), line, self.current_column);
            info.has_trailing_space = has_trailing_space;
            info.is_recovery = true;
            let closing_token = self.buffer.add_token(info);

            self.buffer.token_infos[opening_token.index()].payload =
                TokenPayload::ClosingToken(closing_token);
            self.buffer.token_infos[closing_token.index()].payload =
                TokenPayload::OpeningToken(opening_token);
        }
    }

    fn lex_keyword_or_identifier(&mut self) -> bool {
        let byte = self.text.as_bytes()[self.pos];
        if !(is_alpha(byte) || byte == b'_' || byte >= 0x80) {
            return false;
        }

        self.set_indent_if_needed(self.current_column);

        let text: &'s str = self.text;
        let length = scan_identifier_prefix(&text[self.pos..]);
        debug_assert!(length > 0, "must have at least one character");
        let identifier_text: &'s str = &text[self.pos..self.pos + length];
        let identifier_column = self.current_column;
        let token_start = self.pos;
        self.current_column += length as u32;
        self.pos += length;

        if self.lex_word_as_type_literal(identifier_text, identifier_column, token_start)
        {
            return true;
        }

        let line = self.current_line;
        if let Some(kind) = TokenKind::keyword_from_str(identifier_text) {
            self.buffer
                .add_token(TokenInfo::new(kind, line, identifier_column));
            return true;
        }

        let id = self.get_or_create_identifier(identifier_text);
        let mut info = TokenInfo::new(TokenKind::Identifier, line, identifier_column);
        info.payload = TokenPayload::Identifier(id);
        self.buffer.add_token(info);
        true
    }

    /// Recognises `[iuf][1-9][0-9]*` words as sized type literals.
    fn lex_word_as_type_literal(
        &mut self,
        word: &str,
        column: u32,
        token_start: usize,
    ) -> bool {
        let bytes = word.as_bytes();
        if bytes.len() < 2 {
            return false;
        }
        if !(b'1'..=b'9').contains(&bytes[1]) {
            return false;
        }
        let kind = match bytes[0] {
            b'i' => TokenKind::IntegerTypeLiteral,
            b'u' => TokenKind::UnsignedIntegerTypeLiteral,
            b'f' => TokenKind::FloatingPointTypeLiteral,
            _ => return false,
        };

        let suffix = &word[1..];
        let can_lex = {
            let mut emitter = self.literal_emitter();
            can_lex_integer(&mut emitter, suffix, token_start + 1)
        };
        let line = self.current_line;
        if !can_lex {
            let mut info = TokenInfo::new(TokenKind::Error, line, column);
            info.payload = TokenPayload::ErrorLength(word.len() as u32);
            self.buffer.add_token(info);
            return true;
        }
        if !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        let value = BigUint::parse_bytes(suffix.as_bytes(), 10).unwrap_or_default();
        let index = self.buffer.integer_literals.len() as u32;
        self.buffer.integer_literals.push(value);
        let mut info = TokenInfo::new(kind, line, column);
        info.payload = TokenPayload::IntegerIndex(index);
        self.buffer.add_token(info);
        true
    }

    fn get_or_create_identifier(&mut self, text: &'s str) -> Identifier {
        if let Some(&id) = self.buffer.identifier_map.get(text) {
            return id;
        }
        let id = Identifier::new(self.buffer.identifier_texts.len());
        self.buffer.identifier_texts.push(text);
        self.buffer.identifier_map.insert(text, id);
        id
    }

    /// Consumes a run of bytes no token can start with.
    fn lex_error(&mut self) {
        let rest = &self.text[self.pos..];
        let mut length = rest
            .bytes()
            .position(|b| DISPATCH_TABLE[b as usize] != Dispatch::Invalid || is_space(b))
            .unwrap_or(rest.len());
        if length == 0 {
            length = 1;
        }

        self.emit(
            self.pos,
            DiagnosticKind::UnrecognizedCharacters,
            "Encountered unrecognized characters while parsing.".to_string(),
        );

        let line = self.current_line;
        let mut info = TokenInfo::new(TokenKind::Error, line, self.current_column);
        info.payload = TokenPayload::ErrorLength(length as u32);
        self.buffer.add_token(info);
        self.current_column += length as u32;
        self.pos += length;
    }

    fn add_end_of_file_token(&mut self) {
        let line = self.current_line;
        let info = TokenInfo::new(TokenKind::EndOfFile, line, self.current_column);
        self.buffer.add_token(info);
    }
}
