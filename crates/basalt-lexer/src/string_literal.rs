//! String literal scanning and value computation.
//!
//! Three surface forms share one scanner: simple `"..."` literals,
//! multi-line `'''...'''` (or the diagnosed `"""..."""`) blocks, and
//! `#`-raised raw literals where `k` leading hashes require `k` hashes
//! on the terminator and after each escape backslash.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_common::strings::{
    is_decimal_digit, is_horizontal_whitespace, is_space, is_upper_hex_digit,
};

use crate::helpers::can_lex_integer;
use crate::lexer::LexerDiagnosticEmitter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MultiLineKind {
    NotMultiLine,
    MultiLine,
    MultiLineWithDoubleQuotes,
}

const MULTI_LINE_INDICATOR: &str = "'''";
const DOUBLE_QUOTED_MULTI_LINE_INDICATOR: &str = "\"\"\"";

struct Introducer {
    kind: MultiLineKind,
    terminator: &'static str,
    /// Bytes from the first non-hash character through the end of the
    /// introducer (for multi-line forms, through the newline after the
    /// file-type indicator).
    prefix_size: usize,
}

impl Introducer {
    fn lex(source_text: &str) -> Option<Introducer> {
        let mut kind = MultiLineKind::NotMultiLine;
        let mut indicator = "";
        if source_text.starts_with(MULTI_LINE_INDICATOR) {
            kind = MultiLineKind::MultiLine;
            indicator = MULTI_LINE_INDICATOR;
        } else if source_text.starts_with(DOUBLE_QUOTED_MULTI_LINE_INDICATOR) {
            kind = MultiLineKind::MultiLineWithDoubleQuotes;
            indicator = DOUBLE_QUOTED_MULTI_LINE_INDICATOR;
        }

        if kind != MultiLineKind::NotMultiLine {
            // The rest of the opening line is a file-type indicator: a
            // character sequence without `#` or `"`, then a newline.
            let bytes = source_text.as_bytes();
            let mut i = indicator.len();
            while i < bytes.len() {
                match bytes[i] {
                    b'\n' => {
                        return Some(Introducer {
                            kind,
                            terminator: indicator,
                            prefix_size: i + 1,
                        })
                    }
                    b'#' | b'"' => break,
                    _ => i += 1,
                }
            }
        }

        if source_text.starts_with('"') {
            return Some(Introducer {
                kind: MultiLineKind::NotMultiLine,
                terminator: "\"",
                prefix_size: 1,
            });
        }

        None
    }
}

/// A scanned string literal, not yet expanded.
#[derive(Clone, Copy, Debug)]
pub struct StringLiteral<'s> {
    text: &'s str,
    content_offset: usize,
    content_len: usize,
    hash_level: usize,
    kind: MultiLineKind,
    is_terminated: bool,
}

/// Whether `text[i..]` begins with `terminator` followed by
/// `hash_level` hashes.
fn matches_terminator(text: &str, i: usize, terminator: &str, hash_level: usize) -> bool {
    let Some(rest) = text[i..].strip_prefix(terminator) else {
        return false;
    };
    rest.len() >= hash_level && rest.as_bytes()[..hash_level].iter().all(|&b| b == b'#')
}

/// Whether the backslash at `i` introduces an escape at this hash level.
fn is_escape_intro(bytes: &[u8], i: usize, hash_level: usize) -> bool {
    debug_assert_eq!(bytes[i], b'\\');
    bytes.len() - i > hash_level
        && bytes[i + 1..=i + hash_level].iter().all(|&b| b == b'#')
}

impl<'s> StringLiteral<'s> {
    /// Scans a string literal prefix of `source_text`.
    ///
    /// Returns `None` when the text does not start a string literal at
    /// all; malformed literals are returned unterminated, for the
    /// caller to diagnose.
    pub fn lex(source_text: &'s str) -> Option<StringLiteral<'s>> {
        let bytes = source_text.as_bytes();
        let mut cursor = 0;
        while cursor < bytes.len() && bytes[cursor] == b'#' {
            cursor += 1;
        }
        let hash_level = cursor;

        let introducer = Introducer::lex(&source_text[hash_level..])?;
        cursor += introducer.prefix_size;
        let prefix_len = cursor;
        let multi_line = introducer.kind != MultiLineKind::NotMultiLine;

        let unterminated = |end: usize| StringLiteral {
            text: &source_text[..end],
            content_offset: prefix_len.min(end),
            content_len: end.saturating_sub(prefix_len),
            hash_level,
            kind: introducer.kind,
            is_terminated: false,
        };

        while cursor < bytes.len() {
            match bytes[cursor] {
                b'\\' => {
                    if is_escape_intro(bytes, cursor, hash_level) {
                        cursor += 1 + hash_level;
                        if cursor >= bytes.len() {
                            return Some(unterminated(bytes.len()));
                        }
                        if !multi_line && bytes[cursor] == b'\n' {
                            // An escaped newline truncates a simple
                            // string: it is unterminated on this line.
                            return Some(unterminated(cursor));
                        }
                    }
                    cursor += 1;
                }
                b'\n' if !multi_line => return Some(unterminated(cursor)),
                b'"' | b'\''
                    if matches_terminator(
                        source_text,
                        cursor,
                        introducer.terminator,
                        hash_level,
                    ) =>
                {
                    let terminator_len = introducer.terminator.len() + hash_level;
                    return Some(StringLiteral {
                        text: &source_text[..cursor + terminator_len],
                        content_offset: prefix_len,
                        content_len: cursor - prefix_len,
                        hash_level,
                        kind: introducer.kind,
                        is_terminated: true,
                    });
                }
                _ => cursor += 1,
            }
        }

        Some(unterminated(bytes.len()))
    }

    /// The consumed literal text, including introducer and terminator.
    pub fn text(&self) -> &'s str {
        self.text
    }

    pub fn is_multi_line(&self) -> bool {
        self.kind != MultiLineKind::NotMultiLine
    }

    /// Whether the diagnosed `"""` multi-line form was used.
    pub fn uses_double_quotes(&self) -> bool {
        self.kind == MultiLineKind::MultiLineWithDoubleQuotes
    }

    pub fn is_terminated(&self) -> bool {
        self.is_terminated
    }

    fn content(&self) -> &'s str {
        &self.text[self.content_offset..self.content_offset + self.content_len]
    }

    /// Expands the literal into its string value, diagnosing malformed
    /// indentation, whitespace, and escapes. `literal_start` is the
    /// literal's byte offset in the source.
    pub fn compute_value(
        &self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
        literal_start: usize,
    ) -> String {
        if !self.is_terminated {
            return String::new();
        }
        let indent = if self.is_multi_line() {
            self.check_indent(emitter, literal_start)
        } else {
            ""
        };
        expand_escape_sequences_and_remove_indent(
            emitter,
            self.content(),
            literal_start + self.content_offset,
            self.hash_level,
            indent,
        )
    }

    /// The whitespace-only prefix of the terminator's line, which is
    /// removed from every content line. Diagnoses non-whitespace
    /// content before the terminator.
    fn check_indent(
        &self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
        literal_start: usize,
    ) -> &'s str {
        let (indent_start, indent_end) = compute_indent_of_final_line(self.text);

        if indent_end != self.content_offset + self.content_len {
            emitter.emit(
                literal_start + indent_end,
                DiagnosticKind::ContentBeforeStringTerminator,
                "Only whitespace is permitted before the closing `'''` of a multi-line string.".to_string(),
            );
        }

        &self.text[indent_start..indent_end]
    }
}

/// The whitespace run at the start of the final line of `text`, as a
/// byte range. The text must contain a newline.
fn compute_indent_of_final_line(text: &str) -> (usize, usize) {
    let bytes = text.as_bytes();
    let mut indent_end = bytes.len();
    for i in (0..bytes.len()).rev() {
        if bytes[i] == b'\n' {
            return (i + 1, indent_end);
        }
        if !is_space(bytes[i]) {
            indent_end = i;
        }
    }
    debug_assert!(false, "given text is required to contain a newline");
    (0, 0)
}

/// Expands a `\u{HHHHHH}` escape into UTF-8. `digits_offset` locates
/// the digits in the source for diagnostics.
fn expand_unicode_escape_sequence(
    emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    digits: &str,
    digits_offset: usize,
    result: &mut String,
) -> bool {
    if !can_lex_integer(emitter, digits, digits_offset) {
        return false;
    }
    let code_point = u32::from_str_radix(digits, 16).unwrap_or(u32::MAX);
    if code_point > 0x10FFFF {
        emitter.emit(
            digits_offset,
            DiagnosticKind::UnicodeEscapeTooLarge,
            "Code point specified by `\\u{...}` escape is greater than 0x10FFFF.".to_string(),
        );
        return false;
    }
    if (0xD800..0xE000).contains(&code_point) {
        emitter.emit(
            digits_offset,
            DiagnosticKind::UnicodeEscapeSurrogate,
            "Code point specified by `\\u{...}` escape is a surrogate character.".to_string(),
        );
        return false;
    }

    match char::from_u32(code_point) {
        Some(c) => {
            result.push(c);
            true
        }
        None => {
            debug_assert!(false, "checked code point failed to convert");
            false
        }
    }
}

/// Expands one escape sequence. `pos` sits just past the escape
/// introducer (backslash plus hashes) on entry and past the whole
/// sequence on return.
fn expand_and_consume_escape_sequence(
    emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    content: &str,
    base_offset: usize,
    pos: &mut usize,
    result: &mut String,
) {
    let bytes = content.as_bytes();
    debug_assert!(*pos < bytes.len(), "should have escaped closing delimiter");
    let first = bytes[*pos];
    *pos += 1;

    match first {
        b't' => return result.push('\t'),
        b'n' => return result.push('\n'),
        b'r' => return result.push('\r'),
        b'"' => return result.push('"'),
        b'\'' => return result.push('\''),
        b'\\' => return result.push('\\'),
        b'0' => {
            result.push('\0');
            if *pos < bytes.len() && is_decimal_digit(bytes[*pos]) {
                emitter.emit(
                    base_offset + *pos,
                    DiagnosticKind::DecimalEscapeSequence,
                    "Decimal digit follows `\\0` escape sequence. Use `\\x00` instead of `\\0` if the next character is a digit.".to_string(),
                );
            }
            return;
        }
        b'x' => {
            if bytes.len() - *pos >= 2
                && is_upper_hex_digit(bytes[*pos])
                && is_upper_hex_digit(bytes[*pos + 1])
            {
                let byte = u8::from_str_radix(&content[*pos..*pos + 2], 16)
                    .unwrap_or_default();
                // The escaped byte may not be valid UTF-8 on its own;
                // push it as a unit to keep the value well-formed.
                result.push(byte as char);
                *pos += 2;
                return;
            }
            emitter.emit(
                base_offset + *pos,
                DiagnosticKind::HexadecimalEscapeMissingDigits,
                "Escape sequence `\\x` must be followed by two uppercase hexadecimal digits, for example `\\x0F`.".to_string(),
            );
        }
        b'u' => {
            if *pos < bytes.len() && bytes[*pos] == b'{' {
                let digits_start = *pos + 1;
                let mut digits_end = digits_start;
                while digits_end < bytes.len() && is_upper_hex_digit(bytes[digits_end]) {
                    digits_end += 1;
                }
                if digits_end > digits_start
                    && digits_end < bytes.len()
                    && bytes[digits_end] == b'}'
                {
                    if expand_unicode_escape_sequence(
                        emitter,
                        &content[digits_start..digits_end],
                        base_offset + digits_start,
                        result,
                    ) {
                        *pos = digits_end + 1;
                        return;
                    }
                    // Diagnosed inside; fall through to the literal
                    // rendering below.
                } else {
                    emitter.emit(
                        base_offset + *pos,
                        DiagnosticKind::UnicodeEscapeMissingBracedDigits,
                        "Escape sequence `\\u` must be followed by a braced sequence of uppercase hexadecimal digits, for example `\\u{70AD}`.".to_string(),
                    );
                }
            } else {
                emitter.emit(
                    base_offset + *pos,
                    DiagnosticKind::UnicodeEscapeMissingBracedDigits,
                    "Escape sequence `\\u` must be followed by a braced sequence of uppercase hexadecimal digits, for example `\\u{70AD}`.".to_string(),
                );
            }
        }
        _ => {
            emitter.emit(
                base_offset + *pos - 1,
                DiagnosticKind::UnknownEscapeSequence,
                format!("Unrecognized escape sequence `{}`.", first as char),
            );
        }
    }

    // Failed escapes render their introducing character literally.
    result.push(first as char);
}

/// Expands escapes and strips the terminator's indentation from each
/// content line.
fn expand_escape_sequences_and_remove_indent(
    emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    content: &str,
    base_offset: usize,
    hash_level: usize,
    indent: &str,
) -> String {
    let bytes = content.as_bytes();
    let mut result = String::with_capacity(content.len());
    let mut pos = 0;

    'outer: loop {
        // Line start: strip the indent, or diagnose a mismatch on lines
        // holding anything but whitespace.
        if content[pos..].starts_with(indent) {
            pos += indent.len();
        } else {
            let line_start = pos;
            while pos < bytes.len() && is_horizontal_whitespace(bytes[pos]) {
                pos += 1;
            }
            if !content[pos..].starts_with('\n') {
                emitter.emit(
                    base_offset + line_start,
                    DiagnosticKind::MismatchedIndentInString,
                    "Indentation does not match that of the closing `'''` in multi-line string literal.".to_string(),
                );
            }
        }

        loop {
            let run_end = content[pos..]
                .bytes()
                .position(|b| {
                    b == b'\n' || b == b'\\' || (is_horizontal_whitespace(b) && b != b' ')
                })
                .map(|i| pos + i)
                .unwrap_or(bytes.len());
            result.push_str(&content[pos..run_end]);
            pos = run_end;

            if pos == bytes.len() {
                return result;
            }

            if bytes[pos] == b'\n' {
                // Trailing horizontal whitespace on a line is dropped.
                while result
                    .as_bytes()
                    .last()
                    .is_some_and(|&b| b != b'\n' && is_space(b))
                {
                    result.pop();
                }
                result.push('\n');
                pos += 1;
                continue 'outer;
            }

            if is_horizontal_whitespace(bytes[pos]) {
                debug_assert!(bytes[pos] != b' ', "should not have stopped at a plain space");
                let mut after_space = pos;
                while after_space < bytes.len()
                    && is_horizontal_whitespace(bytes[after_space])
                {
                    after_space += 1;
                }
                if after_space == bytes.len() || bytes[after_space] != b'\n' {
                    emitter.emit(
                        base_offset + pos,
                        DiagnosticKind::InvalidHorizontalWhitespaceInString,
                        "Whitespace other than plain space must be expressed with an escape sequence in a string literal.".to_string(),
                    );
                    result.push_str(&content[pos..after_space]);
                }
                pos = after_space;
                continue;
            }

            // A backslash not followed by this literal's hashes is an
            // ordinary character.
            if !is_escape_intro(bytes, pos, hash_level) {
                result.push('\\');
                pos += 1;
                continue;
            }
            pos += 1 + hash_level;

            if pos < bytes.len() && bytes[pos] == b'\n' {
                // Line continuation: consume the newline and any spaces
                // left at the end of the line.
                pos += 1;
                while result
                    .as_bytes()
                    .last()
                    .is_some_and(|&b| b != b'\n' && is_space(b))
                {
                    result.pop();
                }
                continue 'outer;
            }

            expand_and_consume_escape_sequence(
                emitter,
                content,
                base_offset,
                &mut pos,
                &mut result,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use basalt_common::diagnostics::{Diagnostic, DiagnosticConsumer};
    use basalt_common::source::SourceBuffer;

    use super::*;
    use crate::lexer::LexerDiagnosticEmitter;

    #[derive(Default)]
    struct CollectingConsumer {
        collected: Vec<Diagnostic>,
    }

    impl DiagnosticConsumer for CollectingConsumer {
        fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
            self.collected.push(diagnostic);
        }
    }

    fn compute(text: &str) -> (String, Vec<DiagnosticKind>) {
        let source = SourceBuffer::from_text("test.bas", text.to_string());
        let mut consumer = CollectingConsumer::default();
        let literal = StringLiteral::lex(source.text()).expect("lexes");
        assert!(literal.is_terminated(), "literal should terminate: {text:?}");
        assert_eq!(literal.text(), text);
        let value = {
            let mut emitter = LexerDiagnosticEmitter::for_tests(&source, &mut consumer);
            literal.compute_value(&mut emitter, 0)
        };
        (value, consumer.collected.iter().map(|d| d.kind).collect())
    }

    #[test]
    fn simple_string() {
        let (value, kinds) = compute(r#""hello world""#);
        assert_eq!(value, "hello world");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn simple_string_escapes() {
        let (value, kinds) = compute(r#""a\tb\nc\\d\"e""#);
        assert_eq!(value, "a\tb\nc\\d\"e");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn hex_and_unicode_escapes() {
        let (value, kinds) = compute(r#""\x41\u{48}\u{2764}""#);
        assert_eq!(value, "A\u{48}\u{2764}");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn unicode_escape_limits() {
        let (_, kinds) = compute(r#""\u{110000}""#);
        assert_eq!(kinds, vec![DiagnosticKind::UnicodeEscapeTooLarge]);

        let (_, kinds) = compute(r#""\u{D800}""#);
        assert_eq!(kinds, vec![DiagnosticKind::UnicodeEscapeSurrogate]);

        let (_, kinds) = compute(r#""\u{}""#);
        assert_eq!(kinds, vec![DiagnosticKind::UnicodeEscapeMissingBracedDigits]);
    }

    #[test]
    fn decimal_after_nul_escape() {
        let (value, kinds) = compute(r#""\01""#);
        assert_eq!(value, "\u{0}1");
        assert_eq!(kinds, vec![DiagnosticKind::DecimalEscapeSequence]);
    }

    #[test]
    fn short_hex_escape() {
        let (value, kinds) = compute(r#""\x4""#);
        assert_eq!(value, "x4");
        assert_eq!(kinds, vec![DiagnosticKind::HexadecimalEscapeMissingDigits]);
    }

    #[test]
    fn unknown_escape() {
        let (value, kinds) = compute(r#""\q""#);
        assert_eq!(value, "q");
        assert_eq!(kinds, vec![DiagnosticKind::UnknownEscapeSequence]);
    }

    #[test]
    fn tab_in_content_is_diagnosed() {
        let (value, kinds) = compute("\"a\tb\"");
        assert_eq!(value, "a\tb");
        assert_eq!(kinds, vec![DiagnosticKind::InvalidHorizontalWhitespaceInString]);
    }

    #[test]
    fn multi_line_with_indent_removal() {
        let (value, kinds) = compute("'''\n  hello\n  '''");
        assert_eq!(value, "hello\n");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn multi_line_keeps_deeper_indentation() {
        let (value, kinds) = compute("'''\n  a\n    b\n  '''");
        assert_eq!(value, "a\n  b\n");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn multi_line_file_type_indicator() {
        let literal = StringLiteral::lex("'''json\n{}\n'''").expect("lexes");
        assert!(literal.is_multi_line());
        assert!(literal.is_terminated());
        let (value, kinds) = compute("'''json\n{}\n'''");
        assert_eq!(value, "{}\n");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn mismatched_indent_is_diagnosed() {
        let (value, kinds) = compute("'''\n  ok\n bad\n  '''");
        assert_eq!(kinds, vec![DiagnosticKind::MismatchedIndentInString]);
        assert_eq!(value, "ok\nbad\n");
    }

    #[test]
    fn content_before_terminator_is_diagnosed() {
        let (_, kinds) = compute("'''\nabc\nxx '''");
        assert!(kinds.contains(&DiagnosticKind::ContentBeforeStringTerminator));
    }

    #[test]
    fn line_continuation() {
        let (value, kinds) = compute("'''\na\\\nb\n'''");
        assert_eq!(value, "ab\n");
        assert_eq!(kinds, vec![]);
    }

    #[test]
    fn raw_hashed_strings() {
        let (value, kinds) = compute(r##"#"contains "quotes" fine"#"##);
        assert_eq!(value, r#"contains "quotes" fine"#);
        assert_eq!(kinds, vec![]);

        // Without the hash, the backslash is a literal character.
        let (value, _) = compute(r##"#"a\nb"#"##);
        assert_eq!(value, r"a\nb");

        // With the hash, it escapes.
        let (value, _) = compute(r##"#"a\#nb"#"##);
        assert_eq!(value, "a\nb");
    }

    #[test]
    fn unterminated_forms() {
        let literal = StringLiteral::lex("\"abc").expect("lexes");
        assert!(!literal.is_terminated());
        assert_eq!(literal.text(), "\"abc");

        let literal = StringLiteral::lex("\"abc\ndef\"").expect("lexes");
        assert!(!literal.is_terminated());
        assert_eq!(literal.text(), "\"abc");

        let literal = StringLiteral::lex("'''\nnever closed").expect("lexes");
        assert!(!literal.is_terminated());

        // An escaped newline truncates a simple string.
        let literal = StringLiteral::lex("\"abc\\\ndef\"").expect("lexes");
        assert!(!literal.is_terminated());
        assert_eq!(literal.text(), "\"abc\\");
    }

    #[test]
    fn double_quoted_multi_line_is_flagged() {
        let literal = StringLiteral::lex("\"\"\"\nx\n\"\"\"").expect("lexes");
        assert!(literal.is_multi_line());
        assert!(literal.uses_double_quotes());
        assert!(literal.is_terminated());
    }

    #[test]
    fn non_strings_do_not_lex() {
        assert!(StringLiteral::lex("x").is_none());
        assert!(StringLiteral::lex("#x").is_none());
        assert!(StringLiteral::lex("'x'").is_none());
        assert!(StringLiteral::lex("").is_none());
    }
}
