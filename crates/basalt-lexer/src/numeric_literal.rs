//! Numeric literal scanning and value computation.
//!
//! Lexing is greedy: it consumes everything that could belong to a
//! numeric literal, recording where the radix point and the exponent
//! introducer sit. A separate parsing phase then validates the digits,
//! separators, and exponent for the literal's radix and computes the
//! arbitrary-precision value.

use basalt_common::diagnostics::DiagnosticKind;
use basalt_common::strings::{is_alnum, is_decimal_digit, is_lower};
use num_bigint::{BigInt, BigUint, Sign};

use crate::helpers::can_lex_integer;
use crate::lexer::LexerDiagnosticEmitter;

/// The base of a numeric literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Radix {
    Binary = 2,
    Decimal = 10,
    Hexadecimal = 16,
}

impl std::fmt::Display for Radix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Radix::Binary => write!(f, "binary"),
            Radix::Decimal => write!(f, "decimal"),
            Radix::Hexadecimal => write!(f, "hexadecimal"),
        }
    }
}

/// The computed value of a numeric literal.
#[derive(Debug)]
pub enum NumericValue {
    Integer(BigUint),
    Real {
        /// `Binary` or `Decimal`; hexadecimal literals scale into a
        /// power-of-two exponent.
        radix: Radix,
        mantissa: BigUint,
        exponent: BigInt,
    },
    /// The literal is malformed beyond producing a value.
    UnrecoverableError,
}

/// A greedily lexed numeric literal, not yet validated.
#[derive(Clone, Copy, Debug)]
pub struct NumericLiteral<'s> {
    text: &'s str,
    /// Offset of `.`, or `text.len()` when absent.
    radix_point: usize,
    /// Offset of the exponent introducer, or `text.len()` when absent.
    exponent: usize,
}

impl<'s> NumericLiteral<'s> {
    /// Lexes a numeric literal prefix of `source_text`.
    ///
    /// Consumes as many characters as could possibly form a literal;
    /// validation happens in [`NumericLiteral::compute_value`].
    pub fn lex(source_text: &'s str) -> Option<NumericLiteral<'s>> {
        let bytes = source_text.as_bytes();
        if bytes.is_empty() || !is_decimal_digit(bytes[0]) {
            return None;
        }

        let mut radix_point = None;
        let mut exponent = None;
        let mut seen_plus_minus = false;

        let n = bytes.len();
        let mut i = 1;
        while i != n {
            let c = bytes[i];
            if is_alnum(c) || c == b'_' {
                // Only lower-case exponent introducers are candidates,
                // and only once a radix point has been seen.
                if is_lower(c) && radix_point.is_some() && !seen_plus_minus {
                    exponent = Some(i);
                }
                i += 1;
                continue;
            }

            if c == b'.' && i + 1 != n && is_alnum(bytes[i + 1]) && radix_point.is_none()
            {
                radix_point = Some(i);
                i += 1;
                continue;
            }

            if (c == b'+' || c == b'-')
                && exponent == Some(i - 1)
                && i + 1 != n
                && is_alnum(bytes[i + 1])
            {
                debug_assert!(!seen_plus_minus, "should only consume one + or -");
                seen_plus_minus = true;
                i += 1;
                continue;
            }
            break;
        }

        Some(NumericLiteral {
            text: &source_text[..i],
            radix_point: radix_point.unwrap_or(i),
            exponent: exponent.unwrap_or(i),
        })
    }

    /// The consumed literal text.
    pub fn text(&self) -> &'s str {
        self.text
    }

    /// Validates the literal and computes its value. `literal_start` is
    /// the literal's byte offset in the source, for diagnostics.
    pub fn compute_value(
        &self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
        literal_start: usize,
    ) -> NumericValue {
        let mut parser = Parser::new(*self, literal_start);
        if !parser.check(emitter) {
            return NumericValue::UnrecoverableError;
        }

        if parser.is_integer() {
            return NumericValue::Integer(parser.mantissa());
        }

        NumericValue::Real {
            radix: if parser.radix == Radix::Decimal {
                Radix::Decimal
            } else {
                Radix::Binary
            },
            mantissa: parser.mantissa(),
            exponent: parser.exponent(),
        }
    }
}

struct CheckDigitSequenceResult {
    ok: bool,
    has_digit_separators: bool,
}

/// The validation and value-computation phase.
struct Parser<'s> {
    literal: NumericLiteral<'s>,
    literal_start: usize,
    radix: Radix,
    int_part: &'s str,
    /// Offset of `int_part` within the literal text (skips any radix
    /// prefix).
    int_part_offset: usize,
    fract_part: &'s str,
    exponent_part: &'s str,
    exponent_part_offset: usize,
    mantissa_needs_cleaning: bool,
    exponent_needs_cleaning: bool,
    exponent_is_negative: bool,
}

impl<'s> Parser<'s> {
    fn new(literal: NumericLiteral<'s>, literal_start: usize) -> Self {
        let text = literal.text;
        let mut int_part = &text[..literal.radix_point];
        let mut int_part_offset = 0;
        let mut radix = Radix::Decimal;
        if let Some(stripped) = int_part.strip_prefix("0x") {
            int_part = stripped;
            int_part_offset = 2;
            radix = Radix::Hexadecimal;
        } else if let Some(stripped) = int_part.strip_prefix("0b") {
            int_part = stripped;
            int_part_offset = 2;
            radix = Radix::Binary;
        }

        let fract_start = (literal.radix_point + 1).min(text.len());
        let fract_part = &text[fract_start..literal.exponent.max(fract_start)];

        let exponent_start = (literal.exponent + 1).min(text.len());
        let mut exponent_part = &text[exponent_start..];
        let mut exponent_part_offset = exponent_start;
        let mut exponent_is_negative = false;
        if let Some(stripped) = exponent_part.strip_prefix('+') {
            exponent_part = stripped;
            exponent_part_offset += 1;
        } else if let Some(stripped) = exponent_part.strip_prefix('-') {
            exponent_part = stripped;
            exponent_part_offset += 1;
            exponent_is_negative = true;
        }

        Self {
            literal,
            literal_start,
            radix,
            int_part,
            int_part_offset,
            fract_part,
            exponent_part,
            exponent_part_offset,
            mantissa_needs_cleaning: false,
            exponent_needs_cleaning: false,
            exponent_is_negative,
        }
    }

    /// Whether the literal has no fractional or exponent part.
    fn is_integer(&self) -> bool {
        self.literal.radix_point == self.literal.text.len()
    }

    fn check(&mut self, emitter: &mut LexerDiagnosticEmitter<'_, '_>) -> bool {
        self.check_leading_zero(emitter)
            && self.check_int_part(emitter)
            && self.check_fractional_part(emitter)
            && self.check_exponent_part(emitter)
    }

    /// Rejects a `0` prefix on a non-zero decimal integer part.
    fn check_leading_zero(&mut self, emitter: &mut LexerDiagnosticEmitter<'_, '_>) -> bool {
        if self.radix == Radix::Decimal
            && self.int_part.starts_with('0')
            && self.int_part != "0"
        {
            emitter.emit(
                self.literal_start,
                DiagnosticKind::UnknownBaseSpecifier,
                "Unknown base specifier in numeric literal.".to_string(),
            );
            return false;
        }
        true
    }

    fn check_int_part(&mut self, emitter: &mut LexerDiagnosticEmitter<'_, '_>) -> bool {
        let offset = self.literal_start + self.int_part_offset;
        let result =
            self.check_digit_sequence(emitter, self.int_part, self.radix, true, offset);
        self.mantissa_needs_cleaning |= result.has_digit_separators;
        result.ok
    }

    fn check_fractional_part(
        &mut self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    ) -> bool {
        if self.is_integer() {
            return true;
        }

        if self.radix == Radix::Binary {
            emitter.emit(
                self.literal_start + self.literal.radix_point,
                DiagnosticKind::BinaryRealLiteral,
                "Binary real number literals are not supported.".to_string(),
            );
        }

        // The mantissa digits span the radix point, which must be
        // stripped before parsing.
        self.mantissa_needs_cleaning = true;

        let offset = self.literal_start + self.literal.radix_point + 1;
        self.check_digit_sequence(emitter, self.fract_part, self.radix, false, offset)
            .ok
    }

    fn check_exponent_part(
        &mut self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    ) -> bool {
        if self.literal.exponent == self.literal.text.len() {
            return true;
        }

        let expected = if self.radix == Radix::Decimal { 'e' } else { 'p' };
        if self.literal.text.as_bytes()[self.literal.exponent] != expected as u8 {
            emitter.emit(
                self.literal_start + self.literal.exponent,
                DiagnosticKind::WrongRealLiteralExponent,
                format!("Expected '{expected}' to introduce exponent."),
            );
            return false;
        }

        let offset = self.literal_start + self.exponent_part_offset;
        let result = self.check_digit_sequence(
            emitter,
            self.exponent_part,
            Radix::Decimal,
            true,
            offset,
        );
        self.exponent_needs_cleaning = result.has_digit_separators;
        result.ok
    }

    /// Validates digits and separator placement for one digit sequence.
    /// `offset` is the sequence's position in the source.
    fn check_digit_sequence(
        &self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
        text: &str,
        radix: Radix,
        allow_digit_separators: bool,
        offset: usize,
    ) -> CheckDigitSequenceResult {
        let valid = |c: u8| match radix {
            Radix::Binary => c == b'0' || c == b'1',
            Radix::Decimal => c.is_ascii_digit(),
            Radix::Hexadecimal => c.is_ascii_digit() || (b'A'..=b'F').contains(&c),
        };

        let bytes = text.as_bytes();
        let mut num_digit_separators = 0;

        for (i, &c) in bytes.iter().enumerate() {
            if valid(c) {
                continue;
            }

            if c == b'_' {
                // A separator may not start or end the sequence, nor
                // sit beside another separator.
                if !allow_digit_separators
                    || i == 0
                    || bytes[i - 1] == b'_'
                    || i + 1 == bytes.len()
                {
                    emitter.emit(
                        offset + i,
                        DiagnosticKind::InvalidDigitSeparator,
                        "Misplaced digit separator in numeric literal.".to_string(),
                    );
                }
                num_digit_separators += 1;
                continue;
            }

            emitter.emit(
                offset + i,
                DiagnosticKind::InvalidDigit,
                format!("Invalid digit '{}' in {radix} numeric literal.", c as char),
            );
            return CheckDigitSequenceResult { ok: false, has_digit_separators: false };
        }

        if num_digit_separators == bytes.len() {
            emitter.emit(
                offset,
                DiagnosticKind::EmptyDigitSequence,
                "Empty digit sequence in numeric literal.".to_string(),
            );
            return CheckDigitSequenceResult { ok: false, has_digit_separators: false };
        }

        if num_digit_separators != 0 {
            self.check_digit_separator_placement(
                emitter,
                text,
                radix,
                num_digit_separators,
                offset,
            );
        }

        if !can_lex_integer(emitter, text, offset) {
            return CheckDigitSequenceResult { ok: false, has_digit_separators: false };
        }

        CheckDigitSequenceResult { ok: true, has_digit_separators: num_digit_separators != 0 }
    }

    /// Decimal separators must sit every 3 digits from the right and
    /// hexadecimal ones every 4; binary is unconstrained.
    fn check_digit_separator_placement(
        &self,
        emitter: &mut LexerDiagnosticEmitter<'_, '_>,
        text: &str,
        radix: Radix,
        num_digit_separators: usize,
        offset: usize,
    ) {
        debug_assert_eq!(
            text.bytes().filter(|&b| b == b'_').count(),
            num_digit_separators,
            "given wrong number of digit separators"
        );

        if radix == Radix::Binary {
            return;
        }

        let stride = if radix == Radix::Decimal { 4 } else { 5 };
        let bytes = text.as_bytes();
        let mut remaining = num_digit_separators;
        let mut pos = bytes.len();
        let mut regular = true;
        while pos >= stride {
            pos -= stride;
            if bytes[pos] != b'_' {
                regular = false;
                break;
            }
            remaining -= 1;
        }

        if !regular || remaining != 0 {
            emitter.emit(
                offset,
                DiagnosticKind::IrregularDigitSeparators,
                format!(
                    "Digit separators in {radix} number should appear every {} characters from the right.",
                    if radix == Radix::Decimal { 3 } else { 4 }
                ),
            );
        }
    }

    /// Parses a digit string, dropping `_` and `.` when present.
    fn parse_integer(digits: &str, radix: Radix, needs_cleaning: bool) -> BigUint {
        let parse = |digits: &[u8]| BigUint::parse_bytes(digits, radix as u32);
        let value = if needs_cleaning {
            let cleaned: Vec<u8> = digits
                .bytes()
                .filter(|&b| b != b'_' && b != b'.')
                .collect();
            parse(&cleaned)
        } else {
            parse(digits.as_bytes())
        };
        // The digit sequences were validated by check(); parsing them
        // cannot fail.
        debug_assert!(value.is_some(), "validated digits failed to parse");
        value.unwrap_or_default()
    }

    /// The mantissa: the integer part, or the concatenated integer and
    /// fractional digits for a real literal.
    fn mantissa(&self) -> BigUint {
        let digits = if self.is_integer() {
            self.int_part
        } else {
            let start = self.int_part_offset;
            &self.literal.text[start..self.literal.exponent]
        };
        Self::parse_integer(digits, self.radix, self.mantissa_needs_cleaning)
    }

    /// The exponent, adjusted down by the fractional digit count (times
    /// four for hexadecimal, where each digit is four bits).
    fn exponent(&self) -> BigInt {
        let mut exponent = BigInt::from(0);
        if !self.exponent_part.is_empty() {
            let magnitude = Self::parse_integer(
                self.exponent_part,
                Radix::Decimal,
                self.exponent_needs_cleaning,
            );
            let sign = if self.exponent_is_negative { Sign::Minus } else { Sign::Plus };
            exponent = BigInt::from_biguint(sign, magnitude);
        }

        let mut excess_exponent = self.fract_part.len();
        if self.radix == Radix::Hexadecimal {
            excess_exponent *= 4;
        }
        exponent - BigInt::from(excess_exponent)
    }
}
