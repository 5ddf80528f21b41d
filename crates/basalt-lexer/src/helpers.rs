//! Guards shared by the literal parsers.

use basalt_common::diagnostics::DiagnosticKind;

use crate::lexer::LexerDiagnosticEmitter;

/// Digit sequences longer than this are rejected before reaching the
/// arbitrary-precision parser, which degrades badly on adversarial
/// inputs.
const DIGIT_LIMIT: usize = 1000;

/// Checks that `text` is short enough to parse as an integer,
/// diagnosing at `offset` when it is not.
pub(crate) fn can_lex_integer(
    emitter: &mut LexerDiagnosticEmitter<'_, '_>,
    text: &str,
    offset: usize,
) -> bool {
    if text.len() > DIGIT_LIMIT {
        emitter.emit(
            offset,
            DiagnosticKind::TooManyDigits,
            format!(
                "Found a sequence of {} digits, which is greater than the limit of {}.",
                text.len(),
                DIGIT_LIMIT
            ),
        );
        return false;
    }
    true
}
