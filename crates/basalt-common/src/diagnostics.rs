//! Diagnostic infrastructure shared by every front-end phase.
//!
//! A diagnostic is raised through a [`DiagnosticEmitter`], which pairs a
//! [`DiagnosticLocationTranslator`] (mapping a phase-specific location
//! handle to `file:line:column`) with a [`DiagnosticConsumer`] (deciding
//! what happens to the finished record). Consumers compose: the error
//! tracker and the sorter both wrap another consumer.

use std::io::Write;

use serde::Serialize;

/// Severity of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticLevel {
    Warning,
    Error,
}

/// Every distinct diagnostic message the front-end can produce.
///
/// The set is closed; one variant per message template. Grouped by the
/// phase that raises them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticKind {
    // ── Source acquisition ─────────────────────────────────────────────
    ErrorOpeningFile,
    ErrorStattingFile,
    FileTooLarge,
    ErrorReadingFile,
    SourceNotUtf8,

    // ── Lexing ─────────────────────────────────────────────────────────
    TrailingComment,
    NoWhitespaceAfterCommentIntroducer,
    UnrecognizedCharacters,
    UnknownBaseSpecifier,
    EmptyDigitSequence,
    InvalidDigit,
    InvalidDigitSeparator,
    IrregularDigitSeparators,
    TooManyDigits,
    BinaryRealLiteral,
    WrongRealLiteralExponent,
    UnterminatedString,
    MultiLineStringWithDoubleQuotes,
    ContentBeforeStringTerminator,
    MismatchedIndentInString,
    InvalidHorizontalWhitespaceInString,
    UnknownEscapeSequence,
    DecimalEscapeSequence,
    HexadecimalEscapeMissingDigits,
    UnicodeEscapeMissingBracedDigits,
    UnicodeEscapeTooLarge,
    UnicodeEscapeSurrogate,
    UnmatchedClosing,
    MismatchedClosing,

    // ── Parsing ────────────────────────────────────────────────────────
    UnrecognizedDeclaration,
    ExpectedDeclarationName,
    ExpectedDeclarationSemi,
    ExpectedDeclarationSemiOrDefinition,
    ExpectedCodeBlock,
    ExpectedExpression,
    ExpectedParenAfter,
    UnexpectedTokenAfterListElement,
    ExpectedCloseSymbol,
    OperatorRequiresParentheses,
    UnaryOperatorRequiresParentheses,
    ExpectedSemiAfterExpression,
    ExpectedArraySemi,
    ExpectedIdentifierAfterPeriod,
    ExpectedStructLiteralField,
    ExpectedThenAfterIf,
    ExpectedElseAfterIf,
    ExpectedMatchCaseArrow,
    UnexpectedTokenInMatchBlock,
    ExpectedParameterName,
    ExpectedBindingColon,
    ExpectedLetInitializer,
}

impl DiagnosticKind {
    /// The severity this kind is reported at.
    pub fn level(self) -> DiagnosticLevel {
        // Every current kind is an error; the level distinction is kept in
        // the data model for consumers that filter by severity.
        DiagnosticLevel::Error
    }
}

/// A resolved source position: file, 1-based line, 1-based column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticLocation {
    pub file_name: String,
    pub line_number: u32,
    pub column_number: u32,
}

/// A finished diagnostic record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub level: DiagnosticLevel,
    pub location: DiagnosticLocation,
    pub message: String,
}

/// Receives finished diagnostics.
pub trait DiagnosticConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic);

    /// Flushes any buffered diagnostics.
    fn flush(&mut self) {}
}

/// Maps a phase-specific location handle to a [`DiagnosticLocation`].
///
/// The byte-offset translator over a tokenized buffer is the primitive;
/// the token translator defers to it through the token's start offset.
pub trait DiagnosticLocationTranslator<Loc> {
    fn get_location(&self, loc: Loc) -> DiagnosticLocation;
}

/// The only way to raise a diagnostic: translates the location, stamps
/// the level, and hands the record to the consumer.
pub struct DiagnosticEmitter<'t, 'c, Loc> {
    translator: &'t dyn DiagnosticLocationTranslator<Loc>,
    consumer: &'c mut dyn DiagnosticConsumer,
}

impl<'t, 'c, Loc> DiagnosticEmitter<'t, 'c, Loc> {
    pub fn new(
        translator: &'t dyn DiagnosticLocationTranslator<Loc>,
        consumer: &'c mut dyn DiagnosticConsumer,
    ) -> Self {
        Self { translator, consumer }
    }

    pub fn emit(&mut self, loc: Loc, kind: DiagnosticKind, message: String) {
        self.consumer.handle_diagnostic(Diagnostic {
            kind,
            level: kind.level(),
            location: self.translator.get_location(loc),
            message,
        });
    }
}

/// Prints diagnostics to stderr as `file:line:col: message`.
#[derive(Default)]
pub struct ConsoleDiagnosticConsumer;

impl DiagnosticConsumer for ConsoleDiagnosticConsumer {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        let stderr = std::io::stderr();
        let mut out = stderr.lock();
        // Ignore stderr write failures; there is nowhere left to report.
        let _ = writeln!(
            out,
            "{}:{}:{}: {}",
            diagnostic.location.file_name,
            diagnostic.location.line_number,
            diagnostic.location.column_number,
            diagnostic.message
        );
    }
}

/// Wraps another consumer and records whether an error-level diagnostic
/// has passed through.
pub struct ErrorTrackingDiagnosticConsumer<'a> {
    next_consumer: &'a mut dyn DiagnosticConsumer,
    seen_error: bool,
}

impl<'a> ErrorTrackingDiagnosticConsumer<'a> {
    pub fn new(next_consumer: &'a mut dyn DiagnosticConsumer) -> Self {
        Self { next_consumer, seen_error: false }
    }

    /// Reset whether an error has been seen.
    pub fn reset(&mut self) {
        self.seen_error = false;
    }

    /// Whether an error has been seen since construction or the last reset.
    pub fn seen_error(&self) -> bool {
        self.seen_error
    }
}

impl DiagnosticConsumer for ErrorTrackingDiagnosticConsumer<'_> {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.seen_error |= diagnostic.level == DiagnosticLevel::Error;
        self.next_consumer.handle_diagnostic(diagnostic);
    }

    fn flush(&mut self) {
        self.next_consumer.flush();
    }
}

/// Buffers diagnostics and forwards them in `(line, column)` order on
/// flush. Useful when lexing emits out of source order during recovery.
pub struct SortingDiagnosticConsumer<'a> {
    next_consumer: &'a mut dyn DiagnosticConsumer,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> SortingDiagnosticConsumer<'a> {
    pub fn new(next_consumer: &'a mut dyn DiagnosticConsumer) -> Self {
        Self { next_consumer, diagnostics: Vec::new() }
    }
}

impl DiagnosticConsumer for SortingDiagnosticConsumer<'_> {
    fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn flush(&mut self) {
        self.diagnostics.sort_by_key(|d| {
            (d.location.line_number, d.location.column_number)
        });
        for diagnostic in self.diagnostics.drain(..) {
            self.next_consumer.handle_diagnostic(diagnostic);
        }
        self.next_consumer.flush();
    }
}

impl Drop for SortingDiagnosticConsumer<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Discards all diagnostics.
#[derive(Default)]
pub struct NullDiagnosticConsumer;

impl DiagnosticConsumer for NullDiagnosticConsumer {
    fn handle_diagnostic(&mut self, _diagnostic: Diagnostic) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects diagnostics for inspection.
    #[derive(Default)]
    struct CollectingConsumer {
        collected: Vec<Diagnostic>,
    }

    impl DiagnosticConsumer for CollectingConsumer {
        fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
            self.collected.push(diagnostic);
        }
    }

    struct FixedTranslator;

    impl DiagnosticLocationTranslator<(u32, u32)> for FixedTranslator {
        fn get_location(&self, loc: (u32, u32)) -> DiagnosticLocation {
            DiagnosticLocation {
                file_name: "test.bas".to_string(),
                line_number: loc.0,
                column_number: loc.1,
            }
        }
    }

    fn emit_at(
        consumer: &mut dyn DiagnosticConsumer,
        line: u32,
        column: u32,
        kind: DiagnosticKind,
    ) {
        let translator = FixedTranslator;
        let mut emitter = DiagnosticEmitter::new(&translator, consumer);
        emitter.emit((line, column), kind, "message".to_string());
    }

    #[test]
    fn emitter_translates_location() {
        let mut collector = CollectingConsumer::default();
        emit_at(&mut collector, 3, 7, DiagnosticKind::UnterminatedString);

        assert_eq!(collector.collected.len(), 1);
        let diagnostic = &collector.collected[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::UnterminatedString);
        assert_eq!(diagnostic.level, DiagnosticLevel::Error);
        assert_eq!(diagnostic.location.file_name, "test.bas");
        assert_eq!(diagnostic.location.line_number, 3);
        assert_eq!(diagnostic.location.column_number, 7);
    }

    #[test]
    fn error_tracker_sees_errors() {
        let mut collector = CollectingConsumer::default();
        let mut tracker = ErrorTrackingDiagnosticConsumer::new(&mut collector);
        assert!(!tracker.seen_error());

        emit_at(&mut tracker, 1, 1, DiagnosticKind::TrailingComment);
        assert!(tracker.seen_error());

        tracker.reset();
        assert!(!tracker.seen_error());
    }

    #[test]
    fn sorting_consumer_orders_by_line_then_column() {
        let mut collector = CollectingConsumer::default();
        {
            let mut sorter = SortingDiagnosticConsumer::new(&mut collector);
            emit_at(&mut sorter, 2, 5, DiagnosticKind::InvalidDigit);
            emit_at(&mut sorter, 1, 9, DiagnosticKind::TrailingComment);
            emit_at(&mut sorter, 2, 1, DiagnosticKind::UnterminatedString);
        }

        let positions: Vec<(u32, u32)> = collector
            .collected
            .iter()
            .map(|d| (d.location.line_number, d.location.column_number))
            .collect();
        assert_eq!(positions, vec![(1, 9), (2, 1), (2, 5)]);
    }

    #[test]
    fn null_consumer_discards() {
        let mut null = NullDiagnosticConsumer;
        emit_at(&mut null, 1, 1, DiagnosticKind::UnterminatedString);
    }
}
