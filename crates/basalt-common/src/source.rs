//! Source buffers.
//!
//! A [`SourceBuffer`] owns the text of one input file: a name plus a
//! contiguous, immutable byte range. The text is pinned for the buffer's
//! lifetime, so downstream structures can hold byte offsets into it.

use std::fs::File;

use memmap2::Mmap;

use crate::diagnostics::{
    DiagnosticConsumer, DiagnosticEmitter, DiagnosticKind, DiagnosticLocation,
    DiagnosticLocationTranslator,
};

/// Input files above this size are rejected at open time.
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Translates a bare filename into a location for diagnostics raised
/// before any text exists to point into.
struct FilenameTranslator;

impl DiagnosticLocationTranslator<&str> for FilenameTranslator {
    fn get_location(&self, filename: &str) -> DiagnosticLocation {
        DiagnosticLocation {
            file_name: filename.to_string(),
            line_number: 1,
            column_number: 1,
        }
    }
}

enum Storage {
    Owned(String),
    // Invariant: validated as UTF-8 at construction.
    Mapped(Mmap),
}

/// The text of one input file.
pub struct SourceBuffer {
    filename: String,
    storage: Storage,
}

impl SourceBuffer {
    /// Creates a buffer from a string, for tests and in-memory input.
    pub fn from_text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self { filename: filename.into(), storage: Storage::Owned(text.into()) }
    }

    /// Creates a buffer by memory-mapping a file.
    ///
    /// Each failure (open, stat, size ceiling, map, UTF-8 validation)
    /// emits a distinct diagnostic keyed by the filename and yields
    /// `None`.
    pub fn from_file(
        filename: &str,
        consumer: &mut dyn DiagnosticConsumer,
    ) -> Option<SourceBuffer> {
        let translator = FilenameTranslator;
        let mut emitter = DiagnosticEmitter::new(&translator, consumer);

        let file = match File::open(filename) {
            Ok(file) => file,
            Err(error) => {
                emitter.emit(
                    filename,
                    DiagnosticKind::ErrorOpeningFile,
                    format!("Error opening file for read: {error}"),
                );
                return None;
            }
        };

        let metadata = match file.metadata() {
            Ok(metadata) => metadata,
            Err(error) => {
                emitter.emit(
                    filename,
                    DiagnosticKind::ErrorStattingFile,
                    format!("Error statting file: {error}"),
                );
                return None;
            }
        };

        let size = metadata.len();
        if size >= MAX_FILE_SIZE {
            emitter.emit(
                filename,
                DiagnosticKind::FileTooLarge,
                format!("File is over the 2GiB input limit; size is {size} bytes."),
            );
            return None;
        }

        // Mapping a zero-length file is an error on several platforms.
        if size == 0 {
            return Some(SourceBuffer {
                filename: filename.to_string(),
                storage: Storage::Owned(String::new()),
            });
        }

        // Safety: the map is read-only and the file handle is kept alive
        // by the mapping for the buffer's lifetime.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => {
                emitter.emit(
                    filename,
                    DiagnosticKind::ErrorReadingFile,
                    format!("Error reading file: {error}"),
                );
                return None;
            }
        };

        if std::str::from_utf8(&mmap).is_err() {
            emitter.emit(
                filename,
                DiagnosticKind::SourceNotUtf8,
                "File contents are not valid UTF-8.".to_string(),
            );
            return None;
        }

        Some(SourceBuffer {
            filename: filename.to_string(),
            storage: Storage::Mapped(mmap),
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The full source text. Stable for the buffer's lifetime.
    pub fn text(&self) -> &str {
        match &self.storage {
            Storage::Owned(text) => text,
            // Safety: validated as UTF-8 when the mapping was created.
            Storage::Mapped(mmap) => unsafe { std::str::from_utf8_unchecked(mmap) },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::diagnostics::{Diagnostic, DiagnosticConsumer};

    #[derive(Default)]
    struct CollectingConsumer {
        collected: Vec<Diagnostic>,
    }

    impl DiagnosticConsumer for CollectingConsumer {
        fn handle_diagnostic(&mut self, diagnostic: Diagnostic) {
            self.collected.push(diagnostic);
        }
    }

    #[test]
    fn from_text_owns_the_string() {
        let buffer = SourceBuffer::from_text("test.bas", "fn F();");
        assert_eq!(buffer.filename(), "test.bas");
        assert_eq!(buffer.text(), "fn F();");
    }

    #[test]
    fn from_file_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "var x: i32 = 1;").unwrap();

        let mut consumer = CollectingConsumer::default();
        let buffer =
            SourceBuffer::from_file(file.path().to_str().unwrap(), &mut consumer)
                .unwrap();
        assert_eq!(buffer.text(), "var x: i32 = 1;");
        assert!(consumer.collected.is_empty());
    }

    #[test]
    fn from_file_handles_empty_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut consumer = CollectingConsumer::default();
        let buffer =
            SourceBuffer::from_file(file.path().to_str().unwrap(), &mut consumer)
                .unwrap();
        assert_eq!(buffer.text(), "");
    }

    #[test]
    fn missing_file_emits_open_diagnostic() {
        let mut consumer = CollectingConsumer::default();
        let buffer =
            SourceBuffer::from_file("definitely/not/a/file.bas", &mut consumer);
        assert!(buffer.is_none());
        assert_eq!(consumer.collected.len(), 1);
        assert_eq!(consumer.collected[0].kind, DiagnosticKind::ErrorOpeningFile);
        assert_eq!(
            consumer.collected[0].location.file_name,
            "definitely/not/a/file.bas"
        );
    }

    #[test]
    fn non_utf8_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x66, 0x6E, 0xFF, 0xFE]).unwrap();

        let mut consumer = CollectingConsumer::default();
        let buffer =
            SourceBuffer::from_file(file.path().to_str().unwrap(), &mut consumer);
        assert!(buffer.is_none());
        assert_eq!(consumer.collected[0].kind, DiagnosticKind::SourceNotUtf8);
    }
}
