//! The Basalt front-end driver.
//!
//! Wires source buffers through the lexer and parser and prints the
//! requested dump. Exits non-zero when any error-level diagnostic was
//! produced or the produced structures carry error flags.

use std::process::ExitCode;

use basalt_common::diagnostics::{
    ConsoleDiagnosticConsumer, ErrorTrackingDiagnosticConsumer,
};
use basalt_common::source::SourceBuffer;
use basalt_lexer::TokenizedBuffer;
use basalt_parser::ParseTree;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "basaltc", about = "Basalt compiler front-end driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lex a source file and print its token stream.
    DumpTokens { file: String },
    /// Lex and parse a source file and print its parse tree.
    DumpParseTree { file: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let succeeded = match cli.command {
        Command::DumpTokens { file } => run_dump_tokens(&file),
        Command::DumpParseTree { file } => run_dump_parse_tree(&file),
    };
    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_dump_tokens(file: &str) -> bool {
    let mut console = ConsoleDiagnosticConsumer;
    let mut consumer = ErrorTrackingDiagnosticConsumer::new(&mut console);

    let Some(source) = SourceBuffer::from_file(file, &mut consumer) else {
        return false;
    };
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);

    let mut dump = String::new();
    if tokens.print(&mut dump).is_err() {
        return false;
    }
    print!("{dump}");

    !tokens.has_errors() && !consumer.seen_error()
}

fn run_dump_parse_tree(file: &str) -> bool {
    let mut console = ConsoleDiagnosticConsumer;
    let mut consumer = ErrorTrackingDiagnosticConsumer::new(&mut console);

    let Some(source) = SourceBuffer::from_file(file, &mut consumer) else {
        return false;
    };
    let tokens = TokenizedBuffer::lex(&source, &mut consumer);
    let tree = ParseTree::parse(&tokens, &mut consumer);

    let mut dump = String::new();
    if tree.print(&mut dump).is_err() {
        return false;
    }
    print!("{dump}");

    !tokens.has_errors() && !tree.has_errors() && !consumer.seen_error()
}
