//! Line input parsed into session commands.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    Ask(String),
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Commands:
  /upload <path>   upload a PDF to ask questions about
  /status          show server, document and transcript state
  /help            show this help
  /quit            leave the session
Anything else is sent as a question about the active document.";

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name {
        "upload" | "u" if !argument.is_empty() => Command::Upload(PathBuf::from(argument)),
        "status" => Command::Status,
        "help" | "h" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}
