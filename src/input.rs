//! Terminal and file seams
//!
//! Secure prompts and File-typed flags are the only places the parser
//! touches the outside world during a parse. Both sit behind small traits
//! so tests inject deterministic inputs.

use std::io::{self, BufRead, Write};
use std::path::Path;

/// Reads a secret value from the terminal.
pub trait TerminalReader {
    fn read_secret(&self, prompt: &str) -> io::Result<String>;
}

/// Prompt on stderr, read one line from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdTerminal;

impl TerminalReader for StdTerminal {
    fn read_secret(&self, prompt: &str) -> io::Result<String> {
        let mut err = io::stderr();
        err.write_all(prompt.as_bytes())?;
        err.flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// A fixed response, for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedTerminal {
    pub response: String,
}

impl FixedTerminal {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

impl TerminalReader for FixedTerminal {
    fn read_secret(&self, _prompt: &str) -> io::Result<String> {
        Ok(self.response.clone())
    }
}

/// Reads File-typed flag contents.
pub trait FileReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileReader;

impl FileReader for StdFileReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Expand `${EXEC_DIR}` to the running executable's directory.
pub fn expand_exec_dir(path: &str) -> String {
    if !path.contains("${EXEC_DIR}") {
        return path.to_string();
    }
    let exec_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .map(|d| d.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.replace("${EXEC_DIR}", &exec_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_terminal() {
        let term = FixedTerminal::new("hunter2");
        assert_eq!(term.read_secret("Password: ").unwrap(), "hunter2");
    }

    #[test]
    fn test_expand_exec_dir_no_marker() {
        assert_eq!(expand_exec_dir("/tmp/config.txt"), "/tmp/config.txt");
    }

    #[test]
    fn test_expand_exec_dir_substitutes() {
        let expanded = expand_exec_dir("${EXEC_DIR}/config.txt");
        assert!(expanded.ends_with("/config.txt"));
        assert!(!expanded.contains("${EXEC_DIR}"));
    }
}
