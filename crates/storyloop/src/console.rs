//! Terminal implementation of the session console.

use std::io::{BufRead, IsTerminal, Write};

use dialoguer::Input;
use storyloop_core::Console;

/// Reads answers from the terminal and prints to stdout.
///
/// With a terminal on both ends answers are read through dialoguer.
/// Otherwise answers are read line by line, so piped input works.
pub struct TerminalConsole {
    /// Line source when not attached to a terminal
    lines: Option<Box<dyn BufRead>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
            Self { lines: None }
        } else {
            Self::from_reader(std::io::stdin().lock())
        }
    }

    /// Read answers from `reader` instead of the terminal
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            lines: Some(Box::new(reader)),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for TerminalConsole {
    fn prompt_user(&mut self, message: &str) -> String {
        match self.lines.as_mut() {
            Some(reader) => {
                print!("{}", message);
                let _ = std::io::stdout().flush();
                read_answer(reader.as_mut())
            }
            None => {
                // dialoguer adds its own ": " suffix
                let prompt = message.trim_end().trim_end_matches(':');
                Input::<String>::new()
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text()
                    .unwrap_or_default()
            }
        }
    }

    fn print(&mut self, message: &str) {
        println!("{}", message);
    }
}

/// One line without its terminator; end of input or a read error is empty
fn read_answer(reader: &mut dyn BufRead) -> String {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) | Err(_) => String::new(),
        Ok(_) => line.trim_end_matches(['\r', '\n']).to_string(),
    }
}
