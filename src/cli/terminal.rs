//! Interactive confirmation on the terminal

use crate::execution::Confirmer;
use console::{style, Term};
use tracing::warn;

/// Asks the user on stderr; declines when no terminal is attached
#[derive(Debug, Clone)]
pub struct TerminalConfirmer {
    term: Term,
}

impl TerminalConfirmer {
    pub fn new() -> Self {
        Self { term: Term::stderr() }
    }
}

impl Default for TerminalConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if !self.term.is_term() {
            warn!("Cannot ask '{}' without a terminal; pass --yes to approve", prompt);
            return false;
        }

        if self
            .term
            .write_str(&format!("{} {} ", style(prompt).bold(), style("[y/N]").dim()))
            .is_err()
        {
            return false;
        }

        match self.term.read_line() {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                warn!("Failed to read confirmation: {}", e);
                false
            }
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
