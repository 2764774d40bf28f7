//! Confirmation port
//!
//! The engine never talks to a terminal. Steps that need approval surface
//! their prompt through a `Confirmer` supplied by the caller.

use std::sync::Mutex;

/// Answers confirmation prompts on behalf of the user
pub trait Confirmer: Send + Sync {
    /// Return true to proceed with the step
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves every prompt (non-interactive runs, `--yes`)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Confirmer for AutoApprove {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines every prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoDecline;

impl Confirmer for AutoDecline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Replays scripted answers and records the prompts it saw
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<Vec<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirmer {
    /// Answers are consumed in order; once exhausted every prompt is declined
    pub fn new(answers: Vec<bool>) -> Self {
        let mut answers = answers;
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop())
            .unwrap_or(false)
    }
}
