//! Terminal Prompts
//!
//! Every flow talks to the user through the [`Terminal`] trait, so login and
//! menu flows can be driven by scripted input in tests. The interactive
//! implementation uses `dialoguer`; passwords are read without echo.

use dialoguer::{Input, Password};
use std::collections::VecDeque;

use crate::error::{ClosetlyError, Result};

/// Line-oriented user interaction
pub trait Terminal {
    /// Prompt for one line of text (may be empty)
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Prompt for a secret without echoing it
    fn read_secret(&mut self, prompt: &str) -> Result<String>;

    /// Show a message to the user
    fn say(&mut self, message: &str);
}

/// Interactive terminal backed by `dialoguer`
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerTerminal;

impl Terminal for DialoguerTerminal {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| ClosetlyError::terminal(format!("Could not read input: {e}")))
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(|e| ClosetlyError::terminal(format!("Could not read password: {e}")))
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }
}

/// Terminal that answers prompts from a fixed script
///
/// Prompts and messages are recorded in order. Running out of answers is a
/// terminal error, which ends any flow the same way a closed stdin would.
#[derive(Debug, Default, Clone)]
pub struct ScriptedTerminal {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    messages: Vec<String>,
}

impl ScriptedTerminal {
    /// Create a terminal that replies with `answers`, in order
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Prompts shown so far
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Messages shown so far
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Whether any message contains `needle`
    #[must_use]
    pub fn said(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.contains(needle))
    }

    /// Answers not consumed yet
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| ClosetlyError::terminal(format!("No scripted answer for prompt: {prompt}")))
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn read_secret(&mut self, prompt: &str) -> Result<String> {
        self.next_answer(prompt)
    }

    fn say(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}
