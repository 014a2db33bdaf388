//! Interactive console layer
//!
//! All prompts and printed panels go through the `Console` trait so the
//! menu logic can run against a real terminal or a scripted transcript.

use dialoguer::{Input, Password, Select};

use crate::error::{Error, Result};

pub trait Console: Send {
    /// Print one line of output.
    fn print(&mut self, line: &str);

    /// Ask for free text.
    fn input(&mut self, prompt: &str) -> Result<String>;

    /// Ask for a secret (not echoed).
    fn password(&mut self, prompt: &str) -> Result<String>;

    /// Yes/no question. With `default = None` an explicit answer is required.
    fn confirm(&mut self, prompt: &str, default: Option<bool>) -> Result<bool>;

    /// Pick one of `choices`; returns its zero-based index.
    fn select(&mut self, prompt: &str, choices: &[String], default: usize) -> Result<usize>;

    /// Print a framed title.
    fn panel(&mut self, title: &str) {
        let width = title.chars().count() + 4;
        self.print(&format!("╔{}╗", "═".repeat(width)));
        self.print(&format!("║  {}  ║", title));
        self.print(&format!("╚{}╝", "═".repeat(width)));
    }
}

/// Interpret a yes/no answer. Spanish and English forms are accepted in
/// any case; an empty answer yields `default`.
pub fn parse_yes_no(answer: &str, default: Option<bool>) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "s" | "si" | "sí" | "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        "" => default,
        _ => None,
    }
}

/// Terminal-backed console built on dialoguer.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl TerminalConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for TerminalConsole {
    fn print(&mut self, line: &str) {
        println!("{line}");
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        let value = Input::<String>::new()
            .with_prompt(prompt)
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn password(&mut self, prompt: &str) -> Result<String> {
        Ok(Password::new().with_prompt(prompt).interact()?)
    }

    fn confirm(&mut self, prompt: &str, default: Option<bool>) -> Result<bool> {
        let answer = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(default.is_some())
            .validate_with(|input: &String| -> std::result::Result<(), &'static str> {
                parse_yes_no(input, default)
                    .map(|_| ())
                    .ok_or("Responde s (sí) o n (no)")
            })
            .interact_text()?;
        parse_yes_no(&answer, default)
            .ok_or_else(|| Error::PromptError(format!("invalid yes/no answer '{}'", answer)))
    }

    fn select(&mut self, prompt: &str, choices: &[String], default: usize) -> Result<usize> {
        Ok(Select::new()
            .with_prompt(prompt)
            .items(choices)
            .default(default)
            .interact()?)
    }
}
