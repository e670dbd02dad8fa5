// ABOUTME: Operator interaction: recovery menus, confirmations, selections, editor launch.
// ABOUTME: TerminalInteraction renders numbered menus on stderr and reads answers from stdin.

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::deploy::RecoveryAction;

/// One entry of a selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Returned when selected.
    pub value: String,
    /// Shown to the operator.
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Blocking questions to the operator. `None` means the operator cancelled.
pub trait UserInteraction: Send + Sync {
    fn select(&self, prompt: &str, choices: &[Choice]) -> Option<String>;

    fn confirm(&self, prompt: &str, default: bool) -> bool;

    /// Open `path` in the operator's editor. `false` if it could not be launched
    /// or exited non-zero.
    fn edit_file(&self, path: &Path) -> bool;

    fn choose_action(&self, prompt: &str, options: &[RecoveryAction]) -> Option<RecoveryAction> {
        let choices: Vec<Choice> = options
            .iter()
            .map(|a| Choice::new(a.as_str(), a.label()))
            .collect();
        let value = self.select(prompt, &choices)?;
        options.iter().copied().find(|a| a.as_str() == value)
    }
}

/// Interaction over the controlling terminal.
#[derive(Debug, Clone)]
pub struct TerminalInteraction {
    editor: String,
}

impl TerminalInteraction {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
        }
    }

    /// Print `prompt` and read one line. `None` on EOF or read failure.
    pub fn ask(&self, prompt: &str) -> Option<String> {
        eprint!("{prompt}");
        io::stderr().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!("failed to read from stdin: {}", e);
                None
            }
        }
    }
}

/// Interpret a menu answer: a 1-based index or a choice value.
fn parse_selection(answer: &str, choices: &[Choice]) -> Option<usize> {
    if let Ok(n) = answer.parse::<usize>() {
        return (1..=choices.len()).contains(&n).then(|| n - 1);
    }
    choices.iter().position(|c| c.value.eq_ignore_ascii_case(answer))
}

/// Interpret a yes/no answer. Empty input takes the default.
fn parse_confirmation(answer: &str, default: bool) -> Option<bool> {
    match answer.to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl UserInteraction for TerminalInteraction {
    fn select(&self, prompt: &str, choices: &[Choice]) -> Option<String> {
        if choices.is_empty() {
            return None;
        }

        eprintln!();
        eprintln!("? {prompt}");
        for (i, choice) in choices.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, choice.label);
        }

        loop {
            let answer = self.ask(&format!("Choice [1-{}, empty to cancel]: ", choices.len()))?;
            if answer.is_empty() {
                return None;
            }
            match parse_selection(&answer, choices) {
                Some(i) => return Some(choices[i].value.clone()),
                None => eprintln!("  '{answer}' is not one of the options"),
            }
        }
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.ask(&format!("? {prompt} {hint} ")) else {
                return default;
            };
            match parse_confirmation(&answer, default) {
                Some(answer) => return answer,
                None => eprintln!("  please answer y or n"),
            }
        }
    }

    fn edit_file(&self, path: &Path) -> bool {
        // `$EDITOR` may carry arguments, e.g. "code --wait".
        let mut parts = self.editor.split_whitespace();
        let Some(program) = parts.next() else {
            tracing::warn!("no editor configured");
            return false;
        };

        match std::process::Command::new(program)
            .args(parts)
            .arg(path)
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!("could not open editor {}: {}", program, e);
                false
            }
        }
    }
}
