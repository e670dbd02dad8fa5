// ABOUTME: Failure classification and recovery menus for failed stages.
// ABOUTME: Known recoverable diagnostics live in a (stage, matcher) table.

use regex::Regex;
use std::sync::LazyLock;

use super::Stage;

/// What the operator can do after a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    Retry,
    Reselect,
    Edit,
    Skip,
    Abort,
}

impl RecoveryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryAction::Retry => "retry",
            RecoveryAction::Reselect => "reselect",
            RecoveryAction::Edit => "edit",
            RecoveryAction::Skip => "skip",
            RecoveryAction::Abort => "abort",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecoveryAction::Retry => "Retry",
            RecoveryAction::Reselect => "Select different server type",
            RecoveryAction::Edit => "Edit configuration",
            RecoveryAction::Skip => "Skip to next step",
            RecoveryAction::Abort => "Abort (keep current state)",
        }
    }
}

/// Structured fields pulled out of a recognized failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryMatch {
    pub resource_type: String,
    pub location: String,
}

type Matcher = fn(&str) -> Option<RecoveryMatch>;

/// Recoverable failure patterns, keyed by the stage that produces them.
const PATTERNS: &[(Stage, Matcher)] = &[(Stage::Apply, unavailable_resource_type)];

// Hetzner: `Server Type "cpx31" is unavailable in "hel1"`.
static UNAVAILABLE_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:server|resource) type "([^"]+)" is unavailable in "([^"]+)""#)
        .expect("unavailable type pattern is valid")
});

fn unavailable_resource_type(text: &str) -> Option<RecoveryMatch> {
    let captures = UNAVAILABLE_TYPE.captures(text)?;
    Some(RecoveryMatch {
        resource_type: captures.get(1)?.as_str().to_string(),
        location: captures.get(2)?.as_str().to_string(),
    })
}

/// Recognize a recoverable failure of `stage` from its diagnostic text.
pub fn classify(stage: Stage, text: &str) -> Option<RecoveryMatch> {
    if text.is_empty() {
        return None;
    }
    PATTERNS
        .iter()
        .filter(|(s, _)| *s == stage)
        .find_map(|(_, matcher)| matcher(text))
}

/// Actions offered after `stage` failed, in display order. Always ends with `Abort`.
pub fn menu(stage: Stage, matched: bool) -> Vec<RecoveryAction> {
    let mut actions = Vec::with_capacity(5);

    if stage == Stage::Apply && matched {
        actions.push(RecoveryAction::Reselect);
    }
    actions.push(RecoveryAction::Retry);
    if matches!(stage, Stage::Apply | Stage::Configure) {
        actions.push(RecoveryAction::Edit);
    }
    if matches!(stage, Stage::Apply | Stage::ConnectWait) {
        actions.push(RecoveryAction::Skip);
    }
    actions.push(RecoveryAction::Abort);
    actions
}

pub fn menu_prompt(stage: Stage) -> String {
    format!("{} failed. What would you like to do?", stage.title())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_type_pattern_compiles() {
        let re = LazyLock::force(&UNAVAILABLE_TYPE);
        assert_eq!(re.captures_len(), 3);
    }

    #[test]
    fn classifies_hetzner_server_type_error() {
        let text = "Error: Server Type \"cpx31\" is unavailable in \"hel1\" (invalid_input)";
        let found = classify(Stage::Apply, text).unwrap();
        assert_eq!(found.resource_type, "cpx31");
        assert_eq!(found.location, "hel1");
    }

    #[test]
    fn pattern_only_applies_to_its_stage() {
        let text = "Resource Type \"cpx31\" is unavailable in \"hel1\"";
        assert!(classify(Stage::Apply, text).is_some());
        assert!(classify(Stage::Configure, text).is_none());
        assert!(classify(Stage::Init, text).is_none());
    }

    #[test]
    fn unrelated_text_does_not_match() {
        assert!(classify(Stage::Apply, "Error: quota exceeded").is_none());
        assert!(classify(Stage::Apply, "").is_none());
    }

    #[test]
    fn configure_menu_offers_edit_but_not_skip() {
        assert_eq!(
            menu(Stage::Configure, false),
            vec![RecoveryAction::Retry, RecoveryAction::Edit, RecoveryAction::Abort]
        );
    }

    #[test]
    fn init_menu_is_retry_or_abort() {
        assert_eq!(
            menu(Stage::Init, true),
            vec![RecoveryAction::Retry, RecoveryAction::Abort]
        );
    }
}
