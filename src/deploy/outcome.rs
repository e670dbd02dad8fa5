// ABOUTME: Results produced by running stages and whole deployments.
// ABOUTME: StageOutcome feeds the recovery loop; DeploymentOutcome maps to the exit code.

/// Result of one stage attempt. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub success: bool,
    /// Raw diagnostic text from the collaborator, when it produced any.
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failure carrying `error` as its diagnostic. Blank text counts as none.
    pub fn failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            error: (!error.trim().is_empty()).then_some(error),
        }
    }

    pub fn failed_silently() -> Self {
        Self {
            success: false,
            error: None,
        }
    }

    pub fn error_text(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

/// Why a run stopped before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// The operator has not confirmed the DNS record yet.
    DnsPending,
    /// The operator chose to abort after a failure.
    OperatorAbort,
}

/// Terminal result of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentOutcome {
    /// Stopped early; re-running resumes from the persisted state.
    Paused(PauseReason),
    /// Every stage ran (or was skipped); `validated` reports the final health checks.
    Completed { validated: bool },
}

impl DeploymentOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            DeploymentOutcome::Completed { validated: true } => 0,
            DeploymentOutcome::Completed { validated: false } | DeploymentOutcome::Paused(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_diagnostic_is_dropped() {
        assert_eq!(StageOutcome::failed("  \n").error, None);
        assert_eq!(StageOutcome::failed("boom").error_text(), "boom");
    }

    #[test]
    fn only_validated_completion_exits_zero() {
        assert_eq!(DeploymentOutcome::Completed { validated: true }.exit_code(), 0);
        assert_eq!(DeploymentOutcome::Completed { validated: false }.exit_code(), 1);
        assert_eq!(DeploymentOutcome::Paused(PauseReason::OperatorAbort).exit_code(), 1);
        assert_eq!(DeploymentOutcome::Paused(PauseReason::DnsPending).exit_code(), 1);
    }
}
