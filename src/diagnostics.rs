// ABOUTME: Diagnostics accumulator for non-fatal warnings during a deployment run.
// ABOUTME: Collects warnings that shouldn't stop the run but should be shown to the operator.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Check if a warning of the given kind was collected.
    pub fn has_kind(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Create an editor launch warning.
    pub fn editor(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Editor,
            message: message.into(),
        }
    }

    /// Create a reselection warning.
    pub fn reselection(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Reselection,
            message: message.into(),
        }
    }

    /// Create a validation warning.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::Validation,
            message: message.into(),
        }
    }

    /// Create a configuration read warning.
    pub fn config_read(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ConfigRead,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// The configuration editor could not be launched or exited non-zero.
    Editor,
    /// Resource-type reselection did not change the configuration.
    Reselection,
    /// Post-deployment validation reported failures.
    Validation,
    /// The deployment configuration could not be read.
    ConfigRead,
}
