// ABOUTME: Deployment orchestration engine: resume, stage execution, failure recovery.
// ABOUTME: Exports the orchestrator, the stage model, and the recovery building blocks.

mod error;
mod executor;
mod orchestrator;
mod outcome;
mod recovery;
mod reselect;
mod resolver;
mod stage;

pub use error::{ReselectError, ReselectErrorKind};
pub use executor::{StageExecutor, WaitPolicy};
pub use orchestrator::{Collaborators, Orchestrator, RunState, summary_lines};
pub use outcome::{DeploymentOutcome, PauseReason, StageOutcome};
pub use recovery::{RecoveryAction, RecoveryMatch, classify, menu, menu_prompt};
pub use reselect::reselect_resource_type;
pub use resolver::{DeploymentSnapshot, resolve};
pub use stage::Stage;
