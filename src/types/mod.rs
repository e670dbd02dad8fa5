// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Currently the deployment name newtype.

mod deployment_name;

pub use deployment_name::{DeploymentName, DeploymentNameError};
