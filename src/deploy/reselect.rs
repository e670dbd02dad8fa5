// ABOUTME: Corrective flow for an unavailable compute resource type.
// ABOUTME: Lists valid types for the location, lets the operator pick, and saves the choice.

use snafu::{OptionExt, ResultExt};

use super::RecoveryMatch;
use super::error::{
    CancelledSnafu, CatalogSnafu, ConfigMissingSnafu, ConfigUnreadableSnafu, MissingTokenSnafu,
    NoneAvailableSnafu, PersistSnafu, ReselectError, UnsupportedSnafu,
};
use crate::config::ConfigStore;
use crate::output::Output;
use crate::prompt::{Choice, UserInteraction};
use crate::providers::ResourceCatalog;
use crate::types::DeploymentName;

/// Replace the deployment's resource type with one the operator picks from
/// those available in `found.location`. Returns the new type.
///
/// The configuration is read and overwritten whole; callers must be the only
/// writer for this deployment.
///
/// # Errors
///
/// Every error means the configuration was left unchanged.
pub async fn reselect_resource_type(
    name: &DeploymentName,
    found: &RecoveryMatch,
    store: &dyn ConfigStore,
    catalog: &dyn ResourceCatalog,
    ui: &dyn UserInteraction,
    output: &Output,
) -> Result<String, ReselectError> {
    let mut config = store
        .read(name)
        .context(ConfigUnreadableSnafu)?
        .context(ConfigMissingSnafu {
            name: name.to_string(),
        })?;

    let provider = config.provider.kind();
    if !provider.supports_reselection() {
        return UnsupportedSnafu { provider }.fail();
    }

    let token = config
        .provider
        .api_token()
        .context(MissingTokenSnafu { provider })?
        .to_string();

    output.info(&format!(
        "Fetching available server types for {}...",
        found.location
    ));
    let types = catalog
        .list_types(&token, &found.location)
        .await
        .context(CatalogSnafu)?;
    if types.is_empty() {
        return NoneAvailableSnafu {
            location: found.location.clone(),
        }
        .fail();
    }

    output.warning(&format!(
        "Server type '{}' is not available in '{}'",
        found.resource_type, found.location
    ));
    let choices: Vec<Choice> = types
        .iter()
        .map(|t| Choice::new(t.name.clone(), t.label()))
        .collect();
    let selected = ui
        .select("Select a different server type:", &choices)
        .context(CancelledSnafu)?;

    config.provider.set_resource_type(selected.clone());
    store.write(name, &config).context(PersistSnafu)?;
    tracing::info!("{} resource type changed to {}", name, selected);
    Ok(selected)
}
