// ABOUTME: Reselection flow error types with SNAFU pattern.
// ABOUTME: Every variant means "not handled"; kind() supports programmatic handling.

use snafu::Snafu;

use crate::config::ProviderKind;
use crate::providers::CatalogError;

/// Why the resource-type reselection flow did not change the configuration.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReselectError {
    #[snafu(display("could not read deployment config: {source}"))]
    ConfigUnreadable { source: crate::error::Error },

    #[snafu(display("no configuration found for deployment '{name}'"))]
    ConfigMissing { name: String },

    #[snafu(display(
        "automatic reselection is only supported for Hetzner ({provider} in use); edit the configuration instead"
    ))]
    Unsupported { provider: ProviderKind },

    #[snafu(display("no {provider} API token found in config"))]
    MissingToken { provider: ProviderKind },

    #[snafu(display("failed to fetch server types: {source}"))]
    Catalog { source: CatalogError },

    #[snafu(display("no server types available in {location}"))]
    NoneAvailable { location: String },

    #[snafu(display("server type selection cancelled"))]
    Cancelled,

    #[snafu(display("could not save deployment config: {source}"))]
    Persist { source: crate::error::Error },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReselectErrorKind {
    /// The deployment configuration is missing or unreadable.
    Config,
    /// The provider cannot list resource types.
    Unsupported,
    /// The provider API could not be queried.
    Catalog,
    /// The location offers nothing to choose from.
    NoneAvailable,
    /// The operator dismissed the selection.
    Cancelled,
    /// The new choice could not be written back.
    Persist,
}

impl ReselectError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ReselectErrorKind {
        match self {
            ReselectError::ConfigUnreadable { .. } | ReselectError::ConfigMissing { .. } => {
                ReselectErrorKind::Config
            }
            ReselectError::Unsupported { .. } => ReselectErrorKind::Unsupported,
            ReselectError::MissingToken { .. } | ReselectError::Catalog { .. } => {
                ReselectErrorKind::Catalog
            }
            ReselectError::NoneAvailable { .. } => ReselectErrorKind::NoneAvailable,
            ReselectError::Cancelled => ReselectErrorKind::Cancelled,
            ReselectError::Persist { .. } => ReselectErrorKind::Persist,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_the_provider() {
        let err = ReselectError::Unsupported {
            provider: ProviderKind::Aws,
        };
        assert_eq!(err.kind(), ReselectErrorKind::Unsupported);
        assert!(err.to_string().contains("aws"));
    }

    #[test]
    fn missing_token_is_a_catalog_problem() {
        let err = ReselectError::MissingToken {
            provider: ProviderKind::Hetzner,
        };
        assert_eq!(err.kind(), ReselectErrorKind::Catalog);
    }
}
