// ABOUTME: Cloud provider catalogs used to pick compute resource types.
// ABOUTME: Defines the ResourceCatalog contract and the resource type model.

mod hetzner;

pub use hetzner::HetznerCatalog;

use async_trait::async_trait;

/// A compute resource type offered by a provider (server type, instance type, droplet size).
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceType {
    pub name: String,
    pub cores: u32,
    pub memory_gb: f64,
    pub cpu_type: String,
    pub price_monthly: Option<f64>,
}

impl ResourceType {
    /// Menu label, e.g. `CPX31 - 4 vCPU, 8GB RAM [€13.10/mo]`.
    pub fn label(&self) -> String {
        let cpu = if self.cpu_type == "shared" {
            String::new()
        } else {
            format!(" {}", self.cpu_type)
        };
        let price = self
            .price_monthly
            .map(|p| format!("€{p:.2}/mo"))
            .unwrap_or_default();
        format!(
            "{} - {} vCPU, {}GB RAM{} [{}]",
            self.name.to_uppercase(),
            self.cores,
            self.memory_gb,
            cpu,
            price
        )
    }
}

/// Lists the resource types a provider can create in a location.
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// Resource types available in `location`, cheapest first.
    async fn list_types(&self, token: &str, location: &str)
    -> Result<Vec<ResourceType>, CatalogError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
}
