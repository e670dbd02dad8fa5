// ABOUTME: Hetzner Cloud server type catalog over the public REST API.
// ABOUTME: Filters out deprecated types and those not priced in the requested location.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CatalogError, ResourceCatalog, ResourceType};
use crate::config::HetznerSettings;

#[derive(Debug, Clone)]
pub struct HetznerCatalog {
    client: Client,
    base_url: String,
}

impl HetznerCatalog {
    pub fn new(settings: &HetznerSettings) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.api_url.trim_end_matches('/').to_owned(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ServerTypesResponse {
    #[serde(default)]
    server_types: Vec<RawServerType>,
}

#[derive(Debug, Deserialize)]
struct RawServerType {
    name: String,
    cores: u32,
    memory: f64,
    #[serde(default)]
    cpu_type: Option<String>,
    #[serde(default)]
    deprecation: Option<serde_json::Value>,
    #[serde(default)]
    prices: Vec<RawPrice>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    location: String,
    price_monthly: RawAmount,
}

/// Prices are decimal strings, e.g. `"13.1000000000"`.
#[derive(Debug, Deserialize)]
struct RawAmount {
    gross: String,
}

/// Non-deprecated types priced in `location`, sorted by monthly gross price.
fn available_in(raw: Vec<RawServerType>, location: &str) -> Vec<ResourceType> {
    let mut types: Vec<ResourceType> = raw
        .into_iter()
        .filter(|st| st.deprecation.as_ref().is_none_or(|d| d.is_null()))
        .filter_map(|st| {
            let price = st.prices.iter().find(|p| p.location == location)?;
            let price_monthly = price.price_monthly.gross.trim().parse::<f64>().ok();
            Some(ResourceType {
                name: st.name,
                cores: st.cores,
                memory_gb: st.memory,
                cpu_type: st.cpu_type.unwrap_or_else(|| "shared".to_string()),
                price_monthly,
            })
        })
        .collect();

    types.sort_by(|a, b| {
        a.price_monthly
            .unwrap_or(0.0)
            .total_cmp(&b.price_monthly.unwrap_or(0.0))
    });
    types
}

#[async_trait]
impl ResourceCatalog for HetznerCatalog {
    async fn list_types(
        &self,
        token: &str,
        location: &str,
    ) -> Result<Vec<ResourceType>, CatalogError> {
        let url = format!("{}/server_types", self.base_url);
        tracing::debug!("GET {} (location {})", url, location);

        let response = self.client.get(&url).bearer_auth(token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ServerTypesResponse = response.json().await?;
        Ok(available_in(body.server_types, location))
    }
}
