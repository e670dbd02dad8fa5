// ABOUTME: Smart resume: works out which stages a deployment still needs.
// ABOUTME: Captures a snapshot of the persisted state, then resolves it with a pure rule table.

use nonempty::NonEmpty;
use std::net::IpAddr;

use super::Stage;
use crate::config::{ConfigStore, FeatureConfig};
use crate::probe::ConnectivityProbe;
use crate::types::DeploymentName;

/// Externally observable facts about a deployment, read fresh on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentSnapshot {
    pub name: DeploymentName,
    pub ip: Option<IpAddr>,
    /// Only meaningful when `ip` is set.
    pub ip_reachable: bool,
    pub has_persisted_infra_state: bool,
    pub config: Option<FeatureConfig>,
}

impl DeploymentSnapshot {
    /// Read the store and probe the recorded address, if any.
    pub async fn capture(
        name: &DeploymentName,
        store: &dyn ConfigStore,
        probe: &dyn ConnectivityProbe,
    ) -> Self {
        let ip = store.ip(name);
        let ip_reachable = match ip {
            Some(ip) => probe.is_reachable(ip).await,
            None => false,
        };
        let config = store.read(name).unwrap_or_else(|e| {
            tracing::warn!("could not read configuration for {}: {}", name, e);
            None
        });

        DeploymentSnapshot {
            name: name.clone(),
            ip,
            ip_reachable,
            has_persisted_infra_state: store.has_persisted_state(name),
            config,
        }
    }
}

/// Stages still required, in canonical order. Pure and deterministic.
pub fn resolve(snapshot: &DeploymentSnapshot) -> NonEmpty<Stage> {
    let first = match (snapshot.ip, snapshot.ip_reachable, snapshot.has_persisted_infra_state) {
        (Some(_), true, _) => Stage::Configure,
        (Some(_), false, _) => Stage::ConnectWait,
        (None, _, true) => Stage::Apply,
        (None, _, false) => Stage::Init,
    };
    starting_at(first)
}

/// The canonical order from `first` onward.
fn starting_at(first: Stage) -> NonEmpty<Stage> {
    NonEmpty {
        head: first,
        tail: Stage::ALL[first.index() + 1..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_at_yields_canonical_suffix() {
        let stages: Vec<_> = starting_at(Stage::Apply).into_iter().collect();
        assert_eq!(stages, vec![Stage::Apply, Stage::ConnectWait, Stage::Configure]);

        let stages: Vec<_> = starting_at(Stage::Configure).into_iter().collect();
        assert_eq!(stages, vec![Stage::Configure]);
    }
}
