// ABOUTME: Provisioning stages in their canonical order.
// ABOUTME: A closed set; every dispatch over it is an exhaustive match.

use std::fmt;

/// One phase of bringing a deployment from nothing to a configured server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Prepare the infrastructure tool's working directory.
    Init,
    /// Create or update the cloud resources.
    Apply,
    /// Wait for the new server to accept SSH connections.
    ConnectWait,
    /// Install and configure software on the server.
    Configure,
}

impl Stage {
    /// Canonical order. Resolved stage lists are always a suffix of this.
    pub const ALL: [Stage; 4] = [
        Stage::Init,
        Stage::Apply,
        Stage::ConnectWait,
        Stage::Configure,
    ];

    pub fn index(self) -> usize {
        match self {
            Stage::Init => 0,
            Stage::Apply => 1,
            Stage::ConnectWait => 2,
            Stage::Configure => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Apply => "apply",
            Stage::ConnectWait => "ssh",
            Stage::Configure => "configure",
        }
    }

    /// Name shown to the operator, e.g. in "Apply failed".
    pub fn title(self) -> &'static str {
        match self {
            Stage::Init => "Init",
            Stage::Apply => "Apply",
            Stage::ConnectWait => "SSH",
            Stage::Configure => "Configure",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_matches_canonical_order() {
        for (i, stage) in Stage::ALL.iter().enumerate() {
            assert_eq!(stage.index(), i);
        }
    }

    #[test]
    fn ordering_follows_canonical_order() {
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
    }
}
