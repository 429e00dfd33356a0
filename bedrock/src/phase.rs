//! Deployment phase vocabulary.
//!
//! Data only. The runtime cell holding the current phase (and the guard for
//! scoping it in tests) lives in `caldera-output`.

use serde::{Deserialize, Serialize};

/// Which execution phase a deployment is in.
///
/// During [`DeployPhase::Preview`], resource creation is simulated and many
/// values stay unknown; user callbacks over unknown values are skipped.
/// During [`DeployPhase::Update`], resources are really created and callbacks
/// run even over values that are still unknown, so their side effects happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployPhase {
    /// A dry run: simulate the deployment and report what would change.
    Preview,
    /// The real run: create, update, and delete resources.
    Update,
}

impl DeployPhase {
    /// True for the dry-run phase.
    pub fn is_preview(self) -> bool {
        matches!(self, DeployPhase::Preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_is_the_dry_run() {
        assert!(DeployPhase::Preview.is_preview());
        assert!(!DeployPhase::Update.is_preview());
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DeployPhase::Preview).expect("serialize"),
            r#""preview""#
        );
    }
}
