//! Obra (work order) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::StockDomain;

/// Lifecycle state of an obra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObraState {
    Pending,
    InProgress,
    Completed,
}

impl ObraState {
    /// Production only moves forward; a completed obra stays completed
    pub fn can_transition_to(&self, next: ObraState) -> bool {
        self.rank() <= next.rank()
    }

    fn rank(&self) -> u8 {
        match self {
            ObraState::Pending => 0,
            ObraState::InProgress => 1,
            ObraState::Completed => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObraState::Pending => "pending",
            ObraState::InProgress => "in_progress",
            ObraState::Completed => "completed",
        }
    }
}

impl std::str::FromStr for ObraState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ObraState::Pending),
            "in_progress" => Ok(ObraState::InProgress),
            "completed" => Ok(ObraState::Completed),
            other => Err(format!("Unknown obra state: {}", other)),
        }
    }
}

/// A work order tracked through production
///
/// `version` is the optimistic-concurrency token: every edit must present the
/// version read at load time, and each successful write increments it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obra {
    pub id: Uuid,
    pub name: String,
    pub client: String,
    pub state: ObraState,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One bill-of-materials line of an obra
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObraMaterial {
    pub obra_id: Uuid,
    pub item_id: Uuid,
    pub domain: StockDomain,
    pub quantity_required: i64,
}

/// Check an optimistic-lock token; only equality matters
pub fn version_matches(expected: i64, current: i64) -> bool {
    expected == current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_moves_forward_only() {
        assert!(ObraState::Pending.can_transition_to(ObraState::InProgress));
        assert!(ObraState::InProgress.can_transition_to(ObraState::Completed));
        assert!(ObraState::Pending.can_transition_to(ObraState::Pending));
        assert!(!ObraState::Completed.can_transition_to(ObraState::InProgress));
        assert!(!ObraState::InProgress.can_transition_to(ObraState::Pending));
    }

    #[test]
    fn test_version_equality_only() {
        assert!(version_matches(1, 1));
        assert!(!version_matches(1, 2));
        // Stale in either direction is a mismatch
        assert!(!version_matches(5, 3));
    }
}
