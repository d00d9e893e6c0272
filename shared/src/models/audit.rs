//! Audit trail models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of an audited attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Denied,
    Succeeded,
    Failed,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Denied => "denied",
            AuditOutcome::Succeeded => "succeeded",
            AuditOutcome::Failed => "failed",
        }
    }
}

impl std::str::FromStr for AuditOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "denied" => Ok(AuditOutcome::Denied),
            "succeeded" => Ok(AuditOutcome::Succeeded),
            "failed" => Ok(AuditOutcome::Failed),
            other => Err(format!("Unknown audit outcome: {}", other)),
        }
    }
}

/// One append-only audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub actor: Uuid,
    pub module: String,
    pub action: String,
    pub outcome: AuditOutcome,
    pub detail: String,
    /// Where the action originated (e.g. client host or window)
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
}
