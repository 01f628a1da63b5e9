//! Alert domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use super::ParseStatusError;

/// Operator-facing notification about pipeline health
///
/// Alerts may be global (no pipeline). The acknowledgment lifecycle is
/// independent of any single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub pipeline_id: Option<Uuid>,
    /// Joined from the pipeline on read
    #[serde(default)]
    pub pipeline_name: Option<String>,
    pub severity: AlertSeverity,
    pub message: String,
    pub status: AlertStatus,
    pub triggered_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Acknowledged,
    Resolved,
}

/// Rejected alert status change
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot move alert from {from} to {to}")]
pub struct InvalidTransition {
    pub from: AlertStatus,
    pub to: AlertStatus,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Acknowledged => "acknowledged",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// Whether moving from `self` to `next` is allowed
    ///
    /// Repeating the current status is accepted as a no-op. Resolved alerts
    /// cannot be re-opened.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        use AlertStatus::*;
        matches!(
            (self, next),
            (Active, Active)
                | (Active, Acknowledged)
                | (Active, Resolved)
                | (Acknowledged, Acknowledged)
                | (Acknowledged, Resolved)
                | (Resolved, Resolved)
        )
    }
}

impl Alert {
    /// Apply a status change, stamping `resolved_at` on entry into `Resolved`
    ///
    /// Returns `Ok(false)` when the alert was already in `next`.
    pub fn transition(
        &mut self,
        next: AlertStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if self.status == next {
            return Ok(false);
        }

        if next == AlertStatus::Resolved && self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }
        self.status = next;

        Ok(true)
    }
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::Warning => "warning",
            AlertSeverity::Info => "info",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(AlertSeverity::Critical),
            "warning" => Ok(AlertSeverity::Warning),
            "info" => Ok(AlertSeverity::Info),
            other => Err(ParseStatusError::new(
                "alert severity",
                other,
                "critical, warning, info",
            )),
        }
    }
}

impl FromStr for AlertStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "acknowledged" => Ok(AlertStatus::Acknowledged),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(ParseStatusError::new(
                "alert",
                other,
                "active, acknowledged, resolved",
            )),
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn active_alert() -> Alert {
        Alert {
            id: Uuid::new_v4(),
            pipeline_id: None,
            pipeline_name: None,
            severity: AlertSeverity::Warning,
            message: "Latency above threshold".to_string(),
            status: AlertStatus::Active,
            triggered_at: Utc.with_ymd_and_hms(2025, 1, 2, 8, 0, 0).unwrap(),
            resolved_at: None,
        }
    }

    #[test]
    fn test_resolve_sets_resolved_at() {
        let mut alert = active_alert();
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 9, 30, 0).unwrap();

        assert_eq!(alert.transition(AlertStatus::Resolved, now), Ok(true));
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.resolved_at, Some(now));
    }

    #[test]
    fn test_acknowledge_then_resolve() {
        let mut alert = active_alert();
        let ack_at = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        let resolve_at = Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap();

        assert_eq!(alert.transition(AlertStatus::Acknowledged, ack_at), Ok(true));
        assert!(alert.resolved_at.is_none());

        assert_eq!(alert.transition(AlertStatus::Resolved, resolve_at), Ok(true));
        assert_eq!(alert.resolved_at, Some(resolve_at));
    }

    #[test]
    fn test_resolved_cannot_reopen() {
        let mut alert = active_alert();
        let resolved_at = Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap();
        alert.transition(AlertStatus::Resolved, resolved_at).unwrap();

        let later = Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap();
        let err = alert.transition(AlertStatus::Active, later).unwrap_err();
        assert_eq!(err.from, AlertStatus::Resolved);
        assert_eq!(err.to, AlertStatus::Active);
        assert_eq!(alert.resolved_at, Some(resolved_at));

        // Re-resolving keeps the original timestamp
        assert_eq!(alert.transition(AlertStatus::Resolved, later), Ok(false));
        assert_eq!(alert.resolved_at, Some(resolved_at));
    }

    #[test]
    fn test_acknowledged_cannot_go_back_to_active() {
        assert!(!AlertStatus::Acknowledged.can_transition_to(AlertStatus::Active));
        assert!(!AlertStatus::Resolved.can_transition_to(AlertStatus::Acknowledged));
    }
}
