//! Shared types for the ORDERMON daemon.
//!
//! These types form the data model used across all modules: the on-disk
//! order record, its lifecycle status, and the outcome of a single
//! remote verification attempt.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Order status
// ---------------------------------------------------------------------------

/// Lifecycle status of an order, as stored in the orders file.
///
/// The file is written by external producers, so any string we do not
/// recognise must survive a load/save round-trip verbatim — hence the
/// untagged `Other` fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Verif,
    Failed,
    #[serde(untagged)]
    Other(String),
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A unit of work tracked in the persisted list, subject to periodic
/// remote verification.
///
/// Field names follow the wire format of the orders file (camelCase,
/// epoch-millisecond timestamps). Fields we do not model are carried
/// through rewrites untouched via `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique identifier. Records without one are inert: never
    /// verified, never removed, never mutated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,

    /// Earliest time (epoch ms) the order becomes due for a check again.
    #[serde(rename = "nextCheck", default, skip_serializing_if = "Option::is_none")]
    pub next_check: Option<i64>,

    /// Set whenever a verification attempt completes without removing
    /// the order.
    #[serde(rename = "lastChecked", default, skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<i64>,

    /// Carried through but not authoritative for eligibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<i64>,

    /// Carried through but not authoritative for eligibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timelimit: Option<i64>,

    /// Producer-written fields we do not model.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Order {
    /// Build a minimal pending order.
    pub fn pending(id: &str) -> Self {
        Order {
            id: Some(id.to_string()),
            status: Some(OrderStatus::Pending),
            ..Default::default()
        }
    }

    /// Whether this order is due for verification at `now_ms`.
    ///
    /// Two independent triggers, OR-combined:
    /// - time-based: `nextCheck` is absent, or already in the past;
    /// - status-based: the order is `pending` or `verif`.
    pub fn is_eligible(&self, now_ms: i64) -> bool {
        let time_due = match self.next_check {
            Some(next) => now_ms > next,
            None => true,
        };
        let status_due = matches!(
            self.status,
            Some(OrderStatus::Pending) | Some(OrderStatus::Verif)
        );
        time_due || status_due
    }
}

/// Current time as epoch milliseconds, the unit used throughout the
/// orders file.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

// ---------------------------------------------------------------------------
// Verification outcome
// ---------------------------------------------------------------------------

/// Outcome of one remote verification attempt.
///
/// Everything that is neither a clear success nor a clear failure —
/// timeouts, connection errors, non-2xx statuses, malformed bodies —
/// collapses to `Unknown` and is retried on a later pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Remote confirms the order is resolved; it leaves the list.
    Resolved,
    /// Remote confirms the order failed.
    Failed { reason: Option<String> },
    /// Inconclusive; try again later.
    Unknown,
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyOutcome::Resolved => write!(f, "resolved"),
            VerifyOutcome::Failed { reason: Some(r) } => write!(f, "failed ({r})"),
            VerifyOutcome::Failed { reason: None } => write!(f, "failed"),
            VerifyOutcome::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_roundtrip_known() {
        let s: OrderStatus = serde_json::from_value(json!("pending")).unwrap();
        assert_eq!(s, OrderStatus::Pending);
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("pending"));
    }

    #[test]
    fn test_status_roundtrip_unknown_string() {
        let s: OrderStatus = serde_json::from_value(json!("en-camino")).unwrap();
        assert_eq!(s, OrderStatus::Other("en-camino".into()));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!("en-camino"));
    }

    #[test]
    fn test_order_extra_fields_survive_roundtrip() {
        let raw = json!({
            "id": "A-1",
            "status": "pending",
            "cliente": "Juan",
            "monto": 1250
        });
        let order: Order = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(order.id.as_deref(), Some("A-1"));
        assert_eq!(order.extra.get("cliente"), Some(&json!("Juan")));

        let back = serde_json::to_value(&order).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(VerifyOutcome::Resolved.to_string(), "resolved");
        assert_eq!(
            VerifyOutcome::Failed {
                reason: Some("expired".into())
            }
            .to_string(),
            "failed (expired)"
        );
        assert_eq!(
            VerifyOutcome::Failed { reason: None }.to_string(),
            "failed"
        );
        assert_eq!(VerifyOutcome::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_missing_id_parses() {
        let order: Order = serde_json::from_value(json!({ "status": "verif" })).unwrap();
        assert!(order.id.is_none());
        assert_eq!(order.status, Some(OrderStatus::Verif));
    }

    #[test]
    fn test_eligibility_no_next_check() {
        let order = Order {
            id: Some("X".into()),
            ..Default::default()
        };
        // Absent nextCheck means due, regardless of status.
        assert!(order.is_eligible(now_ms()));
    }

    #[test]
    fn test_eligibility_future_next_check_pending_status() {
        let now = now_ms();
        let mut order = Order::pending("X");
        order.next_check = Some(now + 60_000);
        // Time says wait, but pending status triggers independently.
        assert!(order.is_eligible(now));
    }

    #[test]
    fn test_ineligible_future_next_check_failed_status() {
        let now = now_ms();
        let mut order = Order::pending("X");
        order.status = Some(OrderStatus::Failed);
        order.next_check = Some(now + 60_000);
        assert!(!order.is_eligible(now));
    }

    #[test]
    fn test_eligibility_past_next_check() {
        let now = now_ms();
        let mut order = Order::pending("X");
        order.status = Some(OrderStatus::Failed);
        order.next_check = Some(now - 1);
        assert!(order.is_eligible(now));
    }
}
