//! Polling engine.
//!
//! Owns the per-pass logic: load the order list, verify every eligible
//! order against the remote verifier, apply the state transition for
//! each outcome, and persist after every transition. The loop driver
//! (tick interval, cooldown, shutdown) lives in `main.rs`; `run_pass`
//! is a plain async fn so the pass body is testable without waiting on
//! wall-clock delays.

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::store::OrderStore;
use crate::types::{now_ms, Order, OrderStatus, VerifyOutcome};
use crate::verifier::OrderVerifier;

// ---------------------------------------------------------------------------
// Pass report
// ---------------------------------------------------------------------------

/// Summary of one full traversal of the order list.
#[derive(Debug, Default, Clone)]
pub struct PassReport {
    /// Orders present in the file when the pass started.
    pub loaded: usize,
    /// Verification attempts made this pass.
    pub verified: usize,
    /// Orders removed after a confirmed success.
    pub resolved: usize,
    /// Orders marked `failed` after a confirmed failure.
    pub failed: usize,
    /// Inconclusive attempts, retried next pass.
    pub inconclusive: usize,
    /// Orders left untouched (ineligible or missing an id).
    pub skipped: usize,
    /// The orders file existed but did not parse; nothing was attempted.
    pub store_unreadable: bool,
    /// Persistence failures during the pass (logged, not fatal).
    pub write_errors: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates one verification pass over the stored order list.
pub struct PollingEngine {
    store: OrderStore,
    verifier: Box<dyn OrderVerifier>,
}

impl PollingEngine {
    pub fn new(store: OrderStore, verifier: Box<dyn OrderVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Run a single pass: load → verify eligible orders one at a time →
    /// apply transitions → persist after each transition.
    ///
    /// Verification calls are strictly serialized. Removal uses a
    /// forward accumulation pass — resolved orders are simply not
    /// retained — so every order is visited exactly once regardless of
    /// how many are removed.
    pub async fn run_pass(&self) -> Result<PassReport> {
        let mut report = PassReport::default();

        let orders = match self.store.load() {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Orders file unreadable — skipping this pass");
                report.store_unreadable = true;
                return Ok(report);
            }
        };
        report.loaded = orders.len();

        let mut retained: Vec<Order> = Vec::with_capacity(orders.len());

        for (i, original) in orders.iter().enumerate() {
            let id = match original.id.as_deref() {
                Some(id) if !id.is_empty() => id,
                // No id: inert. Never verified, never removed, never mutated.
                _ => {
                    report.skipped += 1;
                    retained.push(original.clone());
                    continue;
                }
            };

            if !original.is_eligible(now_ms()) {
                report.skipped += 1;
                retained.push(original.clone());
                continue;
            }

            debug!(order_id = id, verifier = self.verifier.name(), "Verifying order");
            report.verified += 1;
            let outcome = self.verifier.verify(id).await;

            match outcome {
                VerifyOutcome::Resolved => {
                    info!(order_id = id, "Order verified — removing from list");
                    report.resolved += 1;
                    // Not retained.
                }
                VerifyOutcome::Failed { reason } => {
                    warn!(
                        order_id = id,
                        reason = reason.as_deref().unwrap_or("(none)"),
                        "Order failed verification"
                    );
                    report.failed += 1;
                    let mut order = original.clone();
                    order.status = Some(OrderStatus::Failed);
                    order.last_checked = Some(now_ms());
                    retained.push(order);
                }
                VerifyOutcome::Unknown => {
                    debug!(order_id = id, "Verification inconclusive, will retry next pass");
                    report.inconclusive += 1;
                    let mut order = original.clone();
                    order.last_checked = Some(now_ms());
                    retained.push(order);
                }
            }

            // Persist after every single transition: retained so far plus
            // the not-yet-visited tail.
            let mut snapshot = retained.clone();
            snapshot.extend_from_slice(&orders[i + 1..]);
            if let Err(e) = self.store.save(&snapshot) {
                error!(error = %e, "Failed to persist orders — continuing with in-memory state");
                report.write_errors += 1;
            }
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
