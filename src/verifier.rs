//! Remote verification.
//!
//! Defines the `OrderVerifier` trait and the production HTTP
//! implementation against the verification service.
//!
//! API: `GET <base>/api/verificar/<id>` (id URL-encoded)
//! Auth: `Authorization: Bearer <token>` when a token is configured;
//!       the endpoint also accepts unauthenticated calls.
//! Response: `{ "status": "ok" | "fail", "reason"?: "..." }`
//!
//! Anything other than a well-formed `ok`/`fail` body — transport
//! errors, timeouts, non-2xx statuses, unexpected shapes — is reported
//! as `VerifyOutcome::Unknown` and never propagated as an error. The
//! polling engine does not distinguish "network down" from "ambiguous
//! response"; both mean "retry next pass".

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Request timeout when the config does not override it. The loop is
/// single-threaded, so a hung connection would stall every other order.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const VERIFIER_NAME: &str = "http";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

use crate::types::VerifyOutcome;

/// Abstraction over the remote verification capability.
///
/// The production implementation is `HttpVerifier`; tests substitute
/// scripted fakes.
#[async_trait]
pub trait OrderVerifier: Send + Sync {
    /// Check one order by id. Never fails — inconclusive results
    /// collapse to `VerifyOutcome::Unknown`.
    async fn verify(&self, order_id: &str) -> VerifyOutcome;

    /// Verifier name for logging and identification.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Response body of the verification endpoint.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Map a parsed response body to an outcome. Unknown status strings are
/// inconclusive, not failures.
fn interpret(resp: VerifyResponse) -> VerifyOutcome {
    match resp.status.as_deref() {
        Some("ok") => VerifyOutcome::Resolved,
        Some("fail") => VerifyOutcome::Failed {
            reason: resp.reason,
        },
        _ => VerifyOutcome::Unknown,
    }
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// Verifier backed by the remote HTTP verification service.
pub struct HttpVerifier {
    http: Client,
    base_url: String,
    /// Optional bearer token; absent means unauthenticated calls.
    token: Option<SecretString>,
}

impl HttpVerifier {
    /// Create a new verifier.
    ///
    /// `token` is optional — the service accepts unauthenticated reads,
    /// so a missing token degrades rather than fails.
    pub fn new(base_url: &str, token: Option<SecretString>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("ORDERMON/0.1.0 (order-verification-daemon)")
            .build()
            .context("Failed to build HTTP client for verifier")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn verify_url(&self, order_id: &str) -> String {
        format!(
            "{}/api/verificar/{}",
            self.base_url,
            urlencoding::encode(order_id)
        )
    }
}

#[async_trait]
impl OrderVerifier for HttpVerifier {
    async fn verify(&self, order_id: &str) -> VerifyOutcome {
        if order_id.is_empty() {
            warn!("Refusing to verify an empty order id");
            return VerifyOutcome::Unknown;
        }

        let url = self.verify_url(order_id);
        debug!(url = %url, "Verifying order");

        let mut req = self.http.get(&url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose_secret());
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(order_id, error = %e, "Verification request failed");
                return VerifyOutcome::Unknown;
            }
        };

        if !resp.status().is_success() {
            warn!(order_id, status = %resp.status(), "Verification endpoint returned an error status");
            return VerifyOutcome::Unknown;
        }

        match resp.json::<VerifyResponse>().await {
            Ok(body) => {
                let outcome = interpret(body);
                debug!(order_id, outcome = %outcome, "Verification response interpreted");
                outcome
            }
            Err(e) => {
                warn!(order_id, error = %e, "Verification response was not the expected shape");
                VerifyOutcome::Unknown
            }
        }
    }

    fn name(&self) -> &str {
        VERIFIER_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
