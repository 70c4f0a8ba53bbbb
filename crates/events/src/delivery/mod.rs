//! Push delivery.
//!
//! [`PushTransport`] is the seam between the [`PushWorker`](crate::PushWorker)
//! and whatever actually talks to the push gateway; [`push::PushDelivery`]
//! is the HTTP implementation.

use async_trait::async_trait;
use hearth_core::notification::PushMessage;

pub mod push;

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("Invalid push gateway URL {0:?}")]
    InvalidUrl(String),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),
}

/// Why a single message was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Destination token of the failed message.
    pub to: String,
    pub message: String,
    /// The gateway reported the token as no longer registered.
    pub unregistered: bool,
}

/// Per-message outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.delivered += other.delivered;
        self.failures.extend(other.failures);
    }

    /// Tokens the gateway reported as unregistered.
    pub fn unregistered_tokens(&self) -> Vec<String> {
        self.failures
            .iter()
            .filter(|f| f.unregistered)
            .map(|f| f.to.clone())
            .collect()
    }
}

/// Sends a batch of push messages.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, messages: &[PushMessage]) -> Result<DeliveryReport, PushError>;
}
