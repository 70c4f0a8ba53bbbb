//! HTTP push gateway client.
//!
//! [`PushDelivery`] POSTs batches of [`PushMessage`]s as a JSON array and
//! reads one ticket per message back:
//!
//! ```json
//! { "data": [ { "status": "ok" }, { "status": "error", "message": "...",
//!               "details": { "error": "DeviceNotRegistered" } } ] }
//! ```
//!
//! Network errors and 5xx responses are retried with exponential backoff
//! (1 s, 2 s, 4 s). Any other non-2xx status fails that request
//! immediately; its messages are reported as failures and the remaining
//! requests are still sent.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use hearth_core::notification::PushMessage;
use serde::Deserialize;

use super::{DeliveryFailure, DeliveryReport, PushError, PushTransport};

/// Retry delays in seconds.
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum messages per gateway request.
pub const MAX_BATCH_SIZE: usize = 100;

/// Gateway error code for a token that should be forgotten.
const DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

// ---------------------------------------------------------------------------
// Gateway response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    data: Vec<Ticket>,
}

#[derive(Debug, Deserialize)]
struct Ticket {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<TicketDetails>,
}

#[derive(Debug, Deserialize)]
struct TicketDetails {
    #[serde(default)]
    error: Option<String>,
}

/// Pair tickets with the messages they answer, in order.
///
/// Messages without a ticket count as failures.
fn build_report(messages: &[PushMessage], tickets: Vec<Ticket>) -> DeliveryReport {
    let mut report = DeliveryReport::default();
    let mut tickets = tickets.into_iter();

    for msg in messages {
        match tickets.next() {
            Some(ticket) if ticket.status == "ok" => report.delivered += 1,
            Some(ticket) => {
                let code = ticket.details.and_then(|d| d.error);
                report.failures.push(DeliveryFailure {
                    to: msg.to.clone(),
                    unregistered: code.as_deref() == Some(DEVICE_NOT_REGISTERED),
                    message: ticket
                        .message
                        .or(code)
                        .unwrap_or_else(|| ticket.status.clone()),
                });
            }
            None => report.failures.push(DeliveryFailure {
                to: msg.to.clone(),
                message: "No ticket returned".to_string(),
                unregistered: false,
            }),
        }
    }

    report
}

/// Send `messages` in gateway-sized chunks, folding every outcome into one
/// report. A chunk that errors counts each of its messages as failed.
async fn send_in_chunks<'a, F, Fut>(
    messages: &'a [PushMessage],
    mut send_chunk: F,
) -> DeliveryReport
where
    F: FnMut(&'a [PushMessage]) -> Fut,
    Fut: Future<Output = Result<DeliveryReport, PushError>>,
{
    let mut report = DeliveryReport::default();
    for chunk in messages.chunks(MAX_BATCH_SIZE) {
        match send_chunk(chunk).await {
            Ok(chunk_report) => report.merge(chunk_report),
            Err(e) => {
                tracing::warn!(count = chunk.len(), error = %e, "Push chunk failed");
                let message = e.to_string();
                report.failures.extend(chunk.iter().map(|msg| DeliveryFailure {
                    to: msg.to.clone(),
                    message: message.clone(),
                    unregistered: false,
                }));
            }
        }
    }
    report
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

/// Delivers push batches to an HTTP push gateway.
#[derive(Debug)]
pub struct PushDelivery {
    client: reqwest::Client,
    gateway_url: reqwest::Url,
}

impl PushDelivery {
    pub fn new(gateway_url: &str) -> Result<Self, PushError> {
        let gateway_url = reqwest::Url::parse(gateway_url)
            .map_err(|_| PushError::InvalidUrl(gateway_url.to_string()))?;
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            gateway_url,
        })
    }

    pub fn gateway_url(&self) -> &str {
        self.gateway_url.as_str()
    }

    /// Send one chunk, retrying transient failures.
    async fn send_chunk(&self, chunk: &[PushMessage]) -> Result<DeliveryReport, PushError> {
        let mut last_err: Option<PushError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(chunk).await {
                Ok(report) => return Ok(report),
                Err(PushError::HttpStatus(status)) if status < 500 => {
                    return Err(PushError::HttpStatus(status));
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url = %self.gateway_url,
                        error = %e,
                        "Push delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        match self.try_send(chunk).await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!(
                    url = %self.gateway_url,
                    error = %e,
                    "Push delivery failed after all retries"
                );
                Err(last_err.unwrap_or(e))
            }
        }
    }

    /// Execute a single POST and parse the tickets.
    async fn try_send(&self, chunk: &[PushMessage]) -> Result<DeliveryReport, PushError> {
        let response = self
            .client
            .post(self.gateway_url.clone())
            .json(chunk)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        let body: GatewayResponse = response.json().await?;
        Ok(build_report(chunk, body.data))
    }
}

#[async_trait]
impl PushTransport for PushDelivery {
    async fn send(&self, messages: &[PushMessage]) -> Result<DeliveryReport, PushError> {
        Ok(send_in_chunks(messages, |chunk| self.send_chunk(chunk)).await)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn message(to: &str) -> PushMessage {
        PushMessage {
            to: to.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            data: serde_json::Value::Null,
        }
    }

    fn tickets(json: &str) -> Vec<Ticket> {
        serde_json::from_str::<GatewayResponse>(json)
            .expect("valid response")
            .data
    }

    #[test]
    fn report_counts_ok_and_error_tickets() {
        let messages = [message("a"), message("b"), message("c")];
        let report = build_report(
            &messages,
            tickets(
                r#"{"data": [
                    {"status": "ok", "id": "1"},
                    {"status": "error", "message": "gone", "details": {"error": "DeviceNotRegistered"}},
                    {"status": "error", "details": {"error": "MessageTooBig"}}
                ]}"#,
            ),
        );

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].message, "gone");
        assert!(report.failures[0].unregistered);
        assert_eq!(report.failures[1].message, "MessageTooBig");
        assert!(!report.failures[1].unregistered);
        assert_eq!(report.unregistered_tokens(), vec!["b".to_string()]);
    }

    #[test]
    fn messages_without_tickets_fail() {
        let messages = [message("a"), message("b")];
        let report = build_report(&messages, tickets(r#"{"data": [{"status": "ok"}]}"#));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failures[0].to, "b");
        assert_eq!(report.failures[0].message, "No ticket returned");
    }

    #[test]
    fn missing_data_key_is_an_empty_ticket_list() {
        assert!(tickets("{}").is_empty());
    }

    #[test]
    fn invalid_gateway_url_is_rejected() {
        assert_matches!(PushDelivery::new("not a url"), Err(PushError::InvalidUrl(_)));
        let delivery = PushDelivery::new("https://push.example.com/send").expect("valid url");
        assert_eq!(delivery.gateway_url(), "https://push.example.com/send");
    }

    #[test]
    fn push_error_display_http_status() {
        assert_eq!(PushError::HttpStatus(502).to_string(), "Push gateway returned HTTP 502");
    }

    #[tokio::test]
    async fn failed_chunk_does_not_stop_later_chunks() {
        let mut messages: Vec<PushMessage> =
            (0..MAX_BATCH_SIZE + 50).map(|i| message(&format!("t{i}"))).collect();
        messages[MAX_BATCH_SIZE + 1].to = "gone".to_string();

        let mut sizes = Vec::new();
        let report = send_in_chunks(&messages, |chunk| {
            sizes.push(chunk.len());
            let first = sizes.len() == 1;
            async move {
                if first {
                    return Err(PushError::HttpStatus(400));
                }
                let mut body = vec![r#"{"status": "ok"}"#; chunk.len()];
                body[1] = r#"{"status": "error", "details": {"error": "DeviceNotRegistered"}}"#;
                let json = format!(r#"{{"data": [{}]}}"#, body.join(","));
                Ok(build_report(chunk, tickets(&json)))
            }
        })
        .await;

        assert_eq!(sizes, vec![MAX_BATCH_SIZE, 50]);
        assert_eq!(report.delivered, 49);
        assert_eq!(report.failures.len(), MAX_BATCH_SIZE + 1);
        assert_eq!(report.failures[0].to, "t0");
        assert_eq!(report.failures[0].message, "Push gateway returned HTTP 400");
        assert!(!report.failures[0].unregistered);
        assert_eq!(report.unregistered_tokens(), vec!["gone".to_string()]);
    }

    #[test]
    fn reports_merge() {
        let mut a = DeliveryReport {
            delivered: 2,
            failures: vec![],
        };
        a.merge(build_report(
            &[message("x")],
            tickets(r#"{"data": [{"status": "error", "message": "nope"}]}"#),
        ));
        assert_eq!(a.delivered, 2);
        assert_eq!(a.failures.len(), 1);
    }
}
