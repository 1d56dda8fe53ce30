//! Best-effort outbound notifications.
//!
//! Sends are detached tasks whose results are discarded; a failed delivery
//! is logged and dropped, never retried and never surfaced. Nothing in the
//! primary flow awaits this channel.

use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Visit,
    Order,
    Event,
}

#[derive(Clone, Debug, Serialize)]
pub struct PageMeta {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Envelope {
    pub kind: EventKind,
    pub payload: Value,
    pub session: Uuid,
    pub page: PageMeta,
}

#[derive(Clone, Debug)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl Notifier {
    pub fn new(endpoint: Url) -> Self {
        Self { client: reqwest::Client::new(), endpoint }
    }

    /// Spawn the send and drop the handle.
    pub fn send_detached(&self, envelope: Envelope) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        tokio::spawn(async move {
            let sent = client.post(endpoint).json(&envelope).send().await;
            match sent.and_then(reqwest::Response::error_for_status) {
                Ok(_) => tracing::debug!(kind = ?envelope.kind, "notification delivered"),
                Err(e) => tracing::warn!(kind = ?envelope.kind, error = %e, "notification dropped"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_shape() {
        let envelope = Envelope {
            kind: EventKind::Visit,
            payload: json!({"started_at": "2024-01-01T00:00:00Z"}),
            session: Uuid::nil(),
            page: PageMeta { path: "#home".to_string(), referrer: None },
        };
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire["kind"], "visit");
        assert_eq!(wire["page"]["path"], "#home");
        assert!(wire["page"].get("referrer").is_none());
    }
}
