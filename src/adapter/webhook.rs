//! HTTP bridge adapter.
//!
//! Posts each capability change as JSON to a platform bridge:
//!
//! ```text
//! POST <url>
//! {"action": "grant", "subject": "1234", "kind": "mute", "capability": "Muted"}
//! ```
//!
//! Any 2xx response is success. 403 maps to [`AdapterError::Forbidden`],
//! 404 to [`AdapterError::NotFound`], everything else to `Rejected`.

use super::{AdapterError, CapabilityAdapter};
use crate::restriction::{RestrictionKind, SubjectId};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

pub struct WebhookAdapter {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookAdapter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("restrictd/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            http_client,
        }
    }

    async fn send(
        &self,
        action: &'static str,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<(), AdapterError> {
        let body = serde_json::json!({
            "action": action,
            "subject": subject.to_string(),
            "kind": kind.as_str(),
            "capability": kind.capability_name(),
        });

        let response = self
            .http_client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(action, subject = %subject, kind = %kind, status = %status, "bridge responded");
        status_to_result(status, subject).inspect_err(|e| {
            warn!(action, subject = %subject, kind = %kind, error = %e, "bridge rejected capability change");
        })
    }
}

fn status_to_result(status: StatusCode, subject: SubjectId) -> Result<(), AdapterError> {
    if status.is_success() {
        return Ok(());
    }
    match status {
        StatusCode::FORBIDDEN => Err(AdapterError::Forbidden),
        StatusCode::NOT_FOUND => Err(AdapterError::NotFound(subject)),
        other => Err(AdapterError::Rejected {
            status: other.as_u16(),
        }),
    }
}

#[async_trait]
impl CapabilityAdapter for WebhookAdapter {
    async fn grant(&self, subject: SubjectId, kind: RestrictionKind) -> Result<(), AdapterError> {
        self.send("grant", subject, kind).await
    }

    async fn revoke(
        &self,
        subject: SubjectId,
        kind: RestrictionKind,
    ) -> Result<(), AdapterError> {
        self.send("revoke", subject, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert!(status_to_result(StatusCode::OK, SubjectId(1)).is_ok());
        assert!(status_to_result(StatusCode::NO_CONTENT, SubjectId(1)).is_ok());
    }

    #[test]
    fn failure_statuses_map_to_errors() {
        assert_eq!(
            status_to_result(StatusCode::FORBIDDEN, SubjectId(1)),
            Err(AdapterError::Forbidden)
        );
        assert_eq!(
            status_to_result(StatusCode::NOT_FOUND, SubjectId(7)),
            Err(AdapterError::NotFound(SubjectId(7)))
        );
        assert_eq!(
            status_to_result(StatusCode::BAD_GATEWAY, SubjectId(1)),
            Err(AdapterError::Rejected { status: 502 })
        );
    }

    #[tokio::test]
    async fn unreachable_bridge_is_transport_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let adapter = WebhookAdapter::new("http://127.0.0.1:9/caps", Duration::from_secs(2));
        let err = adapter
            .grant(SubjectId(1), RestrictionKind::Mute)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
    }
}
