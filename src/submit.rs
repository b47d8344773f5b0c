use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Exact response body the endpoint returns on success. Anything else,
/// including whitespace variations, is a rejection.
pub const SUCCESS_SENTINEL: &str = "OK";

/// Normalized submission forwarded to the webhook. `phone` carries the
/// internationally formatted display string, `device` the fingerprint
/// label; both are omitted from the wire form when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitPayload {
    pub name: String,
    pub email: String,
    pub message: String,
    pub phone: Option<String>,
    pub device: Option<String>,
}

impl SubmitPayload {
    /// Key/value pairs for the URL-encoded POST body.
    pub fn to_form_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("message", self.message.as_str()),
        ];
        if let Some(phone) = &self.phone {
            pairs.push(("phone", phone.as_str()));
        }
        if let Some(device) = &self.device {
            pairs.push(("device", device.as_str()));
        }
        pairs
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Endpoint rejected the submission: {0}")]
    RejectedBody(String),
    #[error("Network error: {0}")]
    Transport(String),
}

/// Wire-level POST of a payload, swappable for a fake in tests.
#[async_trait]
pub trait SubmitTransport: Send + Sync {
    async fn post(&self, payload: &SubmitPayload) -> Result<String, SubmitError>;
}

/// Transport over a real HTTP connection.
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout_secs: u64, user_agent: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid submit endpoint URL: {endpoint}"))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SubmitTransport for HttpTransport {
    async fn post(&self, payload: &SubmitPayload) -> Result<String, SubmitError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&payload.to_form_pairs())
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        // The endpoint signals outcome through the body alone; the
        // status code is recorded only for diagnostics.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        log::debug!("Submit endpoint answered {status} with body {body:?}");

        Ok(body)
    }
}

/// Submission client over an injected transport: posts the payload and
/// maps the body to success or rejection.
pub struct RemoteSubmitClient {
    transport: Arc<dyn SubmitTransport>,
}

impl RemoteSubmitClient {
    pub fn new(transport: Arc<dyn SubmitTransport>) -> Self {
        Self { transport }
    }

    pub async fn send(&self, payload: &SubmitPayload) -> Result<(), SubmitError> {
        let body = self.transport.post(payload).await?;
        if body == SUCCESS_SENTINEL {
            Ok(())
        } else {
            Err(SubmitError::RejectedBody(body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedTransport {
        body: String,
    }

    #[async_trait]
    impl SubmitTransport for ScriptedTransport {
        async fn post(&self, _payload: &SubmitPayload) -> Result<String, SubmitError> {
            Ok(self.body.clone())
        }
    }

    fn payload() -> SubmitPayload {
        SubmitPayload {
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            message: "Hello".to_string(),
            phone: Some("+998 99 123 45 67".to_string()),
            device: Some("iPhone 12/13/14".to_string()),
        }
    }

    #[test]
    fn form_pairs_include_optional_fields_when_present() {
        let p = payload();
        let pairs = p.to_form_pairs();
        assert_eq!(
            pairs,
            vec![
                ("name", "John"),
                ("email", "john@example.com"),
                ("message", "Hello"),
                ("phone", "+998 99 123 45 67"),
                ("device", "iPhone 12/13/14"),
            ]
        );
    }

    #[test]
    fn form_pairs_omit_absent_fields() {
        let mut p = payload();
        p.phone = None;
        p.device = None;
        let keys: Vec<&str> = p.to_form_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["name", "email", "message"]);
    }

    #[tokio::test]
    async fn sentinel_body_is_success() {
        let client = RemoteSubmitClient::new(Arc::new(ScriptedTransport {
            body: "OK".to_string(),
        }));
        assert!(client.send(&payload()).await.is_ok());
    }

    #[tokio::test]
    async fn non_sentinel_body_is_a_rejection() {
        let client = RemoteSubmitClient::new(Arc::new(ScriptedTransport {
            body: "ok".to_string(),
        }));
        let err = client.send(&payload()).await.unwrap_err();
        assert!(matches!(err, SubmitError::RejectedBody(body) if body == "ok"));
    }

    #[tokio::test]
    async fn padded_sentinel_is_a_rejection() {
        let client = RemoteSubmitClient::new(Arc::new(ScriptedTransport {
            body: "OK\n".to_string(),
        }));
        assert!(client.send(&payload()).await.is_err());
    }

    #[test]
    fn invalid_endpoint_url_is_rejected_at_construction() {
        assert!(HttpTransport::new("not a url", 10, "test/1.0").is_err());
    }
}
