use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, ORIGIN, REFERER};
use thiserror::Error;

use crate::request::RequestPayload;
use crate::settings::SessionCookies;

pub const DEFAULT_BASE_URL: &str = "https://www.perplexity.ai";
pub const ASK_PATH: &str = "/rest/sse/perplexity_ask";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0";
const ERROR_BODY_PREVIEW: usize = 200;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Access forbidden (403). Cookies may be expired.")]
    SessionExpired,
    #[error("Rate limit exceeded (429). Please wait.")]
    RateLimited,
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl TransportError {
    /// Maps a non-200 status to its failure class, keeping a short body preview.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            403 => Self::SessionExpired,
            429 => Self::RateLimited,
            _ => Self::Status {
                status,
                body: body.chars().take(ERROR_BODY_PREVIEW).collect(),
            },
        }
    }
}

/// Performs the authenticated exchange and hands back the raw event-stream body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_ask(
        &self,
        payload: &RequestPayload,
        cookies: &SessionCookies,
    ) -> Result<String, TransportError>;
}

// ============================================================================
// reqwest transport
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, ASK_PATH)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_ask(
        &self,
        payload: &RequestPayload,
        cookies: &SessionCookies,
    ) -> Result<String, TransportError> {
        let request_id = payload.request_id().to_string();
        log::debug!("POST {} (request {})", self.endpoint(), request_id);

        let response = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "text/event-stream")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(COOKIE, cookies.expose())
            .header(REFERER, "https://www.perplexity.ai/")
            .header(ORIGIN, "https://www.perplexity.ai")
            .header("X-Request-Id", request_id.as_str())
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-origin")
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if status != 200 {
            log::warn!("Upstream returned {} for request {}", status, request_id);
            return Err(TransportError::from_status(status, &body));
        }

        log::debug!("Received {} bytes for request {}", body.len(), request_id);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert!(matches!(
            TransportError::from_status(403, ""),
            TransportError::SessionExpired
        ));
        assert!(matches!(
            TransportError::from_status(429, ""),
            TransportError::RateLimited
        ));
        assert!(matches!(
            TransportError::from_status(502, "bad gateway"),
            TransportError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn test_body_preview_is_truncated() {
        let body = "é".repeat(500);
        let err = TransportError::from_status(500, &body);
        match err {
            TransportError::Status { body, .. } => assert_eq!(body.chars().count(), 200),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:9000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(
            transport.endpoint(),
            "http://localhost:9000/rest/sse/perplexity_ask"
        );
    }
}
