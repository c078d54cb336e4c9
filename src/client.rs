use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::request::RequestBuilder;
use crate::settings::SessionCookies;
use crate::stream::{DecodedAnswer, decode};
use crate::transport::Transport;

/// Asks one question per call: build payload, exchange, decode.
#[derive(Clone)]
pub struct PerplexityClient {
    transport: Arc<dyn Transport>,
    cookies: SessionCookies,
    builder: RequestBuilder,
}

impl PerplexityClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        cookies: SessionCookies,
        builder: RequestBuilder,
    ) -> Self {
        Self {
            transport,
            cookies,
            builder,
        }
    }

    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Replaces the session, keeping transport and request defaults.
    pub fn with_cookies(&self, cookies: SessionCookies) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cookies,
            builder: self.builder.clone(),
        }
    }

    pub async fn ask(&self, query: &str, model_id: &str) -> Result<DecodedAnswer> {
        if !self.has_cookies() {
            return Err(AppError::not_configured());
        }

        let payload = self.builder.build(query, model_id);
        log::info!(
            "Asking upstream (model {}, request {})",
            model_id,
            payload.request_id()
        );

        let body = self.transport.post_ask(&payload, &self.cookies).await?;
        let decoded = decode(&body);

        if decoded.answer.is_none() {
            log::warn!("No answer decoded for request {}", payload.request_id());
        }
        Ok(decoded)
    }
}

impl std::fmt::Debug for PerplexityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerplexityClient")
            .field("cookies", &self.cookies)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}
