//! api::transport
//!
//! One authenticated JSON request against the service.
//!
//! # Error Mapping
//!
//! | Reply | Error |
//! |-------|-------|
//! | 404, any body | [`ApiError::NotFound`] |
//! | non-2xx with `{message, code}` | [`ApiError::Api`] |
//! | non-2xx, empty or undecodable | [`ApiError::NoResponse`] |
//! | network or decode failure | [`ApiError::Transport`] |
//!
//! Every request emits one `debug` event with the method, resolved URL,
//! status and response body.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::traits::ApiError;
use crate::core::cancel::CancelToken;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

const USER_AGENT_VALUE: &str = concat!("clockify-cli/", env!("CARGO_PKG_VERSION"));

/// Error body sent with non-2xx replies.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: i64,
}

/// Shared, concurrency-safe request executor.
#[derive(Clone)]
pub struct Transport {
    client: Client,
    base_url: String,
    token: String,
    cancel: CancelToken,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("base_url", &self.base_url)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl Transport {
    /// Build a transport for `base_url` (no trailing slash needed).
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        cancel: CancelToken,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            cancel,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Attach the API key. Applied to every request built by this transport.
    fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let value = HeaderValue::from_str(&self.token)
            .map_err(|_| ApiError::Transport("API key contains invalid characters".into()))?;
        Ok(builder.header(API_KEY_HEADER, value))
    }

    /// Execute one request without a body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.execute::<T, ()>(Method::GET, path, query, None).await
    }

    /// Execute one request and decode the reply into `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`, so `T = ()` or
    /// `T = Option<_>` accept it.
    pub async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.authorize(self.client.request(method.clone(), &url))?;
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            let payload =
                serde_json::to_vec(body).map_err(|e| ApiError::Transport(e.to_string()))?;
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let resolved = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        tracing::debug!(
            method = %method,
            url = %resolved,
            status = status.as_u16(),
            body = %text,
            "api request"
        );

        if self.cancel.is_cancelled() {
            return Err(ApiError::Cancelled);
        }

        if status.is_success() {
            let raw = if text.trim().is_empty() { "null" } else { &text };
            return serde_json::from_str(raw)
                .map_err(|e| ApiError::Transport(format!("failed to decode response: {e}")));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound {
                path: path.to_string(),
            });
        }

        Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => ApiError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            },
            Err(_) => ApiError::NoResponse {
                status: status.as_u16(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_token() {
        let t = Transport::new("https://example.test/api/", "secret-key", CancelToken::new())
            .unwrap();
        let shown = format!("{t:?}");
        assert!(!shown.contains("secret-key"));
        assert_eq!(t.base_url(), "https://example.test/api");
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let t = Transport::new("http://127.0.0.1:9", "k", cancel).unwrap();
        let err = t.get::<serde_json::Value>("/user", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Cancelled));
    }
}
