use anyhow::{Context, Result};
use reqwest::{Response, StatusCode, header, multipart};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Source of the bearer token attached to outgoing requests
///
/// Injected rather than read ambiently so the client can be exercised without
/// a real token store. A `None` token is not an error: the request simply
/// goes out unauthenticated.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token persisted as a plain file under the config directory
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileTokenStore {
    fn token(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }
}

type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// Pre-configured request sender for the decoding service
///
/// Built once with the base URL, a bounded timeout and a default JSON
/// content type (multipart requests override it per call). Every response is
/// inspected for 401 before it is handed back; the unauthorized condition is
/// logged and reported to the optional hook, but propagation to the caller
/// is left untouched.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            on_unauthorized: None,
        })
    }

    /// Install a hook invoked on every 401 response (logout, token refresh).
    /// Observation only: the failed call still propagates to the caller.
    pub fn with_unauthorized_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Box::new(hook));
        self
    }

    pub async fn post_multipart(&self, path: &str, form: multipart::Form) -> Result<Response> {
        let mut request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .multipart(form);

        if let Some(token) = self.credentials.token() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", path))?;

        self.observe(&response);
        Ok(response)
    }

    fn observe(&self, response: &Response) {
        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::error!("Unauthorized response from {}", response.url());
            if let Some(hook) = &self.on_unauthorized {
                hook();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testserver;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StaticToken(Option<&'static str>);

    impl CredentialProvider for StaticToken {
        fn token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    fn client(base_url: &str, token: Option<&'static str>) -> ApiClient {
        ApiClient::new(
            base_url,
            Duration::from_secs(10),
            Arc::new(StaticToken(token)),
        )
        .unwrap()
    }

    fn form() -> multipart::Form {
        multipart::Form::new().part(
            "file",
            multipart::Part::bytes(vec![1, 2, 3]).file_name("probe.jpg"),
        )
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_present() {
        let (base_url, request_rx) = testserver::serve_once("200 OK", "{}").await;

        let response = client(&base_url, Some("sekrit"))
            .post_multipart("/upload", form())
            .await
            .unwrap();
        assert!(response.status().is_success());

        let request = request_rx.await.unwrap().to_lowercase();
        assert!(request.contains("authorization: bearer sekrit"));
        assert!(request.starts_with("post /upload"));
    }

    #[tokio::test]
    async fn missing_token_sends_unauthenticated_request() {
        let (base_url, request_rx) = testserver::serve_once("200 OK", "{}").await;

        client(&base_url, None)
            .post_multipart("/upload", form())
            .await
            .unwrap();

        let request = request_rx.await.unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn unauthorized_fires_hook_without_altering_response() {
        let (base_url, _request_rx) = testserver::serve_once("401 Unauthorized", "{}").await;

        static HOOK_FIRED: AtomicBool = AtomicBool::new(false);
        let response = client(&base_url, Some("expired"))
            .with_unauthorized_hook(|| HOOK_FIRED.store(true, Ordering::SeqCst))
            .post_multipart("/upload", form())
            .await
            .unwrap();

        assert!(HOOK_FIRED.load(Ordering::SeqCst));
        // The caller still sees the failure status
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn connection_error_passes_through() {
        // Nothing listens on this port
        let result = client("http://127.0.0.1:1", None)
            .post_multipart("/upload", form())
            .await;
        assert!(result.is_err());
    }
}
