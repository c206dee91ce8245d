use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;

/// Status and raw body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Form fields of a POST request.
pub type Form = Vec<(&'static str, String)>;

/// The HTTP-shaped boundary to the document store.
///
/// A non-success status is still `Ok`; only failures to complete the
/// exchange are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Response, TransportError>;

    async fn post_form(&self, path: &str, form: Form) -> Result<Response, TransportError>;
}

/// `Transport` over a real HTTP connection.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn finish(res: reqwest::Response) -> Result<Response, TransportError> {
        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(Response { status, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Response, TransportError> {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::finish(res).await
    }

    async fn post_form(&self, path: &str, form: Form) -> Result<Response, TransportError> {
        let mut multipart = reqwest::multipart::Form::new();
        for (name, value) in form {
            multipart = multipart.text(name, value);
        }
        let res = self
            .client
            .post(self.url(path))
            .multipart(multipart)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Self::finish(res).await
    }
}

/// Percent-encode a relative path for use in a URL, keeping `/` separators.
pub fn encode_path(rel_path: &str) -> String {
    rel_path
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
