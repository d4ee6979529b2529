//! HTTP transport seam.
//!
//! The pipeline only needs two verbs: GET as text (listing page) and GET as
//! bytes (file bodies). [`ReqwestTransport`] is the production implementation;
//! tests plug in instrumented fakes.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::FetchError;

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and decode the body as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
    /// GET `url` and read the full binary body.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Client tuning for [`ReqwestTransport`].
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            max_redirects: 10,
            user_agent: None,
        }
    }
}

/// `reqwest`-backed transport. Cheap to share; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    request_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(opts: &TransportOptions) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(opts.request_timeout)
            .connect_timeout(opts.connect_timeout)
            .redirect(reqwest::redirect::Policy::limited(opts.max_redirects));
        if let Some(ua) = &opts.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            request_timeout: opts.request_timeout,
        })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    fn map_reqwest(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
                after: self.request_timeout,
            };
        }
        FetchError::Request {
            url: url.to_string(),
            source: e,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.send(url).await?;
        resp.text().await.map_err(|e| self.map_reqwest(url, e))
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.send(url).await?;
        let body = resp.bytes().await.map_err(|e| self.map_reqwest(url, e))?;
        Ok(body.to_vec())
    }
}
