use crate::errors::{RelayError, Result};
use crate::identity::ClientId;
use crate::payload::Payload;
use async_trait::async_trait;
use http::StatusCode;
use http::header::{CONTENT_TYPE, USER_AGENT};
use url::Url;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Everything needed to deliver one pageview.
#[derive(Debug, Clone)]
pub struct Hit {
    pub payload: Payload,
    /// Forwarded verbatim from the beacon request, empty when absent
    pub user_agent: String,
    pub remote_addr: String,
    pub cid: ClientId,
}

/// Destination for pageview hits.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Delivers a hit, returning the collector's status on success. Non-2xx
    /// statuses are errors.
    async fn send(&self, hit: &Hit) -> Result<StatusCode>;
}

/// Measurement protocol collector reached over HTTP.
#[derive(Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    url: Url,
}

impl HttpCollector {
    pub fn new(url: Url) -> Self {
        HttpCollector {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn send(&self, hit: &Hit) -> Result<StatusCode> {
        let response = self
            .client
            .post(self.url.clone())
            .header(USER_AGENT, hit.user_agent.as_str())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(hit.payload.encode())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::CollectorStatus(status));
        }
        Ok(status)
    }
}
