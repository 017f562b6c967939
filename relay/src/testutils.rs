use crate::assets::{Assets, BadgeColor};
use crate::collector::{Collector, Hit};
use crate::errors::RelayError;
use crate::page::PageTemplate;
use async_trait::async_trait;
use http::StatusCode;
use hyper::body::Bytes;
use tokio::sync::mpsc;

pub const TEST_PIXEL: &[u8] = b"GIF89a-test-pixel";

/// Records every hit it is handed and reports success.
pub struct RecordingCollector {
    hits: mpsc::UnboundedSender<Hit>,
}

impl RecordingCollector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Hit>) {
        let (hits, rx) = mpsc::unbounded_channel();
        (RecordingCollector { hits }, rx)
    }
}

#[async_trait]
impl Collector for RecordingCollector {
    async fn send(&self, hit: &Hit) -> Result<StatusCode, RelayError> {
        let _ = self.hits.send(hit.clone());
        Ok(StatusCode::OK)
    }
}

/// Fails every delivery the way an unreachable collector would.
pub struct FailingCollector;

#[async_trait]
impl Collector for FailingCollector {
    async fn send(&self, _hit: &Hit) -> Result<StatusCode, RelayError> {
        Err(RelayError::CollectorStatus(StatusCode::BAD_GATEWAY))
    }
}

pub fn test_badge(color: BadgeColor) -> Bytes {
    Bytes::from(format!("<svg id=\"{}\"/>", color.as_str()))
}

pub fn test_assets() -> Assets {
    let page = PageTemplate::parse("<h1>{{ account }}</h1><p>{{ referer }}</p>").unwrap();
    Assets::from_parts(Bytes::from_static(TEST_PIXEL), test_badge, page)
}
