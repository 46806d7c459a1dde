use crate::app_log;
use crate::error::{EditorError, EditorResult};
use crate::logger::LogLevel;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Source of remote track audio
#[async_trait]
pub trait TrackFetcher: Send + Sync {
    /// Fetch the full audio payload at `url`
    async fn fetch(&self, url: &str) -> EditorResult<Vec<u8>>;
}

/// Fetches tracks over HTTP(S)
pub struct HttpTrackFetcher {
    client: reqwest::Client,
}

impl HttpTrackFetcher {
    pub fn new() -> EditorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Parse `raw` and require an http or https scheme
pub fn validate_track_url(raw: &str) -> EditorResult<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(EditorError::InvalidUrl(format!(
            "unsupported scheme '{}' in {}",
            other, raw
        ))),
    }
}

#[async_trait]
impl TrackFetcher for HttpTrackFetcher {
    async fn fetch(&self, url: &str) -> EditorResult<Vec<u8>> {
        let url = validate_track_url(url)?;
        app_log!(LogLevel::Debug, "offline_cache", "GET {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EditorError::DownloadFailed(format!(
                "{} responded with {}",
                url, status
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(EditorError::DownloadFailed(format!(
                "{} returned an empty body",
                url
            )));
        }
        Ok(bytes.to_vec())
    }
}
