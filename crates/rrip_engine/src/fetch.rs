use std::time::Duration;

use bytes::Bytes;
use engine_logging::engine_debug;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};

use crate::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ProbeInfo};

pub const DEFAULT_USER_AGENT: &str = "rrip / CLI Tool";
pub const DEFAULT_API_BASE: &str = "https://www.reddit.com";

pub type ByteStream = BoxStream<'static, Result<Bytes, FetchError>>;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_base: String,
    pub user_agent: String,
    /// No timeout unless set; a stalled request waits for an interrupt.
    pub connect_timeout: Option<Duration>,
    pub redirect_limit: usize,
    /// Upper bound for pages fetched to look for embedded media.
    pub max_page_bytes: u64,
    pub page_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: None,
            redirect_limit: 10,
            max_page_bytes: 5 * 1024 * 1024,
            page_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Network access of the pipeline.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Body of a listing page, requested as JSON.
    async fn get_listing(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Metadata-only request for a media link.
    async fn probe(&self, url: &str) -> Result<ProbeInfo, FetchError>;

    /// A whole HTML page, bounded in size.
    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchError>;

    /// Body of a media link as a stream of chunks.
    async fn open_stream(&self, url: &str) -> Result<ByteStream, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit));
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// Send and log the answer, whatever its status.
    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let response = request.send().await.map_err(from_reqwest)?;
        engine_debug!(
            "{} -> {} {}",
            response.url(),
            response.status(),
            content_type(response.headers()).unwrap_or_default()
        );
        Ok(response)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FetchError> {
        let response = self.exchange(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let reason = status.canonical_reason().unwrap_or("unexpected status");
        Err(FetchError::new(FailureKind::HttpStatus(status.as_u16()), reason))
    }

    fn accepts_page(&self, content_type: Option<&str>) -> bool {
        let Some(mime) = content_type.and_then(|ct| ct.split(';').next()) else {
            return false;
        };
        let mime = mime.trim();
        self.settings
            .page_content_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(mime))
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get_listing(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = parse_url(url)?;
        let response = self
            .send(self.client.get(url).header(ACCEPT, "application/json"))
            .await?;
        let body = response.bytes().await.map_err(from_reqwest)?;
        Ok(body.to_vec())
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, FetchError> {
        let url = parse_url(url)?;
        // The status is judged by the caller together with the content type.
        let response = self.exchange(self.client.head(url)).await?;
        let headers = response.headers();
        // Read the header directly: a HEAD response has no body to size.
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        Ok(ProbeInfo {
            status: response.status().as_u16(),
            content_type: content_type(headers),
            content_length,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let response = self.send(self.client.get(parse_url(url)?)).await?;
        let limit = self.settings.max_page_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(page_too_large(limit));
        }

        let content_type = content_type(response.headers());
        if !self.accepts_page(content_type.as_deref()) {
            let content_type = content_type.unwrap_or_default();
            return Err(FetchError::new(
                FailureKind::NotAPage { content_type },
                "no og: tags to read",
            ));
        }

        let final_url = response.url().to_string();
        let bytes = read_bounded(response, limit).await?;
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }

    async fn open_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        let url = parse_url(url)?;
        let response = self.send(self.client.get(url)).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(from_reqwest))
            .boxed())
    }
}

fn parse_url(url: &str) -> Result<reqwest::Url, FetchError> {
    reqwest::Url::parse(url)
        .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Collect a body, giving up once it grows past `limit`.
async fn read_bounded(response: reqwest::Response, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(from_reqwest)?;
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(page_too_large(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn page_too_large(limit: u64) -> FetchError {
    FetchError::new(FailureKind::PageTooLarge { limit }, "page skipped")
}

fn from_reqwest(err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::TooManyRedirects
    } else {
        FailureKind::Network
    };
    FetchError::new(kind, err.to_string())
}
