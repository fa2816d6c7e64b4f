#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Mutex, Once};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use rrip_core::{RunConfig, Stats, TerminationReason};
use rrip_engine::{
    ByteStream, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher,
    LinkLogs, ProbeInfo, ProgressSink, RunContext, RunError, TerminationController,
};
use serde_json::{json, Value};

pub const API_BASE: &str = "https://www.reddit.com";
const CHUNK: usize = 4096;

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(engine_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct CollectSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for CollectSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn post(id: &str, title: &str, url: &str, score: i64) -> Value {
    json!({
        "kind": "t3",
        "data": {
            "name": format!("t3_{id}"),
            "title": title,
            "url": url,
            "score": score,
            "subreddit": "pics",
            "author": "someone",
            "link_flair_text": null
        }
    })
}

pub fn listing(posts: &[Value]) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "kind": "Listing",
        "data": { "children": posts, "after": null }
    }))
    .unwrap()
}

enum Body {
    Complete,
    /// First chunk, then a transport error.
    Broken,
    /// First chunk, then terminate the run and stall.
    Interrupting(TerminationController),
}

struct Media {
    content_type: String,
    bytes: Vec<u8>,
    declared: bool,
    body: Body,
}

/// In-memory listing and media host.
///
/// Listing pages are served by cursor: no `after` yields the first page, an
/// `after` naming the last entry of page N yields page N+1, anything else an
/// empty page.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Vec<(Option<String>, Vec<u8>)>,
    media: HashMap<String, Media>,
    html: HashMap<String, String>,
    unreachable: Vec<String>,
    /// Probing these links terminates the run before answering.
    interrupt_on_probe: HashMap<String, TerminationController>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, posts: &[Value]) -> Self {
        let last = posts
            .last()
            .and_then(|post| post["data"]["name"].as_str())
            .map(str::to_string);
        self.pages.push((last, listing(posts)));
        self
    }

    pub fn with_media(self, url: &str, content_type: &str, len: usize) -> Self {
        self.add_media(url, content_type, len, true, Body::Complete)
    }

    pub fn with_undeclared_media(self, url: &str, content_type: &str, len: usize) -> Self {
        self.add_media(url, content_type, len, false, Body::Complete)
    }

    pub fn with_broken_media(self, url: &str, len: usize) -> Self {
        self.add_media(url, "image/jpeg", len, true, Body::Broken)
    }

    pub fn with_interrupting_media(
        self,
        url: &str,
        len: usize,
        termination: TerminationController,
    ) -> Self {
        self.add_media(url, "video/mp4", len, true, Body::Interrupting(termination))
    }

    pub fn with_interrupting_probe(
        mut self,
        url: &str,
        len: usize,
        termination: TerminationController,
    ) -> Self {
        self.interrupt_on_probe.insert(url.to_string(), termination);
        self.with_media(url, "image/jpeg", len)
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.unreachable.push(url.to_string());
        self
    }

    pub fn with_html(mut self, url: &str, html: &str) -> Self {
        self.html.insert(url.to_string(), html.to_string());
        self
    }

    fn add_media(
        mut self,
        url: &str,
        content_type: &str,
        len: usize,
        declared: bool,
        body: Body,
    ) -> Self {
        let bytes = (0..len).map(|i| (i % 251) as u8).collect();
        self.media.insert(
            url.to_string(),
            Media {
                content_type: content_type.to_string(),
                bytes,
                declared,
                body,
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.requests()
            .iter()
            .filter(|request| request.starts_with(verb))
            .count()
    }

    fn log(&self, verb: &str, url: &str) {
        self.requests.lock().unwrap().push(format!("{verb} {url}"));
    }
}

fn connection_refused(url: &str) -> FetchError {
    FetchError {
        kind: FailureKind::Network,
        message: format!("connection refused: {url}"),
    }
}

fn missing(url: &str) -> FetchError {
    FetchError {
        kind: FailureKind::HttpStatus(404),
        message: format!("no such resource: {url}"),
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    async fn get_listing(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.log("LIST", url);
        let parsed = url::Url::parse(url).unwrap();
        let after = parsed
            .query_pairs()
            .find(|(key, _)| key == "after")
            .map(|(_, value)| value.into_owned());
        let index = match after {
            None => Some(0),
            Some(after) => self
                .pages
                .iter()
                .position(|(last, _)| last.as_deref() == Some(after.as_str()))
                .map(|i| i + 1),
        };
        Ok(index
            .and_then(|i| self.pages.get(i))
            .map(|(_, body)| body.clone())
            .unwrap_or_else(|| listing(&[])))
    }

    async fn probe(&self, url: &str) -> Result<ProbeInfo, FetchError> {
        self.log("HEAD", url);
        if self.unreachable.iter().any(|link| link == url) {
            return Err(connection_refused(url));
        }
        if let Some(termination) = self.interrupt_on_probe.get(url) {
            termination.terminate(TerminationReason::UserInterrupt);
        }
        let Some(media) = self.media.get(url) else {
            return Ok(ProbeInfo {
                status: 404,
                content_type: Some("text/html".to_string()),
                content_length: None,
            });
        };
        Ok(ProbeInfo {
            status: 200,
            content_type: Some(media.content_type.clone()),
            content_length: media.declared.then_some(media.bytes.len() as u64),
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.log("PAGE", url);
        let html = self.html.get(url).ok_or_else(|| missing(url))?;
        Ok(FetchOutput {
            bytes: html.as_bytes().to_vec(),
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                content_type: Some("text/html; charset=utf-8".to_string()),
                byte_len: html.len() as u64,
            },
        })
    }

    async fn open_stream(&self, url: &str) -> Result<ByteStream, FetchError> {
        self.log("GET", url);
        let media = self.media.get(url).ok_or_else(|| missing(url))?;
        let chunks: Vec<Result<Bytes, FetchError>> = media
            .bytes
            .chunks(CHUNK)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        let stream = match &media.body {
            Body::Complete => stream::iter(chunks).boxed(),
            Body::Broken => stream::iter(chunks.into_iter().take(1))
                .chain(stream::once(async {
                    Err(FetchError {
                        kind: FailureKind::Network,
                        message: "connection reset".to_string(),
                    })
                }))
                .boxed(),
            Body::Interrupting(termination) => {
                let termination = termination.clone();
                stream::iter(chunks.into_iter().take(1))
                    .chain(stream::once(async move {
                        termination.terminate(TerminationReason::UserInterrupt);
                        std::future::pending::<Result<Bytes, FetchError>>().await
                    }))
                    .boxed()
            }
        };
        Ok(stream)
    }
}

pub struct RunResult {
    pub result: Result<TerminationReason, RunError>,
    pub stats: Stats,
    pub events: Vec<EngineEvent>,
}

pub async fn run_with(
    config: &RunConfig,
    fetcher: &FakeFetcher,
    termination: &TerminationController,
) -> RunResult {
    init_logging();
    let sink = CollectSink::default();
    let ctx = RunContext {
        config,
        api_base: API_BASE,
        fetcher,
        sink: &sink,
        termination,
    };
    let mut logs = LinkLogs::new();
    let mut stats = Stats::new();
    let result = rrip_engine::run(&ctx, &mut logs, &mut stats).await;
    RunResult {
        result,
        stats,
        events: sink.events(),
    }
}

pub async fn run_once(config: &RunConfig, fetcher: &FakeFetcher) -> RunResult {
    run_with(config, fetcher, &TerminationController::new()).await
}

pub fn assert_stats_invariant(stats: &Stats) {
    assert!(
        stats.saved() + stats.failed() + stats.repeated() <= stats.processed(),
        "{stats:?}"
    );
}

pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
