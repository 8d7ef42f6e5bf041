//! Shared helpers and test doubles for integration tests
#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use axum::http::Request;
use linkpeek::links::LinkService;
use linkpeek::metadata::{Metadata, MetadataSource};
use linkpeek::models::{AnalyticsEvent, Link, NewAnalyticsEvent, NewLink};
use linkpeek::shortcode::{CodeSource, RandomCodeSource, ShortCodeIssuer};
use linkpeek::storage::{SqliteStorage, Storage, StorageResult};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::Layer;

/// In-memory SQLite. A single connection keeps every query on the same database.
pub async fn create_test_storage() -> SqliteStorage {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    storage
}

/// Database file in the temp dir, removed with its WAL files on drop.
pub struct TempDatabase {
    path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("linkpeek-test-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// File-backed SQLite with a multi-connection pool, so writers really
/// run side by side.
pub async fn create_file_storage(max_connections: u32) -> (SqliteStorage, TempDatabase) {
    let database = TempDatabase::new();
    let storage = SqliteStorage::new(&database.url(), max_connections)
        .await
        .unwrap();
    storage.init().await.unwrap();
    (storage, database)
}

pub fn new_link(short_code: &str) -> NewLink {
    NewLink {
        short_code: short_code.to_string(),
        original_url: format!("https://example.com/{short_code}"),
        title: String::new(),
        description: String::new(),
        image_url: String::new(),
    }
}

pub fn build_service(
    storage: Arc<dyn Storage>,
    codes: Arc<dyn CodeSource>,
    metadata: Arc<dyn MetadataSource>,
) -> Arc<LinkService> {
    let issuer = ShortCodeIssuer::with_source(Arc::clone(&storage), codes, 8);
    Arc::new(LinkService::new(storage, issuer, metadata))
}

/// Yields the scripted codes first, then random ones.
#[derive(Default)]
pub struct ScriptedCodes {
    codes: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedCodes {
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: Mutex::new(codes.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeSource for ScriptedCodes {
    fn next_code(&self, length: usize) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.codes.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| RandomCodeSource.next_code(length))
    }
}

/// Returns fixed metadata and counts how often it was asked.
pub struct StubMetadata {
    pub metadata: Metadata,
    pub calls: AtomicUsize,
}

impl StubMetadata {
    pub fn new(title: &str, description: &str, image_url: &str) -> Self {
        Self {
            metadata: Metadata {
                title: title.to_string(),
                description: description.to_string(),
                image_url: image_url.to_string(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for StubMetadata {
    async fn extract(&self, _url: &str) -> Metadata {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.clone()
    }
}

/// SQLite storage with switches for injecting failures.
pub struct FlakyStorage {
    inner: SqliteStorage,
    /// Short-code lookups report "not found" even for existing codes
    pub hide_short_codes: AtomicBool,
    /// Short-code lookups fail
    pub fail_lookups: AtomicBool,
    /// Click recording fails
    pub fail_clicks: AtomicBool,
}

impl FlakyStorage {
    pub async fn new() -> Self {
        Self {
            inner: create_test_storage().await,
            hide_short_codes: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
            fail_clicks: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn find_link_by_short_code(&self, short_code: &str) -> Result<Option<Link>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            anyhow::bail!("lookup unavailable");
        }
        if self.hide_short_codes.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_link_by_short_code(short_code).await
    }

    async fn find_link_by_id(&self, id: &str) -> Result<Option<Link>> {
        self.inner.find_link_by_id(id).await
    }

    async fn find_analytics_events(&self, link_id: &str) -> Result<Vec<AnalyticsEvent>> {
        self.inner.find_analytics_events(link_id).await
    }

    async fn create_link(&self, link: NewLink) -> StorageResult<Link> {
        self.inner.create_link(link).await
    }

    async fn increment_clicks(&self, id: &str, by: i64) -> Result<bool> {
        self.inner.increment_clicks(id, by).await
    }

    async fn create_analytics_event(
        &self,
        link_id: &str,
        event: NewAnalyticsEvent,
    ) -> Result<AnalyticsEvent> {
        self.inner.create_analytics_event(link_id, event).await
    }

    async fn delete_analytics_events_by_link_id(&self, link_id: &str) -> Result<u64> {
        self.inner.delete_analytics_events_by_link_id(link_id).await
    }

    async fn delete_link_by_id(&self, id: &str) -> Result<bool> {
        self.inner.delete_link_by_id(id).await
    }

    async fn list_links(&self) -> Result<Vec<Link>> {
        self.inner.list_links().await
    }

    async fn record_click(&self, link_id: &str, event: NewAnalyticsEvent) -> Result<AnalyticsEvent> {
        if self.fail_clicks.load(Ordering::SeqCst) {
            anyhow::bail!("analytics store unavailable");
        }
        self.inner.record_click(link_id, event).await
    }

    async fn remove_link(&self, id: &str) -> Result<bool> {
        self.inner.remove_link(id).await
    }
}

/// Helper layer to inject ConnectInfo for tests
#[derive(Clone)]
pub struct TestConnectInfoLayer;

impl<S> Layer<S> for TestConnectInfoLayer {
    type Service = TestConnectInfoMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TestConnectInfoMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct TestConnectInfoMiddleware<S> {
    inner: S,
}

impl<S, B> tower::Service<Request<B>> for TestConnectInfoMiddleware<S>
where
    S: tower::Service<Request<B>> + Clone,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let addr = SocketAddr::from(([127, 0, 0, 1], 12345));
        req.extensions_mut()
            .insert(axum::extract::connect_info::ConnectInfo(addr));
        self.inner.call(req)
    }
}
