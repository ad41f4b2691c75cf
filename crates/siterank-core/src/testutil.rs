//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures::stream::{self, BoxStream, StreamExt};

use crate::config::QueueMode;
use crate::error::AppError;
use crate::models::{Rank, RankFields, RankResult};
use crate::traits::{
    DomainSource, Fetcher, RankParser, ResultSink, SinkConnector, SinkFactory, WorkQueue,
};

// ---------------------------------------------------------------------------
// MockQueue
// ---------------------------------------------------------------------------

#[derive(Default)]
struct QueueState {
    list: VecDeque<String>,
    set: BTreeSet<String>,
    batches: Vec<Vec<String>>,
    clear_calls: usize,
    pop_error: Option<AppError>,
}

/// In-memory queue with list or set semantics.
#[derive(Clone)]
pub struct MockQueue {
    mode: QueueMode,
    state: Arc<Mutex<QueueState>>,
}

impl MockQueue {
    pub fn new(mode: QueueMode) -> Self {
        Self {
            mode,
            state: Arc::new(Mutex::new(QueueState::default())),
        }
    }

    /// Queue whose first pop fails.
    pub fn with_pop_error(mode: QueueMode, error: AppError) -> Self {
        let queue = Self::new(mode);
        queue.state.lock().unwrap().pop_error = Some(error);
        queue
    }

    /// Insert domains without recording a batch.
    pub fn seed(&self, domains: &[&str]) {
        let mut state = self.state.lock().unwrap();
        for domain in domains {
            match self.mode {
                QueueMode::List => state.list.push_front(domain.to_string()),
                QueueMode::Set => {
                    state.set.insert(domain.to_string());
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.list.len() + state.set.len()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.batches.iter().map(Vec::len).collect()
    }

    /// Every domain pushed, in push order.
    pub fn pushed(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.batches.iter().flatten().cloned().collect()
    }

    pub fn clear_calls(&self) -> usize {
        self.state.lock().unwrap().clear_calls
    }
}

impl WorkQueue for MockQueue {
    async fn push(&self, domains: &[String]) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        for domain in domains {
            match self.mode {
                // LPUSH: newest at the head
                QueueMode::List => state.list.push_front(domain.clone()),
                QueueMode::Set => {
                    state.set.insert(domain.clone());
                }
            }
        }
        state.batches.push(domains.to_vec());
        Ok(())
    }

    async fn pop(&self) -> Result<Option<String>, AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.pop_error.take() {
            return Err(e);
        }
        Ok(match self.mode {
            // RPOP: oldest from the tail
            QueueMode::List => state.list.pop_back(),
            QueueMode::Set => state.set.pop_first(),
        })
    }

    async fn clear(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        state.list.clear();
        state.set.clear();
        state.clear_calls += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockDomainSource
// ---------------------------------------------------------------------------

/// Domain source yielding a fixed list of rows.
pub struct MockDomainSource {
    rows: Vec<Result<String, String>>,
    queries: Vec<String>,
}

impl MockDomainSource {
    pub fn new(domains: Vec<String>) -> Self {
        Self {
            rows: domains.into_iter().map(Ok).collect(),
            queries: Vec::new(),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            rows: vec![Ok("first.com".into()), Err(error.to_string())],
            queries: Vec::new(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.clone()
    }
}

impl DomainSource for MockDomainSource {
    fn domains<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<String, AppError>> {
        self.queries.push(query.to_string());
        let rows = self.rows.clone();
        stream::iter(rows)
            .map(|row| row.map_err(AppError::DatabaseError))
            .boxed()
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Fetcher returning a page per domain; unknown domains yield an empty payload.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<HashMap<String, Vec<u8>>>,
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<(&str, &str)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(domain, page)| (domain.to_string(), page.as_bytes().to_vec()))
                    .collect(),
            ),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, domain: &str) -> Vec<u8> {
        self.fetched.lock().unwrap().push(domain.to_string());
        self.pages.get(domain).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// MockParser
// ---------------------------------------------------------------------------

/// Parser that reads the page text as a rank for every field.
///
/// An empty page yields all `-1`; a page reading `panic` panics.
#[derive(Clone, Default)]
pub struct MockParser;

impl RankParser for MockParser {
    fn parse(&self, page: &[u8]) -> RankFields {
        if page.is_empty() {
            return RankFields::uniform(Rank::SectionMissing);
        }
        let text = String::from_utf8_lossy(page);
        if text == "panic" {
            panic!("malformed page");
        }
        RankFields::uniform(Rank::from_text(&text))
    }
}

// ---------------------------------------------------------------------------
// MockSink / MockSinkFactory
// ---------------------------------------------------------------------------

/// Sink recording persisted results; optionally fails for given domains.
pub struct MockSink {
    saved: Arc<Mutex<Vec<RankResult>>>,
    fail_for: Arc<Vec<String>>,
}

impl ResultSink for MockSink {
    async fn persist(&mut self, result: &RankResult) -> Result<(), AppError> {
        if self.fail_for.contains(&result.domain) {
            return Err(AppError::DatabaseError(format!(
                "insert failed for {}",
                result.domain
            )));
        }
        self.saved.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Factory handing out [`MockSink`]s that share one record list.
#[derive(Clone, Default)]
pub struct MockSinkFactory {
    pub saved: Arc<Mutex<Vec<RankResult>>>,
    fail_for: Arc<Vec<String>>,
    pub created: Arc<Mutex<usize>>,
    create_error: Arc<Mutex<Option<AppError>>>,
}

impl MockSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(domains: &[&str]) -> Self {
        Self {
            fail_for: Arc::new(domains.iter().map(|d| d.to_string()).collect()),
            ..Self::default()
        }
    }

    /// The first `create` call fails.
    pub fn with_create_error(error: AppError) -> Self {
        Self {
            create_error: Arc::new(Mutex::new(Some(error))),
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<RankResult> {
        self.saved.lock().unwrap().clone()
    }
}

impl SinkFactory for MockSinkFactory {
    type Sink = MockSink;

    async fn create(&self) -> Result<MockSink, AppError> {
        if let Some(e) = self.create_error.lock().unwrap().take() {
            return Err(e);
        }
        *self.created.lock().unwrap() += 1;
        Ok(MockSink {
            saved: Arc::clone(&self.saved),
            fail_for: Arc::clone(&self.fail_for),
        })
    }
}

// ---------------------------------------------------------------------------
// MockConnector
// ---------------------------------------------------------------------------

/// Connector whose inserts fail a scripted number of times.
///
/// Each connection records its generation so tests can tell which
/// connection performed an insert.
#[derive(Clone, Default)]
pub struct MockConnector {
    pub connects: Arc<Mutex<usize>>,
    pub rows: Arc<Mutex<Vec<(usize, String)>>>,
    insert_failures: Arc<Mutex<usize>>,
    connect_failures: Arc<Mutex<usize>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `n` inserts fail with a stale-connection error.
    pub fn failing_inserts(n: usize) -> Self {
        let connector = Self::default();
        *connector.insert_failures.lock().unwrap() = n;
        connector
    }

    /// The next `n` connects fail (the initial connect included).
    pub fn failing_connects(self, n: usize) -> Self {
        *self.connect_failures.lock().unwrap() = n;
        self
    }

    pub fn connects(&self) -> usize {
        *self.connects.lock().unwrap()
    }

    pub fn rows(&self) -> Vec<(usize, String)> {
        self.rows.lock().unwrap().clone()
    }
}

impl SinkConnector for MockConnector {
    type Connection = usize;

    async fn connect(&self) -> Result<usize, AppError> {
        let mut failures = self.connect_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::DatabaseError("connection refused".into()));
        }
        let mut connects = self.connects.lock().unwrap();
        *connects += 1;
        Ok(*connects)
    }

    async fn insert(&self, conn: &mut usize, result: &RankResult) -> Result<(), AppError> {
        let mut failures = self.insert_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::DatabaseError("server has gone away".into()));
        }
        self.rows
            .lock()
            .unwrap()
            .push((*conn, result.domain.clone()));
        Ok(())
    }
}
