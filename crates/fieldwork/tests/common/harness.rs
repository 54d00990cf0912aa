//! Isolated environment for end-to-end sync tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;

use fieldwork::net::{RemoteResponse, Transport, TransportError};
use fieldwork::{Connectivity, Database, FieldworkCore, SyncConfig};

/// Bytes returned for every successful generate call.
pub const FAKE_PDF: &[u8] = b"%PDF-1.7 fake work order";

/// One scripted remote answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Unreachable,
}

/// In-process stand-in for the document service.
///
/// Replies come from a script; once it runs out every call succeeds.
#[derive(Default)]
pub struct FakeRemote {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().unwrap().push_back(reply);
    }

    pub fn push_status(&self, status: u16, times: usize) {
        for _ in 0..times {
            self.push(Reply::Status(status));
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn boards(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|(_, body)| body["board"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl Transport for FakeRemote {
    async fn post_json(&self, url: &str, body: &Value) -> Result<RemoteResponse, TransportError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        let reply = self.script.lock().unwrap().pop_front();
        match reply {
            None | Some(Reply::Status(200)) => Ok(RemoteResponse {
                status: 200,
                body: FAKE_PDF.to_vec(),
            }),
            Some(Reply::Status(status)) => Ok(RemoteResponse {
                status,
                body: format!(r#"{{"detail": "status {}"}}"#, status).into_bytes(),
            }),
            Some(Reply::Unreachable) => Err(TransportError::Unreachable("connection refused".into())),
        }
    }
}

/// A complete core over a temp-dir database and a [`FakeRemote`].
pub struct TestHarness {
    temp_dir: TempDir,
    pub remote: Arc<FakeRemote>,
    pub core: FieldworkCore,
}

impl TestHarness {
    /// Online harness with fast retries.
    pub fn new() -> Self {
        Self::with_connectivity(true)
    }

    pub fn offline() -> Self {
        Self::with_connectivity(false)
    }

    pub fn with_connectivity(online: bool) -> Self {
        let config = SyncConfig {
            max_retries: 0,
            retry_base_delay_ms: 1,
            ..Default::default()
        };
        Self::with_config(config, online)
    }

    pub fn with_config(config: SyncConfig, online: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("fieldwork.db"))
            .expect("Failed to open database");
        let remote = FakeRemote::new();
        let core = FieldworkCore::with_parts(
            config,
            db,
            "http://remote.test/",
            remote.clone(),
            Connectivity::new(online),
        );
        Self {
            temp_dir,
            remote,
            core,
        }
    }

    pub fn set_online(&self, online: bool) {
        self.core.connectivity.set_online(online);
    }

    pub fn queue_len(&self) -> u64 {
        self.core.queue.len().unwrap()
    }

    pub fn record_count(&self) -> usize {
        self.core
            .store
            .query(&fieldwork::RecordFilter::default())
            .unwrap()
            .len()
    }

    /// Reopens the same database file, as after an app restart.
    pub fn reopen(&self) -> Database {
        Database::open(&self.temp_dir.path().join("fieldwork.db")).unwrap()
    }

    /// Lets spawned tasks run for `ms` of (possibly paused) tokio time.
    pub async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
