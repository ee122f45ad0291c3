//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wiremock::MockServer;

use intelligentdata::{ClientBuilder, IntelligentDataClient, Sleeper};

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Delays requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
    }
}

/// Builder pointed at the mock server with a recording sleeper installed.
pub fn builder_for(server: &MockServer, sleeper: &Arc<RecordingSleeper>) -> ClientBuilder {
    IntelligentDataClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .sleeper(sleeper.clone())
}

/// API-key client pointed at the mock server.
pub fn api_key_client(
    server: &MockServer,
    sleeper: &Arc<RecordingSleeper>,
) -> IntelligentDataClient {
    builder_for(server, sleeper)
        .api_key("svm_test_key")
        .build()
        .expect("client should build")
}

pub fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}
