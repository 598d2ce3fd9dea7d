//! Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use lotusx_spot::core::config::ExchangeConfig;
use lotusx_spot::core::errors::ExchangeError;
use lotusx_spot::core::kernel::{Dialer, FrameConnection, FrameResult};
use lotusx_spot::core::types::millis_to_datetime;
use lotusx_spot::{BinanceClient, BinanceClientBuilder};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use url::Url;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";
// from the binance API documentation
pub const SECRET_KEY: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
pub const NOW_MILLIS: i64 = 1_499_827_319_559;

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Client pointed at `server`, signing with the documented key at a fixed time
pub fn rest_client(server: &MockServer) -> BinanceClient {
    let config = ExchangeConfig::new(API_KEY.to_string(), SECRET_KEY.to_string())
        .base_url(server.uri());
    BinanceClientBuilder::new(config)
        .with_clock(Arc::new(|| millis_to_datetime(NOW_MILLIS)))
        .build()
        .expect("client should build")
}

/// Client whose streams come from `dialer`
pub fn stream_client(dialer: Arc<ScriptedDialer>) -> BinanceClient {
    BinanceClientBuilder::new(ExchangeConfig::read_only())
        .with_dialer(dialer)
        .build()
        .expect("client should build")
}

pub fn trade_frame(trade_id: i64) -> String {
    format!(
        r#"{{"e":"trade","E":1604705434642,"s":"BTCUSDT","t":{},"p":"15617.99000000","q":"0.00720000","b":3530255770,"a":3530255647,"T":1604705434637,"m":false,"M":true}}"#,
        trade_id
    )
}

pub enum Step {
    Frame(String),
    Fail(&'static str),
    End,
}

/// Plays back its steps, then waits forever
pub struct ScriptedConnection {
    steps: VecDeque<Step>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl FrameConnection for ScriptedConnection {
    async fn next_frame(&mut self) -> Option<FrameResult> {
        match self.steps.pop_front() {
            Some(Step::Frame(frame)) => Some(Ok(frame.into_bytes())),
            Some(Step::Fail(msg)) => Some(Err(ExchangeError::NetworkError(msg.to_string()))),
            Some(Step::End) => None,
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ExchangeError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedDialer {
    steps: Mutex<Option<Vec<Step>>>,
    fail_with: Option<&'static str>,
    closed: Arc<AtomicBool>,
    dialed: Mutex<Vec<Url>>,
}

impl ScriptedDialer {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(Some(steps)),
            fail_with: None,
            closed: Arc::new(AtomicBool::new(false)),
            dialed: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(msg: &'static str) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(None),
            fail_with: Some(msg),
            closed: Arc::new(AtomicBool::new(false)),
            dialed: Mutex::new(Vec::new()),
        })
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// The connection closes after the event channel does, so poll briefly
    pub async fn wait_closed(&self) -> bool {
        for _ in 0..100 {
            if self.was_closed() {
                return true;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        false
    }

    pub fn dialed(&self) -> Vec<Url> {
        self.dialed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(
        &self,
        url: &Url,
        _headers: &HeaderMap,
    ) -> Result<Box<dyn FrameConnection>, ExchangeError> {
        self.dialed.lock().unwrap().push(url.clone());
        if let Some(msg) = self.fail_with {
            return Err(ExchangeError::NetworkError(msg.to_string()));
        }
        let steps = self.steps.lock().unwrap().take().unwrap_or_default();
        Ok(Box::new(ScriptedConnection {
            steps: steps.into(),
            closed: self.closed.clone(),
        }))
    }
}
