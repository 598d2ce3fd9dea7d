use crate::core::errors::{ErrorBody, ExchangeError, HttpFailure};
use crate::core::kernel::params::ParameterSet;
use crate::core::kernel::signer::Signer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, trace};
use url::{form_urlencoded, Url};

pub const API_KEY_HEADER: &str = "x-mbx-apikey";

/// Source of the current time for request timestamps
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// A fully built request, ready to hand to a transport
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// HTTP transport trait
///
/// Performs exactly one round trip. Implementations must not retry and must
/// return the body as received, whatever the status.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError>;
}

/// `HttpTransport` backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ExchangeError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ExchangeError::RequestConstruction(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let response = self
            .client
            .request(request.method, request.url)
            .headers(request.headers)
            .send()
            .await
            .map_err(|e| ExchangeError::NetworkError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds, used when no transport is injected
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
    /// Default `recvWindow` for signed requests; zero leaves it unset
    pub recv_window: Duration,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: crate::core::config::DEFAULT_USER_AGENT.to_string(),
            recv_window: Duration::ZERO,
        }
    }

    pub const fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub const fn with_recv_window(mut self, recv_window: Duration) -> Self {
        self.recv_window = recv_window;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    api_key: Secret<String>,
    signer: Option<Arc<dyn Signer>>,
    transport: Option<Arc<dyn HttpTransport>>,
    clock: Option<Clock>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            api_key: Secret::new(String::new()),
            signer: None,
            transport: None,
            clock: None,
        }
    }

    /// API key sent as `X-MBX-APIKEY`
    pub fn with_api_key(mut self, api_key: Secret<String>) -> Self {
        self.api_key = api_key;
        self
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<RestClient, ExchangeError> {
        let base_url = Url::parse(&self.config.base_url).map_err(|e| {
            ExchangeError::RequestConstruction(format!(
                "Invalid base URL '{}': {}",
                self.config.base_url, e
            ))
        })?;

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(Duration::from_secs(
                self.config.timeout_seconds,
            ))?),
        };

        let clock: Clock = match self.clock {
            Some(clock) => clock,
            None => Arc::new(Utc::now),
        };

        Ok(RestClient {
            base_url,
            exchange_name: self.config.exchange_name,
            user_agent: self.config.user_agent,
            recv_window: self.config.recv_window,
            api_key: Arc::new(self.api_key),
            signer: self.signer,
            transport,
            clock,
        })
    }
}

/// Builds, signs and executes requests against one REST endpoint.
///
/// Holds no mutable state; clones share the transport and signer.
#[derive(Clone)]
pub struct RestClient {
    base_url: Url,
    exchange_name: String,
    user_agent: String,
    recv_window: Duration,
    api_key: Arc<Secret<String>>,
    signer: Option<Arc<dyn Signer>>,
    transport: Arc<dyn HttpTransport>,
    clock: Clock,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("exchange_name", &self.exchange_name)
            .field("recv_window", &self.recv_window)
            .field("has_signer", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub const fn recv_window(&self) -> Duration {
        self.recv_window
    }

    /// Build a request carrying `params` verbatim.
    ///
    /// `include_api_key` adds the `X-MBX-APIKEY` header, which some
    /// unsigned endpoints still require.
    pub fn build_unsigned(
        &self,
        method: Method,
        path: &str,
        params: &ParameterSet,
        include_api_key: bool,
    ) -> Result<HttpRequest, ExchangeError> {
        self.build_request(method, path, &params.encode(), include_api_key)
    }

    /// Build an authenticated request.
    ///
    /// `timestamp` is always taken from the clock. `recvWindow` is filled
    /// from the client default when the caller left it out and the default
    /// is non-zero. The signature covers the encoded query and is appended
    /// as its last parameter.
    pub fn build_signed(
        &self,
        method: Method,
        path: &str,
        params: Option<ParameterSet>,
    ) -> Result<HttpRequest, ExchangeError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ExchangeError::RequestConstruction(
                "Signed request requires a signer".to_string(),
            )
        })?;

        let mut params = params.unwrap_or_default();
        params.set("timestamp", (self.clock)().timestamp_millis().to_string());

        let window_ms = self.recv_window.as_millis();
        if window_ms > 0 && params.get("recvWindow").map_or(true, str::is_empty) {
            params.set("recvWindow", window_ms.to_string());
        }

        let payload = params.encode();
        let signature = signer.sign(&payload);
        let query = form_urlencoded::Serializer::for_suffix(payload, 0)
            .append_pair("signature", &signature)
            .finish();

        self.build_request(method, path, &query, true)
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        query: &str,
        include_api_key: bool,
    ) -> Result<HttpRequest, ExchangeError> {
        let mut url = self.base_url.join(path).map_err(|e| {
            ExchangeError::RequestConstruction(format!("Invalid path '{}': {}", path, e))
        })?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&self.user_agent)?);
        if include_api_key {
            headers.insert(
                HeaderName::from_static(API_KEY_HEADER),
                header_value(self.api_key.expose_secret())?,
            );
        }

        Ok(HttpRequest {
            method,
            url,
            headers,
        })
    }

    /// Perform `request` and decode a 200 body into `T`
    #[instrument(skip(self, request), fields(exchange = %self.exchange_name, method = %request.method, path = %request.url.path()))]
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
    ) -> Result<T, ExchangeError> {
        let body = self.perform(request).await?;
        serde_json::from_slice(&body).map_err(|e| {
            ExchangeError::DeserializationError(format!("Failed to parse JSON response: {}", e))
        })
    }

    /// Perform `request`, discarding a successful body
    #[instrument(skip(self, request), fields(exchange = %self.exchange_name, method = %request.method, path = %request.url.path()))]
    pub async fn execute_empty(&self, request: HttpRequest) -> Result<(), ExchangeError> {
        self.perform(request).await.map(|_| ())
    }

    async fn perform(&self, request: HttpRequest) -> Result<Vec<u8>, ExchangeError> {
        let response = self.transport.execute(request).await.map_err(|e| {
            let detail = match e {
                ExchangeError::NetworkError(msg) => msg,
                other => other.to_string(),
            };
            ExchangeError::NetworkError(format!("error performing request: {}", detail))
        })?;

        trace!(
            status = response.status,
            "Response body: {}",
            String::from_utf8_lossy(&response.body)
        );

        if response.status != 200 {
            let failure = serde_json::from_slice::<ErrorBody>(&response.body).map_or_else(
                |_| HttpFailure::status_only(response.status),
                |body| HttpFailure::new(response.status, body),
            );
            return Err(failure.into());
        }

        Ok(response.body)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ExchangeError> {
    HeaderValue::from_str(value)
        .map_err(|e| ExchangeError::RequestConstruction(format!("Invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::millis_to_datetime;
    use serde::Deserialize;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSigner {
        payloads: Mutex<Vec<String>>,
    }

    impl Signer for RecordingSigner {
        fn sign(&self, payload: &str) -> String {
            self.payloads.lock().unwrap().push(payload.to_string());
            "cafebabe".to_string()
        }
    }

    struct CannedTransport {
        response: Result<HttpResponse, String>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn reply(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(HttpResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn fail(msg: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(msg.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpTransport for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
            self.requests.lock().unwrap().push(request);
            self.response
                .clone()
                .map_err(ExchangeError::NetworkError)
        }
    }

    fn client(transport: Arc<CannedTransport>, signer: Arc<RecordingSigner>) -> RestClient {
        let config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string())
            .with_user_agent("test-agent/1.0".to_string())
            .with_recv_window(Duration::from_secs(3));
        RestClientBuilder::new(config)
            .with_api_key(Secret::new("my-api-key".to_string()))
            .with_signer(signer)
            .with_transport(transport)
            .with_clock(Arc::new(|| millis_to_datetime(1_234_567_890_123)))
            .build()
            .unwrap()
    }

    fn default_client() -> RestClient {
        client(CannedTransport::reply(200, "{}"), Arc::default())
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct ServerTime {
        #[serde(rename = "serverTime")]
        server_time: i64,
    }

    #[test]
    fn test_signed_request_sets_timestamp_and_recv_window() {
        let signer = Arc::new(RecordingSigner::default());
        let rest = client(CannedTransport::reply(200, "{}"), signer.clone());

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();

        assert_eq!(
            req.url.query(),
            Some("recvWindow=3000&timestamp=1234567890123&signature=cafebabe")
        );
        assert_eq!(
            signer.payloads.lock().unwrap().as_slice(),
            ["recvWindow=3000&timestamp=1234567890123"]
        );
    }

    #[test]
    fn test_signed_request_keeps_caller_recv_window() {
        let rest = default_client();
        let mut params = ParameterSet::new();
        params.set("recvWindow", "10000");
        params.set("symbol", "LTCBTC");

        let req = rest
            .build_signed(Method::POST, "/api/v3/order", Some(params))
            .unwrap();
        let pairs: Vec<(String, String)> = req.url.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("recvWindow".to_string(), "10000".to_string()),
                ("symbol".to_string(), "LTCBTC".to_string()),
                ("timestamp".to_string(), "1234567890123".to_string()),
                ("signature".to_string(), "cafebabe".to_string()),
            ]
        );
    }

    #[test]
    fn test_signed_request_overwrites_caller_timestamp() {
        let rest = default_client();
        let mut params = ParameterSet::new();
        params.set("timestamp", "1");

        let req = rest.build_signed(Method::GET, "/api/v3/account", Some(params)).unwrap();
        assert!(req.url.query().unwrap().contains("timestamp=1234567890123"));
    }

    #[test]
    fn test_zero_recv_window_is_left_out() {
        let config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string());
        let rest = RestClientBuilder::new(config)
            .with_signer(Arc::new(RecordingSigner::default()))
            .with_transport(CannedTransport::reply(200, "{}"))
            .build()
            .unwrap();

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();
        assert!(!req.url.query().unwrap().contains("recvWindow"));
    }

    #[test]
    fn test_signed_request_headers() {
        let req = default_client()
            .build_signed(Method::DELETE, "/api/v3/order", None)
            .unwrap();

        assert_eq!(req.method, Method::DELETE);
        assert_eq!(req.url.path(), "/api/v3/order");
        assert_eq!(req.headers.get(API_KEY_HEADER).unwrap(), "my-api-key");
        assert_eq!(req.headers.get(USER_AGENT).unwrap(), "test-agent/1.0");
    }

    #[test]
    fn test_signed_request_without_signer() {
        let config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string());
        let rest = RestClientBuilder::new(config)
            .with_transport(CannedTransport::reply(200, "{}"))
            .build()
            .unwrap();

        assert!(matches!(
            rest.build_signed(Method::GET, "/api/v3/account", None),
            Err(ExchangeError::RequestConstruction(_))
        ));
    }

    #[test]
    fn test_unsigned_request() {
        let rest = default_client();
        let mut params = ParameterSet::new();
        params.set("symbol", "BTCUSDT");

        let req = rest
            .build_unsigned(Method::GET, "/api/v3/ticker/price", &params, false)
            .unwrap();
        assert_eq!(req.url.as_str(), "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT");
        assert!(req.headers.get(API_KEY_HEADER).is_none());

        let req = rest
            .build_unsigned(Method::GET, "/api/v3/ping", &ParameterSet::new(), true)
            .unwrap();
        assert_eq!(req.url.query(), None);
        assert!(req.headers.get(API_KEY_HEADER).is_some());
    }

    #[test]
    fn test_invalid_header_value() {
        let config = RestClientConfig::new("https://api.binance.com".to_string(), "binance".to_string())
            .with_user_agent("bad\nagent".to_string());
        let rest = RestClientBuilder::new(config)
            .with_transport(CannedTransport::reply(200, "{}"))
            .build()
            .unwrap();

        assert!(matches!(
            rest.build_unsigned(Method::GET, "/api/v3/ping", &ParameterSet::new(), false),
            Err(ExchangeError::RequestConstruction(_))
        ));
    }

    #[test]
    fn test_invalid_base_url() {
        let config = RestClientConfig::new("not a url".to_string(), "binance".to_string());
        assert!(matches!(
            RestClientBuilder::new(config)
                .with_transport(CannedTransport::reply(200, "{}"))
                .build(),
            Err(ExchangeError::RequestConstruction(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_decodes_success() {
        let transport = CannedTransport::reply(200, r#"{"serverTime":1499827319559}"#);
        let rest = client(transport.clone(), Arc::default());

        let req = rest.build_unsigned(Method::GET, "/api/v3/time", &ParameterSet::new(), false).unwrap();
        let time: ServerTime = rest.execute(req).await.unwrap();

        assert_eq!(time, ServerTime { server_time: 1_499_827_319_559 });
        assert_eq!(transport.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_venue_error() {
        let transport = CannedTransport::reply(400, r#"{"code":-1234,"msg":"test message"}"#);
        let rest = client(transport, Arc::default());

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();
        let err = rest.execute::<ServerTime>(req).await.unwrap_err();

        let failure = err.as_http_failure().unwrap();
        assert_eq!(failure.status_code(), 400);
        assert_eq!(failure.error_code(), -1234);
        assert_eq!(failure.message(), "test message");
    }

    #[tokio::test]
    async fn test_execute_undecodable_error_body_keeps_status() {
        let rest = client(CannedTransport::reply(502, "<html>bad gateway</html>"), Arc::default());

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();
        let err = rest.execute_empty(req).await.unwrap_err();

        let failure = err.as_http_failure().unwrap();
        assert_eq!(failure.status_code(), 502);
        assert_eq!(failure.error_code(), 0);
        assert_eq!(failure.message(), "");
    }

    #[tokio::test]
    async fn test_non_200_success_status_is_failure() {
        let rest = client(CannedTransport::reply(201, "{}"), Arc::default());

        let req = rest.build_signed(Method::POST, "/api/v3/order", None).unwrap();
        let err = rest.execute_empty(req).await.unwrap_err();
        assert_eq!(err.as_http_failure().map(HttpFailure::status_code), Some(201));
    }

    #[tokio::test]
    async fn test_execute_malformed_success_body() {
        let rest = client(CannedTransport::reply(200, "not json"), Arc::default());

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();
        let err = rest.execute::<ServerTime>(req).await.unwrap_err();
        assert!(matches!(err, ExchangeError::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_execute_empty_ignores_body() {
        let rest = client(CannedTransport::reply(200, "not json"), Arc::default());

        let req = rest.build_unsigned(Method::GET, "/api/v3/ping", &ParameterSet::new(), false).unwrap();
        assert!(rest.execute_empty(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let rest = client(CannedTransport::fail("connection refused"), Arc::default());

        let req = rest.build_signed(Method::GET, "/api/v3/account", None).unwrap();
        let err = rest.execute_empty(req).await.unwrap_err();
        assert!(
            matches!(err, ExchangeError::NetworkError(msg) if msg == "error performing request: connection refused")
        );
    }
}
