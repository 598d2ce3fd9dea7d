use super::client::{BinanceClient, EXCHANGE_NAME};
use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    Clock, Dialer, HmacSigner, HttpTransport, RestClientBuilder, RestClientConfig, Signer,
    StreamClient, TungsteniteDialer,
};
use std::sync::Arc;

/// Builder for [`BinanceClient`].
///
/// Every collaborator defaults to the production implementation and can be
/// replaced, which is how the tests run without a network.
pub struct BinanceClientBuilder {
    config: ExchangeConfig,
    signer: Option<Arc<dyn Signer>>,
    transport: Option<Arc<dyn HttpTransport>>,
    dialer: Option<Arc<dyn Dialer>>,
    clock: Option<Clock>,
}

impl BinanceClientBuilder {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            config,
            signer: None,
            transport: None,
            dialer: None,
            clock: None,
        }
    }

    /// Replace the HMAC signer derived from the configured secret key
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<BinanceClient, ExchangeError> {
        let rest_config =
            RestClientConfig::new(self.config.rest_url().to_string(), EXCHANGE_NAME.to_string())
                .with_user_agent(self.config.user_agent.clone())
                .with_recv_window(self.config.default_recv_window());

        let mut rest_builder =
            RestClientBuilder::new(rest_config).with_api_key(self.config.api_key.clone());

        // Add authentication if credentials are provided
        let signer = self.signer.or_else(|| {
            self.config.has_credentials().then(|| {
                Arc::new(HmacSigner::new(self.config.secret_key().to_string())) as Arc<dyn Signer>
            })
        });
        if let Some(signer) = signer {
            rest_builder = rest_builder.with_signer(signer);
        }
        if let Some(transport) = self.transport {
            rest_builder = rest_builder.with_transport(transport);
        }
        if let Some(clock) = self.clock {
            rest_builder = rest_builder.with_clock(clock);
        }
        let rest = rest_builder.build()?;

        let dialer = self
            .dialer
            .unwrap_or_else(|| Arc::new(TungsteniteDialer) as Arc<dyn Dialer>);
        let streams = StreamClient::new(
            self.config.websocket_url(),
            EXCHANGE_NAME.to_string(),
            dialer,
        )?
        .with_user_agent(self.config.user_agent.clone());

        Ok(BinanceClient::new(rest, streams, self.config))
    }
}

/// Create a client with the production transport, dialer and signer
pub fn build_client(config: ExchangeConfig) -> Result<BinanceClient, ExchangeError> {
    BinanceClientBuilder::new(config).build()
}
