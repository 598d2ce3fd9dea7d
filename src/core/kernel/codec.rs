use crate::core::errors::ExchangeError;

/// Codec trait for turning raw stream frames into typed messages
///
/// Each stream owns one codec. Control frames (ping, pong, close) never reach
/// the codec; they are handled by the connection.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this stream
    type Message: Send + 'static;

    /// Decode one complete data frame.
    ///
    /// A failure is terminal for the stream it came from.
    fn decode_frame(&self, frame: &[u8]) -> Result<Self::Message, ExchangeError>;
}
