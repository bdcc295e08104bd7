use crate::card::CardPayload;
use crate::webhook::DeliveryError;

/// Destination for rendered [`CardPayload`]s.
///
/// Implementations are responsible for transporting the card to a concrete
/// destination (a Teams incoming webhook in production, a recording stub in
/// tests). The layer calls `send` on the logging thread and blocks until the
/// card is delivered or the attempt budget is exhausted.
pub trait CardSink: Send + Sync {
    /// Deliver a single card.
    ///
    /// **Parameters**
    /// - `payload`: fully-built [`CardPayload`] produced by the card builder.
    ///
    /// **Returns**
    /// - `Ok(body)` with the raw response body once the transport layer
    ///   returns any response, regardless of HTTP status.
    /// - `Err(..)` if serialization failed or every delivery attempt hit a
    ///   transport failure.
    fn send(&self, payload: &CardPayload) -> Result<String, DeliveryError>;
}

/// A sink that simply drops all cards.
///
/// Useful for measuring the overhead of the layer itself without any network
/// I/O, and for unit tests that don't care about delivery.
#[derive(Clone, Default)]
pub struct NoopSink;

impl CardSink for NoopSink {
    fn send(&self, _payload: &CardPayload) -> Result<String, DeliveryError> {
        Ok(String::new())
    }
}
