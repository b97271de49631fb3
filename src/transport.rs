/// Timestamp in whole seconds since the unix epoch.
///
/// Hello messages and ticket expiries carry 32-bit seconds on the wire.
pub type UnixTime = u32;

/// Request/response byte transport for the client side.
///
/// One call carries one complete request body and returns the complete
/// response body. Whether that is an HTTP exchange, a socket or an
/// in-memory channel is up to the implementation; timeouts and
/// cancellation belong there too.
pub trait Transport {
    type Error: core::fmt::Display;

    /// Send `request` and wait for the peer's response.
    fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>, Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn round_trip(&mut self, request: &[u8]) -> Result<Vec<u8>, Self::Error> {
        (**self).round_trip(request)
    }
}

/// Wall clock for hello timestamps and ticket expiry.
pub trait Clock {
    /// Current unix time in seconds.
    fn now(&self) -> UnixTime;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixTime {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as UnixTime)
            .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> UnixTime {
        (**self).now()
    }
}
