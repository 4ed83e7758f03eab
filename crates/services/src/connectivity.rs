//! Network reachability probe.
//!
//! The probe only selects between the online and offline explanation
//! variants. It is re-evaluated on every call that needs it and never
//! drives retries or caching.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Well-known public resolver used as the reachability target.
pub const PROBE_ADDR: &str = "8.8.8.8:53";

/// How long a probe dial may take before counting as offline.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// A cheap boolean reachability predicate.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn is_online(&self) -> bool;
}

/// Probe that dials a TCP endpoint with a short timeout.
///
/// Any failure (timeout, refusal, resolution) counts as offline.
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    #[must_use]
    pub fn new() -> Self {
        Self {
            addr: PROBE_ADDR.to_string(),
            timeout: PROBE_TIMEOUT,
        }
    }

    /// Probe a custom endpoint (tests point this at a local listener).
    #[must_use]
    pub fn with_target(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn is_online(&self) -> bool {
        matches!(
            timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}

/// Probe pinned to one answer, for tests and the `--offline` flag.
pub struct FixedProbe {
    online: bool,
}

impl FixedProbe {
    #[must_use]
    pub fn online() -> Self {
        Self { online: true }
    }

    #[must_use]
    pub fn offline() -> Self {
        Self { online: false }
    }
}

#[async_trait]
impl ConnectivityProbe for FixedProbe {
    async fn is_online(&self) -> bool {
        self.online
    }
}
