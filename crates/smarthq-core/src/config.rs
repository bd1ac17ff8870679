// ── Runtime connection configuration ──
//
// These types describe *how* to talk to the SmartHQ event stream.
// They never touch disk: smarthq-config builds a `ClientConfig` and
// hands it in.

use std::time::Duration;

use smarthq_api::wire::PubsubTopics;
use url::Url;

pub const DEFAULT_WEBSOCKET_URL: &str = "wss://ws-us-west-2.mysmarthq.com";
pub const DEFAULT_API_HOST: &str = "api.mysmarthq.com";
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Exponential backoff for reconnection.
///
/// `delay = min(initial * 2^attempt, max)`, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnection attempt. Default: 5s.
    pub initial_delay: Duration,
    /// Upper bound on the delay. Default: 300s.
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait before reconnection attempt number `attempt`
    /// (zero-based: `0` is the first attempt after a drop).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Configuration for one SmartHQ client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Event-stream endpoint.
    pub url: Url,
    /// `host` written into tunnelled command envelopes.
    pub api_host: String,
    /// Feeds requested in the subscription message.
    pub topics: PubsubTopics,
    /// Period between application-level pings. Zero disables them.
    pub heartbeat_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    /// Configuration for `url` with every other setting at its default.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            api_host: DEFAULT_API_HOST.to_owned(),
            topics: PubsubTopics::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_sequence() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (0..8).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 80, 160, 300, 300]);
    }

    #[test]
    fn huge_attempt_numbers_saturate_at_max() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(40), Duration::from_secs(300));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(300));
    }

    #[test]
    fn custom_initial_delay() {
        let policy = ReconnectPolicy {
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(30));
        assert_eq!(policy.delay_for(1), Duration::from_secs(60));
        assert_eq!(policy.delay_for(2), Duration::from_secs(100));
    }
}
