//! Configuration options for the facade.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::channels::ChannelNaming;

/// Client platform whose native SDK backs the facade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android Java client
    Android,
    /// iOS Objective-C client; requires `encrypted` to be set explicitly
    Ios,
    /// JavaScript client for non-native runtimes
    #[default]
    Web,
}

impl Platform {
    /// Whether the native SDK needs an explicit encryption flag
    pub fn requires_explicit_encryption(&self) -> bool {
        matches!(self, Self::Ios)
    }
}

/// Configuration options for creating a facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PusherOptions {
    /// Milliseconds of inactivity after which a ping checks the connection
    pub activity_timeout_ms: Option<u64>,

    /// Milliseconds to wait for a pong before the connection is considered broken
    pub pong_timeout_ms: Option<u64>,

    /// Authorization endpoint for private and presence channels
    pub authorizer: Option<String>,

    /// Cluster identifier (e.g., "mt1", "eu", "ap1")
    pub cluster: Option<String>,

    /// Use an encrypted (TLS) connection; absent when not given explicitly
    #[serde(default)]
    pub encrypted: Option<bool>,

    /// Custom host (overrides cluster)
    pub host: Option<String>,

    /// Port for unencrypted connections
    pub ws_port: Option<u16>,

    /// Port for encrypted connections
    pub wss_port: Option<u16>,

    /// Platform whose native SDK is wrapped
    pub platform: Platform,

    /// Channel identifier convention
    pub channel_naming: ChannelNaming,

    /// Interval at which a deferred client event re-checks the subscription
    pub trigger_poll_interval_ms: Option<u64>,

    /// Upper bound for a deferred client event; `None` waits forever
    pub trigger_timeout_ms: Option<u64>,
}

impl Default for PusherOptions {
    fn default() -> Self {
        Self {
            activity_timeout_ms: None,
            pong_timeout_ms: None,
            authorizer: None,
            cluster: None,
            encrypted: Some(true),
            host: None,
            ws_port: None,
            wss_port: None,
            platform: Platform::default(),
            channel_naming: ChannelNaming::default(),
            trigger_poll_interval_ms: Some(DEFAULT_TRIGGER_POLL_INTERVAL_MS),
            trigger_timeout_ms: Some(DEFAULT_TRIGGER_TIMEOUT_MS),
        }
    }
}

const DEFAULT_ACTIVITY_TIMEOUT_MS: u64 = 120_000;
const DEFAULT_PONG_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_TRIGGER_POLL_INTERVAL_MS: u64 = 10;
const DEFAULT_TRIGGER_TIMEOUT_MS: u64 = 30_000;

impl PusherOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: set cluster
    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Builder pattern: set custom host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builder pattern: set unencrypted port
    pub fn ws_port(mut self, port: u16) -> Self {
        self.ws_port = Some(port);
        self
    }

    /// Builder pattern: set encrypted port
    pub fn wss_port(mut self, port: u16) -> Self {
        self.wss_port = Some(port);
        self
    }

    /// Builder pattern: enable/disable TLS
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = Some(encrypted);
        self
    }

    /// Builder pattern: set authorization endpoint
    pub fn authorizer(mut self, endpoint: impl Into<String>) -> Self {
        self.authorizer = Some(endpoint.into());
        self
    }

    /// Builder pattern: set activity timeout
    pub fn activity_timeout_ms(mut self, ms: u64) -> Self {
        self.activity_timeout_ms = Some(ms);
        self
    }

    /// Builder pattern: set pong timeout
    pub fn pong_timeout_ms(mut self, ms: u64) -> Self {
        self.pong_timeout_ms = Some(ms);
        self
    }

    /// Builder pattern: set platform
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Builder pattern: set channel naming convention
    pub fn channel_naming(mut self, naming: ChannelNaming) -> Self {
        self.channel_naming = naming;
        self
    }

    /// Builder pattern: set deferred trigger poll interval
    pub fn trigger_poll_interval_ms(mut self, ms: u64) -> Self {
        self.trigger_poll_interval_ms = Some(ms);
        self
    }

    /// Builder pattern: bound (or unbound, with `None`) deferred triggers
    pub fn trigger_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.trigger_timeout_ms = ms;
        self
    }

    /// Get the effective WebSocket URL for an app key
    pub fn ws_url(&self, app_key: &str) -> String {
        let encrypted = self.encrypted.unwrap_or(true);
        let scheme = if encrypted { "wss" } else { "ws" };

        let host = if let Some(ref host) = self.host {
            host.clone()
        } else if let Some(ref cluster) = self.cluster {
            format!("ws-{}.pusher.com", cluster)
        } else {
            "ws.pusherapp.com".to_string()
        };

        let port = if encrypted {
            self.wss_port.unwrap_or(443)
        } else {
            self.ws_port.unwrap_or(80)
        };

        let port_str = if (encrypted && port == 443) || (!encrypted && port == 80) {
            String::new()
        } else {
            format!(":{}", port)
        };

        format!(
            "{}://{}{}/app/{}?protocol=7&client=pusher-native&version={}",
            scheme,
            host,
            port_str,
            app_key,
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Internal configuration derived from validated options
#[derive(Debug, Clone)]
pub struct Config {
    pub ws_url: String,
    pub activity_timeout: Duration,
    pub pong_timeout: Duration,
    pub authorizer: Option<String>,
    pub cluster: Option<String>,
    pub host: Option<String>,
    pub ws_port: Option<u16>,
    pub wss_port: Option<u16>,
    pub encrypted: bool,
    pub platform: Platform,
    pub channel_naming: ChannelNaming,
    pub trigger_poll_interval: Duration,
    pub trigger_timeout: Option<Duration>,
}

impl Config {
    /// Derive the configuration for an app key
    pub fn new(app_key: &str, opts: PusherOptions) -> Self {
        Self {
            ws_url: opts.ws_url(app_key),
            activity_timeout: Duration::from_millis(
                opts.activity_timeout_ms.unwrap_or(DEFAULT_ACTIVITY_TIMEOUT_MS),
            ),
            pong_timeout: Duration::from_millis(
                opts.pong_timeout_ms.unwrap_or(DEFAULT_PONG_TIMEOUT_MS),
            ),
            authorizer: opts.authorizer,
            cluster: opts.cluster,
            host: opts.host,
            ws_port: opts.ws_port,
            wss_port: opts.wss_port,
            encrypted: opts.encrypted.unwrap_or(true),
            platform: opts.platform,
            channel_naming: opts.channel_naming,
            trigger_poll_interval: Duration::from_millis(
                opts.trigger_poll_interval_ms
                    .unwrap_or(DEFAULT_TRIGGER_POLL_INTERVAL_MS),
            ),
            trigger_timeout: opts.trigger_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ws_url() {
        let opts = PusherOptions::new().cluster("mt1");
        let url = opts.ws_url("test-key");
        assert!(url.starts_with("wss://ws-mt1.pusher.com/app/test-key"));
    }

    #[test]
    fn test_custom_host_url() {
        let opts = PusherOptions::new()
            .host("localhost")
            .ws_port(6001)
            .encrypted(false);
        let url = opts.ws_url("test-key");
        assert!(url.starts_with("ws://localhost:6001/app/test-key"));
    }

    #[test]
    fn test_wss_port_only_applies_when_encrypted() {
        let opts = PusherOptions::new().host("localhost").ws_port(6001).wss_port(6002);
        assert!(opts.ws_url("k").starts_with("wss://localhost:6002/"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new("key", PusherOptions::default());
        assert!(config.encrypted);
        assert_eq!(config.trigger_poll_interval, Duration::from_millis(10));
        assert_eq!(config.trigger_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.activity_timeout, Duration::from_secs(120));
        assert_eq!(config.channel_naming, ChannelNaming::Prefixed);
    }

    #[test]
    fn test_options_deserialize_from_camel_case() {
        let opts: PusherOptions = serde_json::from_str(
            r#"{"cluster":"eu","encrypted":false,"wsPort":6001,"platform":"ios"}"#,
        )
        .unwrap();
        assert_eq!(opts.cluster.as_deref(), Some("eu"));
        assert_eq!(opts.encrypted, Some(false));
        assert_eq!(opts.ws_port, Some(6001));
        assert_eq!(opts.platform, Platform::Ios);
    }

    #[test]
    fn test_missing_encrypted_stays_unset() {
        let opts: PusherOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.encrypted, None);
        assert_eq!(opts.trigger_timeout_ms, Some(30_000));
        assert_eq!(opts.trigger_poll_interval_ms, Some(10));
    }
}
