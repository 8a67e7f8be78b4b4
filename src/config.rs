//! Client configuration.

use std::time::Duration;

/// Standard WHOIS port (RFC 3912).
pub const DEFAULT_PORT: u16 = 43;

/// Tunables shared by every lookup a [`WhoisClient`](crate::WhoisClient)
/// performs.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use whois_client::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_max_retries(2)
///     .with_retry_delay(Duration::from_millis(500));
///
/// assert_eq!(config.port, 43);
/// assert_eq!(config.max_retries, 2);
/// assert!(!config.generic_recursion);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Port used when a server specifier carries none.
    pub port: u16,

    /// Extra connection attempts after the first one fails.
    pub max_retries: u32,

    /// Pause between failed connection attempts.
    pub retry_delay: Duration,

    /// Read buffer capacity. Zero selects character-buffered collection.
    pub buffer_size: usize,

    /// Connect, read and write timeout for a single round trip.
    pub timeout: Duration,

    /// Allow the generic top-level-domain handler to run.
    pub generic_recursion: bool,

    /// Substituted for `{version}` in argument templates.
    pub version: String,
}

impl ClientConfig {
    /// Creates a config with the standard defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_retries: 0,
            retry_delay: Duration::from_secs(2),
            buffer_size: 255,
            timeout: Duration::from_secs(20),
            generic_recursion: false,
            version: format!("whois-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Overrides the default port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the number of connection retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Overrides the pause between connection attempts.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Overrides the read buffer size (`0` = character-buffered).
    #[must_use]
    pub const fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Overrides the communications timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables the generic handler.
    #[must_use]
    pub const fn with_generic_recursion(mut self, enabled: bool) -> Self {
        self.generic_recursion = enabled;
        self
    }

    /// Overrides the version string sent in `{version}` substitutions.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_defaults() {
        let c = ClientConfig::new();
        assert_eq!(c.port, 43);
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.retry_delay, Duration::from_secs(2));
        assert_eq!(c.buffer_size, 255);
        assert_eq!(c.timeout, Duration::from_secs(20));
        assert!(!c.generic_recursion);
        assert!(c.version.starts_with("whois-client/"));
    }

    #[test]
    fn builder_overrides() {
        let c = ClientConfig::new()
            .with_port(4321)
            .with_buffer_size(0)
            .with_generic_recursion(true)
            .with_version("test/1");
        assert_eq!(c.port, 4321);
        assert_eq!(c.buffer_size, 0);
        assert!(c.generic_recursion);
        assert_eq!(c.version, "test/1");
    }
}
