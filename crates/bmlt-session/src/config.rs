//! Session configuration.

use bmlt_core::MIN_SERVER_VERSION;
use bmlt_protocol::clean_uri;
use bmlt_transport::TransportConfig;

/// What a session connects to and how.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root server URI, always normalized to `https://`.
    root_uri: String,
    /// Oldest acceptable server, as a packed `XYYYZZZ` version.
    pub min_version: u32,
    pub transport: TransportConfig,
}

impl SessionConfig {
    pub fn new(root_uri: impl AsRef<str>) -> Self {
        Self {
            root_uri: clean_uri(root_uri.as_ref()),
            min_version: MIN_SERVER_VERSION,
            transport: TransportConfig::default(),
        }
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    pub fn calling_app(&self) -> &str {
        &self.transport.calling_app
    }

    pub fn with_calling_app(mut self, calling_app: impl Into<String>) -> Self {
        self.transport = self.transport.with_calling_app(calling_app);
        self
    }

    pub fn with_min_version(mut self, min_version: u32) -> Self {
        self.min_version = min_version;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_normalized() {
        let config = SessionConfig::new("http://bmlt.example.org/main_server/");
        assert_eq!(config.root_uri(), "https://bmlt.example.org/main_server");
        assert_eq!(config.min_version, 2_008_012);
        assert_eq!(config.calling_app(), "bmlt-rs");
    }

    #[test]
    fn builder() {
        let config = SessionConfig::new("bmlt.example.org")
            .with_calling_app("tester")
            .with_min_version(2_010_000);
        assert_eq!(config.calling_app(), "tester");
        assert_eq!(config.min_version, 2_010_000);
    }
}
