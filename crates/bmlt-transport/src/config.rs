//! Transport configuration.

use std::time::Duration;

/// Settings shared by every request a session issues.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,

    /// Value of the `callingApp` marker appended to every request.
    pub calling_app: String,

    /// Username answered to a basic-auth challenge.
    pub username: Option<String>,

    /// Password answered to a basic-auth challenge.
    pub password: Option<String>,
}

impl TransportConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default calling app marker.
    pub const DEFAULT_CALLING_APP: &'static str = "bmlt-rs";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_calling_app(mut self, calling_app: impl Into<String>) -> Self {
        self.calling_app = calling_app.into();
        self
    }

    /// Sets the credentials used when the server challenges for basic auth.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns true if challenge credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("bmlt/{}", env!("CARGO_PKG_VERSION")),
            calling_app: Self::DEFAULT_CALLING_APP.to_string(),
            username: None,
            password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("bmlt/"));
        assert_eq!(config.calling_app, "bmlt-rs");
        assert!(!config.has_credentials());
    }

    #[test]
    fn builder() {
        let config = TransportConfig::new()
            .with_timeout(Duration::from_secs(5))
            .with_calling_app("NA Meeting Search")
            .with_credentials("user", "pass");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.calling_app, "NA Meeting Search");
        assert!(config.has_credentials());
    }
}
