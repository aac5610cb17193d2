//! The HTTP seam.
//!
//! [`Fetcher`] is the only thing the transport session needs from the
//! network: GET a URI, return the body bytes. [`HttpsFetcher`] is the real
//! implementation; tests substitute a scripted one.

use std::future::Future;
use std::pin::Pin;

use base64::Engine;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, trace, warn};
use url::Url;

use bmlt_protocol::redact_secrets;

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs one GET request and returns the raw body.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, uri: &str) -> BoxFuture<'_, TransportResult<Vec<u8>>>;

    /// Drops per-session state such as cookies. The default does nothing.
    fn reset(&self) {}
}

/// Builds a basic-auth header value.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials)
    )
}

/// reqwest-backed fetcher that only ever speaks HTTPS.
///
/// The cookie store carries the server's admin session between calls. A 401
/// challenge is answered once with the configured credentials.
pub struct HttpsFetcher {
    client: std::sync::RwLock<Client>,
    config: TransportConfig,
}

impl HttpsFetcher {
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            client: std::sync::RwLock::new(client),
            config,
        })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn client(&self) -> Client {
        // Client is an Arc internally; a poisoned lock still holds a usable one.
        match self.client.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    async fn get(&self, uri: &str) -> TransportResult<Vec<u8>> {
        let url = Url::parse(uri).map_err(|e| {
            TransportError::invalid_uri(format!("invalid uri {}", redact_secrets(uri))).with_source(e)
        })?;
        if url.scheme() != "https" {
            return Err(TransportError::insecure(&redact_secrets(uri)));
        }

        let client = self.client();
        trace!(uri = %redact_secrets(uri), "Sending request");
        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
                debug!("Received 401, retrying with basic auth");
                let response = client
                    .get(url)
                    .header("Authorization", basic_auth(user, pass))
                    .send()
                    .await
                    .map_err(TransportError::from_reqwest)?;
                return handle_response(response).await;
            }
        }

        handle_response(response).await
    }
}

impl Fetcher for HttpsFetcher {
    fn fetch(&self, uri: &str) -> BoxFuture<'_, TransportResult<Vec<u8>>> {
        let uri = uri.to_string();
        Box::pin(async move { self.get(&uri).await })
    }

    fn reset(&self) {
        match build_client(&self.config) {
            Ok(fresh) => match self.client.write() {
                Ok(mut guard) => *guard = fresh,
                Err(poisoned) => *poisoned.into_inner() = fresh,
            },
            Err(e) => warn!(error = %e, "Failed to rebuild HTTP client"),
        }
    }
}

fn build_client(config: &TransportConfig) -> TransportResult<Client> {
    Client::builder()
        .https_only(true)
        .cookie_store(true)
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| TransportError::internal(format!("Failed to create HTTP client: {}", e)))
}

async fn handle_response(response: Response) -> TransportResult<Vec<u8>> {
    let status = response.status();
    trace!(status = %status, "Received response");

    if !status.is_success() {
        warn!(status = %status, "Unexpected response status");
        return Err(TransportError::status(status.as_u16()));
    }
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| TransportError::body(format!("Failed to read response: {}", e)).with_source(e))
}
