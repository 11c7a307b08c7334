//! HTTP liveness probe.

use crate::error::{Result, TetherError};
use reqwest::blocking::Client;
use std::time::Duration;

/// Default timeout for a single liveness request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Answers whether the service is serving.
pub trait LivenessCheck {
    fn is_live(&self) -> bool;

    /// Where the check points, for messages.
    fn target(&self) -> String;
}

/// GET against the health endpoint; any 2xx is live.
pub struct HttpLiveness {
    client: Client,
    url: String,
}

impl HttpLiveness {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tether/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| TetherError::Other(e.into()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl LivenessCheck for HttpLiveness {
    fn is_live(&self) -> bool {
        match self.client.get(&self.url).send() {
            Ok(response) => {
                let status = response.status();
                tracing::debug!("Liveness {} -> {}", self.url, status);
                status.is_success()
            }
            Err(e) => {
                tracing::debug!("Liveness {} unreachable: {}", self.url, e);
                false
            }
        }
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn probe(url: String) -> HttpLiveness {
        HttpLiveness::new(url, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn ok_response_is_live() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/vendorRates/health");
            then.status(200).body("{\"status\":\"ok\"}");
        });

        assert!(probe(server.url("/api/vendorRates/health")).is_live());
        mock.assert();
    }

    #[test]
    fn no_content_is_live() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(204);
        });

        assert!(probe(server.url("/health")).is_live());
    }

    #[test]
    fn server_error_is_not_live() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(503);
        });

        assert!(!probe(server.url("/health")).is_live());
    }

    #[test]
    fn missing_route_is_not_live() {
        let server = MockServer::start();
        assert!(!probe(server.url("/health")).is_live());
    }

    #[test]
    fn closed_port_is_not_live() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(!probe(format!("http://127.0.0.1:{}/health", port)).is_live());
    }

    #[test]
    fn target_is_url() {
        let check = probe("http://127.0.0.1:63400/health".to_string());
        assert_eq!(check.target(), "http://127.0.0.1:63400/health");
        assert_eq!(check.url(), "http://127.0.0.1:63400/health");
    }
}
