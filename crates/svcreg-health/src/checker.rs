//! Health check probe logic.
//!
//! One pooled HTTP(S) client is shared by every polling task so connections
//! to the same host are reused between polls.

use std::time::Duration;

use reqwest::{Certificate, Client, StatusCode};
use tracing::debug;

use crate::error::{HealthError, HealthResult};

/// Idle connections kept per host.
pub const MAX_IDLE_PER_HOST: usize = 10;

/// How long an idle pooled connection is kept before it is closed.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The health endpoint returned exactly 200.
    Healthy,
    /// The health endpoint answered with any other status.
    Unhealthy,
    /// The probe could not be executed (bad URL, connection or TLS error).
    Failed,
}

impl ProbeResult {
    pub fn is_healthy(self) -> bool {
        self == ProbeResult::Healthy
    }
}

/// Pooled HTTP(S) client used for health probes. Cheap to clone.
#[derive(Clone)]
pub struct HealthClient {
    client: Client,
}

impl HealthClient {
    /// Client trusting the bundled webpki roots.
    pub fn new() -> HealthResult<Self> {
        Self::with_root_certificates(Vec::new())
    }

    /// Client that additionally trusts `roots`, for endpoints behind a
    /// private CA.
    pub fn with_root_certificates(roots: Vec<Certificate>) -> HealthResult<Self> {
        let mut builder = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT);
        for root in roots {
            builder = builder.add_root_certificate(root);
        }
        let client = builder.build().map_err(HealthError::Client)?;
        Ok(Self { client })
    }

    /// GET `url` once and classify the outcome.
    ///
    /// No request deadline is applied; a hanging endpoint stalls only the
    /// caller's poll.
    pub async fn probe(&self, url: &str) -> ProbeResult {
        match self.client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                // Drain the body so the connection goes back to the pool.
                let _ = resp.bytes().await;
                if status == StatusCode::OK {
                    ProbeResult::Healthy
                } else {
                    debug!(%status, %url, "health probe non-200");
                    ProbeResult::Unhealthy
                }
            }
            Err(e) => {
                debug!(error = %e, %url, "health probe request failed");
                ProbeResult::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::test_tls;

    async fn server_answering(status: u16) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(status).set_body_string("ok"))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn probe_200_is_healthy() {
        let server = server_answering(200).await;
        let client = HealthClient::new().unwrap();

        let result = client.probe(&format!("{}/healthz", server.uri())).await;
        assert_eq!(result, ProbeResult::Healthy);
        assert!(result.is_healthy());
    }

    #[tokio::test]
    async fn probe_other_2xx_is_unhealthy() {
        let server = server_answering(204).await;
        let client = HealthClient::new().unwrap();

        let result = client.probe(&format!("{}/healthz", server.uri())).await;
        assert_eq!(result, ProbeResult::Unhealthy);
    }

    #[tokio::test]
    async fn probe_500_is_unhealthy() {
        let server = server_answering(500).await;
        let client = HealthClient::new().unwrap();

        let result = client.probe(&format!("{}/healthz", server.uri())).await;
        assert_eq!(result, ProbeResult::Unhealthy);
        assert!(!result.is_healthy());
    }

    #[tokio::test]
    async fn probe_to_closed_port_fails() {
        let client = HealthClient::new().unwrap();
        let result = client.probe("http://127.0.0.1:1/healthz").await;
        assert_eq!(result, ProbeResult::Failed);
    }

    #[tokio::test]
    async fn probe_invalid_uri_fails() {
        let client = HealthClient::new().unwrap();
        assert_eq!(client.probe("not a url").await, ProbeResult::Failed);
    }

    #[tokio::test]
    async fn client_is_reused_across_probes() {
        let server = server_answering(200).await;
        let client = HealthClient::new().unwrap();
        let url = format!("{}/healthz", server.uri());

        for _ in 0..3 {
            assert_eq!(client.clone().probe(&url).await, ProbeResult::Healthy);
        }
        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 3);
    }

    fn trusting(cert: &rcgen::CertifiedKey) -> HealthClient {
        let root = Certificate::from_der(cert.cert.der()).unwrap();
        HealthClient::with_root_certificates(vec![root]).unwrap()
    }

    #[tokio::test]
    async fn probe_https_200_is_healthy() {
        let cert = test_tls::loopback_cert();
        let (addr, server) = test_tls::serve(&cert, 200).await;

        let result = trusting(&cert).probe(&format!("https://{addr}/healthz")).await;
        assert_eq!(result, ProbeResult::Healthy);
        server.abort();
    }

    #[tokio::test]
    async fn probe_https_503_is_unhealthy() {
        let cert = test_tls::loopback_cert();
        let (addr, server) = test_tls::serve(&cert, 503).await;

        let result = trusting(&cert).probe(&format!("https://{addr}/healthz")).await;
        assert_eq!(result, ProbeResult::Unhealthy);
        server.abort();
    }

    #[tokio::test]
    async fn probe_https_untrusted_certificate_fails() {
        let cert = test_tls::loopback_cert();
        let (addr, server) = test_tls::serve(&cert, 200).await;

        let result = HealthClient::new()
            .unwrap()
            .probe(&format!("https://{addr}/healthz"))
            .await;
        assert_eq!(result, ProbeResult::Failed);
        server.abort();
    }
}
