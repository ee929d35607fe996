//! Minimal HTTP/1 client for the registry endpoints.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::Method;
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tracing::debug;

use beacon_registry::NodeRecord;

use crate::error::{AgentError, AgentResult};

/// Talks to one registry over plain HTTP/1.1, one connection per call.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    addr: String,
    timeout: Duration,
}

impl RegistryClient {
    /// `addr` is the registry's `host:port`.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// POST /register for `address`.
    pub async fn register(&self, address: &str) -> AgentResult<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "address": address }))
            .map_err(|e| AgentError::Request(e.to_string()))?;
        self.send(Method::POST, "/register", Bytes::from(body)).await?;
        Ok(())
    }

    /// GET /nodes.
    pub async fn list_nodes(&self) -> AgentResult<Vec<NodeRecord>> {
        let body = self.send(Method::GET, "/nodes", Bytes::new()).await?;
        serde_json::from_slice(&body).map_err(|e| AgentError::Decode(e.to_string()))
    }

    /// Send one request and return the body of a 2xx response.
    async fn send(&self, method: Method, path: &str, body: Bytes) -> AgentResult<Bytes> {
        let exchange = async {
            let stream = tokio::net::TcpStream::connect(&self.addr)
                .await
                .map_err(|e| AgentError::Connect {
                    addr: self.addr.clone(),
                    reason: e.to_string(),
                })?;

            let io = TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(|e| AgentError::Request(e.to_string()))?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    debug!(error = %e, "registry connection closed with error");
                }
            });

            let req = http::Request::builder()
                .method(method)
                .uri(path)
                .header(HOST, self.addr.as_str())
                .header(USER_AGENT, concat!("beacon-agent/", env!("CARGO_PKG_VERSION")))
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(body))
                .map_err(|e| AgentError::Request(e.to_string()))?;

            let resp = sender
                .send_request(req)
                .await
                .map_err(|e| AgentError::Request(e.to_string()))?;

            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(|e| AgentError::Request(e.to_string()))?
                .to_bytes();

            if !status.is_success() {
                return Err(AgentError::Status {
                    status: status.as_u16(),
                    body: String::from_utf8_lossy(&bytes).into_owned(),
                });
            }

            Ok::<Bytes, AgentError>(bytes)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| AgentError::Timeout(self.timeout))?
    }
}
