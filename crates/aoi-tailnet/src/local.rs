//! Client for the local identity daemon's HTTP API on its unix socket.

use crate::cache::StatusCache;
use crate::client::NetworkIdentityClient;
use aoi_types::config::TailnetConfig;
use aoi_types::{AoiError, AoiResult, Status};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UnixStream;
use tracing::{debug, warn};

/// Status endpoint of the daemon's local API.
pub const STATUS_PATH: &str = "/localapi/v0/status";

/// Host header the daemon expects on local API requests.
const LOCAL_API_HOST: &str = "local-tailscaled.sock";

/// Longest error body kept in [`AoiError::Daemon`].
const MAX_ERROR_BODY: usize = 512;

/// [`NetworkIdentityClient`] backed by the daemon's control socket.
pub struct LocalClient {
    socket_path: PathBuf,
    timeout: Duration,
    cache: StatusCache,
}

impl LocalClient {
    /// Create a client for the socket at `socket_path`.
    pub fn new(socket_path: impl Into<PathBuf>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout,
            cache: StatusCache::new(ttl),
        }
    }

    /// Create a client from configuration.
    pub fn from_config(config: &TailnetConfig) -> Self {
        Self::new(
            config.socket_path.clone(),
            config.status_ttl(),
            config.request_timeout(),
        )
    }

    /// Path of the control socket.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Fetch a fresh status document, bypassing the cache.
    pub async fn fetch_status(&self) -> AoiResult<Status> {
        match tokio::time::timeout(self.timeout, self.request_status()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    socket = %self.socket_path.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Identity daemon status request timed out"
                );
                Err(AoiError::Timeout(self.timeout))
            }
        }
    }

    async fn request_status(&self) -> AoiResult<Status> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            AoiError::Connection(format!("{}: {e}", self.socket_path.display()))
        })?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| AoiError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "Identity daemon connection closed with error");
            }
        });

        let request = Request::builder()
            .method("GET")
            .uri(STATUS_PATH)
            .header(hyper::header::HOST, LOCAL_API_HOST)
            .body(Empty::<Bytes>::new())
            .map_err(|e| AoiError::Connection(e.to_string()))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| AoiError::Connection(e.to_string()))?;

        let status_code = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| AoiError::Connection(e.to_string()))?
            .to_bytes();

        if !status_code.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            let mut end = MAX_ERROR_BODY.min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            text.truncate(end);
            return Err(AoiError::Daemon {
                status: status_code.as_u16(),
                body: text,
            });
        }

        let status: Status = serde_json::from_slice(&body)?;
        debug!(
            backend_state = %status.backend_state,
            peers = status.peers.len(),
            "Fetched identity daemon status"
        );
        Ok(status)
    }
}

#[async_trait]
impl NetworkIdentityClient for LocalClient {
    async fn get_status(&self) -> AoiResult<Arc<Status>> {
        self.cache.get_or_fetch(|| self.fetch_status()).await
    }

    fn invalidate_cache(&self) {
        self.cache.invalidate();
    }
}
