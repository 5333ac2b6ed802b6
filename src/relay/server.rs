//! HTTP front end of the relay.

use std::io::Cursor;
use std::net::SocketAddr;

use log::{debug, error, info};
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::SNAPSHOT_PATH;

use super::{build_snapshot, RecordStore, RelayError};

/// Status and JSON body of one relay answer, before CORS headers are added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body; `None` for an empty preflight answer.
    pub body: Option<String>,
}

impl RelayResponse {
    const fn json(status: u16, body: String) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }).to_string())
    }
}

/// Serves snapshots read from a [`RecordStore`].
pub struct RelayServer<S> {
    server: Server,
    store: S,
    list_key: String,
}

impl<S: RecordStore> RelayServer<S> {
    /// Binds `addr`; port 0 picks a free port.
    ///
    /// # Errors
    /// Returns [`RelayError::Bind`] when the address is unavailable.
    pub fn bind(addr: &str, store: S, list_key: impl Into<String>) -> Result<Self, RelayError> {
        let server = Server::http(addr).map_err(|err| RelayError::Bind {
            addr: addr.to_owned(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            server,
            store,
            list_key: list_key.into(),
        })
    }

    /// Address actually bound.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Answers requests until the listener fails.
    ///
    /// A failure writing one response is logged and does not stop the loop.
    ///
    /// # Errors
    /// Returns [`RelayError::Io`] when no further request can be received.
    pub fn serve(&self) -> Result<(), RelayError> {
        if let Some(addr) = self.local_addr() {
            info!("relay listening on http://{addr}{SNAPSHOT_PATH}");
        }
        loop {
            let request = self.server.recv()?;
            if let Err(err) = self.respond(request) {
                error!("failed to answer request: {err}");
            }
        }
    }

    /// Receives and answers exactly one request.
    ///
    /// # Errors
    /// Returns [`RelayError::Io`] when receiving or responding fails.
    pub fn serve_one(&self) -> Result<(), RelayError> {
        let request = self.server.recv()?;
        self.respond(request)
    }

    /// Decides the answer for `method` on `url`.
    #[must_use]
    pub fn route(&self, method: &Method, url: &str) -> RelayResponse {
        let path = url.split('?').next().unwrap_or(url);
        match (method, path) {
            (Method::Options, _) => RelayResponse {
                status: 204,
                body: None,
            },
            (Method::Get, SNAPSHOT_PATH) => self.snapshot_response(),
            _ => RelayResponse::error(404, "not found"),
        }
    }

    fn snapshot_response(&self) -> RelayResponse {
        let encoded = build_snapshot(&self.store, &self.list_key)
            .map_err(RelayError::from)
            .and_then(|snapshot| serde_json::to_string(&snapshot).map_err(RelayError::from));
        match encoded {
            Ok(body) => RelayResponse::json(200, body),
            Err(err) => {
                error!("snapshot request failed: {err}");
                RelayResponse::error(500, &err.to_string())
            }
        }
    }

    fn respond(&self, request: Request) -> Result<(), RelayError> {
        let answer = self.route(request.method(), request.url());
        debug!(
            "{} {} -> {}",
            request.method(),
            request.url(),
            answer.status
        );

        let body = answer.body.unwrap_or_default().into_bytes();
        let headers = [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", "GET, OPTIONS"),
            ("Access-Control-Allow-Headers", "Content-Type"),
            ("Content-Type", "application/json"),
        ]
        .into_iter()
        .filter_map(|(name, value)| Header::from_bytes(name.as_bytes(), value.as_bytes()).ok())
        .collect();
        let length = body.len();
        let response = Response::new(
            StatusCode(answer.status),
            headers,
            Cursor::new(body),
            Some(length),
            None,
        );
        request.respond(response)?;
        Ok(())
    }
}
