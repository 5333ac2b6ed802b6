//! Where snapshots come from.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::snapshot::Snapshot;

/// Why a snapshot fetch produced nothing usable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The relay could not be reached.
    #[error("relay unreachable: {0}")]
    Transport(String),
    /// The relay answered with a non-success status.
    #[error("relay answered HTTP {0}")]
    Status(u16),
    /// The response body could not be read.
    #[error("failed to read relay response: {0}")]
    Io(#[from] io::Error),
    /// The body was not a snapshot object.
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Produces one snapshot per call. Implementations block; callers run them
/// off the main thread.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Fetches the current snapshot.
    ///
    /// # Errors
    /// Returns [`FetchError`] when no complete snapshot could be obtained.
    fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Fetches snapshots from the relay over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    agent: ureq::Agent,
    url: String,
}

impl HttpSnapshotSource {
    /// Creates a source for `url`. Without a `timeout` a request may wait
    /// indefinitely.
    #[must_use]
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(limit) = timeout {
            builder = builder.timeout(limit);
        }
        Self {
            agent: builder.build(),
            url: url.into(),
        }
    }

    /// Endpoint this source polls.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = match self.agent.get(&self.url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport(transport.to_string()))
            }
        };
        let body = response.into_string()?;
        Ok(Snapshot::from_json(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unreachable_relay_is_a_transport_error() {
        // Port 9 (discard) on loopback is closed on any sane test host.
        let source = HttpSnapshotSource::new(
            "http://127.0.0.1:9/api/redis-data",
            Some(Duration::from_millis(500)),
        );
        assert!(matches!(source.fetch(), Err(FetchError::Transport(_))));
    }

    #[rstest]
    #[case::status(FetchError::Status(503), "relay answered HTTP 503")]
    #[case::transport(FetchError::Transport("refused".into()), "relay unreachable: refused")]
    fn errors_render_readably(#[case] error: FetchError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
