//! Streaming client for the orchestrator's deploy call
//!
//! One method, `execute_deploy`, maps onto the orchestrator's server-
//! streaming endpoint: request in, ordered record stream out. Records are
//! decoded incrementally from the chunked NDJSON body, so each one is
//! available the moment its line arrives.

use std::time::Duration;

use futures::{Stream, StreamExt};
use reqwest::Client;
use tracing::{debug, error};

use botdock_wire::ndjson::Decoder;
use botdock_wire::{DeployRequest, LogResponse};

use crate::errors::BridgeError;

/// Client for the orchestrator's streaming deploy endpoint
pub struct OrchestratorClient {
    client: Client,
    base_url: String,
}

impl OrchestratorClient {
    /// Create a new client.
    ///
    /// Only the connect phase gets a timeout; the call itself stays open
    /// for as long as the deployment streams.
    pub fn new(base_url: &str) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one deploy call and stream its records until the terminal one.
    pub async fn execute_deploy(
        &self,
        request: &DeployRequest,
    ) -> Result<impl Stream<Item = Result<LogResponse, BridgeError>>, BridgeError> {
        let url = format!("{}/v1/deploy/execute", self.base_url);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("deploy call rejected: {} - {}", status, body);
            return Err(BridgeError::Transport(format!("{}: {}", status, body)));
        }

        Ok(record_stream(Box::pin(response.bytes_stream())))
    }
}

/// Decode a chunked NDJSON body into typed records as chunks arrive
fn record_stream<S, B>(body: S) -> impl Stream<Item = Result<LogResponse, BridgeError>>
where
    S: Stream<Item = Result<B, reqwest::Error>> + Unpin,
    B: AsRef<[u8]>,
{
    futures::stream::try_unfold((body, Decoder::new()), |(mut body, mut decoder)| async move {
        loop {
            if let Some(record) = decoder.next_record()? {
                return Ok(Some((record, (body, decoder))));
            }
            match body.next().await {
                Some(Ok(chunk)) => decoder.push(chunk.as_ref()),
                Some(Err(e)) => return Err(BridgeError::Transport(e.to_string())),
                None => return Ok(None),
            }
        }
    })
}
