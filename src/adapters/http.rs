//! reqwest-backed stage client.
//!
//! Posts the stage body as JSON and waits for the full response under the
//! call's timeout. The timeout covers both sending the request and reading
//! the body.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::debug;

use super::{truncate_detail, StageCall, StageClient, StageError, StageResult};

/// Stage client that speaks JSON over HTTP
#[derive(Debug, Clone, Default)]
pub struct HttpStageClient {
    client: reqwest::Client,
}

impl HttpStageClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StageClient for HttpStageClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn call(&self, call: StageCall<'_>) -> Result<StageResult, StageError> {
        if call.timeout.is_zero() {
            return Err(StageError::InvalidRequest(format!(
                "timeout for stage '{}' must be greater than zero",
                call.stage
            )));
        }

        let mut request = self.client.post(call.url).json(&call.body);
        if let Some(token) = call.bearer {
            request = request.bearer_auth(token);
        }

        debug!(stage = %call.stage, url = call.url, timeout = ?call.timeout, "Calling stage");

        let started = Instant::now();
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match timeout(call.timeout, exchange).await {
            Err(_) => return Err(StageError::Timeout(call.timeout)),
            Ok(Err(e)) => return Err(classify(e, call.timeout)),
            Ok(Ok(parts)) => parts,
        };
        let elapsed = started.elapsed();

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(StageError::Remote {
                status: status.as_u16(),
                body: truncate_detail(&text),
            });
        }

        let payload = serde_json::from_slice(&body).map_err(|e| {
            StageError::MalformedResponse(format!("response body is not valid JSON: {}", e))
        })?;

        Ok(StageResult::success(call.stage, payload, elapsed))
    }
}

/// Map a reqwest failure onto the stage error taxonomy
fn classify(error: reqwest::Error, limit: Duration) -> StageError {
    if error.is_timeout() {
        StageError::Timeout(limit)
    } else {
        StageError::Transport(error.without_url().to_string())
    }
}
