// Push channel client - subscribes to the station's event stream
use crate::application::session::{PushEvent, PushUpstream, SessionHandle};
use crate::infrastructure::chunked_json::{decode_frame, FrameDecoder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpPushClient {
    client: reqwest::Client,
    base_url: String,
    reconnect_delay: Duration,
    compressed: bool,
}

/// How a subscription ended.
enum StreamEnd {
    Closed,
    SessionGone,
}

impl HttpPushClient {
    pub fn new(base_url: &str, reconnect_delay: Duration, compressed: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            reconnect_delay,
            compressed,
        }
    }

    /// Keep a subscription open, reconnecting after every drop, until the
    /// session stops.
    pub async fn run(self, session: SessionHandle) {
        loop {
            let mut connected = false;
            match self.subscribe(&session, &mut connected).await {
                Ok(StreamEnd::SessionGone) => break,
                Ok(StreamEnd::Closed) => tracing::info!("Push stream closed by station"),
                Err(e) => tracing::warn!("Push stream error: {:#}", e),
            }

            if connected && session.deliver(PushEvent::Disconnect).await.is_err() {
                break;
            }
            tokio::time::sleep(self.reconnect_delay).await;
        }

        tracing::info!("Push client stopped");
    }

    async fn subscribe(&self, session: &SessionHandle, connected: &mut bool) -> Result<StreamEnd> {
        let url = format!("{}/events", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to connect to push stream")?;

        if !response.status().is_success() {
            anyhow::bail!("Push stream refused with status {}", response.status());
        }

        if session.deliver(PushEvent::Connect).await.is_err() {
            return Ok(StreamEnd::SessionGone);
        }
        *connected = true;

        let mut body = response.bytes_stream();
        let mut decoder = FrameDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.context("Push stream read failed")?;
            decoder.extend(&chunk);

            while let Some(frame) = decoder.next_frame()? {
                let event = match decode_frame::<PushEvent>(&frame, self.compressed).await {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Skipping undecodable push frame: {}", e);
                        continue;
                    }
                };

                if session.deliver(event).await.is_err() {
                    return Ok(StreamEnd::SessionGone);
                }
            }
        }

        Ok(StreamEnd::Closed)
    }
}

#[async_trait]
impl PushUpstream for HttpPushClient {
    async fn request_data(&self) -> Result<()> {
        let url = format!("{}/request-data", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .context("Failed to send request_data")?;

        if !response.status().is_success() {
            anyhow::bail!("request_data rejected with status {}", response.status());
        }
        Ok(())
    }
}

/// Upstream used when no push URL is configured: events arrive via `POST /push`
/// and there is nobody to ask for a resend.
pub struct NoUpstream;

#[async_trait]
impl PushUpstream for NoUpstream {
    async fn request_data(&self) -> Result<()> {
        tracing::debug!("No push upstream configured, skipping request_data");
        Ok(())
    }
}
