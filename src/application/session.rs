// Dashboard session - single task owning the dashboard state
use crate::application::ingestion_service::{Ack, Acknowledger, DashboardController};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::update::RawUpdate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const SESSION_QUEUE_DEPTH: usize = 100;

/// Named message delivered by the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushEvent {
    UpdateDashboard(serde_json::Value),
    Connect,
    Disconnect,
}

/// Outbound side of the push channel.
#[async_trait]
pub trait PushUpstream: Send + Sync {
    /// Ask the station to resend its buffered readings (`request_data`).
    async fn request_data(&self) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
#[error("dashboard session has stopped")]
pub struct SessionClosed;

enum SessionCommand {
    Push {
        event: PushEvent,
        ack: Option<Acknowledger>,
    },
    Snapshot(oneshot::Sender<DashboardSnapshot>),
}

/// Cheap handle for feeding the session from any task.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Queue an event without waiting for it to be applied.
    pub async fn deliver(&self, event: PushEvent) -> Result<(), SessionClosed> {
        self.tx
            .send(SessionCommand::Push { event, ack: None })
            .await
            .map_err(|_| SessionClosed)
    }

    /// Queue an event and wait for its acknowledgement.
    pub async fn deliver_with_ack(&self, event: PushEvent) -> Result<Ack, SessionClosed> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Push {
                event,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| SessionClosed)?;
        ack_rx.await.map_err(|_| SessionClosed)
    }

    pub async fn snapshot(&self) -> Result<DashboardSnapshot, SessionClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot(reply_tx))
            .await
            .map_err(|_| SessionClosed)?;
        reply_rx.await.map_err(|_| SessionClosed)
    }
}

/// Start the session task. It runs until every handle is dropped.
pub fn spawn_session(
    controller: DashboardController,
    upstream: Arc<dyn PushUpstream>,
) -> (SessionHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
    let task = tokio::spawn(run_session(controller, upstream, rx));
    (SessionHandle { tx }, task)
}

async fn run_session(
    mut controller: DashboardController,
    upstream: Arc<dyn PushUpstream>,
    mut rx: mpsc::Receiver<SessionCommand>,
) {
    tracing::info!("Dashboard session started");

    // Each command runs to completion before the next one is taken.
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Push {
                event: PushEvent::UpdateDashboard(payload),
                ack,
            } => {
                controller.on_update(RawUpdate::from_value(payload), ack);
            }
            SessionCommand::Push {
                event: PushEvent::Connect,
                ack,
            } => {
                tracing::info!("Push channel connected, requesting fresh data");
                let upstream = upstream.clone();
                tokio::spawn(async move {
                    if let Err(e) = upstream.request_data().await {
                        tracing::warn!("request_data failed: {:#}", e);
                    }
                });
                acknowledge(ack, Ack::Received);
            }
            SessionCommand::Push {
                event: PushEvent::Disconnect,
                ack,
            } => {
                tracing::info!("Push channel disconnected");
                acknowledge(ack, Ack::Received);
            }
            SessionCommand::Snapshot(reply) => {
                let _ = reply.send(controller.snapshot());
            }
        }
    }

    tracing::info!("Dashboard session stopped");
}

fn acknowledge(ack: Option<Acknowledger>, status: Ack) {
    if let Some(ack) = ack {
        let _ = ack.send(status);
    }
}
