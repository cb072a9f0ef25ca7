//! Status stream listener.
//!
//! Subscribes to one topic on the backend's update channel and forwards
//! every parsed status batch to the synchronizer. A malformed frame is
//! logged and dropped; it never terminates the subscription. The outer
//! loop reconnects with exponential backoff, making no assumptions about
//! ordering or redelivery across reconnects — batch application is
//! idempotent, so neither matters.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::service::DeltaBatch;

/// Topic carrying the poller's status updates.
pub const UPDATES_TOPIC: &str = "poller.updates";

/// Reconnection delays in seconds (exponential backoff with max)
const RECONNECT_DELAYS: &[u64] = &[1, 2, 4, 8, 16, 32];

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    Subscribe { topic: &'a str },
    Pong,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Event {
        topic: String,
        body: serde_json::Value,
    },
    Ping,
    #[serde(other)]
    Other,
}

/// What to do with one inbound text frame.
#[derive(Debug, PartialEq, Eq)]
enum Inbound {
    Batch(DeltaBatch),
    Ping,
    Ignore,
}

fn decode_frame(text: &str, topic: &str) -> Inbound {
    match serde_json::from_str::<ServerFrame>(text) {
        Ok(ServerFrame::Event { topic: t, body }) if t == topic => {
            match serde_json::from_value::<DeltaBatch>(body) {
                Ok(batch) => Inbound::Batch(batch),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed status batch");
                    Inbound::Ignore
                },
            }
        },
        Ok(ServerFrame::Event { topic: t, .. }) => {
            tracing::debug!(topic = %t, "ignoring event for unsubscribed topic");
            Inbound::Ignore
        },
        Ok(ServerFrame::Ping) => Inbound::Ping,
        Ok(ServerFrame::Other) => {
            tracing::debug!("ignoring unknown frame type");
            Inbound::Ignore
        },
        Err(e) => {
            tracing::warn!(error = %e, "discarding unparseable frame");
            Inbound::Ignore
        },
    }
}

/// Run the listener with automatic reconnection.
///
/// Returns once the synchronizer side of `delta_tx` is gone; until then
/// it keeps the subscription alive indefinitely.
pub async fn run(events_url: String, topic: String, delta_tx: UnboundedSender<DeltaBatch>) {
    let mut attempt = 0;

    loop {
        tracing::info!(url = %events_url, "connecting to update channel (attempt {})", attempt + 1);

        match connect_and_listen(&events_url, &topic, &delta_tx).await {
            Ok(()) => {
                tracing::info!("update channel closed, reconnecting");
                attempt = 0;
                tokio::time::sleep(Duration::from_secs(1)).await;
            },
            Err(e) => {
                tracing::warn!("update channel failed: {}. Retrying...", e);

                let delay_index = std::cmp::min(attempt, RECONNECT_DELAYS.len() - 1);
                let base_delay = RECONNECT_DELAYS[delay_index];

                // ±25% jitter so reconnecting clients don't stampede
                let jitter_factor = rand::random::<f64>() * 2.0 - 1.0;
                let jitter_ms = (base_delay * 1000) as f64 * 0.25 * jitter_factor;
                let delay_ms = (base_delay * 1000) as f64 + jitter_ms;

                tokio::time::sleep(Duration::from_millis(delay_ms.max(0.0) as u64)).await;
                attempt += 1;
            },
        }

        if delta_tx.is_closed() {
            tracing::debug!("synchronizer gone, stopping listener");
            return;
        }
    }
}

/// Connect, subscribe, and pump frames until the connection ends.
///
/// Returns `Ok(())` on graceful close, `Err` on connection failure.
async fn connect_and_listen(
    url: &str,
    topic: &str,
    delta_tx: &UnboundedSender<DeltaBatch>,
) -> Result<()> {
    let (ws_stream, _) = connect_async(url)
        .await
        .context("failed to connect to update channel")?;

    tracing::debug!("connected to update channel at {}", url);

    let (mut write, mut read) = ws_stream.split();

    let subscribe = ClientFrame::Subscribe { topic };
    write
        .send(Message::Text(serde_json::to_string(&subscribe)?))
        .await
        .context("failed to subscribe")?;

    while let Some(message) = read.next().await {
        let message = message.context("update channel read failed")?;
        match message {
            Message::Text(text) => {
                handle_text_frame(&text, topic, delta_tx, &mut write).await?;
            },
            Message::Ping(payload) => {
                write.send(Message::Pong(payload)).await.ok();
            },
            Message::Close(_) => {
                return Ok(());
            },
            _ => {},
        }
    }

    Ok(())
}

async fn handle_text_frame(
    text: &str,
    topic: &str,
    delta_tx: &UnboundedSender<DeltaBatch>,
    write: &mut WsSink,
) -> Result<()> {
    match decode_frame(text, topic) {
        Inbound::Batch(batch) => {
            if delta_tx.send(batch).is_err() {
                anyhow::bail!("synchronizer channel closed");
            }
        },
        Inbound::Ping => {
            let pong = serde_json::to_string(&ClientFrame::Pong)?;
            if write.send(Message::Text(pong)).await.is_err() {
                tracing::warn!("failed to answer keepalive ping");
            }
        },
        Inbound::Ignore => {},
    }
    Ok(())
}
