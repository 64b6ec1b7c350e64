// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket lifecycle management.
//!
//! At most one socket is live at a time. Each successful dial bumps a
//! generation counter, and events from a superseded reader task are
//! discarded by generation check. Reconnection uses exponential backoff
//! with a bounded attempt count; the session loop owns the retry timer,
//! this module only hands back the delay.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use wisp_core::error::WispError;
use wisp_core::frame::OutboundFrame;
use wisp_core::traits::transport::{SocketSink, SocketTransport};
use wisp_core::types::{ConnectionState, RoomId};

/// Event emitted by the socket reader task.
#[derive(Debug)]
pub enum SocketEvent {
    /// A text frame arrived on the socket of the given generation.
    Frame { generation: u64, text: String },
    /// The socket of the given generation closed or errored.
    Closed { generation: u64 },
}

/// What the session should do after a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Sleep for the given delay, then dial again.
    RetryAfter(Duration),
    /// The attempt budget is spent; stay disconnected.
    Exhausted,
}

pub struct ConnectionManager {
    transport: Arc<dyn SocketTransport>,
    ws_url: String,
    base_delay: Duration,
    max_attempts: u32,
    state: ConnectionState,
    attempts: u32,
    generation: u64,
    sink: Option<Box<dyn SocketSink>>,
    events_tx: mpsc::Sender<SocketEvent>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        ws_url: impl Into<String>,
        base_delay: Duration,
        max_attempts: u32,
    ) -> (Self, mpsc::Receiver<SocketEvent>) {
        let (events_tx, events_rx) = mpsc::channel(64);
        let manager = Self {
            transport,
            ws_url: ws_url.into(),
            base_delay,
            max_attempts,
            state: ConnectionState::Idle,
            attempts: 0,
            generation: 0,
            sink: None,
            events_tx,
        };
        (manager, events_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Generation of the currently live socket. Events stamped with an
    /// older generation belong to a superseded socket.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Dials the room socket. A no-op while already open; otherwise any
    /// lingering sink is closed first so only one socket is ever live.
    pub async fn connect(&mut self, room: &RoomId) -> Result<(), WispError> {
        if self.state == ConnectionState::Open {
            debug!(room = %room, "connect skipped, socket already open");
            return Ok(());
        }
        if let Some(mut old) = self.sink.take() {
            old.close().await;
        }
        self.generation += 1;
        let generation = self.generation;
        if self.state != ConnectionState::Reconnecting {
            self.state = ConnectionState::Connecting;
        }

        let url = format!("{}{}/", self.ws_url, room);
        debug!(room = %room, attempt = self.attempts, %url, "dialing socket");
        let (sink, mut stream) = self.transport.connect(&url).await?;

        let events_tx = self.events_tx.clone();
        tokio::spawn(async move {
            loop {
                match stream.next_text().await {
                    Some(Ok(text)) => {
                        if events_tx
                            .send(SocketEvent::Frame { generation, text })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(generation, error = %err, "socket read failed");
                        let _ = events_tx.send(SocketEvent::Closed { generation }).await;
                        return;
                    }
                    None => {
                        let _ = events_tx.send(SocketEvent::Closed { generation }).await;
                        return;
                    }
                }
            }
        });

        self.sink = Some(sink);
        self.state = ConnectionState::Open;
        self.attempts = 0;
        info!(room = %room, generation, "socket open");
        Ok(())
    }

    /// Records a failed dial and decides whether to retry.
    pub fn fail_attempt(&mut self) -> ReconnectDecision {
        self.next_retry()
    }

    /// Handles a reader-task close event. Returns `None` when the event
    /// is stale (an older generation) or the manager was closed on
    /// purpose.
    pub fn handle_socket_closed(&mut self, generation: u64) -> Option<ReconnectDecision> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "stale close event ignored");
            return None;
        }
        if self.state == ConnectionState::Closed {
            return None;
        }
        self.sink = None;
        Some(self.next_retry())
    }

    fn next_retry(&mut self) -> ReconnectDecision {
        if self.attempts < self.max_attempts {
            let delay = backoff_delay(self.base_delay, self.attempts);
            self.attempts += 1;
            self.state = ConnectionState::Reconnecting;
            info!(
                attempt = self.attempts,
                max = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "scheduling reconnect"
            );
            ReconnectDecision::RetryAfter(delay)
        } else {
            warn!(attempts = self.attempts, "reconnect attempts exhausted");
            self.state = ConnectionState::Closed;
            ReconnectDecision::Exhausted
        }
    }

    /// Serializes and transmits a frame over the open socket.
    pub async fn send(&mut self, frame: &OutboundFrame) -> Result<(), WispError> {
        if self.state != ConnectionState::Open {
            return Err(WispError::NotConnected);
        }
        let sink = self.sink.as_mut().ok_or(WispError::NotConnected)?;
        let wire = frame
            .to_wire()
            .map_err(|err| WispError::Internal(format!("frame encoding failed: {err}")))?;
        sink.send_text(wire).await
    }

    /// Closes the socket for good. Idempotent; later close events from
    /// the reader task are ignored via the generation bump.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        if let Some(mut sink) = self.sink.take() {
            sink.close().await;
        }
        self.generation += 1;
        self.state = ConnectionState::Closed;
        info!("socket closed");
    }
}

/// Exponential backoff: `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(31))
}
