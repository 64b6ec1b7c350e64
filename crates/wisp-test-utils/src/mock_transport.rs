// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock socket transport for deterministic testing.
//!
//! `MockTransport` implements `SocketTransport` with a scriptable dial
//! outcome per attempt, injectable inbound frames, and captured outbound
//! frames for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use wisp_core::error::WispError;
use wisp_core::traits::transport::{SocketPair, SocketSink, SocketStream, SocketTransport};

/// Outcome of the next dial attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOutcome {
    Accept,
    Refuse,
}

/// A mock socket transport for testing.
///
/// Each `connect()` consumes the next scripted [`DialOutcome`]
/// (defaulting to `Accept` when the script runs dry). Accepted dials
/// produce a [`MockSocket`] the test can drive: inject inbound frames,
/// inspect captured outbound frames, or drop the connection.
pub struct MockTransport {
    script: Mutex<VecDeque<DialOutcome>>,
    sockets: Mutex<Vec<Arc<MockSocket>>>,
    dialed_urls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            sockets: Mutex::new(Vec::new()),
            dialed_urls: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the next `count` dial attempts to be refused.
    pub async fn refuse_next(&self, count: usize) {
        let mut script = self.script.lock().await;
        for _ in 0..count {
            script.push_back(DialOutcome::Refuse);
        }
    }

    /// Every URL that was dialed, in order.
    pub async fn dialed_urls(&self) -> Vec<String> {
        self.dialed_urls.lock().await.clone()
    }

    /// Number of dial attempts so far.
    pub async fn dial_count(&self) -> usize {
        self.dialed_urls.lock().await.len()
    }

    /// The most recently accepted socket, if any.
    pub async fn latest_socket(&self) -> Option<Arc<MockSocket>> {
        self.sockets.lock().await.last().cloned()
    }

    /// All accepted sockets, oldest first.
    pub async fn sockets(&self) -> Vec<Arc<MockSocket>> {
        self.sockets.lock().await.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketTransport for MockTransport {
    async fn connect(&self, url: &str) -> Result<SocketPair, WispError> {
        self.dialed_urls.lock().await.push(url.to_string());
        let outcome = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(DialOutcome::Accept);
        if outcome == DialOutcome::Refuse {
            return Err(WispError::Socket {
                message: format!("mock refused dial to {url}"),
                source: None,
            });
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let socket = Arc::new(MockSocket {
            inbound_tx: Mutex::new(Some(inbound_tx)),
            sent: Mutex::new(Vec::new()),
        });
        self.sockets.lock().await.push(Arc::clone(&socket));

        let sink = MockSink {
            socket: Arc::clone(&socket),
        };
        let stream = MockStream { rx: inbound_rx };
        Ok((Box::new(sink), Box::new(stream)))
    }
}

/// A live mock socket, held by the test for driving one connection.
pub struct MockSocket {
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    sent: Mutex<Vec<String>>,
}

impl MockSocket {
    /// Injects an inbound text frame, as if the backend sent it.
    pub async fn inject(&self, frame: impl Into<String>) {
        if let Some(tx) = self.inbound_tx.lock().await.as_ref() {
            let _ = tx.send(frame.into());
        }
    }

    /// Severs the connection: the read half sees a peer close.
    pub async fn drop_connection(&self) {
        self.inbound_tx.lock().await.take();
    }

    /// All frames sent through the write half, in order.
    pub async fn sent_frames(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

struct MockSink {
    socket: Arc<MockSocket>,
}

#[async_trait]
impl SocketSink for MockSink {
    async fn send_text(&mut self, text: String) -> Result<(), WispError> {
        self.socket.sent.lock().await.push(text);
        Ok(())
    }

    async fn close(&mut self) {
        self.socket.drop_connection().await;
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl SocketStream for MockStream {
    async fn next_text(&mut self) -> Option<Result<String, WispError>> {
        self.rx.recv().await.map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refused_dials_come_before_accepted_ones() {
        let transport = MockTransport::new();
        transport.refuse_next(2).await;

        assert!(transport.connect("ws://x/room/").await.is_err());
        assert!(transport.connect("ws://x/room/").await.is_err());
        assert!(transport.connect("ws://x/room/").await.is_ok());
        assert_eq!(transport.dial_count().await, 3);
    }

    #[tokio::test]
    async fn injected_frames_reach_the_stream() {
        let transport = MockTransport::new();
        let (mut sink, mut stream) = transport.connect("ws://x/room/").await.unwrap();
        let socket = transport.latest_socket().await.unwrap();

        socket.inject(r#"{"typing":true}"#).await;
        let frame = stream.next_text().await.unwrap().unwrap();
        assert_eq!(frame, r#"{"typing":true}"#);

        sink.send_text("outbound".to_string()).await.unwrap();
        assert_eq!(socket.sent_frames().await, vec!["outbound".to_string()]);

        socket.drop_connection().await;
        assert!(stream.next_text().await.is_none());
    }
}
