// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! tokio-tungstenite implementation of the socket transport seam.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use wisp_core::error::WispError;
use wisp_core::traits::transport::{SocketPair, SocketSink, SocketStream, SocketTransport};

type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport backed by tokio-tungstenite.
#[derive(Debug, Default)]
pub struct TungsteniteTransport;

#[async_trait]
impl SocketTransport for TungsteniteTransport {
    async fn connect(&self, url: &str) -> Result<SocketPair, WispError> {
        debug!(%url, "opening websocket");
        let (ws, _response) = connect_async(url).await.map_err(|err| WispError::Socket {
            message: format!("websocket dial to {url} failed"),
            source: Some(Box::new(err)),
        })?;
        let (sink, stream) = ws.split();
        Ok((
            Box::new(WsSink { sink }),
            Box::new(WsStream { stream }),
        ))
    }
}

struct WsSink {
    sink: SplitSink<WsConnection, Message>,
}

#[async_trait]
impl SocketSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<(), WispError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|err| WispError::Socket {
                message: "websocket send failed".into(),
                source: Some(Box::new(err)),
            })
    }

    async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}

struct WsStream {
    stream: SplitStream<WsConnection>,
}

#[async_trait]
impl SocketStream for WsStream {
    async fn next_text(&mut self) -> Option<Result<String, WispError>> {
        // Control frames are handled by tungstenite; only text frames
        // carry protocol traffic.
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(err) => {
                    return Some(Err(WispError::Socket {
                        message: "websocket read failed".into(),
                        source: Some(Box::new(err)),
                    }))
                }
            }
        }
    }
}
