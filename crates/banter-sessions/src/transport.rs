//! Transport abstraction over the realtime channel.
//!
//! The registry never touches a socket directly: a [`Transport`] hands it a
//! [`TransportLink`] — an outbound frame sender plus an inbound event stream —
//! and the production [`WsTransport`] bridges a `tokio-tungstenite` socket
//! onto those channels. Tests substitute channel-backed mocks.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use banter_common::{ConversationId, SessionError};

/// Lifecycle events delivered by a transport, in wire-arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The channel is open and usable.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The channel failed. Triggers the registry's reconnect policy.
    Error(String),
    /// The peer closed the channel. Does not trigger a reconnect.
    Closed,
}

/// The two halves of a live channel: frames out, events in.
pub struct TransportLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens realtime channels. One call per connection attempt; the returned
/// link is owned by exactly one `Connection`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(
        &self,
        conversation: &ConversationId,
        endpoint: &str,
    ) -> Result<TransportLink, SessionError>;
}

/// Production WebSocket transport.
///
/// The endpoint already encodes the conversation; the conversation id is
/// carried for log correlation only.
pub struct WsTransport;

#[async_trait]
impl Transport for WsTransport {
    async fn connect(
        &self,
        conversation: &ConversationId,
        endpoint: &str,
    ) -> Result<TransportLink, SessionError> {
        debug!(conversation = %conversation, endpoint = %endpoint, "Dialing chat backend");
        let (ws_stream, _) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // connect_async resolves once the handshake is complete.
        let _ = event_tx.send(TransportEvent::Opened);

        tokio::spawn(async move {
            let (mut sink, mut stream) = ws_stream.split();
            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => match outgoing {
                        Some(text) => {
                            if let Err(e) = sink.send(WsMessage::Text(text.into())).await {
                                warn!(error = %e, "WebSocket send failed");
                                let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                                break;
                            }
                        }
                        // Sender dropped: the session was closed on our side.
                        None => {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            break;
                        }
                    },
                    incoming = stream.next() => match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            let _ = event_tx.send(TransportEvent::Frame(text.to_string()));
                        }
                        Some(Ok(WsMessage::Close(_))) | None => {
                            let _ = event_tx.send(TransportEvent::Closed);
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            let _ = event_tx.send(TransportEvent::Error(e.to_string()));
                            break;
                        }
                        _ => {}
                    }
                }
            }
        });

        Ok(TransportLink {
            outbound: outbound_tx,
            events: event_rx,
        })
    }
}
