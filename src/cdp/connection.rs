// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! WebSocket connection to the browser
//!
//! One connection per browser. Commands are correlated to responses by id;
//! events are forwarded to a single subscriber (the page). The event loop
//! runs in its own task and fails all pending commands on shutdown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::types::{IncomingMessage, OutgoingCommand};
use crate::error::{Error, Result};

/// Time budget for a single protocol command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = HashMap<u64, oneshot::Sender<Result<Value>>>;

/// An event frame routed off the connection.
#[derive(Debug, Clone)]
pub struct CdpEvent {
    pub method: String,
    pub session_id: Option<String>,
    pub params: Value,
}

enum LoopCommand {
    Send {
        frame: String,
        id: u64,
        response_tx: oneshot::Sender<Result<Value>>,
    },
    DropPending(u64),
    Shutdown,
}

/// Shared handle to the browser connection.
pub struct Connection {
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    next_id: Arc<AtomicU64>,
    event_tx: Arc<Mutex<Option<mpsc::UnboundedSender<CdpEvent>>>>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            next_id: Arc::clone(&self.next_id),
            event_tx: Arc::clone(&self.event_tx),
        }
    }
}

impl Connection {
    /// Connect to a DevTools WebSocket URL.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (stream, _) = connect_async(ws_url).await?;
        debug!(url = %ws_url, "connected to browser");
        Ok(Self::new(stream))
    }

    fn new(stream: Stream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let event_tx: Arc<Mutex<Option<mpsc::UnboundedSender<CdpEvent>>>> =
            Arc::new(Mutex::new(None));

        tokio::spawn(Self::run_event_loop(
            stream,
            command_rx,
            Arc::clone(&event_tx),
        ));

        Self {
            command_tx,
            next_id: Arc::new(AtomicU64::new(1)),
            event_tx,
        }
    }

    /// Route subsequent event frames to the given sender. Events arriving
    /// with no sender installed are dropped.
    pub fn set_event_sender(&self, sender: mpsc::UnboundedSender<CdpEvent>) {
        *self.event_tx.lock() = Some(sender);
    }

    /// Drop the event sender, ending the subscriber's stream.
    pub fn clear_event_sender(&self) {
        self.event_tx.lock().take();
    }

    /// Send a command and wait for its result.
    pub async fn send(
        &self,
        method: &str,
        session_id: Option<&str>,
        params: Value,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&OutgoingCommand {
            id,
            method,
            session_id,
            params,
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(LoopCommand::Send {
                frame,
                id,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(COMMAND_TIMEOUT, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self.command_tx.send(LoopCommand::DropPending(id));
                Err(Error::timeout(method, COMMAND_TIMEOUT.as_millis() as u64))
            }
        }
    }

    /// Shut the connection down, failing anything still pending.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoopCommand::Shutdown);
    }

    async fn run_event_loop(
        stream: Stream,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        event_tx: Arc<Mutex<Option<mpsc::UnboundedSender<CdpEvent>>>>,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();
        let mut pending: PendingMap = HashMap::new();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming(&text, &mut pending, &event_tx);
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("browser closed the connection");
                            break;
                        }
                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket read error");
                            break;
                        }
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Send { frame, id, response_tx }) => {
                            pending.insert(id, response_tx);
                            if let Err(e) = ws_write.send(Message::Text(frame)).await {
                                if let Some(tx) = pending.remove(&id) {
                                    let _ = tx.send(Err(Error::WebSocket(e)));
                                }
                            } else {
                                trace!(id, "command sent");
                            }
                        }
                        Some(LoopCommand::DropPending(id)) => {
                            pending.remove(&id);
                        }
                        Some(LoopCommand::Shutdown) | None => {
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        // Fail whatever is still waiting; drop the event sender so the
        // subscriber's stream terminates.
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }
        event_tx.lock().take();
        debug!("connection event loop terminated");
    }

    fn handle_incoming(
        text: &str,
        pending: &mut PendingMap,
        event_tx: &Arc<Mutex<Option<mpsc::UnboundedSender<CdpEvent>>>>,
    ) {
        let message: IncomingMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "unparseable frame from browser");
                return;
            }
        };

        if let Some(id) = message.id {
            let result = match message.error {
                Some(error) => Err(Error::protocol(format!("command {}", id), error.message)),
                None => Ok(message.result.unwrap_or(Value::Null)),
            };
            if let Some(tx) = pending.remove(&id) {
                let _ = tx.send(result);
            } else {
                trace!(id, "response for unknown command");
            }
            return;
        }

        if let Some(method) = message.method {
            let event = CdpEvent {
                method,
                session_id: message.session_id,
                params: message.params.unwrap_or(Value::Null),
            };
            let guard = event_tx.lock();
            if let Some(ref sender) = *guard {
                let _ = sender.send(event);
            }
        }
    }
}
