//! Demo real-time channel for the dashboard page.
//!
//! Every connection gets its own canned server list, a periodic random
//! status flip for `srv1`, and per-server synthetic console output once the
//! client joins a console. Nothing here is shared between connections.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{Sink, SinkExt, StreamExt};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crazedash_common::{
    ClientEvent, ConsoleLine, ServerEvent, ServerStatus, ServerSummary, StatusUpdate,
};

/// Period of the random status flip.
pub const STATUS_INTERVAL: Duration = Duration::from_secs(3);
/// Period of synthetic console lines for a joined server.
pub const CONSOLE_INTERVAL: Duration = Duration::from_secs(1);
/// Server whose status flips.
const FLIPPING_SERVER_ID: &str = "srv1";

/// The fixed list sent on connect.
pub fn demo_servers() -> Vec<ServerSummary> {
    vec![
        ServerSummary {
            id: "srv1".to_string(),
            name: "Survival Server".to_string(),
            status: ServerStatus::Online,
        },
        ServerSummary {
            id: "srv2".to_string(),
            name: "Creative Server".to_string(),
            status: ServerStatus::Offline,
        },
    ]
}

/// Console tickers owned by one connection. Dropping aborts them all.
#[derive(Default)]
struct ConsoleTasks {
    tickers: HashMap<String, JoinHandle<()>>,
}

impl ConsoleTasks {
    /// Start streaming lines for `srv_id`. Joining a server twice keeps one ticker.
    fn join(&mut self, srv_id: String, events: mpsc::Sender<ServerEvent>) {
        if self.tickers.contains_key(&srv_id) {
            return;
        }

        let id = srv_id.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + CONSOLE_INTERVAL, CONSOLE_INTERVAL);
            loop {
                ticker.tick().await;
                let line = format!(
                    "[Server] Demo log line at {}",
                    chrono::Local::now().format("%H:%M:%S")
                );
                let event = ServerEvent::ConsoleLog(ConsoleLine {
                    srv_id: id.clone(),
                    line,
                });
                if events.send(event).await.is_err() {
                    break;
                }
            }
        });

        self.tickers.insert(srv_id, handle);
    }

    fn len(&self) -> usize {
        self.tickers.len()
    }
}

impl Drop for ConsoleTasks {
    fn drop(&mut self) {
        for (_, handle) in self.tickers.drain() {
            handle.abort();
        }
    }
}

/// GET /ws - WebSocket upgrade for the dashboard channel.
async fn socket(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

/// Handle one dashboard connection until the client goes away.
async fn handle_socket(socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<ServerEvent>(64);
    let mut consoles = ConsoleTasks::default();

    tracing::debug!("Dashboard WS client connected");

    if send_event(&mut ws_tx, &ServerEvent::Servers(demo_servers()))
        .await
        .is_err()
    {
        return;
    }

    let mut status_interval = interval_at(Instant::now() + STATUS_INTERVAL, STATUS_INTERVAL);

    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                let online = rand::thread_rng().gen_bool(0.5);
                let event = ServerEvent::StatusUpdate(StatusUpdate {
                    id: FLIPPING_SERVER_ID.to_string(),
                    status: ServerStatus::from_online(online),
                });
                if send_event(&mut ws_tx, &event).await.is_err() {
                    break;
                }
            }

            Some(event) = event_rx.recv() => {
                if send_event(&mut ws_tx, &event).await.is_err() {
                    break;
                }
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(ClientEvent::JoinConsole(srv_id)) => {
                                tracing::debug!("Dashboard WS client joined console {}", srv_id);
                                consoles.join(srv_id, event_tx.clone());
                            }
                            Ok(ClientEvent::ConsoleCmd(cmd)) => {
                                let event = ServerEvent::ConsoleLog(ConsoleLine {
                                    line: format!("[You]: {}", cmd.command),
                                    srv_id: cmd.srv_id,
                                });
                                if send_event(&mut ws_tx, &event).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!("Dashboard WS received malformed message: {}", e);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("Dashboard WS error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(
        "Dashboard WS client disconnected, stopping {} console ticker(s)",
        consoles.len()
    );
    drop(consoles);
}

/// Send a ServerEvent over WebSocket.
async fn send_event<S>(
    sink: &mut S,
    event: &ServerEvent,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(event)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}

pub fn router() -> Router {
    Router::new().route("/ws", get(socket))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_servers() {
        let servers = demo_servers();
        assert_eq!(servers.len(), 2);
        assert_eq!(servers[0].id, "srv1");
        assert_eq!(servers[0].status, ServerStatus::Online);
        assert_eq!(servers[1].name, "Creative Server");
        assert_eq!(servers[1].status, ServerStatus::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_console_ticker_emits_lines() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut consoles = ConsoleTasks::default();
        consoles.join("srv2".to_string(), tx);

        let event = rx.recv().await.unwrap();
        match event {
            ServerEvent::ConsoleLog(line) => {
                assert_eq!(line.srv_id, "srv2");
                assert!(line.line.starts_with("[Server] Demo log line at "));
            }
            other => panic!("Expected ConsoleLog, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_joining_twice_keeps_one_ticker() {
        let (tx, _rx) = mpsc::channel(8);
        let mut consoles = ConsoleTasks::default();
        consoles.join("srv1".to_string(), tx.clone());
        consoles.join("srv1".to_string(), tx.clone());
        consoles.join("srv2".to_string(), tx);
        assert_eq!(consoles.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_tasks_stops_tickers() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut consoles = ConsoleTasks::default();
        consoles.join("srv1".to_string(), tx);

        assert!(rx.recv().await.is_some());
        drop(consoles);

        // The aborted ticker drops its sender, closing the channel once drained
        while rx.recv().await.is_some() {}
    }
}
