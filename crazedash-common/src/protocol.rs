//! WebSocket protocol types for the dashboard real-time channel.
//!
//! Every frame is a JSON text message with an `event` field naming the event
//! and a `data` field carrying its payload, mirroring the event names the
//! dashboard page listens for.
//!
//! ## Server events
//!
//! - `servers`: initial list of demo servers, sent once on connect
//! - `statusUpdate`: a server flipped between online and offline
//! - `consoleLog`: a single console line for a server
//!
//! ## Client events
//!
//! - `joinConsole`: start streaming console lines for a server id
//! - `consoleCmd`: submit a console command, echoed back as a `consoleLog`

use serde::{Deserialize, Serialize};

/// Events sent from the dashboard server to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full server list.
    Servers(Vec<ServerSummary>),
    /// Status change for one server.
    StatusUpdate(StatusUpdate),
    /// One console line.
    ConsoleLog(ConsoleLine),
}

/// Events sent from the browser to the dashboard server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Start streaming console output for the given server id.
    JoinConsole(String),
    /// Command typed into a server console.
    ConsoleCmd(ConsoleCommand),
}

/// Online state of a game server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Offline,
}

impl ServerStatus {
    pub fn from_online(online: bool) -> Self {
        if online {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        }
    }
}

/// A game server as shown in the dashboard list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id: String,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleLine {
    pub srv_id: String,
    pub line: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleCommand {
    pub srv_id: String,
    pub command: String,
}
