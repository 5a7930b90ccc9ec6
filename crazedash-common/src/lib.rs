//! CrazeDash Common Types
//!
//! Wire types shared by the dashboard backend and its clients.

pub mod panel;
pub mod protocol;

pub use panel::{CreateServerRequest, CreateServerResponse};
pub use protocol::{
    ClientEvent, ConsoleCommand, ConsoleLine, ServerEvent, ServerStatus, ServerSummary,
    StatusUpdate,
};
