pub mod client;

pub use client::{PanelClient, PanelError};
