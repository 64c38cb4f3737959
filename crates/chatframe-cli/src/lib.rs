//! Chatframe terminal client
//!
//! The consuming half of the relay: opens an exchange against the server,
//! re-splits the SSE stream on line boundaries with its own [`LineBuffer`]
//! instance, and assembles token fragments into one growing assistant turn.

pub mod client;
pub mod consumer;
pub mod session;

pub use client::RelayClient;
pub use consumer::{Exchange, ExchangeEvent, ExchangePhase};
pub use session::ChatSession;
