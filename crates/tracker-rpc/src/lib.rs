//! Bidirectional request channel to the tracker language server.
//!
//! [`RequestChannel`] is the seam the RPC-backed controller talks through.
//! [`IpcClient`] speaks NDJSON over a Unix socket; [`ScriptedChannel`]
//! replays canned results in tests.

mod channel;
mod client;
mod error;
mod scripted;

pub use channel::RequestChannel;
pub use client::IpcClient;
pub use error::{RpcError, RpcResult};
pub use scripted::ScriptedChannel;
