//! Wire types for requests to the tracker language server.
//!
//! One JSON object per line in each direction, JSON-RPC style ids and error
//! codes.

mod protocol;

pub use protocol::{error_codes, ErrorInfo, Method, Request, Response, StopTrackerResult};
