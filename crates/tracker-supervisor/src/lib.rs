//! Supervision of the CodeCarbon emissions tracker.
//!
//! Two integrations share the [`TrackerController`] contract:
//!
//! - [`ProcessTrackerController`] spawns the tracker and reads sentinel lines
//!   from its stdout.
//! - [`RpcTrackerController`] asks the tracker language server over a
//!   [`tracker_rpc::RequestChannel`] and gets a structured stop result.
//!
//! [`Supervisor`] picks one at composition time, registers the start/stop
//! commands and keeps the [`StatusIndicator`] in sync. User-facing output
//! goes through [`EditorHost`].

mod controller;
mod error;
mod format;
mod host;
mod process;
mod process_controller;
mod report;
mod rpc_controller;
mod sentinel;
mod session;
mod status;
mod supervisor;

pub use controller::{ControllerKind, TrackerController};
pub use error::{SupervisorError, SupervisorResult};
pub use format::{format_emissions, DEFAULT_DECIMALS, EMISSIONS_UNIT};
pub use host::{EditorHost, HostEvent, RecordingHost};
pub use process::{spawn_tracker, StopSignal, TrackerCommand, TrackerHandle, TrackerOutput};
pub use process_controller::ProcessTrackerController;
pub use report::{
    emissions_file_message, emissions_message, offer_emissions_file, report_emissions,
    ALREADY_RUNNING, CANCEL_CHOICE, NO_EMISSIONS, OPEN_CHOICE,
};
pub use rpc_controller::RpcTrackerController;
pub use sentinel::{
    parse_leading_float, strip_ansi, LineBuffer, SentinelEvent, SentinelTable,
    EMISSIONS_FILE_MARKER, EMISSIONS_MARKER,
};
pub use session::TrackerSession;
pub use status::{RecordingStatusBar, StatusBarItem, StatusIndicator, StatusState, STATUS_LABEL};
pub use supervisor::Supervisor;
