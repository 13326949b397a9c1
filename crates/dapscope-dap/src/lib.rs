//! dapscope-dap: Debug Adapter Protocol client.
//!
//! Frames and correlates DAP messages over any byte stream, drives the
//! attach handshake up to the first breakpoint stop and collects the
//! stopped frame's variables. The debuggee process sits behind the
//! [`Supervisor`] trait.

pub mod breakpoint;
pub mod capabilities;
pub mod client;
pub mod dispatcher;
pub mod error;
pub mod handshake;
pub mod inspect;
pub mod protocol;
pub mod runner;
pub mod sequencer;
pub mod session;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
mod testing;

pub use breakpoint::{Breakpoint, BreakpointManager};
pub use capabilities::DapCapabilities;
pub use client::{ClientOptions, DapClient};
pub use error::DapError;
pub use handshake::{Handshake, HandshakePlan, StopSnapshot};
pub use inspect::{ScopeSnapshot, VariableNode};
pub use protocol::*;
pub use runner::{run_session, SessionOptions, SessionReport};
pub use session::{DapSession, SessionState};
pub use supervisor::{ChildHandle, CommandSupervisor, DebuggeeHandle, ExternalDebuggee, Supervisor};
