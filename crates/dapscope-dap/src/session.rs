//! DAP session state machine.

use crate::capabilities::DapCapabilities;
use crate::error::DapError;

/// Where a session is in the attach handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket yet.
    Disconnected,
    /// TCP stream open.
    Connected,
    /// `initialize` sent and answered.
    Initializing,
    /// `attach` sent; waiting for the `initialized` event.
    AwaitingInitialized,
    /// Sending `setBreakpoints`.
    ConfiguringBreakpoints,
    /// `configurationDone` acknowledged; the debuggee runs.
    Running,
    /// Waiting for the `stopped` event.
    AwaitingStopped,
    /// The debuggee is suspended.
    Stopped,
    /// Walking frames, scopes and variables.
    Inspecting,
    /// The session is over.
    Terminated,
}

impl SessionState {
    /// The state that normally follows this one.
    pub fn successor(self) -> Option<SessionState> {
        use SessionState::*;
        match self {
            Disconnected => Some(Connected),
            Connected => Some(Initializing),
            Initializing => Some(AwaitingInitialized),
            AwaitingInitialized => Some(ConfiguringBreakpoints),
            ConfiguringBreakpoints => Some(Running),
            Running => Some(AwaitingStopped),
            AwaitingStopped => Some(Stopped),
            Stopped => Some(Inspecting),
            Inspecting => Some(Terminated),
            Terminated => None,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::Initializing => "initializing",
            Self::AwaitingInitialized => "awaiting initialized",
            Self::ConfiguringBreakpoints => "configuring breakpoints",
            Self::Running => "running",
            Self::AwaitingStopped => "awaiting stopped",
            Self::Stopped => "stopped",
            Self::Inspecting => "inspecting",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Tracks the lifecycle state and negotiated capabilities of one session.
#[derive(Debug)]
pub struct DapSession {
    state: SessionState,
    capabilities: DapCapabilities,
}

impl DapSession {
    /// Create a new session in the [`Disconnected`](SessionState::Disconnected) state.
    pub fn new() -> Self {
        Self {
            state: SessionState::Disconnected,
            capabilities: DapCapabilities::default(),
        }
    }

    /// Return the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Return the resolved adapter capabilities.
    pub fn capabilities(&self) -> &DapCapabilities {
        &self.capabilities
    }

    /// Record the adapter capabilities from the `initialize` response.
    pub fn set_capabilities(&mut self, capabilities: DapCapabilities) {
        self.capabilities = capabilities;
    }

    /// Move to `next`, which must be the current state's successor.
    ///
    /// [`SessionState::Terminated`] is reachable from anywhere except itself.
    pub fn advance(&mut self, next: SessionState) -> Result<(), DapError> {
        let allowed = self.state.successor() == Some(next)
            || (next == SessionState::Terminated && self.state != SessionState::Terminated);
        if !allowed {
            return Err(DapError::InvalidState {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(from = %self.state, to = %next, "session transition");
        self.state = next;
        Ok(())
    }

    /// Move to [`SessionState::Terminated`]. Idempotent.
    pub fn terminate(&mut self) {
        if self.state != SessionState::Terminated {
            tracing::debug!(from = %self.state, "session terminated");
            self.state = SessionState::Terminated;
        }
    }
}

impl Default for DapSession {
    fn default() -> Self {
        Self::new()
    }
}
