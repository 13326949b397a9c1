//! Attach handshake: from a fresh connection to a stopped, inspected frame.

use std::path::{Path, PathBuf};

use crate::breakpoint::BreakpointManager;
use crate::client::DapClient;
use crate::error::DapError;
use crate::inspect::{collect_scopes, ScopeSnapshot};
use crate::protocol::{StackFrame, StopReason, StoppedEventBody};
use crate::session::{DapSession, SessionState};

/// What the handshake attaches to and where it stops.
#[derive(Debug, Clone)]
pub struct HandshakePlan {
    /// Host the adapter's `attach` should connect to.
    pub host: String,
    /// Port the adapter's `attach` should connect to.
    pub port: u16,
    /// `adapterID` sent with `initialize`.
    pub adapter_id: String,
    pub breakpoints: BreakpointManager,
    /// Variable levels fetched per scope.
    pub depth: u32,
}

impl HandshakePlan {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            adapter_id: "python".to_string(),
            breakpoints: BreakpointManager::new(),
            depth: 1,
        }
    }
}

/// State of the debuggee at the first stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopSnapshot {
    pub thread_id: i64,
    pub reason: Option<StopReason>,
    /// Innermost frame of the stopped thread.
    pub frame: StackFrame,
    pub scopes: Vec<ScopeSnapshot>,
}

/// Drives one session through the attach handshake.
#[derive(Debug)]
pub struct Handshake {
    session: DapSession,
    plan: HandshakePlan,
}

impl Handshake {
    pub fn new(plan: HandshakePlan) -> Self {
        Self {
            session: DapSession::new(),
            plan,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &DapSession {
        &self.session
    }

    /// Breakpoints, with the adapter's verification once configured.
    pub fn breakpoints(&self) -> &BreakpointManager {
        &self.plan.breakpoints
    }

    /// Run the handshake over a freshly connected client.
    ///
    /// The session ends in [`SessionState::Terminated`] whether or not this
    /// succeeds; a handshake runs once.
    pub async fn run(&mut self, client: &DapClient) -> Result<StopSnapshot, DapError> {
        let result = self.drive(client).await;
        match &result {
            Ok(snapshot) => {
                tracing::info!(thread_id = snapshot.thread_id, "inspection complete")
            }
            Err(err) => {
                tracing::warn!(state = %self.session.state(), error = %err, "handshake aborted")
            }
        }
        self.session.terminate();
        result
    }

    async fn drive(&mut self, client: &DapClient) -> Result<StopSnapshot, DapError> {
        self.session.advance(SessionState::Connected)?;

        self.session.advance(SessionState::Initializing)?;
        let capabilities = client.initialize(&self.plan.adapter_id).await?;
        tracing::info!(?capabilities, "adapter initialized");
        self.session.set_capabilities(capabilities);

        client.attach(&self.plan.host, self.plan.port).await?;
        self.session.advance(SessionState::AwaitingInitialized)?;
        client.wait_for_event("initialized").await?;
        tracing::info!("adapter ready for configuration");

        self.session.advance(SessionState::ConfiguringBreakpoints)?;
        self.configure_breakpoints(client).await?;

        if !self.session.capabilities().supports_configuration_done_request {
            tracing::warn!("adapter does not advertise configurationDone; sending it anyway");
        }
        client.configuration_done().await?;
        self.session.advance(SessionState::Running)?;
        tracing::info!("configuration done, debuggee running");

        self.session.advance(SessionState::AwaitingStopped)?;
        let body = client.wait_for_event("stopped").await?;
        let stopped: StoppedEventBody = serde_json::from_value(body)
            .map_err(|e| DapError::InvalidResponse(format!("stopped event: {e}")))?;
        let thread_id = stopped.thread_id.ok_or_else(|| {
            DapError::InvalidResponse("stopped event without threadId".to_string())
        })?;
        self.session.advance(SessionState::Stopped)?;
        tracing::info!(thread_id, reason = ?stopped.reason, "debuggee stopped");

        self.session.advance(SessionState::Inspecting)?;
        let frame = client
            .stack_trace(thread_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                DapError::InvalidResponse(format!("thread {thread_id} has no stack frames"))
            })?;
        tracing::debug!(frame_id = frame.id, name = %frame.name, line = frame.line, "top frame");
        let scopes = collect_scopes(client, frame.id, self.plan.depth).await?;

        Ok(StopSnapshot {
            thread_id,
            reason: stopped.reason,
            frame,
            scopes,
        })
    }

    async fn configure_breakpoints(&mut self, client: &DapClient) -> Result<(), DapError> {
        if self.plan.breakpoints.is_empty() {
            tracing::warn!("no breakpoints configured; the debuggee may never stop");
            return Ok(());
        }
        let files: Vec<PathBuf> = self.plan.breakpoints.files().map(Path::to_path_buf).collect();
        for path in files {
            let args = self.plan.breakpoints.arguments_for(&path);
            let body = client.set_breakpoints(&args).await?;
            self.plan.breakpoints.apply_response(&path, &body);

            for bp in self.plan.breakpoints.get_for_file(&path) {
                if bp.verified {
                    tracing::info!(path = %path.display(), line = bp.line, "breakpoint set");
                } else {
                    tracing::warn!(
                        path = %path.display(),
                        line = bp.line,
                        message = bp.message.as_deref().unwrap_or(""),
                        "breakpoint not verified"
                    );
                }
            }
        }
        let verified = self.plan.breakpoints.all().filter(|(_, bp)| bp.verified).count();
        tracing::info!(verified, total = self.plan.breakpoints.len(), "breakpoints configured");
        Ok(())
    }
}
