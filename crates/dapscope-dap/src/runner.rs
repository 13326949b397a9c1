//! One complete debugging session: launch, attach, inspect, tear down.

use std::future::Future;
use std::time::Duration;

use crate::breakpoint::BreakpointManager;
use crate::client::{ClientOptions, DapClient};
use crate::error::DapError;
use crate::handshake::{Handshake, HandshakePlan, StopSnapshot};
use crate::supervisor::{DebuggeeHandle, Supervisor};

/// Default pause between launching the debuggee and connecting.
pub const STARTUP_DELAY_MS: u64 = 2000;

/// Everything a session needs besides the supervisor.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub plan: HandshakePlan,
    pub client: ClientOptions,
    /// Pause before connecting, giving the debuggee time to listen.
    pub startup_delay: Duration,
}

impl SessionOptions {
    pub fn new(plan: HandshakePlan) -> Self {
        Self {
            plan,
            client: ClientOptions::default(),
            startup_delay: Duration::from_millis(STARTUP_DELAY_MS),
        }
    }
}

/// Outcome of a successful session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub snapshot: StopSnapshot,
    /// Breakpoints with the adapter's verification.
    pub breakpoints: BreakpointManager,
}

/// Launch the debuggee, run the handshake against it and tear everything
/// down.
///
/// The debuggee is terminated on every path, including when `shutdown`
/// resolves first, which yields [`DapError::Interrupted`].
pub async fn run_session<S, F>(
    supervisor: &S,
    options: SessionOptions,
    shutdown: F,
) -> Result<SessionReport, DapError>
where
    S: Supervisor,
    F: Future<Output = ()>,
{
    let mut debuggee = supervisor.spawn().await?;

    let result = tokio::select! {
        result = attach_and_inspect(&options) => result,
        _ = shutdown => {
            tracing::warn!("shutdown requested, abandoning session");
            Err(DapError::Interrupted)
        }
    };

    if let Err(err) = debuggee.terminate().await {
        tracing::warn!(error = %err, "failed to stop debuggee");
    }
    result
}

async fn attach_and_inspect(options: &SessionOptions) -> Result<SessionReport, DapError> {
    if !options.startup_delay.is_zero() {
        tracing::debug!(delay_ms = options.startup_delay.as_millis() as u64, "waiting for debuggee");
        tokio::time::sleep(options.startup_delay).await;
    }

    let plan = &options.plan;
    let client = DapClient::connect(&plan.host, plan.port, options.client).await?;
    let mut handshake = Handshake::new(plan.clone());
    let result = handshake.run(&client).await;
    client.close().await;

    Ok(SessionReport {
        snapshot: result?,
        breakpoints: handshake.breakpoints().clone(),
    })
}
