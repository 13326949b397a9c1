//! Debuggee process supervision.
//!
//! The session only needs to start the debuggee and, at the end, make sure
//! it is gone. [`Supervisor`] and [`DebuggeeHandle`] are that seam;
//! [`CommandSupervisor`] is the real implementation.
use std::future::Future;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::error::DapError;

/// A running debuggee.
pub trait DebuggeeHandle: Send {
    /// OS process id, when there is a process.
    fn id(&self) -> Option<u32>;

    /// Stop the debuggee and wait for it to exit.
    fn terminate(&mut self) -> impl Future<Output = Result<(), DapError>> + Send;
}

/// Starts debuggees.
pub trait Supervisor: Sync {
    type Handle: DebuggeeHandle;

    fn spawn(&self) -> impl Future<Output = Result<Self::Handle, DapError>> + Send;
}

/// Launches the debuggee as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSupervisor {
    program: String,
    args: Vec<String>,
}

impl CommandSupervisor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `python -m debugpy --listen host:port --wait-for-client script args...`
    pub fn debugpy(
        python: impl Into<String>,
        host: &str,
        port: u16,
        script: impl Into<String>,
        script_args: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::new(python)
            .args([
                "-m".to_string(),
                "debugpy".to_string(),
                "--listen".to_string(),
                format!("{host}:{port}"),
                "--wait-for-client".to_string(),
            ])
            .arg(script)
            .args(script_args)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// The command line, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Supervisor for CommandSupervisor {
    type Handle = ChildHandle;

    async fn spawn(&self) -> Result<ChildHandle, DapError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| DapError::ProcessSpawn {
            program: self.program.clone(),
            source,
        })?;
        tracing::info!(pid = ?child.id(), command = %self.command_line(), "debuggee launched");
        Ok(ChildHandle {
            child,
            program: self.program.clone(),
        })
    }
}

/// A debuggee child process.
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    program: String,
}

impl DebuggeeHandle for ChildHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn terminate(&mut self) -> Result<(), DapError> {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(program = %self.program, %status, "debuggee already exited");
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(program = %self.program, error = %err, "cannot poll debuggee status");
            }
        }
        self.kill_and_reap().await
    }
}

impl ChildHandle {
    /// Send SIGKILL (the only signal tokio offers) and wait for the exit.
    /// A failed kill is logged; the wait still runs so the child is reaped.
    async fn kill_and_reap(&mut self) -> Result<(), DapError> {
        if let Err(err) = self.child.start_kill() {
            tracing::warn!(program = %self.program, error = %err, "cannot signal debuggee");
        }
        let status = self.child.wait().await?;
        tracing::info!(program = %self.program, %status, "debuggee terminated");
        Ok(())
    }
}

/// Attaches to an adapter someone else started; nothing to launch or stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalDebuggee;

/// Handle returned by [`ExternalDebuggee`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Supervisor for ExternalDebuggee {
    type Handle = Detached;

    async fn spawn(&self) -> Result<Detached, DapError> {
        tracing::info!("attaching to an externally started debuggee");
        Ok(Detached)
    }
}

impl DebuggeeHandle for Detached {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn terminate(&mut self) -> Result<(), DapError> {
        Ok(())
    }
}
