//! DAP client connected to a single debug adapter.
//!
//! Owns the socket, hands out sequence numbers, correlates responses to
//! requests and exposes the adapter's events. A background task reads the
//! socket; writes go straight to the write half.
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::capabilities::DapCapabilities;
use crate::dispatcher::{Disconnect, Dispatcher};
use crate::error::DapError;
use crate::protocol::{
    AttachRequestArguments, ConnectTarget, Event, InitializeRequestArguments, Message, Request,
    Response, Scope, ScopesArguments, ScopesResponseBody, SetBreakpointsArguments,
    SetBreakpointsResponseBody, StackFrame, StackTraceArguments, StackTraceResponseBody, Variable,
    VariablesArguments, VariablesResponseBody,
};
use crate::sequencer::Sequencer;
use crate::transport::{MessageReader, MessageWriter};

/// Default timeout for awaited requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default timeout for event waits (seconds).
pub const EVENT_TIMEOUT_SECS: u64 = 30;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Deadlines applied by a [`DapClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// How long an awaited request may wait for its response.
    pub request_timeout: Duration,
    /// How long [`DapClient::wait_for_event`] may wait.
    pub event_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            event_timeout: Duration::from_secs(EVENT_TIMEOUT_SECS),
        }
    }
}

/// A DAP client session over one byte stream.
///
/// At most one awaited request may be outstanding at a time; a second
/// concurrent [`send_request`](DapClient::send_request) fails with
/// [`DapError::RequestInFlight`].
pub struct DapClient {
    writer: Mutex<MessageWriter<BoxedWriter>>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    events: Mutex<mpsc::Receiver<Event>>,
    sequencer: Sequencer,
    in_flight: Mutex<()>,
    reader_task: JoinHandle<()>,
    options: ClientOptions,
}

impl DapClient {
    /// Open a TCP connection to the adapter at `host:port`.
    pub async fn connect(host: &str, port: u16, options: ClientOptions) -> Result<Self, DapError> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| DapError::Connect {
                addr: addr.clone(),
                source,
            })?;
        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!(error = %err, "could not disable Nagle");
        }
        tracing::info!(%addr, "connected to debug adapter");

        let (read_half, write_half) = stream.into_split();
        Ok(Self::from_transport(read_half, write_half, options))
    }

    /// Run a session over an arbitrary reader/writer pair.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_transport<R, W>(reader: R, writer: W, options: ClientOptions) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (dispatcher, events_rx) = Dispatcher::new();
        let dispatcher = Arc::new(Mutex::new(dispatcher));
        let reader_task = tokio::spawn(read_loop(MessageReader::new(reader), dispatcher.clone()));
        let writer: BoxedWriter = Box::new(writer);

        Self {
            writer: Mutex::new(MessageWriter::new(writer)),
            dispatcher,
            events: Mutex::new(events_rx),
            sequencer: Sequencer::new(),
            in_flight: Mutex::new(()),
            reader_task,
            options,
        }
    }

    /// The deadlines this client applies.
    pub fn options(&self) -> ClientOptions {
        self.options
    }

    /// Send a request and wait for its response.
    ///
    /// Events that arrive meanwhile are queued for
    /// [`wait_for_event`](DapClient::wait_for_event). The response is
    /// returned as sent, including `success: false` answers.
    pub async fn send_request(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<Response, DapError> {
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| DapError::RequestInFlight {
                command: command.to_string(),
            })?;

        let request = self.build_request(command, arguments);
        let seq = request.seq;
        let slot = self.dispatcher.lock().await.register_request(seq, command)?;

        if let Err(err) = self.write(request).await {
            self.dispatcher.lock().await.cancel(seq);
            return Err(err);
        }

        match timeout(self.options.request_timeout, slot).await {
            Ok(Ok(result)) => {
                if let Ok(response) = &result {
                    tracing::debug!(
                        command,
                        seq,
                        success = response.success,
                        "received response"
                    );
                }
                result
            }
            Ok(Err(_)) => Err(self.disconnect_error().await),
            Err(_) => {
                self.dispatcher.lock().await.cancel(seq);
                Err(DapError::Timeout {
                    what: format!("response to '{command}'"),
                    after: self.options.request_timeout,
                })
            }
        }
    }

    /// Send a request without waiting for any response.
    ///
    /// Returns the request's sequence number. A response that arrives later
    /// is logged and dropped.
    pub async fn send_request_no_wait(
        &self,
        command: &str,
        arguments: Option<serde_json::Value>,
    ) -> Result<i64, DapError> {
        let request = self.build_request(command, arguments);
        let seq = request.seq;
        self.write(request).await?;
        Ok(seq)
    }

    /// Wait for the event `name` and return its body (`null` when absent).
    ///
    /// Other events received meanwhile are discarded. Bounded by the
    /// client's event timeout.
    pub async fn wait_for_event(&self, name: &str) -> Result<serde_json::Value, DapError> {
        self.wait_for_event_timeout(name, self.options.event_timeout)
            .await
    }

    /// [`wait_for_event`](DapClient::wait_for_event) with an explicit bound.
    pub async fn wait_for_event_timeout(
        &self,
        name: &str,
        limit: Duration,
    ) -> Result<serde_json::Value, DapError> {
        let mut events = self.events.lock().await;
        let wait = async {
            while let Some(event) = events.recv().await {
                if event.event == name {
                    return Ok(event.body.unwrap_or(serde_json::Value::Null));
                }
                tracing::debug!(event = %event.event, waiting_for = name, "skipping event");
            }
            Err(self.disconnect_error().await)
        };

        timeout(limit, wait).await.map_err(|_| DapError::Timeout {
            what: format!("event '{name}'"),
            after: limit,
        })?
    }

    /// Send `initialize` and return the adapter's capabilities.
    pub async fn initialize(&self, adapter_id: &str) -> Result<DapCapabilities, DapError> {
        let args = to_arguments(&InitializeRequestArguments::for_adapter(adapter_id))?;
        let response = ensure_success(self.send_request("initialize", Some(args)).await?)?;
        Ok(DapCapabilities::from_response_body(response.body.as_ref()))
    }

    /// Send `attach` without waiting; the adapter acknowledges with the
    /// `initialized` event.
    pub async fn attach(&self, host: &str, port: u16) -> Result<i64, DapError> {
        let args = to_arguments(&AttachRequestArguments {
            connect: ConnectTarget {
                host: host.to_string(),
                port,
            },
            path_mappings: Vec::new(),
            just_my_code: false,
        })?;
        self.send_request_no_wait("attach", Some(args)).await
    }

    /// Replace the breakpoints of one source file.
    pub async fn set_breakpoints(
        &self,
        args: &SetBreakpointsArguments,
    ) -> Result<SetBreakpointsResponseBody, DapError> {
        let response = self
            .send_request("setBreakpoints", Some(to_arguments(args)?))
            .await?;
        decode_body(ensure_success(response)?)
    }

    /// Tell the adapter configuration is complete.
    pub async fn configuration_done(&self) -> Result<(), DapError> {
        ensure_success(self.send_request("configurationDone", None).await?)?;
        Ok(())
    }

    /// Fetch the call stack of a stopped thread.
    pub async fn stack_trace(&self, thread_id: i64) -> Result<Vec<StackFrame>, DapError> {
        let args = to_arguments(&StackTraceArguments { thread_id })?;
        let response = ensure_success(self.send_request("stackTrace", Some(args)).await?)?;
        let body: StackTraceResponseBody = decode_body(response)?;
        Ok(body.stack_frames)
    }

    /// List the scopes of a frame.
    pub async fn scopes(&self, frame_id: i64) -> Result<Vec<Scope>, DapError> {
        let args = to_arguments(&ScopesArguments { frame_id })?;
        let response = ensure_success(self.send_request("scopes", Some(args)).await?)?;
        let body: ScopesResponseBody = decode_body(response)?;
        Ok(body.scopes)
    }

    /// List the children of a variables container.
    pub async fn variables(&self, variables_reference: i64) -> Result<Vec<Variable>, DapError> {
        let args = to_arguments(&VariablesArguments {
            variables_reference,
        })?;
        let response = ensure_success(self.send_request("variables", Some(args)).await?)?;
        let body: VariablesResponseBody = decode_body(response)?;
        Ok(body.variables)
    }

    /// Close the session: fail anything still waiting, stop the reader and
    /// shut down the write half. The socket is released when `self` drops.
    pub async fn close(self) {
        self.dispatcher.lock().await.close(Disconnect::Closed);
        self.reader_task.abort();
        if let Err(err) = self.writer.lock().await.shutdown().await {
            tracing::debug!(error = %err, "shutdown of write half failed");
        }
        tracing::info!("connection to debug adapter closed");
    }

    fn build_request(&self, command: &str, arguments: Option<serde_json::Value>) -> Request {
        Request {
            seq: self.sequencer.next(),
            command: command.to_string(),
            arguments: arguments.unwrap_or_else(|| serde_json::json!({})),
        }
    }

    async fn write(&self, request: Request) -> Result<(), DapError> {
        tracing::debug!(command = %request.command, seq = request.seq, "sending request");
        self.writer
            .lock()
            .await
            .write_message(&Message::Request(request))
            .await
    }

    async fn disconnect_error(&self) -> DapError {
        self.dispatcher
            .lock()
            .await
            .closed_reason()
            .map(Disconnect::to_error)
            .unwrap_or(DapError::ConnectionClosed)
    }
}

impl Drop for DapClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

impl std::fmt::Debug for DapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DapClient")
            .field("next_seq", &self.sequencer.peek())
            .field("options", &self.options)
            .finish()
    }
}

/// Read frames until the stream ends, routing each one.
async fn read_loop<R>(mut reader: MessageReader<R>, dispatcher: Arc<Mutex<Dispatcher>>)
where
    R: AsyncRead + Unpin,
{
    loop {
        match reader.read_message().await {
            Ok(message) => {
                tracing::trace!(label = message.label(), "frame received");
                dispatcher.lock().await.dispatch(message);
            }
            Err(err) => {
                let reason = Disconnect::from_error(&err);
                if reason == Disconnect::Eof {
                    tracing::debug!("adapter closed the connection");
                } else {
                    tracing::warn!(error = %err, "reader stopped");
                }
                dispatcher.lock().await.close(reason);
                return;
            }
        }
    }
}

fn to_arguments<T: Serialize>(args: &T) -> Result<serde_json::Value, DapError> {
    serde_json::to_value(args)
        .map_err(|e| DapError::Protocol(format!("cannot serialize arguments: {e}")))
}

fn ensure_success(response: Response) -> Result<Response, DapError> {
    if response.success {
        Ok(response)
    } else {
        Err(DapError::Rejected {
            command: response.command,
            message: response
                .message
                .unwrap_or_else(|| "no message given".to_string()),
        })
    }
}

fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, DapError> {
    let body = response.body.unwrap_or(serde_json::Value::Null);
    serde_json::from_value(body)
        .map_err(|e| DapError::InvalidResponse(format!("{} body: {e}", response.command)))
}
