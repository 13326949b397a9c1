//! DAP protocol message types.
//!
//! Implements the subset of the Debug Adapter Protocol this client speaks,
//! with serde Serialize/Deserialize support. Bodies the client never looks
//! into stay as raw [`serde_json::Value`]s.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Base protocol messages
// ---------------------------------------------------------------------------

/// Any DAP message, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// A request (client to adapter in this crate).
    Request(Request),
    /// A response to an earlier request.
    Response(Response),
    /// An asynchronous event.
    Event(Event),
}

impl Message {
    /// Short human-readable label used in logs: the command or event name.
    pub fn label(&self) -> &str {
        match self {
            Message::Request(req) => &req.command,
            Message::Response(resp) => &resp.command,
            Message::Event(evt) => &evt.event,
        }
    }
}

/// A DAP request message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Sequence number.
    #[serde(default)]
    pub seq: i64,
    /// The command to execute.
    pub command: String,
    /// Command arguments; an empty object when the command takes none.
    #[serde(default)]
    pub arguments: serde_json::Value,
}

/// A DAP response message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Sequence number.
    #[serde(default)]
    pub seq: i64,
    /// Sequence number of the corresponding request.
    pub request_seq: i64,
    /// Whether the request was successful.
    pub success: bool,
    /// The command this response is for.
    pub command: String,
    /// Error message if `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response body (command-specific).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// A DAP event message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Sequence number.
    #[serde(default)]
    pub seq: i64,
    /// The event type.
    pub event: String,
    /// Event body (event-specific).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Request arguments
// ---------------------------------------------------------------------------

/// Arguments for the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequestArguments {
    /// ID of the client.
    #[serde(rename = "clientID")]
    pub client_id: String,
    /// Human-readable name of the client.
    pub client_name: String,
    /// ID of the debug adapter.
    #[serde(rename = "adapterID")]
    pub adapter_id: String,
    /// Path format: "path" or "uri".
    pub path_format: String,
    /// Whether lines are 1-based.
    pub lines_start_at1: bool,
    /// Whether columns are 1-based.
    pub columns_start_at1: bool,
    /// Whether the client supports variable type.
    pub supports_variable_type: bool,
    /// Whether the client supports variable paging.
    pub supports_variable_paging: bool,
    /// Whether the client supports the `runInTerminal` request.
    pub supports_run_in_terminal_request: bool,
}

impl InitializeRequestArguments {
    /// The fixed capabilities this client advertises.
    pub fn for_adapter(adapter_id: impl Into<String>) -> Self {
        Self {
            client_id: "dapscope".into(),
            client_name: "dapscope".into(),
            adapter_id: adapter_id.into(),
            path_format: "path".into(),
            lines_start_at1: true,
            columns_start_at1: true,
            supports_variable_type: true,
            supports_variable_paging: true,
            supports_run_in_terminal_request: true,
        }
    }
}

/// Capabilities returned by the debug adapter in the `initialize` response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// The adapter supports the `configurationDone` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_configuration_done_request: Option<bool>,
    /// The adapter supports conditional breakpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_conditional_breakpoints: Option<bool>,
    /// The adapter supports hit conditional breakpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_hit_conditional_breakpoints: Option<bool>,
    /// The adapter supports log points.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_log_points: Option<bool>,
    /// The adapter supports setting variable values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_set_variable: Option<bool>,
    /// The adapter supports the `terminate` request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_terminate_request: Option<bool>,
}

/// Where the adapter should connect to reach the debuggee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectTarget {
    /// Host name.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// A local/remote path mapping for `attach`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathMapping {
    /// Path on the client side.
    pub local_root: String,
    /// Path as seen by the debuggee.
    pub remote_root: String,
}

/// Arguments for the `attach` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequestArguments {
    /// The debuggee endpoint.
    pub connect: ConnectTarget,
    /// Source path mappings.
    pub path_mappings: Vec<PathMapping>,
    /// Restrict stepping and breakpoints to user code.
    pub just_my_code: bool,
}

/// Arguments for the `setBreakpoints` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBreakpointsArguments {
    /// The source to set breakpoints for.
    pub source: Source,
    /// Breakpoints to set (replaces all previous ones for this source).
    pub breakpoints: Vec<SourceBreakpoint>,
}

/// A source breakpoint (client-side).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakpoint {
    /// The source line of the breakpoint.
    pub line: i64,
}

/// Response body for `setBreakpoints`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetBreakpointsResponseBody {
    /// Information about the breakpoints, in request order.
    #[serde(default)]
    pub breakpoints: Vec<BreakpointResponse>,
}

/// A breakpoint as returned by the adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointResponse {
    /// Unique identifier for the breakpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Whether the breakpoint has been verified.
    pub verified: bool,
    /// Optional message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Actual line of the breakpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
}

/// Arguments for the `stackTrace` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceArguments {
    /// Thread to retrieve the stack for.
    pub thread_id: i64,
}

/// Response body for `stackTrace`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTraceResponseBody {
    /// Frames, innermost first.
    #[serde(default)]
    pub stack_frames: Vec<StackFrame>,
    /// Total number of frames available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_frames: Option<i64>,
}

/// Arguments for the `scopes` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopesArguments {
    /// Frame to list scopes for.
    pub frame_id: i64,
}

/// Response body for `scopes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopesResponseBody {
    /// Scopes visible in the frame.
    #[serde(default)]
    pub scopes: Vec<Scope>,
}

/// Arguments for the `variables` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariablesArguments {
    /// Container to list.
    pub variables_reference: i64,
}

/// Response body for `variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariablesResponseBody {
    /// Children of the container.
    #[serde(default)]
    pub variables: Vec<Variable>,
}

// ---------------------------------------------------------------------------
// Runtime types
// ---------------------------------------------------------------------------

/// A stack frame in the call stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    /// Unique identifier for the stack frame.
    pub id: i64,
    /// Name of the frame (function name).
    #[serde(default)]
    pub name: String,
    /// Source location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Line within the source.
    #[serde(default)]
    pub line: i64,
    /// Column within the source.
    #[serde(default)]
    pub column: i64,
}

/// A source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Short name of the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// File system path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// A scope (container for variables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    /// Name of the scope (e.g. "Locals", "Globals").
    pub name: String,
    /// Variables reference for this scope.
    pub variables_reference: i64,
    /// Whether the scope is expensive to resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expensive: Option<bool>,
}

/// A variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Name of the variable.
    pub name: String,
    /// Value of the variable as a string.
    pub value: String,
    /// Type of the variable.
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    /// If non-zero, the variable has children accessed via this reference.
    #[serde(default)]
    pub variables_reference: i64,
}

impl Variable {
    /// Whether the adapter offers children for this variable.
    pub fn is_expandable(&self) -> bool {
        self.variables_reference != 0
    }
}

// ---------------------------------------------------------------------------
// Event bodies
// ---------------------------------------------------------------------------

/// Reason why the debuggee stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// A step request completed.
    Step,
    /// A breakpoint was hit.
    Breakpoint,
    /// An exception occurred.
    Exception,
    /// A pause request was fulfilled.
    Pause,
    /// An entry point was reached.
    Entry,
    /// A function breakpoint was hit.
    #[serde(rename = "function breakpoint")]
    FunctionBreakpoint,
    /// Any reason this client does not distinguish.
    #[serde(other)]
    Other,
}

/// Body of the `stopped` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedEventBody {
    /// The reason for the stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<StopReason>,
    /// Description of the stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Thread that stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<i64>,
    /// Whether all threads are stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_threads_stopped: Option<bool>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
