use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log verbosity level.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Debug messages.
    Debug,
    /// Informational messages (default).
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Where the debug adapter listens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5678
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// How the debuggee is launched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebuggeeConfig {
    /// Launch the debuggee under debugpy. When false, attach to an
    /// adapter that is already listening.
    #[serde(default = "default_true")]
    pub spawn: bool,
    /// Python interpreter.
    #[serde(default = "default_python")]
    pub python: String,
    /// Script to debug.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments passed to the script.
    #[serde(default)]
    pub args: Vec<String>,
    /// Milliseconds to wait after launch before connecting.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_program() -> String {
    "demo/main.py".to_string()
}

fn default_startup_delay() -> u64 {
    2000
}

impl Default for DebuggeeConfig {
    fn default() -> Self {
        Self {
            spawn: true,
            python: default_python(),
            program: default_program(),
            args: Vec::new(),
            startup_delay_ms: default_startup_delay(),
        }
    }
}

/// Breakpoint lines in one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointEntry {
    /// Source path; relative paths resolve against the working directory.
    pub file: String,
    pub lines: Vec<i64>,
}

fn default_breakpoints() -> Vec<BreakpointEntry> {
    vec![BreakpointEntry {
        file: default_program(),
        lines: vec![99],
    }]
}

/// Request and event deadlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_request_secs")]
    pub request_secs: u64,
    #[serde(default = "default_event_secs")]
    pub event_secs: u64,
}

fn default_request_secs() -> u64 {
    10
}

fn default_event_secs() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: default_request_secs(),
            event_secs: default_event_secs(),
        }
    }
}

/// What to report once stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectConfig {
    /// Variable levels fetched per scope (1 = scope entries only).
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Variable names to flag in the report.
    #[serde(default)]
    pub watch: Vec<String>,
}

fn default_depth() -> u32 {
    1
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            watch: Vec::new(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log verbosity level.
    #[serde(default)]
    pub level: LogLevel,
    /// Optional path to a log file.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
        }
    }
}

/// Top-level dapscope configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub debuggee: DebuggeeConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub inspect: InspectConfig,
    #[serde(default)]
    pub log: LogConfig,
    /// Breakpoints set before the debuggee runs.
    #[serde(default = "default_breakpoints")]
    pub breakpoints: Vec<BreakpointEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            debuggee: DebuggeeConfig::default(),
            timeouts: TimeoutConfig::default(),
            inspect: InspectConfig::default(),
            log: LogConfig::default(),
            breakpoints: default_breakpoints(),
        }
    }
}

impl Config {
    /// Debug `program` instead of the configured one.
    ///
    /// Breakpoint entries that named the old program follow it.
    pub fn override_program(&mut self, program: &str) {
        let old = std::mem::replace(&mut self.debuggee.program, program.to_string());
        for entry in &mut self.breakpoints {
            if entry.file == old {
                entry.file = program.to_string();
            }
        }
    }
}
