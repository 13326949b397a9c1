//! Breakpoint management for DAP sessions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::protocol::{SetBreakpointsArguments, SetBreakpointsResponseBody, Source, SourceBreakpoint};

/// A client-side breakpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    /// Line number (1-based) as requested.
    pub line: i64,
    /// Whether the adapter has verified this breakpoint.
    pub verified: bool,
    /// Adapter-assigned ID (set after adapter response).
    pub adapter_id: Option<i64>,
    /// Line the adapter actually bound the breakpoint to.
    pub actual_line: Option<i64>,
    /// Adapter message, usually explaining why verification failed.
    pub message: Option<String>,
}

impl Breakpoint {
    /// Create a new unverified breakpoint at the given line.
    pub fn new(line: i64) -> Self {
        Self {
            line,
            verified: false,
            adapter_id: None,
            actual_line: None,
            message: None,
        }
    }
}

/// Resolve `path` against the working directory when it is relative.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Breakpoints for a debug session, grouped by source file.
///
/// Lines keep their insertion order; all lines of one file travel in a
/// single `setBreakpoints` request.
#[derive(Debug, Clone, Default)]
pub struct BreakpointManager {
    files: BTreeMap<PathBuf, Vec<Breakpoint>>,
}

impl BreakpointManager {
    /// Create a new empty breakpoint manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint. Returns `false` when the line was already set.
    pub fn add(&mut self, path: impl Into<PathBuf>, line: i64) -> bool {
        let list = self.files.entry(path.into()).or_default();
        if list.iter().any(|bp| bp.line == line) {
            return false;
        }
        list.push(Breakpoint::new(line));
        true
    }

    /// Add several lines for one file.
    pub fn add_lines(&mut self, path: impl Into<PathBuf>, lines: impl IntoIterator<Item = i64>) {
        let path = path.into();
        for line in lines {
            self.add(path.clone(), line);
        }
    }

    /// Get all breakpoints for a file.
    pub fn get_for_file(&self, path: &Path) -> &[Breakpoint] {
        self.files.get(path).map_or(&[], |v| v.as_slice())
    }

    /// Files that have at least one breakpoint.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Total number of breakpoints across all files.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Whether no breakpoints are set.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Build the `setBreakpoints` arguments for one file.
    pub fn arguments_for(&self, path: &Path) -> SetBreakpointsArguments {
        SetBreakpointsArguments {
            source: Source {
                name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
                path: Some(path.to_string_lossy().into_owned()),
            },
            breakpoints: self
                .get_for_file(path)
                .iter()
                .map(|bp| SourceBreakpoint { line: bp.line })
                .collect(),
        }
    }

    /// Record the adapter's verdict for a file.
    ///
    /// The adapter answers in request order, one entry per requested line.
    pub fn apply_response(&mut self, path: &Path, body: &SetBreakpointsResponseBody) {
        let Some(list) = self.files.get_mut(path) else {
            return;
        };
        if list.len() != body.breakpoints.len() {
            tracing::warn!(
                path = %path.display(),
                requested = list.len(),
                returned = body.breakpoints.len(),
                "adapter returned a different number of breakpoints"
            );
        }
        for (bp, verdict) in list.iter_mut().zip(&body.breakpoints) {
            bp.verified = verdict.verified;
            bp.adapter_id = verdict.id;
            bp.actual_line = verdict.line;
            bp.message = verdict.message.clone();
        }
    }

    /// Return an iterator over all breakpoints across all files.
    pub fn all(&self) -> impl Iterator<Item = (&Path, &Breakpoint)> {
        self.files
            .iter()
            .flat_map(|(path, list)| list.iter().map(move |bp| (path.as_path(), bp)))
    }
}
