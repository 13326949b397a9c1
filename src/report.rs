//! Plain-text report of the first breakpoint stop, written to stdout.

use std::io::{self, Write};

use dapscope_dap::{SessionReport, StopSnapshot};

/// Write the stop report. Variables named in `watch` are flagged after
/// their line, wherever they appear in the tree.
pub fn write_report<W: Write>(out: &mut W, report: &SessionReport, watch: &[String]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== BREAKPOINT HIT ===")?;
    writeln!(out, "{}", stop_line(&report.snapshot))?;

    for scope in &report.snapshot.scopes {
        writeln!(out)?;
        writeln!(out, "{} variables:", scope.scope.name)?;
        for root in &scope.variables {
            for (level, node) in root.walk() {
                let var = &node.variable;
                writeln!(out, "{:indent$}{}: {}", "", var.name, var.value, indent = 2 + level * 2)?;
                if watch.iter().any(|w| w == &var.name) {
                    writeln!(out, "watched variable: {} = {}", var.name, var.value)?;
                }
            }
        }
    }
    Ok(())
}

fn stop_line(snapshot: &StopSnapshot) -> String {
    let frame = &snapshot.frame;
    let location = frame
        .source
        .as_ref()
        .and_then(|s| s.path.as_deref().or(s.name.as_deref()))
        .map(|path| format!("{path}:{}", frame.line))
        .unwrap_or_else(|| format!("line {}", frame.line));
    let name = if frame.name.is_empty() { "<unknown>" } else { frame.name.as_str() };
    match &snapshot.reason {
        Some(reason) => format!(
            "thread {} stopped ({reason:?}) in {name} at {location}",
            snapshot.thread_id
        ),
        None => format!("thread {} stopped in {name} at {location}", snapshot.thread_id),
    }
}
