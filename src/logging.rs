//! Tracing subscriber setup.

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use dapscope_config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset: the configured level for our
/// crates, warnings for everything else.
fn default_directives(config: &LogConfig) -> String {
    let level = config.level.as_str();
    format!("warn,dapscope={level},dapscope_dap={level},dapscope_config={level}")
}

fn build_filter(config: &LogConfig, env: Option<&str>) -> Result<EnvFilter> {
    match env.filter(|s| !s.trim().is_empty()) {
        Some(directives) => {
            EnvFilter::try_new(directives).with_context(|| format!("invalid RUST_LOG `{directives}`"))
        }
        None => EnvFilter::try_new(default_directives(config)).context("invalid log level"),
    }
}

/// Install the global subscriber.
///
/// Logs go to `config.file` when set, otherwise to stderr; stdout carries
/// the report only.
pub fn init(config: &LogConfig) -> Result<()> {
    let env = std::env::var("RUST_LOG").ok();
    let filter = build_filter(config, env.as_deref())?;

    match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create log directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
