mod logging;
mod report;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dapscope_config::{load_config, Config};
use dapscope_dap::breakpoint::absolutize;
use dapscope_dap::{
    run_session, ClientOptions, CommandSupervisor, ExternalDebuggee, HandshakePlan,
    SessionOptions, SessionReport,
};
use tracing::info;

const USAGE: &str = "usage: dapscope [PROGRAM]

Launches PROGRAM under debugpy, stops at the configured breakpoints and
prints the variables of the first stopped frame. Settings are read from
dapscope/config.toml in the user config directory (~/.config on Linux) and
the nearest .dapscope/config.toml.";

/// The user config directory joined with `dapscope`.
fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .or_else(|| {
            env::var_os("HOME")
                .filter(|v| !v.is_empty())
                .map(|home| PathBuf::from(home).join(".config"))
        })
        .context("could not determine config directory")?;
    Ok(base.join("dapscope"))
}

fn session_options(config: &Config) -> Result<SessionOptions> {
    let mut plan = HandshakePlan::new(config.target.host.clone(), config.target.port);
    plan.depth = config.inspect.depth;
    for entry in &config.breakpoints {
        let path = absolutize(Path::new(&entry.file))
            .with_context(|| format!("cannot resolve breakpoint file {}", entry.file))?;
        plan.breakpoints.add_lines(path, entry.lines.iter().copied());
    }

    let startup_delay = if config.debuggee.spawn {
        Duration::from_millis(config.debuggee.startup_delay_ms)
    } else {
        Duration::ZERO
    };
    Ok(SessionOptions {
        plan,
        client: ClientOptions {
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            event_timeout: Duration::from_secs(config.timeouts.event_secs),
        },
        startup_delay,
    })
}

/// Resolves on Ctrl-C; never resolves when the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn debug_session(config: &Config, options: SessionOptions) -> Result<SessionReport> {
    let report = if config.debuggee.spawn {
        let debuggee = &config.debuggee;
        let supervisor = CommandSupervisor::debugpy(
            debuggee.python.clone(),
            &config.target.host,
            config.target.port,
            debuggee.program.clone(),
            debuggee.args.iter().cloned(),
        );
        run_session(&supervisor, options, shutdown_signal()).await
    } else {
        run_session(&ExternalDebuggee, options, shutdown_signal()).await
    };
    report.with_context(|| {
        format!(
            "debug session with {}:{} failed",
            config.target.host, config.target.port
        )
    })
}

fn run(program: Option<String>) -> Result<()> {
    let config_dir = config_dir()?;
    let project_dir = env::current_dir().ok();
    let mut config = load_config(&config_dir, project_dir.as_deref())
        .with_context(|| format!("failed to load config from {}", config_dir.display()))?;
    if let Some(program) = program {
        config.override_program(&program);
    }

    logging::init(&config.log)?;
    info!(
        host = %config.target.host,
        port = config.target.port,
        program = %config.debuggee.program,
        "starting debug session"
    );

    let options = session_options(&config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let report = runtime.block_on(debug_session(&config, options))?;

    let stdout = std::io::stdout();
    report::write_report(&mut stdout.lock(), &report, &config.inspect.watch)
        .context("failed to write report")?;
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Option<Option<String>>> {
    match args {
        [] => Ok(Some(None)),
        [flag] if flag == "-h" || flag == "--help" => Ok(None),
        [flag] if flag.starts_with('-') => bail!("unknown option {flag}\n\n{USAGE}"),
        [program] => Ok(Some(Some(program.clone()))),
        _ => bail!("too many arguments\n\n{USAGE}"),
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let result = parse_args(&args).and_then(|parsed| match parsed {
        Some(program) => run(program),
        None => {
            println!("{USAGE}");
            Ok(())
        }
    });
    if let Err(e) = result {
        eprintln!("dapscope: {:#}", e);
        std::process::exit(1);
    }
}
