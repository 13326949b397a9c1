use crate::config::Config;
use crate::error::ConfigError;

/// Deepest variable expansion allowed.
pub const MAX_DEPTH: u32 = 8;

/// Validate a [`Config`], returning all detected violations.
///
/// Returns `Ok(())` when the config is valid, or `Err` with a
/// vector of every validation error found.
pub fn validate(config: &Config) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut reject = |field: String, message: String| {
        errors.push(ConfigError::Validation { field, message });
    };

    if config.target.host.trim().is_empty() {
        reject("target.host".into(), "must not be empty".into());
    }
    if config.target.port == 0 {
        reject("target.port".into(), "must be 1-65535, got 0".into());
    }

    // Only needed when we launch it ourselves.
    if config.debuggee.spawn {
        if config.debuggee.program.trim().is_empty() {
            reject("debuggee.program".into(), "must not be empty".into());
        }
        if config.debuggee.python.trim().is_empty() {
            reject("debuggee.python".into(), "must not be empty".into());
        }
    }

    for (i, entry) in config.breakpoints.iter().enumerate() {
        let field = format!("breakpoints[{i}]");
        if entry.file.trim().is_empty() {
            reject(format!("{field}.file"), "must not be empty".into());
        }
        if entry.lines.is_empty() {
            reject(format!("{field}.lines"), "must list at least one line".into());
        }
        if let Some(bad) = entry.lines.iter().find(|&&line| line < 1) {
            reject(
                format!("{field}.lines"),
                format!("lines start at 1, got {bad}"),
            );
        }
    }

    if config.timeouts.request_secs == 0 {
        reject("timeouts.request_secs".into(), "must be at least 1".into());
    }
    if config.timeouts.event_secs == 0 {
        reject("timeouts.event_secs".into(), "must be at least 1".into());
    }

    if config.inspect.depth > MAX_DEPTH {
        reject(
            "inspect.depth".into(),
            format!("must be at most {MAX_DEPTH}, got {}", config.inspect.depth),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreakpointEntry;

    fn single_error(cfg: &Config) -> String {
        let errs = validate(cfg).unwrap_err();
        assert_eq!(errs.len(), 1, "{errs:?}");
        format!("{}", errs[0])
    }

    #[test]
    fn valid_default_config_passes() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn empty_host_rejected() {
        let mut cfg = Config::default();
        cfg.target.host = "  ".into();
        assert!(single_error(&cfg).contains("target.host"));
    }

    #[test]
    fn port_zero_rejected() {
        let mut cfg = Config::default();
        cfg.target.port = 0;
        assert!(single_error(&cfg).contains("target.port"));
    }

    #[test]
    fn empty_program_only_matters_when_spawning() {
        let mut cfg = Config::default();
        cfg.debuggee.program = String::new();
        assert!(single_error(&cfg).contains("debuggee.program"));

        cfg.debuggee.spawn = false;
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn breakpoint_without_lines_rejected() {
        let mut cfg = Config::default();
        cfg.breakpoints.push(BreakpointEntry {
            file: "demo/util.py".into(),
            lines: Vec::new(),
        });
        assert!(single_error(&cfg).contains("breakpoints[1].lines"));
    }

    #[test]
    fn breakpoint_line_zero_rejected() {
        let mut cfg = Config::default();
        cfg.breakpoints[0].lines = vec![10, 0];
        let msg = single_error(&cfg);
        assert!(msg.contains("breakpoints[0].lines"));
        assert!(msg.contains("got 0"));
    }

    #[test]
    fn breakpoint_empty_file_rejected() {
        let mut cfg = Config::default();
        cfg.breakpoints[0].file = String::new();
        assert!(single_error(&cfg).contains("breakpoints[0].file"));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let mut cfg = Config::default();
        cfg.timeouts.request_secs = 0;
        cfg.timeouts.event_secs = 0;
        assert_eq!(validate(&cfg).unwrap_err().len(), 2);
    }

    #[test]
    fn depth_limit() {
        let mut cfg = Config::default();
        cfg.inspect.depth = MAX_DEPTH;
        assert!(validate(&cfg).is_ok());
        cfg.inspect.depth = MAX_DEPTH + 1;
        assert!(single_error(&cfg).contains("inspect.depth"));
    }

    #[test]
    fn multiple_errors_returned() {
        let mut cfg = Config::default();
        cfg.target.host = String::new();
        cfg.target.port = 0;
        cfg.inspect.depth = 20;
        let errs = validate(&cfg).unwrap_err();
        assert_eq!(errs.len(), 3);
    }
}
