use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::ConfigError;
use crate::merge::merge_configs;
use crate::validate::validate;

/// Content written into a newly-created default config file.
const DEFAULT_CONFIG_CONTENT: &str = r#"# dapscope configuration
# Uncomment and edit settings below to override defaults.

# [target]
# host = "localhost"
# port = 5678

# [debuggee]
# spawn = true
# python = "python3"
# program = "demo/main.py"
# args = []
# startup_delay_ms = 2000

# [timeouts]
# request_secs = 10
# event_secs = 30

# [inspect]
# depth = 1
# watch = ["password", "api_key"]

# [log]
# level = "info"
# file = "/tmp/dapscope.log"

# [[breakpoints]]
# file = "demo/main.py"
# lines = [99]
"#;

/// Project-local config, relative to a project directory.
const PROJECT_CONFIG: &str = ".dapscope/config.toml";

/// Load and merge configuration.
///
/// 1. Reads the global config from `config_dir/config.toml`.
///    If the file does not exist it is created with commented-out
///    defaults.
/// 2. Optionally reads a project config from
///    `project_dir/.dapscope/config.toml` (walks upward).
/// 3. Merges: `Config::default() <- global <- project`.
/// 4. Validates the merged result.
///
/// # Errors
///
/// Returns [`ConfigError`] on I/O failure, parse failure, or
/// validation failure.
pub fn load_config(config_dir: &Path, project_dir: Option<&Path>) -> Result<Config, ConfigError> {
    let global_path = config_dir.join("config.toml");

    if !global_path.exists() {
        write_default(config_dir, &global_path)?;
    }

    let mut config = Config::default();

    let global_content = std::fs::read_to_string(&global_path)?;
    if has_non_comment_content(&global_content) {
        config = merge_configs(&config, &global_content, &global_path.display().to_string())?;
        tracing::debug!(path = %global_path.display(), "global config merged");
    }

    if let Some(proj) = project_dir {
        if let Some(project_path) = find_project_config(proj) {
            let project_content = std::fs::read_to_string(&project_path)?;
            config = merge_configs(
                &config,
                &project_content,
                &project_path.display().to_string(),
            )?;
            tracing::debug!(path = %project_path.display(), "project config merged");
        }
    }

    validate(&config).map_err(ConfigError::from_violations)?;

    Ok(config)
}

fn write_default(config_dir: &Path, path: &Path) -> Result<(), ConfigError> {
    let create = |e: std::io::Error| ConfigError::CreateDefault {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    std::fs::create_dir_all(config_dir).map_err(create)?;
    std::fs::write(path, DEFAULT_CONFIG_CONTENT).map_err(create)?;
    tracing::info!("Created default config at {}", path.display());
    Ok(())
}

/// Walk from `start` upward looking for `.dapscope/config.toml`.
fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(PROJECT_CONFIG);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Returns `true` when the content has at least one
/// non-empty, non-comment line.
fn has_non_comment_content(content: &str) -> bool {
    content.lines().any(|l| {
        let trimmed = l.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}

/// Parse a TOML string directly into a validated [`Config`].
///
/// Useful for tests or one-off parsing without file I/O.
///
/// # Errors
///
/// Returns [`ConfigError`] on parse or validation failure.
pub fn load_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::parse("<string>", e))?;

    validate(&config).map_err(ConfigError::from_violations)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_config_creates_default_when_missing() {
        let tmp = TempDir::new().unwrap();
        let cfg_dir = tmp.path().join("config");

        let config = load_config(&cfg_dir, None).unwrap();
        assert_eq!(config, Config::default());

        let created = cfg_dir.join("config.toml");
        assert!(created.exists());
    }

    #[test]
    fn load_config_reads_existing_global() {
        let tmp = TempDir::new().unwrap();
        let cfg_dir = tmp.path().join("config");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[target]\nport = 6001\n").unwrap();

        let config = load_config(&cfg_dir, None).unwrap();
        assert_eq!(config.target.port, 6001);
        // Unmodified fields keep defaults
        assert_eq!(config.target.host, "localhost");
    }

    #[test]
    fn load_config_merges_project_over_global() {
        let tmp = TempDir::new().unwrap();
        let cfg_dir = tmp.path().join("config");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[target]\nport = 6001\n\n[inspect]\nwatch = [\"token\"]\n",
        )
        .unwrap();

        let proj_dir = tmp.path().join("project");
        let local = proj_dir.join(".dapscope");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("config.toml"), "[target]\nport = 6002\n").unwrap();

        let config = load_config(&cfg_dir, Some(&proj_dir)).unwrap();
        assert_eq!(config.target.port, 6002);
        assert_eq!(config.inspect.watch, vec!["token".to_string()]);
    }

    #[test]
    fn load_config_rejects_invalid_merged_values() {
        let tmp = TempDir::new().unwrap();
        let cfg_dir = tmp.path().join("config");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(
            cfg_dir.join("config.toml"),
            "[timeouts]\nrequest_secs = 0\nevent_secs = 0\n",
        )
        .unwrap();

        let err = load_config(&cfg_dir, None).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref errs) if errs.len() == 2));
    }

    #[test]
    fn load_from_str_parses_valid_toml() {
        let config = load_from_str("[inspect]\ndepth = 3\n").unwrap();
        assert_eq!(config.inspect.depth, 3);
    }

    #[test]
    fn load_from_str_rejects_invalid_toml() {
        let result = load_from_str("{{bad}}");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn load_from_str_rejects_invalid_values() {
        let result = load_from_str("[target]\nport = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn find_project_config_walks_up() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("repo");
        let local = root.join(".dapscope");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("config.toml"), "[target]\nport = 6002\n").unwrap();

        let deep = root.join("src").join("module");
        std::fs::create_dir_all(&deep).unwrap();

        let found = find_project_config(&deep).unwrap();
        assert!(found.ends_with(".dapscope/config.toml"));
        assert!(found.starts_with(&root));
    }

    #[test]
    fn default_config_content_is_all_comments() {
        assert!(!has_non_comment_content(DEFAULT_CONFIG_CONTENT));
    }

    #[test]
    fn default_config_content_uncommented_is_valid() {
        let uncommented: String = DEFAULT_CONFIG_CONTENT
            .lines()
            .skip(2)
            .map(|l| l.strip_prefix("# ").unwrap_or(l))
            .collect::<Vec<_>>()
            .join("\n");
        let config = load_from_str(&uncommented).unwrap();
        assert_eq!(config.target, Config::default().target);
        assert_eq!(config.breakpoints, Config::default().breakpoints);
    }

    #[test]
    fn has_non_comment_content_detects_values() {
        assert!(!has_non_comment_content(""));
        assert!(!has_non_comment_content("# comment\n"));
        assert!(has_non_comment_content("# comment\nport = 4\n"));
    }
}
