use crate::config::Config;
use crate::error::ConfigError;

/// Merge an overlay TOML fragment on top of a base [`Config`].
///
/// Values present in `overlay_toml` override those in `base`.
/// Missing keys in the overlay keep their `base` values. Arrays,
/// including `[[breakpoints]]`, are replaced as a whole.
/// `origin` names the overlay in parse errors.
pub fn merge_configs(
    base: &Config,
    overlay_toml: &str,
    origin: &str,
) -> Result<Config, ConfigError> {
    let base_str = toml::to_string(base).map_err(|e| ConfigError::parse("<defaults>", e))?;

    let mut base_val: toml::Value =
        toml::from_str(&base_str).map_err(|e| ConfigError::parse("<defaults>", e))?;

    let overlay_val: toml::Value =
        toml::from_str(overlay_toml).map_err(|e| ConfigError::parse(origin, e))?;

    merge_values(&mut base_val, &overlay_val);

    base_val
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::parse(origin, e))
}

/// Recursively merge `overlay` into `base`.
///
/// Tables are merged key-by-key; all other value types are
/// replaced outright.
fn merge_values(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    merge_values(base_val, val);
                } else {
                    base_table.insert(key.clone(), val.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn merge_empty_overlay_returns_base() {
        let base = Config::default();
        let merged = merge_configs(&base, "", "test").expect("merge empty");
        assert_eq!(merged, base);
    }

    #[test]
    fn merge_overrides_port_only() {
        let base = Config::default();
        let merged = merge_configs(&base, "[target]\nport = 6000\n", "test").expect("merge");
        assert_eq!(merged.target.port, 6000);
        assert_eq!(merged.target.host, "localhost");
    }

    #[test]
    fn merge_replaces_breakpoint_list() {
        let base = Config::default();
        let overlay = "[[breakpoints]]\nfile = \"app.py\"\nlines = [3]\n";
        let merged = merge_configs(&base, overlay, "test").expect("merge");
        assert_eq!(merged.breakpoints.len(), 1);
        assert_eq!(merged.breakpoints[0].file, "app.py");
    }

    #[test]
    fn merge_adds_missing_field() {
        let base = Config::default();
        assert!(base.log.file.is_none());
        let overlay = "[log]\nfile = \"/tmp/dapscope.log\"\n";
        let merged = merge_configs(&base, overlay, "test").expect("merge");
        assert_eq!(merged.log.file, Some(PathBuf::from("/tmp/dapscope.log")));
        assert_eq!(merged.log.level, base.log.level);
    }

    #[test]
    fn merge_invalid_overlay_names_origin() {
        let base = Config::default();
        let err = merge_configs(&base, "{{invalid}}", "/home/me/.config/dapscope/config.toml")
            .unwrap_err();
        assert!(err.to_string().contains("/home/me/.config/dapscope/config.toml"));
    }

    #[test]
    fn merge_wrong_type_is_parse_error() {
        let base = Config::default();
        let result = merge_configs(&base, "[target]\nport = \"high\"\n", "test");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn merge_preserves_unrelated_sections() {
        let base = Config::default();
        let overlay = "[inspect]\nwatch = [\"password\"]\n";
        let merged = merge_configs(&base, overlay, "test").expect("merge");
        assert_eq!(merged.inspect.watch, vec!["password".to_string()]);
        assert_eq!(merged.inspect.depth, base.inspect.depth);
        assert_eq!(merged.target, base.target);
        assert_eq!(merged.debuggee, base.debuggee);
        assert_eq!(merged.breakpoints, base.breakpoints);
    }
}
