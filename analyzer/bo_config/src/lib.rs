//! Process-wide, read-only analysis configuration.
//!
//! Spec §9's design note asks for configuration to be threaded as a context
//! argument rather than hidden behind globals, so any analysis code that
//! needs `relational_domain_enabled`/`debug_level`/`write_html` takes a
//! `&Config` rather than reading `std::env` directly. `Config::from_env`
//! is the one place env vars are read, mirroring `bo_log::LoggerConfig::from_env`.

use std::env::VarError;

/// Read-only configuration shared by every transfer function in a single
/// analysis run.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Whether the relational-constraints engine (`bo_relation`) is active.
    /// When `false`, `bo_domain` skips relation-store updates entirely; this
    /// only affects printing per spec §6, but callers may also use it to
    /// skip relational work outright for performance.
    pub relational_domain_enabled: bool,
    /// Debug verbosity. `>= 1` causes traces to be printed (spec §6).
    pub debug_level: u8,
    /// Enables "pruned a multi-valued slot" / "weak update for ..." notes
    /// (spec §4.1, §4.6, §7).
    pub write_html: bool,
}

/// Error parsing a configuration value from the environment.
#[derive(Debug)]
pub enum ConfigError {
    /// The value was present but not valid unicode.
    NotUnicode(String),
    /// The value was present but failed to parse as the expected type.
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotUnicode(s) => write!(f, "not unicode: {}", s),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "invalid value for {}: {}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for Config {
    fn default() -> Self {
        Config {
            relational_domain_enabled: false,
            debug_level: 0,
            write_html: false,
        }
    }
}

impl Config {
    /// Build a configuration from `{prefix}_RELATIONAL`, `{prefix}_DEBUG_LEVEL`,
    /// and `{prefix}_WRITE_HTML` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let relational_domain_enabled = match std::env::var(format!("{}_RELATIONAL", prefix)) {
            Ok(v) => match v.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: format!("{}_RELATIONAL", prefix),
                        value: other.to_string(),
                    });
                }
            },
            Err(VarError::NotPresent) => Config::default().relational_domain_enabled,
            Err(VarError::NotUnicode(s)) => {
                return Err(ConfigError::NotUnicode(s.to_string_lossy().to_string()));
            }
        };

        let debug_level = match std::env::var(format!("{}_DEBUG_LEVEL", prefix)) {
            Ok(v) => v.parse::<u8>().map_err(|_| ConfigError::InvalidValue {
                key: format!("{}_DEBUG_LEVEL", prefix),
                value: v,
            })?,
            Err(VarError::NotPresent) => Config::default().debug_level,
            Err(VarError::NotUnicode(s)) => {
                return Err(ConfigError::NotUnicode(s.to_string_lossy().to_string()));
            }
        };

        let write_html = match std::env::var(format!("{}_WRITE_HTML", prefix)) {
            Ok(v) => match v.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: format!("{}_WRITE_HTML", prefix),
                        value: other.to_string(),
                    });
                }
            },
            Err(VarError::NotPresent) => Config::default().write_html,
            Err(VarError::NotUnicode(s)) => {
                return Err(ConfigError::NotUnicode(s.to_string_lossy().to_string()));
            }
        };

        Ok(Config {
            relational_domain_enabled,
            debug_level,
            write_html,
        })
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug_level >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_conservative() {
        let cfg = Config::default();
        assert!(!cfg.relational_domain_enabled);
        assert!(!cfg.debug_enabled());
        assert!(!cfg.write_html);
    }
}
