//! Configuration and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examkit_core::traits::ReportStore;

use crate::file::FileReportStore;
use crate::http::HttpReportStore;
use crate::memory::MemoryReportStore;

/// Where finished attempts are persisted.
///
/// Note: Custom Debug impl masks the API token to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    File {
        #[serde(default = "default_store_dir")]
        dir: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default)]
        token: Option<String>,
    },
    Memory,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            StoreConfig::Http { base_url, token } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("token", &token.as_ref().map(|_| "***"))
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::File {
            dir: default_store_dir(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("./examkit-reports")
}

/// Top-level examkit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamkitConfig {
    #[serde(default)]
    pub store: StoreConfig,
    /// Countdown tick period in milliseconds.
    #[serde(default = "default_tick_period")]
    pub tick_period_ms: u64,
    /// User id used when a command is given none.
    #[serde(default)]
    pub default_user: Option<String>,
    /// Max concurrent sheets during batch grading.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for rendered reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_tick_period() -> u64 {
    1000
}
fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./examkit-results")
}

impl Default for ExamkitConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            tick_period_ms: default_tick_period(),
            default_user: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl ExamkitConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_store_config(config: &StoreConfig) -> StoreConfig {
    match config {
        StoreConfig::File { dir } => StoreConfig::File {
            dir: PathBuf::from(resolve_env_vars(&dir.to_string_lossy())),
        },
        StoreConfig::Http { base_url, token } => StoreConfig::Http {
            base_url: resolve_env_vars(base_url),
            token: token
                .as_ref()
                .map(|t| resolve_env_vars(t))
                .filter(|t| !t.is_empty()),
        },
        StoreConfig::Memory => StoreConfig::Memory,
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `examkit.toml` in the current directory
/// 2. `~/.config/examkit/config.toml`
///
/// Environment variable overrides: `EXAMKIT_REPORT_URL`, `EXAMKIT_API_TOKEN`.
pub fn load_config() -> Result<ExamkitConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamkitConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("examkit.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|home| home.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamkitConfig::default(),
    };

    Ok(apply_env_overrides(
        config,
        std::env::var("EXAMKIT_REPORT_URL").ok(),
        std::env::var("EXAMKIT_API_TOKEN").ok(),
    ))
}

/// Parse a config document and resolve `${VAR}` references in the store
/// section.
pub fn parse_config(content: &str) -> Result<ExamkitConfig> {
    let mut config: ExamkitConfig = toml::from_str(content)?;
    config.store = resolve_store_config(&config.store);
    Ok(config)
}

fn apply_env_overrides(
    mut config: ExamkitConfig,
    report_url: Option<String>,
    api_token: Option<String>,
) -> ExamkitConfig {
    if let Some(url) = report_url.filter(|u| !u.is_empty()) {
        let token = match &config.store {
            StoreConfig::Http { token, .. } => token.clone(),
            _ => None,
        };
        config.store = StoreConfig::Http {
            base_url: url,
            token,
        };
    }

    if let Some(key) = api_token.filter(|t| !t.is_empty()) {
        if let StoreConfig::Http { token, .. } = &mut config.store {
            *token = Some(key);
        }
    }

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examkit"))
}

/// Create a report store from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ReportStore>> {
    match config {
        StoreConfig::File { dir } => Ok(Arc::new(FileReportStore::new(dir)?)),
        StoreConfig::Http { base_url, token } => {
            Ok(Arc::new(HttpReportStore::new(base_url, token.clone())?))
        }
        StoreConfig::Memory => Ok(Arc::new(MemoryReportStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_EXAMKIT_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_EXAMKIT_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_EXAMKIT_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("unterminated ${OOPS"), "unterminated ${OOPS");
        std::env::remove_var("_EXAMKIT_TEST_VAR");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        std::env::set_var("_EXAMKIT_SELF_REF", "${_EXAMKIT_SELF_REF}");
        std::env::set_var("_EXAMKIT_PLAIN", "x");
        assert_eq!(
            resolve_env_vars("${_EXAMKIT_SELF_REF}/${_EXAMKIT_PLAIN}"),
            "${_EXAMKIT_SELF_REF}/x"
        );
        std::env::remove_var("_EXAMKIT_SELF_REF");
        std::env::remove_var("_EXAMKIT_PLAIN");
    }

    #[test]
    fn default_config() {
        let config = ExamkitConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert!(matches!(config.store, StoreConfig::File { .. }));
        assert!(config.default_user.is_none());
    }

    #[test]
    fn parse_store_variants() {
        let config = parse_config(
            r#"
tick_period_ms = 250
default_user = "alice"

[store]
type = "http"
base_url = "https://exams.example.com"
token = "secret"
"#,
        )
        .unwrap();
        assert_eq!(config.tick_period_ms, 250);
        assert_eq!(config.default_user.as_deref(), Some("alice"));
        assert_eq!(
            config.store,
            StoreConfig::Http {
                base_url: "https://exams.example.com".into(),
                token: Some("secret".into()),
            }
        );

        let config = parse_config("[store]\ntype = \"memory\"\n").unwrap();
        assert_eq!(config.store, StoreConfig::Memory);

        let config = parse_config("[store]\ntype = \"file\"\n").unwrap();
        assert_eq!(
            config.store,
            StoreConfig::File {
                dir: default_store_dir()
            }
        );
    }

    #[test]
    fn token_resolved_from_env() {
        std::env::set_var("_EXAMKIT_TOKEN_VAR", "t0k3n");
        let config = parse_config(
            "[store]\ntype = \"http\"\nbase_url = \"http://x\"\ntoken = \"${_EXAMKIT_TOKEN_VAR}\"\n",
        )
        .unwrap();
        std::env::remove_var("_EXAMKIT_TOKEN_VAR");
        assert!(matches!(
            config.store,
            StoreConfig::Http { token: Some(ref t), .. } if t == "t0k3n"
        ));
    }

    #[test]
    fn unset_token_variable_becomes_none() {
        let config = parse_config(
            "[store]\ntype = \"http\"\nbase_url = \"http://x\"\ntoken = \"${_EXAMKIT_SURELY_UNSET}\"\n",
        )
        .unwrap();
        assert!(matches!(config.store, StoreConfig::Http { token: None, .. }));
    }

    #[test]
    fn env_overrides_switch_to_http() {
        let config = apply_env_overrides(
            ExamkitConfig::default(),
            Some("http://reports.local".into()),
            Some("abc".into()),
        );
        assert_eq!(
            config.store,
            StoreConfig::Http {
                base_url: "http://reports.local".into(),
                token: Some("abc".into()),
            }
        );
    }

    #[test]
    fn token_override_ignored_for_file_store() {
        let config = apply_env_overrides(ExamkitConfig::default(), None, Some("abc".into()));
        assert!(matches!(config.store, StoreConfig::File { .. }));
    }

    #[test]
    fn debug_masks_token() {
        let store = StoreConfig::Http {
            base_url: "http://x".into(),
            token: Some("super-secret".into()),
        };
        let debug = format!("{store:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("examkit.toml");
        std::fs::write(&path, "parallelism = 9\n[store]\ntype = \"memory\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.parallelism, 9);
    }

    #[tokio::test]
    async fn create_store_by_kind() {
        let dir = tempfile::tempdir().unwrap();
        let store = create_store(&StoreConfig::File {
            dir: dir.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(store.name(), "file");

        let store = create_store(&StoreConfig::Memory).unwrap();
        assert_eq!(store.name(), "memory");

        let store = create_store(&StoreConfig::Http {
            base_url: "http://localhost:1".into(),
            token: None,
        })
        .unwrap();
        assert_eq!(store.name(), "http");
    }
}
