//! Configuration file support.
//!
//! Reads `gsi-deploy.toml` (or the file named by `--config`) and merges it
//! with command line flags.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI arguments
//! 2. Environment variables (`AWS_REGION` etc., resolved by the AWS SDK)
//! 3. Config file (`[aws]`, `[reconcile]`)
//! 4. Hardcoded defaults
//!
//! ```toml
//! [aws]
//! region = "eu-west-1"
//! endpoint = "http://localhost:4566"
//! timeout_ms = 30000
//!
//! [reconcile]
//! poll_interval_secs = 15
//! max_poll_attempts = 240
//! backoff = "exponential"
//! max_interval_secs = 60
//! concurrency = 2
//! keep_going = true
//! ```

use crate::cli::ReconcileArgs;
use gsi_deploy_aws::DynamoDbConfig;
use gsi_deploy_core::{FailurePolicy, PollBackoff, ReconcileConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "gsi-deploy.toml";

// ---------------------------------------------------------------------------
// File config serde types (all Option, absence means "not set in file")
// ---------------------------------------------------------------------------

/// Top-level config file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub aws: Option<AwsFileConfig>,

    #[serde(default)]
    pub reconcile: Option<ReconcileFileConfig>,
}

/// `[aws]` section
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AwsFileConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// Poll backoff as written in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffSetting {
    Fixed,
    Exponential,
}

/// `[reconcile]` section
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReconcileFileConfig {
    pub poll_interval_secs: Option<u64>,
    pub max_poll_attempts: Option<u32>,
    pub backoff: Option<BackoffSetting>,
    /// Cap for exponential backoff. Defaults to four poll intervals.
    pub max_interval_secs: Option<u64>,
    pub concurrency: Option<usize>,
    pub keep_going: Option<bool>,
}

/// Errors from config file loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {detail}")]
    Parse { path: PathBuf, detail: String },
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// Resolve which config file to read, if any.
///
/// An explicit path is always returned (a missing file is then an error);
/// otherwise the default file is used only when it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Load a TOML config file from the given path.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigFileError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    toml::from_str(&content).map_err(|e| ConfigFileError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Load the config file if one applies, otherwise an empty config.
pub fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig, ConfigFileError> {
    let Some(path) = resolve_config_path(explicit) else {
        debug!("No config file found, using CLI args and defaults only");
        return Ok(FileConfig::default());
    };

    info!(path = %path.display(), "Loading configuration file");
    load_config(&path)
}

impl FileConfig {
    /// DynamoDB client settings: CLI flags over file values.
    ///
    /// A region left unset here falls through to the SDK's own resolution
    /// (`AWS_REGION`, profile).
    pub fn dynamodb_config(&self, args: &ReconcileArgs) -> DynamoDbConfig {
        let file = self.aws.clone().unwrap_or_default();
        DynamoDbConfig {
            region: args.region.clone().or(file.region),
            endpoint: args.endpoint.clone().or(file.endpoint),
            timeout_ms: file.timeout_ms,
        }
    }

    /// Engine settings: CLI flags over file values over defaults.
    pub fn reconcile_config(&self, args: &ReconcileArgs) -> Result<ReconcileConfig, ConfigFileError> {
        let file = self.reconcile.clone().unwrap_or_default();
        let mut config = ReconcileConfig::default();

        if let Some(secs) = args.poll_interval.or(file.poll_interval_secs) {
            if secs == 0 {
                return Err(ConfigFileError::InvalidValue(
                    "poll interval must be at least 1 second".to_string(),
                ));
            }
            config = config.with_poll_interval(Duration::from_secs(secs));
        }

        if let Some(attempts) = args.max_poll_attempts.or(file.max_poll_attempts) {
            if attempts == 0 {
                return Err(ConfigFileError::InvalidValue(
                    "max poll attempts must be at least 1".to_string(),
                ));
            }
            config = config.with_max_poll_attempts(attempts);
        }

        if let Some(BackoffSetting::Exponential) = file.backoff {
            let max_interval = file
                .max_interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.poll_interval * 4);
            config = config.with_backoff(PollBackoff::Exponential { max_interval });
        }

        if let Some(tables) = args.concurrency.or(file.concurrency) {
            if tables == 0 {
                return Err(ConfigFileError::InvalidValue(
                    "concurrency must be at least 1".to_string(),
                ));
            }
            config = config.with_table_concurrency(tables);
        }

        if args.keep_going || file.keep_going.unwrap_or(false) {
            config = config.with_failure_policy(FailurePolicy::IsolateTables);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_full_file() {
        let toml = r#"
[aws]
region = "eu-west-1"
endpoint = "http://localhost:4566"
timeout_ms = 30000

[reconcile]
poll_interval_secs = 5
max_poll_attempts = 10
backoff = "exponential"
max_interval_secs = 40
concurrency = 3
keep_going = true
"#;
        let file: FileConfig = toml::from_str(toml).unwrap();

        let aws = file.dynamodb_config(&ReconcileArgs::default());
        assert_eq!(aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(aws.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(aws.timeout_ms, Some(30000));

        let config = file.reconcile_config(&ReconcileArgs::default()).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.max_poll_attempts, 10);
        assert_eq!(
            config.backoff,
            PollBackoff::Exponential {
                max_interval: Duration::from_secs(40)
            }
        );
        assert_eq!(config.table_concurrency, 3);
        assert_eq!(config.failure_policy, FailurePolicy::IsolateTables);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = FileConfig::default();
        let config = file.reconcile_config(&ReconcileArgs::default()).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(config.max_poll_attempts, 240);
        assert_eq!(config.backoff, PollBackoff::Fixed);
        assert_eq!(config.failure_policy, FailurePolicy::FailFast);
        assert!(file.dynamodb_config(&ReconcileArgs::default()).region.is_none());
    }

    #[test]
    fn cli_flags_override_file() {
        let file: FileConfig = toml::from_str(
            r#"
[aws]
region = "eu-west-1"

[reconcile]
poll_interval_secs = 5
concurrency = 3
"#,
        )
        .unwrap();
        let args = ReconcileArgs {
            region: Some("us-east-2".to_string()),
            poll_interval: Some(30),
            ..ReconcileArgs::default()
        };

        assert_eq!(
            file.dynamodb_config(&args).region.as_deref(),
            Some("us-east-2")
        );
        let config = file.reconcile_config(&args).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.table_concurrency, 3);
    }

    #[test]
    fn zero_values_are_rejected() {
        let args = ReconcileArgs {
            concurrency: Some(0),
            ..ReconcileArgs::default()
        };
        let err = FileConfig::default().reconcile_config(&args).unwrap_err();
        assert!(matches!(err, ConfigFileError::InvalidValue(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[reconcile]\npoll_every = 5").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_file_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigFileError::Io { .. }));
    }
}
