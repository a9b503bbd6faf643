//! Service configuration
use crate::engine::ExecutionAuthorization;
use crate::error::SettingError;
use std::path::PathBuf;

pub const ENV_EXECUTION_AUTH: &str = "CUSTODY_EXECUTION_AUTH";
pub const ENV_PRINCIPAL_PREFIX: &str = "CUSTODY_PRINCIPAL_PREFIX";
pub const ENV_JOURNAL_PATH: &str = "CUSTODY_JOURNAL_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Applied to wallets created without an explicit policy.
    pub execution_authorization: ExecutionAuthorization,
    /// bech32 prefix for principals minted by the service.
    pub principal_prefix: String,
    /// sled directory; `None` keeps everything in memory.
    pub journal_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            execution_authorization: ExecutionAuthorization::OwnersOnly,
            principal_prefix: "owner".to_string(),
            journal_path: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_execution_authorization(mut self, authorization: ExecutionAuthorization) -> Self {
        self.execution_authorization = authorization;
        self
    }

    pub fn with_principal_prefix(mut self, prefix: &str) -> Self {
        self.principal_prefix = prefix.to_string();
        self
    }

    pub fn with_journal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.journal_path = Some(path.into());
        self
    }

    /// Defaults overridden by `CUSTODY_*` environment variables.
    pub fn from_env() -> Result<Self, SettingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_EXECUTION_AUTH) {
            config.execution_authorization =
                value.parse().map_err(|_| SettingError::InvalidValue {
                    key: ENV_EXECUTION_AUTH,
                    value,
                })?;
        }
        if let Some(prefix) = lookup(ENV_PRINCIPAL_PREFIX) {
            if bech32::Hrp::parse(&prefix).is_err() {
                return Err(SettingError::InvalidValue {
                    key: ENV_PRINCIPAL_PREFIX,
                    value: prefix,
                });
            }
            config.principal_prefix = prefix;
        }
        if let Some(path) = lookup(ENV_JOURNAL_PATH).filter(|p| !p.is_empty()) {
            config.journal_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}
