//! Session configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FinlensError, Result};
use crate::input::ParserConfig;
use crate::reconcile::ReconcileConfig;
use crate::sandbox::SandboxConfig;

/// Which [`Analyst`](super::Analyst) implementation a session uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Pure in-memory evaluation; free-form SQL is not available.
    Basic,
    /// DataFusion-backed evaluation.
    #[default]
    Sql,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Basic => f.write_str("basic"),
            Backend::Sql => f.write_str("sql"),
        }
    }
}

/// Configuration for a [`Session`](super::Session).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: Backend,
    pub parser: ParserConfig,
    pub reconcile: ReconcileConfig,
    pub sandbox: SandboxConfig,
    /// Profile only the first N rows (None = whole table).
    pub sample_rows: Option<usize>,
}

impl SessionConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sandbox.validate()?;
        if self.sample_rows == Some(0) {
            return Err(FinlensError::Config(
                "sample_rows must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
