// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anyhow::Context;
use bridge_kernel::config::ProverConfig;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Settings read from `--config`; command line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub prover: ProverConfig,
    pub output_format: OutputFormat,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        tracing::debug!("Loaded config from {:?}: {:?}", path, cfg);
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_kernel::config::TotalWeightMode;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: CliConfig =
            serde_json::from_str(r#"{"prover": {"total_weight_mode": "all_validators"}}"#).unwrap();
        assert_eq!(cfg.prover.total_weight_mode, TotalWeightMode::AllValidators);
        assert_eq!(cfg.output_format, OutputFormat::Bin);
    }
}
