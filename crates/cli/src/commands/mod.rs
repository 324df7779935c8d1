// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod info;
pub mod message;
pub mod proof;
pub mod prune;
pub mod signatures;
pub mod validators;
pub mod verify;

use std::path::Path;

use bridge_kernel::config::{ProverConfig, TotalWeightMode};

use crate::config::CliConfig;
use crate::output::OutputFormat;

/// Effective settings of one invocation.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub format: OutputFormat,
    pub prover: ProverConfig,
}

impl Settings {
    pub fn resolve(
        config: Option<&Path>,
        format: Option<OutputFormat>,
        all_validators: bool,
    ) -> anyhow::Result<Self> {
        let cfg = CliConfig::load(config)?;
        let mut prover = cfg.prover;
        if all_validators {
            prover.total_weight_mode = TotalWeightMode::AllValidators;
        }
        Ok(Self {
            format: format.unwrap_or(cfg.output_format),
            prover,
        })
    }
}
