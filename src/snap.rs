// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::{collections::BTreeMap, fmt};

use log::info;

use crate::{error::Result, ops};

/// The Slurm service a snap configuration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Slurmd,
    Slurmctld,
    Slurmdbd,
    Slurmrestd,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Slurmd => "slurmd",
                Self::Slurmctld => "slurmctld",
                Self::Slurmdbd => "slurmdbd",
                Self::Slurmrestd => "slurmrestd",
            }
        )
    }
}

impl Service {
    /// Key prefix of this service in the snap's configuration. The controller owns the shared
    /// `slurm` key.
    pub fn config_name(&self) -> String {
        match self {
            Self::Slurmctld => "slurm".to_string(),
            other => other.to_string(),
        }
    }
}

/// Arguments to `snap` that store every entry of `configs` under `service`.
pub fn set_config_args(service: Service, configs: &BTreeMap<String, String>) -> Vec<String> {
    let prefix = service.config_name();
    ["set".to_string(), "slurm".to_string()]
        .into_iter()
        .chain(
            configs
                .iter()
                .map(|(key, value)| format!("{prefix}.{key}={value}")),
        )
        .collect()
}

pub fn set_configs(service: Service, configs: &BTreeMap<String, String>) -> Result<()> {
    info!("setting {} snap configuration keys for {service}", configs.len());
    ops::run("snap", &set_config_args(service, configs)).map(|_| ())
}

/// `scontrol` invocations the controller makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scontrol {
    Reconfigure,
    Resume { nodes: Vec<String> },
    Drain { nodes: Vec<String>, reason: String },
}

impl Scontrol {
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Reconfigure => vec!["reconfigure".to_string()],
            Self::Resume { nodes } => vec![
                "update".to_string(),
                format!("nodename={}", nodes.join(",")),
                "state=resume".to_string(),
            ],
            Self::Drain { nodes, reason } => vec![
                "update".to_string(),
                format!("nodename={}", nodes.join(",")),
                "state=drain".to_string(),
                format!("reason={reason}"),
            ],
        }
    }

    pub fn run(&self) -> Result<()> {
        ops::run("slurm.scontrol", &self.args()).map(|_| ())
    }
}
