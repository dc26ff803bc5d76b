// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::{
    collections::BTreeSet,
    fmt, fs,
    os::unix::fs::PermissionsExt,
    path::Path,
};

use chrono::{Local, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    conf::SlurmConf,
    config::CharmConfig,
    error::{Error, Result},
};

pub const STATE_VERSION: u32 = 1;

/// Everything the controller has to remember between invocations.
///
/// The assembler itself keeps no state; the caller loads this record, passes what it needs
/// into the assembly, and saves it again afterwards. It holds key material, so it is written
/// with mode 0600.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ControllerState {
    pub version: u32,
    /// When the state was last saved.
    #[serde(default)]
    pub updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub slurm_installed: bool,
    #[serde(default)]
    pub default_partition: String,
    #[serde(default)]
    pub slurmdbd_host: String,
    #[serde(default)]
    pub user_supplied_slurm_conf_params: String,
    #[serde(default)]
    pub nhc_params: String,
    /// Base64 encoded.
    #[serde(default)]
    pub munge_key: String,
    #[serde(default)]
    pub jwt_rsa: String,
    /// Nodes held down as new by the last slurm.conf written.
    #[serde(default)]
    pub new_nodes: BTreeSet<String>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

/// What a configuration change requires of the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChange {
    /// slurm.conf has to be assembled and written again.
    pub rewrite_slurm_conf: bool,
    /// New health check parameters to hand to every slurmd.
    pub nhc_params: Option<String>,
}

impl ControllerState {
    pub fn new() -> Self {
        ControllerState {
            version: STATE_VERSION,
            updated: None,
            slurm_installed: false,
            default_partition: String::new(),
            slurmdbd_host: String::new(),
            user_supplied_slurm_conf_params: String::new(),
            nhc_params: String::new(),
            munge_key: String::new(),
            jwt_rsa: String::new(),
            new_nodes: BTreeSet::new(),
        }
    }

    /// Load the state at `path`. A missing file is a controller that has never run.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("no state at '{}', starting fresh", path.display());
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path).map_err(Error::io(path))?;
        let state: Self = toml::from_str(&text).map_err(|source| Error::TomlDe {
            path: path.display().to_string(),
            source,
        })?;
        if state.version > STATE_VERSION {
            return Err(Error::StateVersion {
                found: state.version,
                supported: STATE_VERSION,
            });
        }
        Ok(state)
    }

    /// Stamp the state and write it to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.version = STATE_VERSION;
        self.updated = Some(Local::now().naive_local());
        let text = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(Error::io(parent))?;
        }
        fs::write(path, text).map_err(Error::io(path))?;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(Error::io(path))
    }

    /// Record the options in `config`, reporting what changed.
    ///
    /// Empty health check parameters and an empty default partition are ignored rather than
    /// treated as a change.
    pub fn apply_config(&mut self, config: &CharmConfig) -> ConfigChange {
        let mut change = ConfigChange::default();

        if !config.health_check_params.is_empty() && config.health_check_params != self.nhc_params {
            debug!("health check parameters changed");
            self.nhc_params = config.health_check_params.clone();
            change.nhc_params = Some(self.nhc_params.clone());
        }

        if !config.default_partition.is_empty()
            && config.default_partition != self.default_partition
        {
            debug!("default partition changed");
            self.default_partition = config.default_partition.clone();
            change.rewrite_slurm_conf = true;
        }

        if config.slurm_conf_parameters != self.user_supplied_slurm_conf_params {
            debug!("user supplied parameters changed");
            self.user_supplied_slurm_conf_params = config.slurm_conf_parameters.clone();
            change.rewrite_slurm_conf = true;
        }

        change
    }

    /// Record the accounting host, returning whether it changed.
    pub fn set_slurmdbd_host(&mut self, host: &str) -> bool {
        if self.slurmdbd_host == host {
            return false;
        }
        self.slurmdbd_host = host.to_string();
        true
    }

    /// Move node bookkeeping forward to the slurm.conf that was just written.
    ///
    /// Returns the nodes that were new last time, are no longer held down as new, and are still
    /// part of the cluster: those must now be resumed. Nodes that left the cluster are dropped.
    pub fn reconcile(&mut self, conf: &SlurmConf) -> Vec<String> {
        let current: BTreeSet<String> = conf
            .new_node_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let resume = self
            .new_nodes
            .iter()
            .filter(|node| !current.contains(*node) && conf.nodes.contains_key(node.as_str()))
            .cloned()
            .collect();

        self.new_nodes = current;
        resume
    }
}

/// Where a node is in its life as seen by the controller.
///
/// Nodes start out `Pending` until their peer publishes them, are held down as `New` while
/// their peer still flags them new, and become `Available` once a later pass no longer holds
/// them down. There is no timeout: a peer that never clears the flag keeps its node down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLifecycle {
    Pending,
    New,
    Available,
}

impl NodeLifecycle {
    pub fn of(node: &str, conf: &SlurmConf) -> Self {
        if !conf.nodes.contains_key(node) {
            Self::Pending
        } else if conf.new_node_names().contains(node) {
            Self::New
        } else {
            Self::Available
        }
    }
}

impl fmt::Display for NodeLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Pending => "pending",
                Self::New => "new",
                Self::Available => "available",
            }
        )
    }
}
