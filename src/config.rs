// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    assemble::{Fragments, PeerFragment},
    defaults::{self, Controller, DEFAULT_CLUSTER_NAME},
    error::{Error, Result},
    ops,
    state::ControllerState,
};

fn read_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(Error::io(path))?;
    toml::from_str(&text).map_err(|source| Error::TomlDe {
        path: path.display().to_string(),
        source,
    })
}

/// CharmConfig is the operator facing configuration of the controller, the same options the
/// charm exposes. It is read from a TOML file:
///
/// ```toml
/// cluster-name = "charmedhpc"
/// default-partition = "batch"
/// slurm-conf-parameters = """
/// MaxJobCount=20000
/// """
///
/// [controller]
/// hostname = "ctld-0"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CharmConfig {
    #[serde(default = "default_cluster_name")]
    pub cluster_name: String,
    #[serde(default)]
    pub default_partition: String,
    /// Free form `Key=Value` lines layered over everything else in slurm.conf.
    #[serde(default)]
    pub slurm_conf_parameters: String,
    /// Written verbatim to cgroup.conf when non-empty.
    #[serde(default)]
    pub cgroup_parameters: String,
    #[serde(default)]
    pub health_check_params: String,
    #[serde(default)]
    pub controller: ControllerConfig,
}

fn default_cluster_name() -> String {
    DEFAULT_CLUSTER_NAME.to_string()
}

impl Default for CharmConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CharmConfig {
    pub fn new() -> Self {
        CharmConfig {
            cluster_name: default_cluster_name(),
            default_partition: String::new(),
            slurm_conf_parameters: String::new(),
            cgroup_parameters: String::new(),
            health_check_params: String::new(),
            controller: ControllerConfig::default(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_toml(path.as_ref())
    }

    /// Resolve the controller's identity, probing the local machine for anything the
    /// configuration leaves out.
    pub fn controller(&self) -> Result<Controller> {
        let hostname = match &self.controller.hostname {
            Some(hostname) => hostname.clone(),
            None => ops::hostname()?,
        };
        let container = match self.controller.container {
            Some(container) => container,
            None => ops::is_container(),
        };
        let cluster_name = match self.cluster_name.is_empty() {
            true => default_cluster_name(),
            false => self.cluster_name.clone(),
        };
        Ok(Controller {
            cluster_name,
            hostname,
            ingress_address: self.controller.ingress_address.clone(),
            container,
        })
    }

    /// Gather everything slurm.conf is assembled from. The controller's identity comes from
    /// this configuration; the default partition, overrides and accounting host come from
    /// `state`, which has already recorded this configuration via
    /// [`ControllerState::apply_config`].
    pub fn fragments(&self, state: &ControllerState, peers: Vec<PeerFragment>) -> Result<Fragments> {
        Ok(Fragments {
            controller: self.controller()?.parameters()?,
            defaults: defaults::charm_maintained()?,
            accounting: defaults::accounting(&state.slurmdbd_host)?,
            peers,
            default_partition: Some(state.default_partition.clone()),
            user_overrides: state.user_supplied_slurm_conf_params.clone(),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ControllerConfig {
    /// Defaults to the short hostname of this machine.
    pub hostname: Option<String>,
    #[serde(default)]
    pub ingress_address: String,
    /// Defaults to asking `systemd-detect-virt`.
    pub container: Option<bool>,
}

/// Inventory is the relation data the controller has received from its peers, already decoded
/// from the runtime but with JSON payloads left as text.
///
/// ```toml
/// slurmdbd-host = "dbd-0"
///
/// [[slurmd]]
/// application = "compute"
/// partition = '{"compute": {"MaxTime": "INFINITE"}}'
///
/// [[slurmd.units]]
/// unit = "compute/0"
/// node = '{"new_node": true, "node_parameters": {"NodeName": "compute-0", "CPUs": "4"}}'
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Inventory {
    #[serde(default)]
    pub slurmdbd_host: String,
    #[serde(default)]
    pub slurmd: Vec<PeerFragment>,
}

impl Inventory {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        read_toml(path.as_ref())
    }

    /// Like [`Inventory::load`], but a missing file means no peers have related yet.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no inventory at '{}', assuming no peers", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charm_config_defaults() {
        let config: CharmConfig = toml::from_str("default-partition = \"batch\"").unwrap();
        assert_eq!(config.cluster_name, "charmedhpc");
        assert_eq!(config.default_partition, "batch");
        assert!(config.slurm_conf_parameters.is_empty());
        assert_eq!(config.controller, ControllerConfig::default());
    }

    #[test]
    fn controller_from_config() {
        let config: CharmConfig = toml::from_str(
            r#"
            cluster-name = "mycluster"

            [controller]
            hostname = "ctld-0"
            ingress-address = "10.0.0.2"
            container = false
            "#,
        )
        .unwrap();
        let controller = config.controller().unwrap();
        assert_eq!(controller.cluster_name, "mycluster");
        assert_eq!(controller.hostname, "ctld-0");
        assert_eq!(controller.ingress_address, "10.0.0.2");
        assert!(!controller.container);
    }

    #[test]
    fn inventory_from_toml() {
        let inventory: Inventory = toml::from_str(
            r#"
            [[slurmd]]
            application = "compute"
            partition = '{"compute": {}}'

            [[slurmd.units]]
            unit = "compute/0"
            node = '{"new_node": false, "node_parameters": {"NodeName": "compute-0"}}'

            [[slurmd.units]]
            unit = "compute/1"
            "#,
        )
        .unwrap();
        assert!(inventory.slurmdbd_host.is_empty());
        assert_eq!(inventory.slurmd.len(), 1);
        assert_eq!(inventory.slurmd[0].units.len(), 2);
        assert_eq!(inventory.slurmd[0].units[1].node, None);
    }

    #[test]
    fn fragments_follow_state() {
        let config: CharmConfig = toml::from_str(
            r#"
            default-partition = "ignored"
            slurm-conf-parameters = "MaxJobCount=1"

            [controller]
            hostname = "ctld-0"
            container = true
            "#,
        )
        .unwrap();
        let mut state = ControllerState::new();
        state.default_partition = "batch".to_string();
        state.user_supplied_slurm_conf_params = "MaxJobCount=20000".to_string();
        state.slurmdbd_host = "dbd-0".to_string();

        let fragments = config.fragments(&state, Vec::new()).unwrap();
        assert_eq!(fragments.default_partition.as_deref(), Some("batch"));
        assert_eq!(fragments.user_overrides, "MaxJobCount=20000");
        assert_eq!(fragments.accounting.get("AccountingStorageHost"), Some("dbd-0"));
        assert_eq!(fragments.controller.get("SlurmctldHost"), Some("ctld-0"));
    }
}
