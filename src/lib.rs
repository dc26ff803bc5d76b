// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod assemble;
pub mod commands;
pub mod conf;
pub mod config;
pub mod defaults;
pub mod error;
pub mod ops;
pub mod parse;
pub mod render;
pub mod schema;
pub mod snap;
pub mod state;
pub mod test_env;

pub fn default_config_path() -> String {
    match std::env::var("SLURMCTLD_CONFIG") {
        Ok(conf) => conf,
        Err(_) => "/etc/slurm/slurmctld-charm.toml".to_string(),
    }
}

pub fn default_inventory_path() -> String {
    match std::env::var("SLURMCTLD_INVENTORY") {
        Ok(inventory) => inventory,
        Err(_) => "/etc/slurm/slurmctld-inventory.toml".to_string(),
    }
}

pub fn default_statefile_path() -> String {
    match std::env::var("SLURMCTLD_STATEFILE") {
        Ok(statefile) => statefile,
        Err(_) => "/var/lib/slurmctld-charm/state.toml".to_string(),
    }
}

/// Where slurmctld reads its configuration from.
pub fn default_slurm_conf_path() -> String {
    match std::env::var("SLURM_CONF") {
        Ok(path) => path,
        Err(_) => "/etc/slurm/slurm.conf".to_string(),
    }
}

pub fn default_cgroup_conf_path() -> String {
    match std::env::var("SLURM_CGROUP_CONF") {
        Ok(path) => path,
        Err(_) => "/etc/slurm/cgroup.conf".to_string(),
    }
}

pub fn default_munge_key_path() -> String {
    match std::env::var("MUNGE_KEY") {
        Ok(path) => path,
        Err(_) => "/etc/munge/munge.key".to_string(),
    }
}

pub fn default_jwt_key_path() -> String {
    match std::env::var("SLURM_JWT_KEY") {
        Ok(path) => path,
        Err(_) => "/var/spool/slurmctld/jwt_hs256.key".to_string(),
    }
}
