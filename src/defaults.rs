// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use crate::{conf::Parameters, error::Result};

pub const SLURM_USER: &str = "slurm";
pub const SLURM_GROUP: &str = "slurm";
pub const MUNGE_USER: &str = "munge";
pub const MUNGE_GROUP: &str = "munge";

pub const DEFAULT_CLUSTER_NAME: &str = "charmedhpc";
pub const SLURMDBD_PORT: &str = "6819";

/// Parameters the charm always sets. Anything here can still be overridden by the operator
/// through `slurm-conf-parameters`.
pub const CHARM_MAINTAINED_PARAMETERS: &[(&str, &str)] = &[
    (
        "AuthAltParameters",
        "jwt_key=/var/spool/slurmctld/jwt_hs256.key",
    ),
    ("AuthAltTypes", "auth/jwt"),
    (
        "AuthInfo",
        "/var/snap/slurm/common/run/munge/munged.socket.2",
    ),
    ("AuthType", "auth/munge"),
    ("GresTypes", "gpu"),
    ("HealthCheckInterval", "600"),
    ("HealthCheckNodeState", "ANY,CYCLE"),
    ("HealthCheckProgram", "/usr/sbin/omni-nhc-wrapper"),
    ("MailProg", "/usr/bin/mail.mailutils"),
    ("PluginDir", "/usr/lib/x86_64-linux-gnu/slurm-wlm"),
    ("PlugStackConfig", "/etc/slurm/plugstack.conf.d/plugstack.conf"),
    ("SelectType", "select/cons_tres"),
    ("SlurmctldPort", "6817"),
    ("SlurmdPort", "6818"),
    ("StateSaveLocation", "/var/spool/slurmctld"),
    ("SlurmdSpoolDir", "/var/spool/slurmd"),
    ("SlurmctldParameters", "enable_configless"),
    (
        "SlurmctldLogFile",
        "/var/snap/slurm/common/var/log/slurm/slurmctld.log",
    ),
    (
        "SlurmdLogFile",
        "/var/snap/slurm/common/var/log/slurm/slurmctld.log",
    ),
    ("SlurmdPidFile", "/run/slurmd.pid"),
    ("SlurmctldPidFile", "/run/slurmctld.pid"),
    ("SlurmUser", SLURM_USER),
    ("SlurmdUser", "root"),
    ("RebootProgram", "\"/usr/sbin/reboot --reboot\""),
];

pub fn charm_maintained() -> Result<Parameters> {
    Parameters::from_pairs(CHARM_MAINTAINED_PARAMETERS.iter().copied())
}

/// Accounting parameters pointing at slurmdbd. An empty host means there is no accounting
/// backend, in which case none of the keys are set.
pub fn accounting(slurmdbd_host: &str) -> Result<Parameters> {
    if slurmdbd_host.is_empty() {
        return Ok(Parameters::new());
    }
    Parameters::from_pairs([
        ("AccountingStorageHost", slurmdbd_host),
        ("AccountingStorageType", "accounting_storage/slurmdbd"),
        ("AccountingStoragePass", "/var/run/munge/munge.socket.2"),
        ("AccountingStoragePort", SLURMDBD_PORT),
    ])
}

/// Facts about the controller itself that end up in slurm.conf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub cluster_name: String,
    pub hostname: String,
    /// Address slurmd units reach the controller on. Empty when unknown.
    pub ingress_address: String,
    /// Containers can't use the cgroup process tracker.
    pub container: bool,
}

impl Controller {
    pub fn parameters(&self) -> Result<Parameters> {
        let mut parameters = Parameters::new();
        parameters.set("ClusterName", self.cluster_name.as_str())?;
        parameters.set("SlurmctldHost", self.hostname.as_str())?;
        if !self.ingress_address.is_empty() {
            parameters.set("SlurmctldAddr", self.ingress_address.as_str())?;
        }
        parameters.set(
            "ProctrackType",
            match self.container {
                true => "proctrack/linuxproc",
                false => "proctrack/cgroup",
            },
        )?;
        Ok(parameters)
    }
}
