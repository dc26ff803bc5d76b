// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::{fmt, marker::PhantomData};

use crate::error::{Error, Result};

/// A kind of slurm.conf record together with the catalog of keys it recognizes.
///
/// The catalogs are the keys understood by the Slurm releases this charm targets. A key missing
/// from a catalog can't be configured at all, so additions upstream have to be mirrored here.
pub trait Schema {
    /// Name of the record kind, used when reporting errors.
    const KIND: &'static str;

    /// Every recognized key, in declaration order. Rendering follows this order.
    const FIELDS: &'static [&'static str];

    fn fields() -> &'static [&'static str] {
        Self::FIELDS
    }

    /// Index of `key` in the catalog. Matching is exact: keys are written back the way they
    /// appear here.
    fn position(key: &str) -> Option<usize> {
        Self::FIELDS.iter().position(|field| *field == key)
    }
}

/// Top level slurm.conf parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlobalSchema;

impl Schema for GlobalSchema {
    const KIND: &'static str = "parameter";
    const FIELDS: &'static [&'static str] = GLOBAL_FIELDS;
}

/// `PartitionName=` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionSchema;

impl Schema for PartitionSchema {
    const KIND: &'static str = "partition";
    const FIELDS: &'static [&'static str] = PARTITION_FIELDS;
}

/// `NodeName=` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeSchema;

impl Schema for NodeSchema {
    const KIND: &'static str = "node";
    const FIELDS: &'static [&'static str] = NODE_FIELDS;
}

/// `DownNodes=` lines. These are never built from free-form keys; the catalog only exists so
/// that the snap mapping and field enumeration have something to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownNodesSchema;

impl Schema for DownNodesSchema {
    const KIND: &'static str = "down nodes";
    const FIELDS: &'static [&'static str] = DOWN_NODES_FIELDS;
}

/// A set of values keyed by the catalog of `S`.
///
/// Values are held in catalog order, so there is no way to store a key twice or to store a key
/// the catalog doesn't know about.
#[derive(Clone, PartialEq, Eq)]
pub struct Record<S: Schema> {
    values: Vec<Option<String>>,
    schema: PhantomData<S>,
}

impl<S: Schema> Default for Record<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Schema> fmt::Debug for Record<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<S: Schema> Record<S> {
    pub fn new() -> Self {
        Record {
            values: vec![None; S::FIELDS.len()],
            schema: PhantomData,
        }
    }

    /// Build a record from key/value pairs. Later pairs overwrite earlier ones.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.set(key.as_ref(), value)?;
        }
        Ok(record)
    }

    /// Set `key` to `value`, replacing whatever was there. Every value ends up on a single
    /// slurm.conf line, so line breaks are rejected.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let Some(index) = S::position(key) else {
            return Err(Error::SchemaViolation {
                kind: S::KIND,
                field: key.to_string(),
            });
        };
        let value = value.into();
        if value.contains(['\n', '\r']) {
            return Err(Error::LineBreak {
                kind: S::KIND,
                field: key.to_string(),
            });
        }
        self.values[index] = Some(value);
        Ok(())
    }

    /// Clear `key`, returning the previous value. Unknown keys were never set, so they yield
    /// `None`.
    pub fn unset(&mut self, key: &str) -> Option<String> {
        S::position(key).and_then(|index| self.values[index].take())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        S::position(key).and_then(|index| self.values[index].as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over the keys that are set, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        S::FIELDS
            .iter()
            .zip(self.values.iter())
            .filter_map(|(key, value)| value.as_deref().map(|value| (*key, value)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Copy every key set in `other` over this record. Keys `other` leaves unset are kept.
    pub fn merge(&mut self, other: &Self) {
        for (slot, value) in self.values.iter_mut().zip(other.values.iter()) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }
    }
}

pub const GLOBAL_FIELDS: &[&str] = &[
    "AccountingStorageBackupHost",
    "AccountingStorageEnforce",
    "AccountingStorageExternalHost",
    "AccountingStorageHost",
    "AccountingStorageParameters",
    "AccountingStoragePass",
    "AccountingStoragePort",
    "AccountingStorageTRES",
    "AccountingStorageType",
    "AccountingStorageUser",
    "AccountingStoreFlags",
    "AcctGatherNodeFreq",
    "AcctGatherEnergyType",
    "AcctGatherInterconnectType",
    "AcctGatherFilesystemType",
    "AcctGatherProfileType",
    "AllowSpecResourcesUsage",
    "AuthAltTypes",
    "AuthAltParameters",
    "AuthInfo",
    "AuthType",
    "BatchStartTimeout",
    "BcastExclude",
    "BcastParameters",
    "BurstBufferType",
    "CliFilterPlugins",
    "ClusterName",
    "CommunicationParameters",
    "CheckGhalQuiesce",
    "DisableIPv4",
    "EnableIPv6",
    "NoCtldInAddrAny",
    "NoInAddrAny",
    "CompleteWait",
    "CoreSpecPlugin",
    "CpuFreqDef",
    "CpuFreqGovernors",
    "CredType",
    "DebugFlags",
    "BurstBuffer",
    "DefCpuPerGPU",
    "DefMemPerCPU",
    "DefMemPerGPU",
    "DefMemPerNode",
    "DependencyParameters",
    "DisableRootJobs",
    "EioTimeout",
    "EnforcePartLimits",
    "Epilog",
    "EpilogMsgTime",
    "EpilogSlurmctld",
    "FairShareDampeningFactor",
    "FederationParameters",
    "FirstJobId",
    "GetEnvTimeout",
    "GresTypes",
    "GroupUpdateForce",
    "GroupUpdateTime",
    "GpuFreqDef",
    "HealthCheckInterval",
    "HealthCheckNodeState",
    "HealthCheckProgram",
    "InactiveLimit",
    "InteractiveStepOptions",
    "JobAcctGatherType",
    "JobAcctGatherFrequency",
    "JobAcctGatherParams",
    "NoShared",
    "UsePss",
    "OverMemoryKill",
    "DisableGPUAcct",
    "JobCompHost",
    "JobCompLoc",
    "JobCompParams",
    "JobCompPass",
    "JobCompPort",
    "JobCompType",
    "JobCompUser",
    "JobContainerType",
    "JobFileAppend",
    "JobRequeue",
    "JobSubmitPlugins",
    "KillOnBadExit",
    "KillWait",
    "MaxBatchRequeue",
    "NodeFeaturesPlugins",
    "LaunchParameters",
    "Licenses",
    "LogTimeFormat",
    "MailDomain",
    "MailProg",
    "MaxArraySize",
    "MaxDBDMsgs",
    "MaxJobCount",
    "MaxJobId",
    "MaxMemPerCPU",
    "MaxMemPerNode",
    "MaxNodeCount",
    "MaxStepCount",
    "MaxTasksPerNode",
    "MCSParameters",
    "MCSPlugin",
    "MessageTimeout",
    "MinJobAge",
    "MpiDefault",
    "MpiParams",
    "OverTimeLimit",
    "PluginDir",
    "PlugStackConfig",
    "PowerParameters",
    "PowerPlugin",
    "PreemptMode",
    "PreemptParameters",
    "PreemptType",
    "PreemptExemptTime",
    "PrEpParameters",
    "PrEpPlugins",
    "PriorityCalcPeriod",
    "PriorityDecayHalfLife",
    "PriorityFavorSmall",
    "PriorityFlags",
    "PriorityMaxAge",
    "PriorityParameters",
    "PrioritySiteFactorParameters",
    "PrioritySiteFactorPlugin",
    "PriorityType",
    "PriorityUsageResetPeriod",
    "PriorityWeightAge",
    "PriorityWeightAssoc",
    "PriorityWeightFairshare",
    "PriorityWeightJobSize",
    "PriorityWeightPartition",
    "PriorityWeightQOS",
    "PriorityWeightTRES",
    "PrivateData",
    "ProctrackType",
    "Prolog",
    "PrologEpilogTimeout",
    "PrologFlags",
    "PrologSlurmctld",
    "PropagatePrioProcess",
    "PropagateResourceLimits",
    "PropagateResourceLimitsExcept",
    "RebootProgram",
    "ReconfigFlags",
    "KeepPartInfo",
    "KeepPartState",
    "KeepPowerSaveSettings",
    "RequeueExit",
    "RequeueExitHold",
    "ResumeFailProgram",
    "ResumeProgram",
    "ResumeRate",
    "ResumeTimeout",
    "ResvEpilog",
    "ResvOverRun",
    "ResvProlog",
    "ReturnToService",
    "SchedulerParameters",
    "SchedulerTimeSlice",
    "SchedulerType",
    "ScronParameters",
    "SelectType",
    "SelectTypeParameters",
    "SlurmctldAddr",
    "SlurmctldDebug",
    "SlurmctldHost",
    "SlurmctldLogFile",
    "SlurmctldParameters",
    "SlurmctldPidFile",
    "SlurmctldPort",
    "SlurmctldPrimaryOffProg",
    "SlurmctldPrimaryOnProg",
    "SlurmctldSyslogDebug",
    "SlurmctldTimeout",
    "SlurmdDebug",
    "SlurmdLogFile",
    "SlurmdParameters",
    "SlurmdPidFile",
    "SlurmdPort",
    "SlurmdSpoolDir",
    "SlurmdSyslogDebug",
    "SlurmdTimeout",
    "SlurmdUser",
    "SlurmSchedLogFile",
    "SlurmSchedLogLevel",
    "SlurmUser",
    "SrunEpilog",
    "SrunPortRange",
    "SrunProlog",
    "StateSaveLocation",
    "SuspendExcNodes",
    "SuspendExcParts",
    "SuspendExcStates",
    "SuspendProgram",
    "SuspendRate",
    "SuspendTime",
    "SuspendTimeout",
    "SwitchParameters",
    "SwitchType",
    "TaskEpilog",
    "TaskPlugin",
    "TaskPluginParam",
    "Cores",
    "Sockets",
    "Threads",
    "SlurmdOffSpec",
    "Verbose",
    "Autobind",
    "TaskProlog",
    "TCPTimeout",
    "TmpFS",
    "TopologyParam",
    "Dragonfly",
    "RoutePart",
    "SwitchAsNodeRank",
    "RouteTree",
    "TopoOptional",
    "TopologyPlugin",
    "TrackWCKey",
    "TreeWidth",
    "UnkillableStepProgram",
    "UnkillableStepTimeout",
    "UsePAM",
    "VSizeFactor",
    "WaitTime",
    "X11Parameters",
];

pub const PARTITION_FIELDS: &[&str] = &[
    "PartitionName",
    "AllocNodes",
    "AllowAccounts",
    "AllowGroups",
    "AllowQos",
    "Alternate",
    "CpuBind",
    "Default",
    "DefaultTime",
    "DefCpuPerGPU",
    "DefMemPerCPU",
    "DefMemPerGPU",
    "DefMemPerNode",
    "DenyAccounts",
    "DenyQos",
    "DisableRootJobs",
    "ExclusiveUser",
    "GraceTime",
    "Hidden",
    "LLN",
    "MaxCPUsPerNode",
    "MaxCPUsPerSocket",
    "MaxMemPerCPU",
    "MaxMemPerNode",
    "MaxNodes",
    "MaxTime",
    "MinNodes",
    "Nodes",
    "OverSubscribe",
    "OverTimeLimit",
    "PowerDownOnIdle",
    "PreemptMode",
    "PriorityJobFactor",
    "PriorityTier",
    "QOS",
    "ReqResv",
    "ResumeTimeout",
    "RootOnly",
    "SelectTypeParameters",
    "State",
    "SuspendTime",
    "SuspendTimeout",
    "TRESBillingWeights",
];

pub const NODE_FIELDS: &[&str] = &[
    "NodeName",
    "NodeHostname",
    "NodeAddr",
    "BcastAddr",
    "Boards",
    "CoreSpecCount",
    "CoresPerSocket",
    "CpuBind",
    "CPUs",
    "CpuSpecList",
    "Features",
    "Gres",
    "MemSpecLimit",
    "Port",
    "Procs",
    "RealMemory",
    "Reason",
    "Sockets",
    "SocketsPerBoard",
    "State",
    "ThreadsPerCore",
    "TmpDisk",
    "Weight",
];

pub const DOWN_NODES_FIELDS: &[&str] = &[
    "DownNodes",
    "State",
    "Reason",
];
