// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{DownNodes, Node, Parameters, Partition, SlurmConf};

/// Line emitted in place of partitions when the cluster has none yet, so that slurmctld still
/// has a default partition to start with.
pub const DEFAULT_PARTITION_ENTRY: &str = "PartitionName=DEFAULT Default=YES";

fn join_nodes(nodes: &BTreeSet<String>) -> String {
    nodes.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// `Key=Value` for an entry line. Values with whitespace are quoted to keep them one token.
fn entry_token(key: &str, value: &str) -> String {
    match value.contains(char::is_whitespace) {
        true => format!("{key}=\"{value}\""),
        false => format!("{key}={value}"),
    }
}

impl Partition {
    /// `PartitionName=<name> Nodes=<members> <Key=Value>...`
    pub fn as_slurm_conf_entry(&self) -> String {
        let nodes = match self.nodes().is_empty() {
            true => "\"\"".to_string(),
            false => join_nodes(self.nodes()),
        };
        let mut tokens = vec![
            format!("PartitionName={}", self.name()),
            format!("Nodes={nodes}"),
        ];
        tokens.extend(self.attributes().map(|(k, v)| entry_token(k, v)));
        tokens.join(" ")
    }

    /// Snap keys are prefixed with the partition name, since every partition shares the same
    /// set of keys.
    pub fn as_snap_conf_entries(&self) -> Vec<(String, String)> {
        let mut entries = vec![(
            format!("{}.PartitionName", self.name()),
            self.name().to_string(),
        )];
        if !self.nodes().is_empty() {
            entries.push((format!("{}.Nodes", self.name()), join_nodes(self.nodes())));
        }
        entries.extend(
            self.attributes()
                .map(|(k, v)| (format!("{}.{k}", self.name()), v.to_string())),
        );
        entries
    }
}

impl Node {
    pub fn as_slurm_conf_entry(&self) -> String {
        std::iter::once(format!("NodeName={}", self.name()))
            .chain(self.attributes().map(|(k, v)| entry_token(k, v)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Node keys are not prefixed, so with more than one node the last one written wins.
    pub fn as_snap_conf_entries(&self) -> Vec<(String, String)> {
        std::iter::once(("NodeName".to_string(), self.name().to_string()))
            .chain(self.attributes().map(|(k, v)| (k.to_string(), v.to_string())))
            .collect()
    }
}

impl DownNodes {
    pub fn as_slurm_conf_entry(&self) -> String {
        format!(
            "DownNodes={} State={} Reason=\"{}\"",
            join_nodes(&self.nodes),
            self.state,
            self.reason
        )
    }

    pub fn as_snap_conf_entries(&self) -> Vec<(String, String)> {
        vec![
            ("DownNodes".to_string(), join_nodes(&self.nodes)),
            ("State".to_string(), self.state.clone()),
            ("Reason".to_string(), self.reason.clone()),
        ]
    }
}

fn parameter_entries(parameters: &Parameters) -> String {
    parameters
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `conf` in slurm.conf syntax.
///
/// The output always has the four sections `Parameters`, `Partitions`, `Nodes` and `DownNodes`
/// in that order, each introduced by a `# <Section>` comment and separated by a blank line. A
/// section with nothing in it keeps its header.
pub fn as_slurm_conf(conf: &SlurmConf) -> String {
    let partitions = match conf.partitions.is_empty() {
        true => DEFAULT_PARTITION_ENTRY.to_string(),
        false => conf
            .partitions
            .values()
            .map(Partition::as_slurm_conf_entry)
            .collect::<Vec<_>>()
            .join("\n"),
    };
    let nodes = conf
        .nodes
        .values()
        .map(Node::as_slurm_conf_entry)
        .collect::<Vec<_>>()
        .join("\n");
    let down_nodes = conf
        .down_nodes
        .iter()
        .map(DownNodes::as_slurm_conf_entry)
        .collect::<Vec<_>>()
        .join("\n");

    [
        ("Parameters", parameter_entries(&conf.parameters)),
        ("Partitions", partitions),
        ("Nodes", nodes),
        ("DownNodes", down_nodes),
    ]
    .iter()
    .map(|(section, body)| format!("# {section}\n{}", body.trim_start()))
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Render `conf` as the key/value pairs understood by the slurm snap's configuration store.
///
/// Unlike [`as_slurm_conf`], an empty partition list becomes `partition-name=DEFAULT` and
/// `default=YES`.
pub fn as_snap_conf(conf: &SlurmConf) -> BTreeMap<String, String> {
    let mut entries: Vec<(String, String)> = conf
        .parameters
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if conf.partitions.is_empty() {
        entries.push(("partition-name".to_string(), "DEFAULT".to_string()));
        entries.push(("default".to_string(), "YES".to_string()));
    } else {
        entries.extend(
            conf.partitions
                .values()
                .flat_map(Partition::as_snap_conf_entries),
        );
    }
    entries.extend(conf.nodes.values().flat_map(Node::as_snap_conf_entries));
    entries.extend(
        conf.down_nodes
            .iter()
            .flat_map(DownNodes::as_snap_conf_entries),
    );

    entries.into_iter().collect()
}
