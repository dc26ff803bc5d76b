// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::{
    error::{Error, Result},
    schema::{GlobalSchema, NodeSchema, PartitionSchema, Record, Schema},
};

/// Top level slurm.conf parameters such as `ClusterName` or `AuthType`.
pub type Parameters = Record<GlobalSchema>;

/// Reason given to nodes that are held down until their peer reports them ready.
pub const NEW_NODE_REASON: &str = "New node.";

/// State given to nodes that are held down until their peer reports them ready.
pub const NEW_NODE_STATE: &str = "DOWN";

/// Split a comma separated node list. Empty items and the literal `""` are dropped.
pub(crate) fn split_list(value: &str) -> BTreeSet<String> {
    value
        .trim_matches('"')
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// A partition entry. The member list is kept sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    name: String,
    nodes: BTreeSet<String>,
    attributes: Record<PartitionSchema>,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Partition {
            name: name.into(),
            nodes: BTreeSet::new(),
            attributes: Record::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &BTreeSet<String> {
        &self.nodes
    }

    pub fn add_node(&mut self, node: impl Into<String>) {
        self.nodes.insert(node.into());
    }

    /// Set a partition key. `Nodes` replaces the member list with the comma separated `value`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        match key {
            "PartitionName" => Err(Error::IdentityField {
                kind: PartitionSchema::KIND,
                field: key.to_string(),
            }),
            "Nodes" => {
                let value: String = value.into();
                self.nodes = split_list(&value);
                Ok(())
            }
            _ => self.attributes.set(key, value),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    /// Keys other than `PartitionName` and `Nodes`, in catalog order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.attributes.iter()
    }

    pub fn is_default(&self) -> bool {
        self.get("Default") == Some("YES")
    }

    /// Fold another entry for the same partition into this one: members are unioned and keys
    /// set in `other` win.
    pub fn merge(&mut self, other: &Partition) {
        self.nodes.extend(other.nodes.iter().cloned());
        self.attributes.merge(&other.attributes);
    }
}

/// A node entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Record<NodeSchema>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            attributes: Record::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        if key == "NodeName" {
            return Err(Error::IdentityField {
                kind: NodeSchema::KIND,
                field: key.to_string(),
            });
        }
        self.attributes.set(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    /// Keys other than `NodeName`, in catalog order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.attributes.iter()
    }

    pub fn merge(&mut self, other: &Node) {
        self.attributes.merge(&other.attributes);
    }
}

/// A group of nodes that share a down state and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownNodes {
    pub nodes: BTreeSet<String>,
    pub state: String,
    pub reason: String,
}

impl DownNodes {
    /// The grouping used to hold freshly discovered nodes down.
    pub fn new_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DownNodes {
            nodes: nodes.into_iter().map(Into::into).collect(),
            state: NEW_NODE_STATE.to_string(),
            reason: NEW_NODE_REASON.to_string(),
        }
    }

    pub fn is_new_nodes(&self) -> bool {
        self.reason == NEW_NODE_REASON
    }
}

/// A complete slurm.conf held in memory.
///
/// Partitions and nodes keep the order they were added in; that is the order they are rendered
/// in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlurmConf {
    pub parameters: Parameters,
    pub partitions: IndexMap<String, Partition>,
    pub nodes: IndexMap<String, Node>,
    pub down_nodes: Vec<DownNodes>,
}

impl SlurmConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partition, merging it into an existing entry of the same name.
    pub fn add_partition(&mut self, partition: Partition) {
        match self.partitions.get_mut(partition.name()) {
            Some(existing) => existing.merge(&partition),
            None => {
                self.partitions
                    .insert(partition.name().to_string(), partition);
            }
        }
    }

    /// Add a node, merging it into an existing entry of the same name.
    pub fn add_node(&mut self, node: Node) {
        match self.nodes.get_mut(node.name()) {
            Some(existing) => existing.merge(&node),
            None => {
                self.nodes.insert(node.name().to_string(), node);
            }
        }
    }

    pub fn default_partition(&self) -> Option<&Partition> {
        self.partitions.values().find(|p| p.is_default())
    }

    /// Names of nodes currently held down as new.
    pub fn new_node_names(&self) -> BTreeSet<&str> {
        self.down_nodes
            .iter()
            .filter(|down| down.is_new_nodes())
            .flat_map(|down| down.nodes.iter().map(String::as_str))
            .collect()
    }

    /// Partition members that have no node entry, as `(partition, node)` pairs.
    pub fn dangling_members(&self) -> Vec<(&str, &str)> {
        self.partitions
            .values()
            .flat_map(|partition| {
                partition
                    .nodes()
                    .iter()
                    .filter(|node| !self.nodes.contains_key(node.as_str()))
                    .map(move |node| (partition.name(), node.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_handles_quotes_and_blanks() {
        assert!(split_list("\"\"").is_empty());
        assert!(split_list("").is_empty());
        let nodes: Vec<String> = split_list("b, a,,a").into_iter().collect();
        assert_eq!(nodes, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn identity_keys_are_rejected() {
        let mut partition = Partition::new("batch");
        assert!(matches!(
            partition.set("PartitionName", "other"),
            Err(Error::IdentityField { .. })
        ));
        let mut node = Node::new("compute-0");
        assert!(matches!(
            node.set("NodeName", "compute-1"),
            Err(Error::IdentityField { .. })
        ));
    }

    #[test]
    fn partitions_merge_by_name() {
        let mut conf = SlurmConf::new();

        let mut first = Partition::new("batch");
        first.add_node("compute-0");
        first.set("MaxTime", "10").unwrap();
        conf.add_partition(first);

        let mut second = Partition::new("batch");
        second.add_node("compute-1");
        second.set("State", "UP").unwrap();
        conf.add_partition(second);

        assert_eq!(conf.partitions.len(), 1);
        let batch = &conf.partitions["batch"];
        assert_eq!(batch.nodes().len(), 2);
        assert_eq!(batch.get("MaxTime"), Some("10"));
        assert_eq!(batch.get("State"), Some("UP"));
    }

    #[test]
    fn dangling_members_are_reported() {
        let mut conf = SlurmConf::new();
        let mut partition = Partition::new("batch");
        partition.add_node("compute-0");
        partition.add_node("ghost");
        conf.add_partition(partition);
        conf.add_node(Node::new("compute-0"));

        assert_eq!(conf.dangling_members(), vec![("batch", "ghost")]);
    }
}
