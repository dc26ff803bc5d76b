// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::collections::BTreeSet;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    conf::{DownNodes, Node, Parameters, Partition, SlurmConf},
    error::{Error, Result},
};

/// Relation data published by one slurmd application: the partition it serves, and the node
/// each of its units runs.
///
/// The JSON is kept as text, exactly as it arrives from the relation, so that decoding errors
/// surface from [`assemble`] rather than from whoever collected the data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PeerFragment {
    pub application: String,

    /// `{"<partition name>": {<partition keys>}}`
    #[serde(default)]
    pub partition: Option<String>,

    #[serde(default)]
    pub units: Vec<UnitFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFragment {
    pub unit: String,

    /// `{"new_node": <bool>, "node_parameters": {"NodeName": ..., <node keys>}}`
    #[serde(default)]
    pub node: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeFragment {
    #[serde(default)]
    new_node: bool,
    #[serde(default)]
    node_parameters: Option<Map<String, Value>>,
}

/// Everything a slurm.conf is built from, lowest precedence first.
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    /// Cluster name, controller host and address, process tracker.
    pub controller: Parameters,
    /// Parameters the charm always sets.
    pub defaults: Parameters,
    /// Empty unless an accounting backend is related.
    pub accounting: Parameters,
    pub peers: Vec<PeerFragment>,
    /// Partition to mark with `Default=YES`.
    pub default_partition: Option<String>,
    /// Operator supplied `Key=Value` lines.
    pub user_overrides: String,
}

/// Build a complete slurm.conf from `fragments`.
///
/// Global parameters are layered in order: controller, defaults, accounting, then the operator's
/// overrides, each layer replacing keys set by the ones below. `SlurmctldParameters` is the
/// exception: the default and override values are unioned rather than replaced.
///
/// Any malformed input fails the whole pass; no partial configuration is returned.
pub fn assemble(fragments: &Fragments) -> Result<SlurmConf> {
    let overrides = parse_overrides(&fragments.user_overrides)?;
    let default_partition = fragments
        .default_partition
        .as_deref()
        .filter(|name| !name.is_empty());
    let mut conf = discover(&fragments.peers, default_partition)?;

    let mut parameters = fragments.controller.clone();
    parameters.merge(&fragments.defaults);
    parameters.merge(&fragments.accounting);
    parameters.merge(&overrides);

    if let Some(merged) = union_lists(
        fragments.defaults.get("SlurmctldParameters"),
        overrides.get("SlurmctldParameters"),
    ) {
        parameters.set("SlurmctldParameters", merged)?;
    }
    conf.parameters = parameters;

    debug!(
        "assembled slurm.conf: {} parameters, {} partitions, {} nodes",
        conf.parameters.len(),
        conf.partitions.len(),
        conf.nodes.len()
    );
    Ok(conf)
}

/// Union two comma separated flag lists. The result is sorted.
fn union_lists(left: Option<&str>, right: Option<&str>) -> Option<String> {
    if left.is_none() && right.is_none() {
        return None;
    }
    let flags: BTreeSet<&str> = left
        .into_iter()
        .chain(right)
        .flat_map(|list| list.split(','))
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .collect();
    Some(flags.into_iter().collect::<Vec<_>>().join(","))
}

/// Parse the operator's `slurm-conf-parameters` block.
///
/// One `Key=Value` per line, split on the first `=`. Blank lines and lines starting with `#` are
/// skipped.
pub fn parse_overrides(text: &str) -> Result<Parameters> {
    let mut parameters = Parameters::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(Error::Override {
                line: index + 1,
                content: line.to_string(),
            });
        };
        parameters.set(key.trim(), value.trim())?;
    }
    Ok(parameters)
}

/// Collect partitions, nodes and new-node down groupings from peer relation data.
///
/// A peer that hasn't published its partition yet contributes nothing, not even its nodes; it
/// is picked up on a later pass once the data is there.
pub fn discover(peers: &[PeerFragment], default_partition: Option<&str>) -> Result<SlurmConf> {
    let mut conf = SlurmConf::new();
    let mut new_nodes = BTreeSet::new();

    for peer in peers {
        let Some(mut partition) = peer_partition(peer)? else {
            debug!("no partition from '{}' yet, skipping", peer.application);
            continue;
        };

        for unit in &peer.units {
            let Some((node, is_new)) = unit_node(unit)? else {
                debug!("no node data from unit '{}'", unit.unit);
                continue;
            };
            partition.add_node(node.name());
            if is_new {
                new_nodes.insert(node.name().to_string());
            }
            conf.add_node(node);
        }

        if default_partition == Some(partition.name()) {
            partition.set("Default", "YES")?;
        }
        conf.add_partition(partition);
    }

    if !new_nodes.is_empty() {
        debug!("holding new nodes down: {new_nodes:?}");
        conf.down_nodes.push(DownNodes::new_nodes(new_nodes));
    }

    for (partition, node) in conf.dangling_members() {
        warn!("partition '{partition}' lists unknown node '{node}'");
    }

    Ok(conf)
}

fn peer_partition(peer: &PeerFragment) -> Result<Option<Partition>> {
    let Some(json) = peer.partition.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let context = format!("partition data from '{}'", peer.application);
    let object: Map<String, Value> =
        serde_json::from_str(json).map_err(|source| Error::Json {
            context: context.clone(),
            source,
        })?;

    let mut entries = object.into_iter();
    let Some((name, parameters)) = entries.next() else {
        return Ok(None);
    };
    if entries.next().is_some() {
        return Err(Error::Fragment {
            context,
            reason: "more than one partition".to_string(),
        });
    }
    let Value::Object(parameters) = parameters else {
        return Err(Error::Fragment {
            context,
            reason: format!("parameters of partition '{name}' are not an object"),
        });
    };

    let mut partition = Partition::new(entry_name(name, &context)?);
    for (key, value) in parameters {
        // Membership comes from the units on the relation, not from the partition data.
        if key == "Nodes" {
            continue;
        }
        if let Some(value) = scalar(&value, &context)? {
            partition.set(&key, value)?;
        }
    }
    Ok(Some(partition))
}

fn unit_node(unit: &UnitFragment) -> Result<Option<(Node, bool)>> {
    let Some(json) = unit.node.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let context = format!("node data from '{}'", unit.unit);
    let fragment: NodeFragment = serde_json::from_str(json).map_err(|source| Error::Json {
        context: context.clone(),
        source,
    })?;
    let Some(mut parameters) = fragment.node_parameters.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    let name = match parameters.remove("NodeName") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => {
            return Err(Error::Fragment {
                context,
                reason: "node_parameters has no NodeName".to_string(),
            })
        }
    };

    let mut node = Node::new(entry_name(name, &context)?);
    for (key, value) in parameters {
        if let Some(value) = scalar(&value, &context)? {
            node.set(&key, value)?;
        }
    }
    Ok(Some((node, fragment.new_node)))
}

/// Turn a JSON value into the text slurm.conf expects. `null` means unset; arrays are joined
/// with commas.
fn scalar(value: &Value, context: &str) -> Result<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) | Value::Null => Err(Error::Fragment {
                    context: context.to_string(),
                    reason: format!("unsupported list item {item}"),
                }),
                Value::String(s) => Ok(s.clone()),
                other => Ok(other.to_string()),
            })
            .collect::<Result<Vec<_>>>()?
            .join(","),
        Value::Object(_) => {
            return Err(Error::Fragment {
                context: context.to_string(),
                reason: format!("unsupported value {value}"),
            })
        }
    };
    entry_value(text, context).map(Some)
}

/// An entry value has to stay a single token on a single line. One pair of surrounding quotes
/// is dropped, since the renderer adds them back where needed.
fn entry_value(text: String, context: &str) -> Result<String> {
    let text = match text.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
        Some(inner) => inner.to_string(),
        None => text,
    };
    let reason = if text.contains(['\n', '\r']) {
        "line break"
    } else if text.contains('"') {
        "double quote"
    } else {
        return Ok(text);
    };
    Err(Error::Fragment {
        context: context.to_string(),
        reason: format!("value {text:?} contains a {reason}"),
    })
}

/// Partition and node names are written bare and as members of comma separated lists.
fn entry_name(name: String, context: &str) -> Result<String> {
    if name.is_empty() || name.contains(|c: char| c.is_whitespace() || "\",=".contains(c)) {
        return Err(Error::Fragment {
            context: context.to_string(),
            reason: format!("{name:?} is not a usable name"),
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_lists_dedups() {
        assert_eq!(union_lists(None, None), None);
        assert_eq!(
            union_lists(Some("enable_configless"), Some("enable_configless,other_flag")),
            Some("enable_configless,other_flag".to_string())
        );
        assert_eq!(union_lists(None, Some("b,a,")), Some("a,b".to_string()));
    }

    #[test]
    fn scalar_values() {
        assert_eq!(scalar(&Value::Null, "t").unwrap(), None);
        assert_eq!(
            scalar(&serde_json::json!(4096), "t").unwrap(),
            Some("4096".to_string())
        );
        assert_eq!(
            scalar(&serde_json::json!(["a", "b"]), "t").unwrap(),
            Some("a,b".to_string())
        );
        assert!(scalar(&serde_json::json!({"a": 1}), "t").is_err());
    }

    #[test]
    fn entry_values_stay_on_one_line() {
        assert_eq!(
            scalar(&serde_json::json!("\"under maintenance\""), "t").unwrap(),
            Some("under maintenance".to_string())
        );
        assert!(matches!(
            scalar(&serde_json::json!("x\nSlurmUser=root"), "t"),
            Err(Error::Fragment { .. })
        ));
        assert!(matches!(
            scalar(&serde_json::json!(["a", "b\r"]), "t"),
            Err(Error::Fragment { .. })
        ));
        assert!(scalar(&serde_json::json!("say \"hi\" there"), "t").is_err());
    }

    #[test]
    fn unusable_names() {
        assert_eq!(entry_name("node-0".to_string(), "t").unwrap(), "node-0");
        for name in ["", "node 0", "a,b", "a=b", "a\nb"] {
            assert!(entry_name(name.to_string(), "t").is_err(), "{name:?}");
        }
    }
}
