// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use crate::{
    conf::{split_list, DownNodes, Node, Partition, SlurmConf},
    error::{Error, Result},
};

/// Split an entry line on whitespace, keeping double quoted runs together.
fn tokenize(line: &str, line_number: usize) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if quoted {
        return Err(Error::SlurmConf {
            line: line_number,
            reason: "unterminated quote".to_string(),
        });
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Drop one pair of quotes around a whole value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn pairs(line: &str, line_number: usize) -> Result<Vec<(String, String)>> {
    tokenize(line, line_number)?
        .into_iter()
        .map(|token| match token.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), unquote(value).to_string())),
            None => Err(Error::SlurmConf {
                line: line_number,
                reason: format!("'{token}' is not of the form Key=Value"),
            }),
        })
        .collect()
}

fn parse_partition(line: &str, line_number: usize) -> Result<Option<Partition>> {
    let mut pairs = pairs(line, line_number)?.into_iter();
    let Some((_, name)) = pairs.next() else {
        return Ok(None);
    };
    let rest: Vec<(String, String)> = pairs.collect();

    // The placeholder written when there are no partitions.
    if name == "DEFAULT" && !rest.iter().any(|(key, _)| key == "Nodes") {
        return Ok(None);
    }

    let mut partition = Partition::new(name);
    for (key, value) in rest {
        partition.set(&key, value)?;
    }
    Ok(Some(partition))
}

fn parse_node(line: &str, line_number: usize) -> Result<Node> {
    let mut pairs = pairs(line, line_number)?.into_iter();
    let Some((_, name)) = pairs.next() else {
        return Err(Error::SlurmConf {
            line: line_number,
            reason: "missing NodeName".to_string(),
        });
    };
    let mut node = Node::new(name);
    for (key, value) in pairs {
        node.set(&key, value)?;
    }
    Ok(node)
}

fn parse_down_nodes(line: &str, line_number: usize) -> Result<DownNodes> {
    let mut nodes = None;
    let mut state = None;
    let mut reason = None;
    for (key, value) in pairs(line, line_number)? {
        match key.as_str() {
            "DownNodes" => nodes = Some(split_list(&value)),
            "State" => state = Some(value),
            "Reason" => reason = Some(value),
            other => {
                return Err(Error::SlurmConf {
                    line: line_number,
                    reason: format!("unexpected key '{other}' in DownNodes entry"),
                })
            }
        }
    }
    match (nodes, state, reason) {
        (Some(nodes), Some(state), Some(reason)) => Ok(DownNodes {
            nodes,
            state,
            reason,
        }),
        _ => Err(Error::SlurmConf {
            line: line_number,
            reason: "DownNodes entries need DownNodes, State and Reason".to_string(),
        }),
    }
}

/// Read slurm.conf text, as written by [`crate::render::as_slurm_conf`], back into a
/// [`SlurmConf`].
///
/// Every line that isn't a partition, node or down nodes entry is read as a single top level
/// `Key=Value`, so values may contain spaces and further `=` signs.
pub fn from_slurm_conf(text: &str) -> Result<SlurmConf> {
    let mut conf = SlurmConf::new();

    for (index, line) in text.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("PartitionName=") {
            if let Some(partition) = parse_partition(line, line_number)? {
                conf.add_partition(partition);
            }
        } else if line.starts_with("NodeName=") {
            conf.add_node(parse_node(line, line_number)?);
        } else if line.starts_with("DownNodes=") {
            conf.down_nodes.push(parse_down_nodes(line, line_number)?);
        } else {
            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::SlurmConf {
                    line: line_number,
                    reason: format!("'{line}' is not of the form Key=Value"),
                });
            };
            conf.parameters.set(key.trim(), value.trim())?;
        }
    }

    Ok(conf)
}
