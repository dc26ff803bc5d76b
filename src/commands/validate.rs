// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::{
    commands::{handled_error, Handle, HandledResult},
    parse,
    state::NodeLifecycle,
};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Defaults to $SLURM_CONF, or /etc/slurm/slurm.conf.
    #[arg(long)]
    pub path: Option<String>,
}

/// Parse a slurm.conf and print what it contains. Partition members without a node entry are
/// reported and make validation fail.
pub fn validate(args: &ValidateArgs) -> HandledResult<()> {
    let path = args.path.clone().unwrap_or_else(crate::default_slurm_conf_path);
    let text = std::fs::read_to_string(&path)
        .handle_err(|e| eprintln!("Could not read \"{path}\": {e}"))?;
    let conf = parse::from_slurm_conf(&text).handle_err(|e| eprintln!("{path}: {e}"))?;

    println!("{} parameters", conf.parameters.len());
    for partition in conf.partitions.values() {
        let default = match partition.is_default() {
            true => " (default)",
            false => "",
        };
        println!(
            "partition {}{default}: {} nodes",
            partition.name(),
            partition.nodes().len()
        );
    }
    for node in conf.nodes.keys() {
        println!("node {node}: {}", NodeLifecycle::of(node, &conf));
    }

    let dangling = conf.dangling_members();
    for (partition, node) in &dangling {
        eprintln!("partition {partition} lists unknown node {node}");
    }
    if !dangling.is_empty() {
        return handled_error();
    }
    Ok(())
}
