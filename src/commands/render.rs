// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::{
    commands::{Cli, Handle, HandledResult},
    ops, render,
    snap::{self, Service},
};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Write to this path instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
}

pub fn render(cli: &Cli, args: &RenderArgs) -> HandledResult<()> {
    let conf = cli.assemble()?.conf;

    match &args.output {
        Some(path) => ops::write_slurm_conf(path, &conf, None)
            .handle_err(|e| eprintln!("Could not write slurm.conf: {e}")),
        None => {
            println!("{}", render::as_slurm_conf(&conf));
            Ok(())
        }
    }
}

#[derive(Args, Debug)]
pub struct SnapConfigArgs {
    /// Store the keys with `snap set` instead of printing them.
    #[arg(long)]
    pub apply: bool,
}

pub fn snap_config(cli: &Cli, args: &SnapConfigArgs) -> HandledResult<()> {
    let conf = cli.assemble()?.conf;
    let entries = render::as_snap_conf(&conf);

    if args.apply {
        return snap::set_configs(Service::Slurmctld, &entries)
            .handle_err(|e| eprintln!("Could not set snap configuration: {e}"));
    }
    for (key, value) in &entries {
        println!("{key}={value}");
    }
    Ok(())
}
