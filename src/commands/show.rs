// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;

use crate::commands::{Handle, HandledResult};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Defaults to $SLURM_CONF, or /etc/slurm/slurm.conf.
    #[arg(long)]
    pub path: Option<String>,
}

pub fn show(args: &ShowArgs) -> HandledResult<()> {
    let path = args.path.clone().unwrap_or_else(crate::default_slurm_conf_path);
    let slurm_conf = std::fs::read_to_string(&path)
        .handle_err(|e| eprintln!("Could not read \"{path}\": {e}"))?;
    print!("{slurm_conf}");
    Ok(())
}
