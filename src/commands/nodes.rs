// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;
use log::info;

use crate::{
    commands::{Handle, HandledResult},
    snap::Scontrol,
};

#[derive(Args, Debug)]
pub struct DrainArgs {
    #[arg(long)]
    pub reason: String,

    #[arg(required = true)]
    pub nodes: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    #[arg(required = true)]
    pub nodes: Vec<String>,
}

pub fn drain(args: &DrainArgs) -> HandledResult<()> {
    info!("draining {:?} because {}", args.nodes, args.reason);
    Scontrol::Drain {
        nodes: args.nodes.clone(),
        reason: args.reason.clone(),
    }
    .run()
    .handle_err(|e| eprintln!("Error draining {}: {e}", args.nodes.join(",")))?;
    println!("draining {}", args.nodes.join(","));
    Ok(())
}

pub fn resume(args: &ResumeArgs) -> HandledResult<()> {
    info!("resuming {:?}", args.nodes);
    Scontrol::Resume {
        nodes: args.nodes.clone(),
    }
    .run()
    .handle_err(|e| eprintln!("Error resuming {}: {e}", args.nodes.join(",")))?;
    println!("resuming {}", args.nodes.join(","));
    Ok(())
}
