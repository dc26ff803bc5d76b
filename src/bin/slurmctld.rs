// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Parser;

use slurmctld_lib::commands::{self, Cli};

/// The slurmctld binary assembles, installs and inspects the controller's slurm.conf.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("SLURMCTLD_LOG", "warn"))
        .init();

    let args = Cli::parse();

    if commands::main(&args).is_err() {
        std::process::exit(1);
    }
}
