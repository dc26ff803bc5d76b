// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;
use log::info;

use crate::{
    commands::{Cli, Handle, HandledResult},
    ops,
};

#[derive(Args, Debug)]
pub struct KeysArgs {
    /// Defaults to $MUNGE_KEY, or /etc/munge/munge.key.
    #[arg(long)]
    pub munge_key: Option<String>,

    /// Defaults to $SLURM_JWT_KEY, or /var/spool/slurmctld/jwt_hs256.key.
    #[arg(long)]
    pub jwt_key: Option<String>,

    /// Generate new keys even if the state file already holds some.
    #[arg(long)]
    pub regenerate: bool,

    #[arg(long)]
    pub no_chown: bool,
}

/// Install the munge and JWT keys kept in the state file, generating them first if this
/// controller doesn't have any yet. Afterwards Slurm counts as installed, and `write` starts
/// running scontrol.
pub fn keys(cli: &Cli, args: &KeysArgs) -> HandledResult<()> {
    let mut state = cli.controller_state()?;

    if args.regenerate || state.munge_key.is_empty() {
        info!("generating munge key");
        state.munge_key =
            ops::generate_munge_key().handle_err(|e| eprintln!("Could not generate munge key: {e}"))?;
    }
    if args.regenerate || state.jwt_rsa.is_empty() {
        info!("generating JWT key");
        state.jwt_rsa =
            ops::generate_jwt_key().handle_err(|e| eprintln!("Could not generate JWT key: {e}"))?;
    }

    let (munge_owner, slurm_owner) = match args.no_chown {
        true => (None, None),
        false => (Some(ops::MUNGE_OWNER), Some(ops::SLURM_OWNER)),
    };
    let munge_key = args.munge_key.clone().unwrap_or_else(crate::default_munge_key_path);
    ops::write_munge_key(&munge_key, &state.munge_key, munge_owner)
        .handle_err(|e| eprintln!("Could not write munge key: {e}"))?;
    let jwt_key = args.jwt_key.clone().unwrap_or_else(crate::default_jwt_key_path);
    ops::write_jwt_key(&jwt_key, &state.jwt_rsa, slurm_owner)
        .handle_err(|e| eprintln!("Could not write JWT key: {e}"))?;

    state.slurm_installed = true;
    state
        .save(cli.state_path())
        .handle_err(|e| eprintln!("Could not save state: {e}"))
}
