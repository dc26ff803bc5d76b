// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use clap::Args;
use log::info;

use crate::{
    commands::{Cli, Handle, HandledResult, Pass},
    ops,
    snap::Scontrol,
};

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Defaults to $SLURM_CONF, or /etc/slurm/slurm.conf.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Defaults to $SLURM_CGROUP_CONF, or /etc/slurm/cgroup.conf.
    #[arg(long)]
    pub cgroup_output: Option<String>,

    /// Leave file ownership alone instead of handing files to the slurm user.
    #[arg(long)]
    pub no_chown: bool,

    /// Don't run scontrol. Nodes that are ready to be resumed are still printed and recorded
    /// as resumed in the state file.
    #[arg(long)]
    pub no_reconfigure: bool,
}

/// One full write pass.
///
/// Nothing is written unless slurm.conf assembles cleanly, and slurm.conf is left alone when
/// neither the options nor the assembled file changed. After that, nodes that are no longer
/// held down as new are resumed and the state file is updated.
///
/// Changed health check parameters are printed as `nhc-params=<params>` for the caller to hand
/// to the slurmd peers. scontrol is only run once Slurm has been installed with `keys`.
pub fn write(cli: &Cli, args: &WriteArgs) -> HandledResult<()> {
    let Pass {
        config,
        mut state,
        change,
        conf,
    } = cli.assemble()?;

    if let Some(nhc_params) = &change.nhc_params {
        println!("nhc-params={nhc_params}");
    }

    let owner = match args.no_chown {
        true => None,
        false => Some(ops::SLURM_OWNER),
    };
    let output = args.output.clone().unwrap_or_else(crate::default_slurm_conf_path);
    let unchanged = !change.rewrite_slurm_conf && ops::slurm_conf_is_current(&output, &conf);
    if unchanged {
        info!("{output} is up to date");
    } else {
        ops::write_slurm_conf(&output, &conf, owner)
            .handle_err(|e| eprintln!("Could not write slurm.conf: {e}"))?;
    }

    if !config.cgroup_parameters.is_empty() {
        let cgroup_output = args
            .cgroup_output
            .clone()
            .unwrap_or_else(crate::default_cgroup_conf_path);
        ops::write_cgroup_conf(&cgroup_output, &config.cgroup_parameters, owner)
            .handle_err(|e| eprintln!("Could not write cgroup.conf: {e}"))?;
    }

    let run_scontrol = !args.no_reconfigure && state.slurm_installed;
    if !args.no_reconfigure && !state.slurm_installed {
        info!("slurm is not installed yet, not running scontrol");
    }

    if run_scontrol && !unchanged {
        Scontrol::Reconfigure
            .run()
            .handle_err(|e| eprintln!("Could not reconfigure slurmctld: {e}"))?;
    }

    let resume = state.reconcile(&conf);
    if !resume.is_empty() {
        println!("resuming {}", resume.join(","));
        if run_scontrol {
            Scontrol::Resume { nodes: resume }
                .run()
                .handle_err(|e| eprintln!("Could not resume nodes: {e}"))?;
        }
    }

    state
        .save(cli.state_path())
        .handle_err(|e| eprintln!("Could not save state: {e}"))
}
