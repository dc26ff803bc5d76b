// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod keys;
pub mod nodes;
pub mod render;
pub mod show;
pub mod validate;
pub mod write;

use std::path::Path;

use {
    keys::KeysArgs,
    nodes::{DrainArgs, ResumeArgs},
    render::{RenderArgs, SnapConfigArgs},
    show::ShowArgs,
    validate::ValidateArgs,
    write::WriteArgs,
};

use clap::{Parser, Subcommand};
use log::info;

use crate::{
    assemble::assemble,
    conf::SlurmConf,
    config::{CharmConfig, Inventory},
    state::{ConfigChange, ControllerState},
};

/// A `HandledError` represents an error that has already been handled. When you call a function
/// that returns a `HandledError` or `HandledResult`, you don't need to do anything with that error,
/// other than just be aware that it happened, and return it on to your caller.
///
/// `main()` has a special responsibility: since its "caller" is, in a certain sense, the operating
/// system, `main()` must return a nonzero exit status when it gets a `HandledError`.
///
/// The primary way to construct a `HandledError` is with the `handle_err()` function, which turns a
/// generic error into a `HandledError`, and also runs some caller-provided code to handle the
/// error. That provided code would normally do something like report the error to stderr.
#[derive(Debug, PartialEq)]
pub struct HandledError {}

pub type HandledResult<T> = std::result::Result<T, HandledError>;

pub fn handled_error() -> HandledResult<()> {
    HandledResult::Err(HandledError {})
}

pub trait Handle<T, F> {
    fn handle_err(self, handler: F) -> HandledResult<T>;
}

impl<T, E, F: FnOnce(E)> Handle<T, F> for std::result::Result<T, E> {
    /// Handle an error by running the provided `handler` code, giving it the error.
    ///
    /// Then, return a `HandledResult`, so that transitive callers of this function know that they
    /// do not need to do anything further to handle the error.
    fn handle_err(self, handler: F) -> HandledResult<T> {
        self.map_err(|e| {
            handler(e);
            HandledError {}
        })
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Charm options, TOML.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Relation data received from slurmd and slurmdbd, TOML.
    #[arg(long, global = true)]
    pub inventory: Option<String>,

    /// Controller state carried between runs, TOML.
    #[arg(long, global = true)]
    pub state: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble slurm.conf and print it.
    Render(RenderArgs),
    /// Assemble slurm.conf as slurm snap configuration keys.
    SnapConfig(SnapConfigArgs),
    /// Assemble and install slurm.conf, then bring slurmctld and the state file up to date.
    Write(WriteArgs),
    /// Print the installed slurm.conf.
    Show(ShowArgs),
    /// Check an existing slurm.conf and summarize it.
    Validate(ValidateArgs),
    /// Install the munge and JWT keys, generating them on first use.
    Keys(KeysArgs),
    Drain(DrainArgs),
    Resume(ResumeArgs),
}

impl Cli {
    pub fn state_path(&self) -> String {
        self.state.clone().unwrap_or_else(crate::default_statefile_path)
    }

    /// Load the charm options. Without `--config`, a missing default file means every option
    /// keeps its default.
    pub fn charm_config(&self) -> HandledResult<CharmConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => {
                let path = crate::default_config_path();
                if !Path::new(&path).exists() {
                    return Ok(CharmConfig::new());
                }
                path
            }
        };
        CharmConfig::load(&path).handle_err(|e| eprintln!("Could not load config: {e}"))
    }

    pub fn inventory(&self) -> HandledResult<Inventory> {
        let path = self
            .inventory
            .clone()
            .unwrap_or_else(crate::default_inventory_path);
        Inventory::load_or_default(&path).handle_err(|e| eprintln!("Could not load inventory: {e}"))
    }

    pub fn controller_state(&self) -> HandledResult<ControllerState> {
        ControllerState::load(self.state_path())
            .handle_err(|e| eprintln!("Could not load state: {e}"))
    }

    /// Record the charm options and accounting host in the controller state, then assemble
    /// slurm.conf from that state and the inventory's peers. Nothing is saved.
    pub fn assemble(&self) -> HandledResult<Pass> {
        let config = self.charm_config()?;
        let inventory = self.inventory()?;
        let mut state = self.controller_state()?;

        let mut change = state.apply_config(&config);
        if state.set_slurmdbd_host(&inventory.slurmdbd_host) {
            info!("accounting host is now '{}'", inventory.slurmdbd_host);
            change.rewrite_slurm_conf = true;
        }

        let fragments = config
            .fragments(&state, inventory.slurmd)
            .handle_err(|e| eprintln!("Could not gather configuration: {e}"))?;
        let conf =
            assemble(&fragments).handle_err(|e| eprintln!("Could not assemble slurm.conf: {e}"))?;
        Ok(Pass {
            config,
            state,
            change,
            conf,
        })
    }
}

/// One assembly pass, and the updated state it was assembled from.
pub struct Pass {
    pub config: CharmConfig,
    pub state: ControllerState,
    pub change: ConfigChange,
    pub conf: SlurmConf,
}

pub fn main(cli: &Cli) -> HandledResult<()> {
    match &cli.command {
        Commands::Render(args) => render::render(cli, args),
        Commands::SnapConfig(args) => render::snap_config(cli, args),
        Commands::Write(args) => write::write(cli, args),
        Commands::Show(args) => show::show(args),
        Commands::Validate(args) => validate::validate(args),
        Commands::Keys(args) => keys::keys(cli, args),
        Commands::Drain(args) => nodes::drain(args),
        Commands::Resume(args) => nodes::resume(args),
    }
}
