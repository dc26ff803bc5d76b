// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::fs;
use std::io;
use std::process::{Command, Output};

use crate::assemble::{PeerFragment, UnitFragment};

/// Given a relative `path` in the test directory, prepend the
/// full path to the test directory.
fn test_path(path: &str) -> String {
    std::env::var("CARGO_MANIFEST_DIR").unwrap() + "/tests/" + path
}

trait IgnoreEexist {
    fn ignore_eexist(self) -> Self;
}

impl IgnoreEexist for io::Result<()> {
    fn ignore_eexist(self) -> Self {
        match self {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// A TestEnvironment holds a test's "private" working directory, in which the charm config,
/// inventory, state file and any written slurm.conf for the test live.
///
/// All access to the test's files should be done via methods on TestEnvironment rather than
/// coded in the tests themselves.
pub struct TestEnvironment {
    /// The path to this test's private working directory.
    private_dir_path: String,

    /// The binary path has to be passed in as an argument from the tests because the
    /// CARGO_BIN_EXE_* environment variables aren't defined during non-test compilation.
    binary_path: String,
}

impl TestEnvironment {
    /// Set up an environment for a test named `test_id`, starting from an empty private
    /// directory.
    pub fn new(test_id: &str, binary_path: &str) -> Self {
        let private_dir_path = test_path(&format!("test_output/{test_id}"));
        // Start by emptying out the test's private directory, so that files from a previous test
        // run don't impact this run:
        match fs::remove_dir_all(&private_dir_path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => panic!("Could not clean up test directory: {e}"),
        };

        fs::create_dir(test_path("test_output"))
            .ignore_eexist()
            .unwrap();
        fs::create_dir(&private_dir_path).unwrap();

        Self {
            private_dir_path,
            binary_path: binary_path.to_string(),
        }
    }

    /// Full path of `name` inside the private directory.
    pub fn path(&self, name: &str) -> String {
        format!("{}/{name}", self.private_dir_path)
    }

    pub fn write_file(&self, name: &str, contents: &str) -> String {
        let path = self.path(name);
        fs::write(&path, contents).unwrap_or_else(|e| panic!("failed to write '{path}': {e}"));
        path
    }

    pub fn read_file(&self, name: &str) -> String {
        let path = self.path(name);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read '{path}': {e}"))
    }

    /// Run the binary with the test's `config.toml`, `inventory.toml` and `state.toml`.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .arg("--config")
            .arg(self.path("config.toml"))
            .arg("--inventory")
            .arg(self.path("inventory.toml"))
            .arg("--state")
            .arg(self.path("state.toml"))
            .args(args)
            .env("SLURMCTLD_LOG", "debug")
            .output()
            .expect("could not launch process")
    }
}

/// JSON a slurmd unit publishes for its node.
pub fn node_json(name: &str, new_node: bool) -> String {
    serde_json::json!({
        "new_node": new_node,
        "node_parameters": {
            "NodeName": name,
            "CPUs": "4",
            "RealMemory": "7850",
        }
    })
    .to_string()
}

pub fn unit(name: &str, node: Option<String>) -> UnitFragment {
    UnitFragment {
        unit: name.to_string(),
        node,
    }
}

pub fn peer(application: &str, partition: Option<&str>, units: Vec<UnitFragment>) -> PeerFragment {
    PeerFragment {
        application: application.to_string(),
        partition: partition.map(str::to_string),
        units,
    }
}
