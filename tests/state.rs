// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use slurmctld_lib::{
        assemble::{discover, PeerFragment},
        config::CharmConfig,
        error::Error,
        state::*,
        test_env::{node_json, peer, unit},
    };

    fn compute(nodes: &[(&str, bool)]) -> PeerFragment {
        peer(
            "compute",
            Some(r#"{"compute": {}}"#),
            nodes
                .iter()
                .enumerate()
                .map(|(i, (name, new))| unit(&format!("compute/{i}"), Some(node_json(name, *new))))
                .collect(),
        )
    }

    #[test]
    fn new_nodes_resume_on_the_next_pass() {
        let mut state = ControllerState::new();

        let first = discover(&[compute(&[("node-a", true), ("node-b", true)])], None).unwrap();
        assert!(state.reconcile(&first).is_empty());
        assert_eq!(
            state.new_nodes,
            BTreeSet::from(["node-a".to_string(), "node-b".to_string()])
        );

        let second = discover(&[compute(&[("node-a", false), ("node-b", true)])], None).unwrap();
        assert_eq!(state.reconcile(&second), vec!["node-a".to_string()]);
        assert_eq!(state.new_nodes, BTreeSet::from(["node-b".to_string()]));

        // Nothing left to resume once the bookkeeping has caught up.
        assert!(state.reconcile(&second).is_empty());
    }

    #[test]
    fn departed_nodes_are_not_resumed() {
        let mut state = ControllerState::new();
        let first = discover(&[compute(&[("node-a", true)])], None).unwrap();
        state.reconcile(&first);

        let second = discover(&[compute(&[("node-b", false)])], None).unwrap();
        assert!(state.reconcile(&second).is_empty());
        assert!(state.new_nodes.is_empty());
    }

    #[test]
    fn node_lifecycle() {
        let conf = discover(&[compute(&[("node-a", true), ("node-b", false)])], None).unwrap();
        assert_eq!(NodeLifecycle::of("node-a", &conf), NodeLifecycle::New);
        assert_eq!(NodeLifecycle::of("node-b", &conf), NodeLifecycle::Available);
        assert_eq!(NodeLifecycle::of("node-c", &conf), NodeLifecycle::Pending);
        assert_eq!(NodeLifecycle::New.to_string(), "new");
    }

    #[test]
    fn config_changes() {
        let mut state = ControllerState::new();
        let mut config = CharmConfig::new();

        assert_eq!(state.apply_config(&config), ConfigChange::default());

        config.default_partition = "batch".to_string();
        config.health_check_params = "-M root".to_string();
        let change = state.apply_config(&config);
        assert!(change.rewrite_slurm_conf);
        assert_eq!(change.nhc_params.as_deref(), Some("-M root"));
        assert_eq!(state.default_partition, "batch");

        // Applying the same options again changes nothing.
        assert_eq!(state.apply_config(&config), ConfigChange::default());

        config.slurm_conf_parameters = "MaxJobCount=20000".to_string();
        let change = state.apply_config(&config);
        assert!(change.rewrite_slurm_conf);
        assert_eq!(change.nhc_params, None);

        // Clearing the default partition is not a change.
        config.default_partition.clear();
        assert!(!state.apply_config(&config).rewrite_slurm_conf);
        assert_eq!(state.default_partition, "batch");
    }

    #[test]
    fn slurmdbd_host_changes() {
        let mut state = ControllerState::new();
        assert!(!state.set_slurmdbd_host(""));
        assert!(state.set_slurmdbd_host("dbd-0"));
        assert!(!state.set_slurmdbd_host("dbd-0"));
        assert!(state.set_slurmdbd_host(""));
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/state.toml");

        assert_eq!(ControllerState::load(&path).unwrap(), ControllerState::new());

        let mut state = ControllerState::new();
        state.slurm_installed = true;
        state.munge_key = "a2V5".to_string();
        state.new_nodes.insert("node-a".to_string());
        state.save(&path).unwrap();
        assert!(state.updated.is_some());

        let loaded = ControllerState::load(&path).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn newer_state_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, format!("version = {}\n", STATE_VERSION + 1)).unwrap();

        assert!(matches!(
            ControllerState::load(&path),
            Err(Error::StateVersion { .. })
        ));
    }
}
