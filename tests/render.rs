// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

#[cfg(test)]
mod tests {
    use slurmctld_lib::{
        conf::{DownNodes, Node, Partition, SlurmConf},
        parse::from_slurm_conf,
        render::{as_slurm_conf, as_snap_conf, DEFAULT_PARTITION_ENTRY},
    };

    fn small_cluster() -> SlurmConf {
        let mut conf = SlurmConf::new();
        conf.parameters.set("ClusterName", "c").unwrap();
        conf.parameters.set("AuthType", "auth/munge").unwrap();

        let mut batch = Partition::new("batch");
        batch.add_node("b-1");
        batch.add_node("a-1");
        batch.set("State", "UP").unwrap();
        batch.set("MaxTime", "10").unwrap();
        conf.add_partition(batch);

        for name in ["a-1", "b-1"] {
            let mut node = Node::new(name);
            node.set("RealMemory", "7850").unwrap();
            node.set("CPUs", "4").unwrap();
            conf.add_node(node);
        }

        conf.down_nodes.push(DownNodes::new_nodes(["a-1"]));
        conf
    }

    fn headers(text: &str) -> Vec<&str> {
        text.lines().filter(|line| line.starts_with("# ")).collect()
    }

    #[test]
    fn renders_exact_text() {
        let expected = "# Parameters\n\
                        AuthType=auth/munge\n\
                        ClusterName=c\n\
                        \n\
                        # Partitions\n\
                        PartitionName=batch Nodes=a-1,b-1 MaxTime=10 State=UP\n\
                        \n\
                        # Nodes\n\
                        NodeName=a-1 CPUs=4 RealMemory=7850\n\
                        NodeName=b-1 CPUs=4 RealMemory=7850\n\
                        \n\
                        # DownNodes\n\
                        DownNodes=a-1 State=DOWN Reason=\"New node.\"";
        assert_eq!(as_slurm_conf(&small_cluster()), expected);
    }

    #[test]
    fn sections_always_present_in_order() {
        let expected = vec!["# Parameters", "# Partitions", "# Nodes", "# DownNodes"];
        assert_eq!(headers(&as_slurm_conf(&SlurmConf::new())), expected);
        assert_eq!(headers(&as_slurm_conf(&small_cluster())), expected);
    }

    #[test]
    fn no_partitions_gives_default_entry() {
        let text = as_slurm_conf(&SlurmConf::new());
        let partitions: Vec<&str> = text
            .lines()
            .skip_while(|line| *line != "# Partitions")
            .skip(1)
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(partitions, vec![DEFAULT_PARTITION_ENTRY]);

        let snap = as_snap_conf(&SlurmConf::new());
        assert_eq!(snap.get("partition-name").map(String::as_str), Some("DEFAULT"));
        assert_eq!(snap.get("default").map(String::as_str), Some("YES"));
    }

    #[test]
    fn empty_partition_renders_quoted_members() {
        let mut conf = SlurmConf::new();
        conf.add_partition(Partition::new("idle"));
        assert!(as_slurm_conf(&conf).contains("PartitionName=idle Nodes=\"\"\n"));

        let snap = as_snap_conf(&conf);
        assert_eq!(snap.get("idle.PartitionName").map(String::as_str), Some("idle"));
        assert!(!snap.contains_key("idle.Nodes"));
    }

    #[test]
    fn only_set_fields_are_rendered() {
        let text = as_slurm_conf(&small_cluster());
        assert_eq!(text.matches("ClusterName=").count(), 1);
        assert_eq!(text.matches("AuthType=").count(), 1);
        assert!(!text.contains("SlurmctldHost"));
        assert!(!text.contains("Default="));
        assert!(!text.contains("=None"));
        assert!(!text.contains("Features"));
    }

    #[test]
    fn snap_mapping_keys() {
        let snap = as_snap_conf(&small_cluster());
        let get = |key: &str| snap.get(key).map(String::as_str);

        assert_eq!(get("ClusterName"), Some("c"));
        assert_eq!(get("batch.PartitionName"), Some("batch"));
        assert_eq!(get("batch.Nodes"), Some("a-1,b-1"));
        assert_eq!(get("batch.MaxTime"), Some("10"));
        // Node keys are shared, so the last node wins.
        assert_eq!(get("NodeName"), Some("b-1"));
        assert_eq!(get("CPUs"), Some("4"));
        assert_eq!(get("DownNodes"), Some("a-1"));
        assert_eq!(get("Reason"), Some("New node."));
        assert!(!snap.contains_key("partition-name"));
    }

    #[test]
    fn rendered_text_parses_back() {
        let mut conf = small_cluster();
        conf.parameters
            .set("RebootProgram", "/usr/sbin/reboot --reboot")
            .unwrap();
        conf.parameters
            .set("AuthAltParameters", "jwt_key=/var/lib/slurm/checkpoint/jwt_hs256.key")
            .unwrap();
        let mut drained = Node::new("c-1");
        drained.set("State", "DRAIN").unwrap();
        drained.set("Reason", "under maintenance").unwrap();
        conf.add_node(drained);
        let mut batch = conf.partitions["batch"].clone();
        batch.set("AllowAccounts", "ops team").unwrap();
        conf.add_partition(batch);

        let text = as_slurm_conf(&conf);
        assert!(text.contains("NodeName=c-1 Reason=\"under maintenance\" State=DRAIN\n"));
        assert!(text.contains("AllowAccounts=\"ops team\""));

        let parsed = from_slurm_conf(&text).unwrap();
        assert_eq!(parsed, conf);
        assert_eq!(as_slurm_conf(&parsed), as_slurm_conf(&conf));
    }
}
