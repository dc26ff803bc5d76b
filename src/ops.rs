// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::Path,
    process::Command,
};

use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, error, warn};
use nix::unistd::{self, Group, User};

use crate::{
    conf::SlurmConf,
    defaults::{MUNGE_GROUP, MUNGE_USER, SLURM_GROUP, SLURM_USER},
    error::{Error, Result},
    render,
};

/// Run `program` with `args`, returning its stdout. A non-zero exit is an error carrying the
/// program's stderr.
pub fn run(program: &str, args: &[String]) -> Result<Vec<u8>> {
    debug!("executing `{program} {}`", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(Error::io(program))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!("`{program}` failed: {stderr}");
        return Err(Error::Command {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }
    Ok(output.stdout)
}

/// Short hostname of this machine.
pub fn hostname() -> Result<String> {
    let hostname = unistd::gethostname().map_err(|source| Error::Sys {
        context: "gethostname".to_string(),
        source,
    })?;
    let hostname = hostname.to_string_lossy();
    Ok(hostname.split('.').next().unwrap_or_default().to_string())
}

/// Whether this machine is a container, according to `systemd-detect-virt`.
pub fn is_container() -> bool {
    match Command::new("systemd-detect-virt")
        .arg("--container")
        .output()
    {
        Ok(output) => output.status.success(),
        Err(e) => {
            warn!("could not run systemd-detect-virt, assuming not a container: {e}");
            false
        }
    }
}

/// The user and group a written file should belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub user: &'static str,
    pub group: &'static str,
}

pub const SLURM_OWNER: Owner = Owner {
    user: SLURM_USER,
    group: SLURM_GROUP,
};

pub const MUNGE_OWNER: Owner = Owner {
    user: MUNGE_USER,
    group: MUNGE_GROUP,
};

fn chown(path: &Path, owner: Owner) -> Result<()> {
    let lookup_failed = |kind: &'static str, name: &str| Error::User {
        kind,
        name: name.to_string(),
    };
    let sys = |source| Error::Sys {
        context: format!("chown {}", path.display()),
        source,
    };
    let user = User::from_name(owner.user)
        .map_err(sys)?
        .ok_or_else(|| lookup_failed("user", owner.user))?;
    let group = Group::from_name(owner.group)
        .map_err(sys)?
        .ok_or_else(|| lookup_failed("group", owner.group))?;
    unistd::chown(path, Some(user.uid), Some(group.gid)).map_err(sys)
}

/// Write `contents` to `path`, then restrict its mode and hand it to `owner` if given.
fn write_file(path: &Path, contents: &[u8], mode: Option<u32>, owner: Option<Owner>) -> Result<()> {
    fs::write(path, contents).map_err(Error::io(path))?;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(Error::io(path))?;
    }
    if let Some(owner) = owner {
        chown(path, owner)?;
    }
    Ok(())
}

pub fn write_slurm_conf(path: impl AsRef<Path>, conf: &SlurmConf, owner: Option<Owner>) -> Result<()> {
    let path = path.as_ref();
    debug!("writing {}", path.display());
    write_file(path, render::as_slurm_conf(conf).as_bytes(), None, owner)
}

/// Whether the file at `path` already holds exactly what [`write_slurm_conf`] would write.
pub fn slurm_conf_is_current(path: impl AsRef<Path>, conf: &SlurmConf) -> bool {
    fs::read_to_string(path).is_ok_and(|installed| installed == render::as_slurm_conf(conf))
}

pub fn write_cgroup_conf(path: impl AsRef<Path>, cgroup_conf: &str, owner: Option<Owner>) -> Result<()> {
    write_file(path.as_ref(), cgroup_conf.as_bytes(), Some(0o600), owner)
}

pub fn write_jwt_key(path: impl AsRef<Path>, key: &str, owner: Option<Owner>) -> Result<()> {
    write_file(path.as_ref(), key.as_bytes(), Some(0o600), owner)
}

/// Decode a base64 munge key and install it.
pub fn write_munge_key(path: impl AsRef<Path>, key: &str, owner: Option<Owner>) -> Result<()> {
    let key = STANDARD.decode(key.trim())?;
    write_file(path.as_ref(), &key, Some(0o600), owner)
}

/// Read an installed munge key as base64.
pub fn read_munge_key(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let key = fs::read(path).map_err(Error::io(path))?;
    Ok(STANDARD.encode(key))
}

/// Create a new munge key with `mungekey`, returned as base64.
pub fn generate_munge_key() -> Result<String> {
    let dir = tempfile::tempdir().map_err(Error::io("temporary directory"))?;
    let key_path = dir.path().join("munge.key");
    run(
        "mungekey",
        &[
            "-c".to_string(),
            "-k".to_string(),
            key_path.display().to_string(),
            "-b".to_string(),
            "2048".to_string(),
        ],
    )?;
    read_munge_key(&key_path)
}

/// Create a new 2048 bit RSA key, PEM encoded, for signing JWTs.
pub fn generate_jwt_key() -> Result<String> {
    let pem = run("openssl", &["genrsa".to_string(), "2048".to_string()])?;
    Ok(String::from_utf8_lossy(&pem).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::SlurmConf;

    #[test]
    fn munge_key_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("munge.key");
        let key = STANDARD.encode(b"not a very secret key");

        write_munge_key(&path, &key, None).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(&path).unwrap(), b"not a very secret key");
        assert_eq!(read_munge_key(&path).unwrap(), key);
    }

    #[test]
    fn munge_key_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("munge.key");
        assert!(matches!(
            write_munge_key(&path, "!!not base64!!", None),
            Err(Error::Base64(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn slurm_conf_is_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slurm.conf");
        let conf = SlurmConf::new();

        write_slurm_conf(&path, &conf, None).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            render::as_slurm_conf(&conf)
        );
    }

    #[test]
    fn installed_slurm_conf_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slurm.conf");
        let mut conf = SlurmConf::new();
        assert!(!slurm_conf_is_current(&path, &conf));

        write_slurm_conf(&path, &conf, None).unwrap();
        assert!(slurm_conf_is_current(&path, &conf));

        conf.parameters.set("ClusterName", "c").unwrap();
        assert!(!slurm_conf_is_current(&path, &conf));
    }

    #[test]
    fn failing_command_is_an_error() {
        assert!(matches!(
            run("false", &[]),
            Err(Error::Command { .. })
        ));
    }
}
