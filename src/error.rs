// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A key that isn't in the catalog for its record kind.
    #[error("'{field}' is not a recognized {kind} key")]
    SchemaViolation { kind: &'static str, field: String },

    /// A value that can't be written on a single slurm.conf line.
    #[error("value of {kind} key '{field}' contains a line break")]
    LineBreak { kind: &'static str, field: String },

    /// `PartitionName` and `NodeName` identify a record and can't be set as attributes.
    #[error("'{field}' identifies a {kind} and can't be set as an attribute")]
    IdentityField { kind: &'static str, field: String },

    #[error("slurm-conf-parameters line {line} is not of the form Key=Value: '{content}'")]
    Override { line: usize, content: String },

    #[error("failed to decode {context}: {source}")]
    Json {
        context: String,
        source: serde_json::Error,
    },

    /// Relation data that is valid JSON but not of the shape peers are expected to publish.
    #[error("malformed {context}: {reason}")]
    Fragment { context: String, reason: String },

    #[error("slurm.conf line {line}: {reason}")]
    SlurmConf { line: usize, reason: String },

    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    TomlDe {
        path: String,
        source: toml::de::Error,
    },

    #[error("state file version {found} is newer than the supported version {supported}")]
    StateVersion { found: u32, supported: u32 },

    #[error("failed to serialize state: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid base64 key: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("`{program}` exited with {status}: {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("no such system {kind} '{name}'")]
    User { kind: &'static str, name: String },

    #[error("{context}: {source}")]
    Sys {
        context: String,
        source: nix::Error,
    },
}

impl Error {
    /// Whether this error came from malformed input rather than from the environment. Parse
    /// faults abort a whole assembly pass; the caller is expected to retry once the input changes.
    pub fn is_parse_fault(&self) -> bool {
        matches!(
            self,
            Error::Override { .. }
                | Error::LineBreak { .. }
                | Error::Json { .. }
                | Error::Fragment { .. }
                | Error::SlurmConf { .. }
        )
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        move |source| Error::Io { path, source }
    }
}
