//! Invocation of the `velero` command line tool.
//!
//! Handlers talk to [`VeleroClient`] only. [`VeleroCli`] is the production implementation,
//! which spawns the configured executable once per call and waits for it to exit.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::AppError;

/// Longest object name Kubernetes accepts (DNS subdomain).
const MAX_RESOURCE_NAME_LEN: usize = 253;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` exited with status {status:?}: {stderr}")]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("`{command}` did not print valid JSON: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait VeleroClient: Send + Sync {
    /// Runs `subcommand` asking for machine readable output and parses it.
    async fn structured(&self, subcommand: &str) -> Result<JsonValue, CommandError>;

    /// Runs `subcommand` and returns its standard output verbatim.
    async fn text(&self, subcommand: &str) -> Result<String, CommandError>;
}

#[derive(Debug, Clone)]
pub struct VeleroCli {
    bin: PathBuf,
    kubeconfig: PathBuf,
}

impl VeleroCli {
    pub fn new(bin: impl Into<PathBuf>, kubeconfig: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            kubeconfig: kubeconfig.into(),
        }
    }

    fn args(&self, subcommand: &str, structured: bool) -> Vec<String> {
        let mut args: Vec<String> = subcommand.split_whitespace().map(str::to_string).collect();
        if structured {
            args.push("-o".to_string());
            args.push("json".to_string());
        }
        args.push(format!("--kubeconfig={}", self.kubeconfig.display()));
        args
    }

    fn command_line(&self, args: &[String]) -> String {
        let mut line = self.bin.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    async fn run(&self, subcommand: &str, structured: bool) -> Result<String, CommandError> {
        let args = self.args(subcommand, structured);
        let command = self.command_line(&args);
        tracing::debug!(command = %command, "invoking velero");

        let output = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(
                command = %command,
                status = ?output.status.code(),
                stderr = %stderr,
                "velero exited with failure"
            );
            return Err(CommandError::Failed {
                command,
                status: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl VeleroClient for VeleroCli {
    async fn structured(&self, subcommand: &str) -> Result<JsonValue, CommandError> {
        let stdout = self.run(subcommand, true).await?;
        serde_json::from_str(&stdout).map_err(|source| CommandError::Parse {
            command: self.command_line(&self.args(subcommand, true)),
            source,
        })
    }

    async fn text(&self, subcommand: &str) -> Result<String, CommandError> {
        self.run(subcommand, false).await
    }
}

/// Accepts Kubernetes object names only, so a path segment can never be read as a flag.
pub fn validate_resource_name(name: &str) -> Result<&str, AppError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_RESOURCE_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
        && name
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        && name
            .bytes()
            .last()
            .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(AppError::bad_request(format!(
            "Invalid resource name: {name:?}"
        )))
    }
}
