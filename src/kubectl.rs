//! External `kubectl` invocations
//!
//! Every call builds an explicit argument list for the subprocess; no shell
//! is involved, so namespaces and paths are never interpreted as shell text.
//! Only the exit status matters for apply and delete; the ingress query
//! returns raw stdout for the caller to parse.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::ingress::INGRESS_TEMPLATE;
use crate::{Error, Result};

/// Output format requested from the ingress query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IngressFormat {
    /// Go template `{{.status.loadBalancer.ingress}}`, e.g. `[map[ip:1.2.3.4]]`
    #[default]
    Template,
    /// Full service object as JSON
    Json,
}

/// Command output for testability
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether command succeeded
    pub success: bool,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Cluster operations the deployer needs (allows mocking in tests)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Kubectl: Send + Sync {
    /// Create or update every resource in a manifest file
    async fn apply(&self, path: &Path) -> Result<()>;

    /// Delete every resource in a manifest file
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Raw ingress status of a service in the requested format
    async fn service_ingress(
        &self,
        service: &str,
        namespace: &str,
        format: IngressFormat,
    ) -> Result<String>;
}

/// Runs the real `kubectl` binary
#[derive(Debug, Clone)]
pub struct KubectlRunner {
    binary: PathBuf,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    timeout: Option<Duration>,
}

impl Default for KubectlRunner {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl KubectlRunner {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            kubeconfig: None,
            context: None,
            timeout: None,
        }
    }

    /// Pass `--kubeconfig` on every invocation
    pub fn with_kubeconfig(mut self, kubeconfig: Option<PathBuf>) -> Self {
        self.kubeconfig = kubeconfig;
        self
    }

    /// Pass `--context` on every invocation
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Kill and fail any invocation that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Base command with the connection flags every invocation carries
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(ref kubeconfig) = self.kubeconfig {
            cmd.arg("--kubeconfig").arg(kubeconfig);
        }
        if let Some(ref context) = self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command, description: &str) -> Result<CommandOutput> {
        debug!(command = ?cmd, "Executing {}", description);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, cmd.output())
                .await
                .map_err(|_| {
                    Error::command_failed(format!("{} timed out after {:?}", description, limit))
                })?,
            None => cmd.output().await,
        }
        .map_err(|e| {
            Error::command_failed(format!(
                "failed to execute {}: {}",
                self.binary.display(),
                e
            ))
        })?;

        let output = CommandOutput::from(output);
        if !output.success {
            return Err(Error::command_failed(format!(
                "{} failed: {}",
                description,
                output.stderr.trim()
            )));
        }

        Ok(output)
    }
}

#[async_trait]
impl Kubectl for KubectlRunner {
    async fn apply(&self, path: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("apply").arg("--filename").arg(path);
        self.run(cmd, &format!("kubectl apply --filename {}", path.display()))
            .await
            .map(|_| ())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("delete").arg("--filename").arg(path);
        self.run(cmd, &format!("kubectl delete --filename {}", path.display()))
            .await
            .map(|_| ())
    }

    async fn service_ingress(
        &self,
        service: &str,
        namespace: &str,
        format: IngressFormat,
    ) -> Result<String> {
        let mut cmd = self.command();
        cmd.args(["get", "service", service, "--namespace", namespace]);
        match format {
            IngressFormat::Template => {
                cmd.args(["--output", "template", "--template", INGRESS_TEMPLATE]);
            }
            IngressFormat::Json => {
                cmd.args(["--output", "json"]);
            }
        }

        let output = self
            .run(cmd, &format!("kubectl get service {}", service))
            .await?;
        Ok(output.stdout)
    }
}
