//! Command-line interface.
//!
//! Single run-to-completion invocation, no subcommands: provision the
//! instance, deploy the payload, pause, tear down.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use crate::config::{self, DeployConfig};
use crate::core::Orchestrator;
use crate::providers::{GceCompute, GcsStore};

/// skiff - deploy a packaged app to a short-lived cloud VM
#[derive(Parser, Debug)]
#[command(name = "skiff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Cloud project ID
    pub project_id: String,

    /// Storage bucket name for the packaged app
    pub bucket_name: String,

    /// Compute zone to deploy to
    #[arg(long, default_value = "us-central1-f")]
    pub zone: String,

    /// New instance name
    #[arg(long, default_value = "demo-instance")]
    pub name: String,

    /// Ports to open to the instance, e.g. 80,8080
    #[arg(long, default_value = "8080")]
    pub ports: String,

    /// Directory holding the application payload
    #[arg(long, default_value = "./app")]
    pub app_dir: PathBuf,

    /// Staging directory for the packaged artifact
    #[arg(long, env = "SKIFF_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Skip the pause before teardown (for scripted runs)
    #[arg(long)]
    pub no_wait: bool,
}

impl Cli {
    /// Execute the deployment
    pub async fn execute(self) -> Result<()> {
        let config = self.resolve_config()?;
        let token = config::access_token()?;

        let compute = Arc::new(GceCompute::new(token.clone()));
        let store = Arc::new(GcsStore::new(token));

        Orchestrator::new(compute, store, config).run().await?;
        Ok(())
    }

    /// Merge CLI flags over the optional config file and defaults
    fn resolve_config(&self) -> Result<DeployConfig> {
        let mut config = DeployConfig::new(&self.project_id, &self.bucket_name);

        if let Some(path) = config::find_config_file() {
            let file = config::load_config_file(&path)?;
            // Paths in the file are relative to the directory holding .skiff/
            let base = path
                .parent()
                .and_then(Path::parent)
                .unwrap_or(Path::new("."));
            config.apply_file(&file, base);
        }

        config.zone = self.zone.clone();
        config.instance_name = self.name.clone();
        config.ports = config::parse_ports(&self.ports);
        config.app_dir = self.app_dir.clone();
        if let Some(staging_dir) = &self.staging_dir {
            config.staging_dir = staging_dir.clone();
        }
        config.wait_for_user = !self.no_wait;

        if config.ports.is_empty() {
            anyhow::bail!("--ports must name at least one port");
        }

        Ok(config)
    }
}
