//! Deployment configuration.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags
//! 2. Environment variables (SKIFF_ACCESS_TOKEN, SKIFF_STAGING_DIR)
//! 3. Config file (.skiff/config.yaml)
//! 4. Defaults
//!
//! Config file discovery searches the current directory and parents for
//! `.skiff/config.yaml`. The resolved [`DeployConfig`] is built once at
//! process start and threaded through every collaborator; nothing reaches
//! for ambient globals.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::waiter::PollPolicy;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub machine: Option<MachineConfig>,
    #[serde(default)]
    pub poll: Option<PollPolicy>,
    #[serde(default)]
    pub paths: Option<PathsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineConfig {
    pub machine_type: Option<String>,
    pub image_project: Option<String>,
    pub image_family: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Staging directory for the packaged artifact
    pub staging: Option<String>,
}

/// Resolved configuration for one deployment run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub project: String,
    pub bucket: String,
    pub zone: String,
    pub instance_name: String,
    /// Ports the ingress rule opens (as decimal strings)
    pub ports: Vec<String>,
    /// Directory holding the application payload
    pub app_dir: PathBuf,
    /// Where the packaged artifact and teardown record are staged
    pub staging_dir: PathBuf,
    pub machine_type: String,
    pub image_project: String,
    pub image_family: String,
    pub poll: PollPolicy,
    /// Block for a keypress before teardown
    pub wait_for_user: bool,
}

impl DeployConfig {
    /// Defaults for everything but project and bucket
    pub fn new(project: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            bucket: bucket.into(),
            zone: "us-central1-f".to_string(),
            instance_name: "demo-instance".to_string(),
            ports: vec!["8080".to_string()],
            app_dir: PathBuf::from("./app"),
            staging_dir: std::env::temp_dir().join("skiff"),
            machine_type: "e2-micro".to_string(),
            image_project: "debian-cloud".to_string(),
            image_family: "debian-12".to_string(),
            poll: PollPolicy::default(),
            wait_for_user: true,
        }
    }

    /// Overlay settings from a config file
    pub fn apply_file(&mut self, file: &ConfigFile, file_dir: &Path) {
        if let Some(machine) = &file.machine {
            if let Some(machine_type) = &machine.machine_type {
                self.machine_type = machine_type.clone();
            }
            if let Some(image_project) = &machine.image_project {
                self.image_project = image_project.clone();
            }
            if let Some(image_family) = &machine.image_family {
                self.image_family = image_family.clone();
            }
        }

        if let Some(poll) = &file.poll {
            self.poll = poll.clone();
        }

        if let Some(paths) = &file.paths {
            if let Some(staging) = &paths.staging {
                self.staging_dir = resolve_path(file_dir, staging);
            }
        }
    }
}

/// Parse a comma-separated port list, dropping empty entries
pub fn parse_ports(ports: &str) -> Vec<String> {
    ports
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Bearer token for provider calls, supplied by the environment
pub fn access_token() -> Result<String> {
    std::env::var("SKIFF_ACCESS_TOKEN")
        .or_else(|_| std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN"))
        .context("no access token: set SKIFF_ACCESS_TOKEN or GOOGLE_OAUTH_ACCESS_TOKEN")
}

/// Find a config file by searching the current directory and parents
pub fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".skiff").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse a config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
