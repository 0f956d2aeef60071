//! Build and serve settings.
//!
//! Defaults come first, then `planexe-docs.toml` if present, then the
//! `PLANEXE_REPO` and `DOCS_SOURCE_DIR` environment variables.

use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use planexe_docs_server::{PortRange, ServerConfig};
use planexe_docs_static::{GeneratorConfig, ReadmeSource, StageConfig};

pub const REPO_ENV: &str = "PLANEXE_REPO";
pub const DOCS_DIR_ENV: &str = "DOCS_SOURCE_DIR";

/// Settings file structure (planexe-docs.toml).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// PlanExe repository root
    pub repo: PathBuf,

    /// Docs directory inside the repository
    pub docs_source_dir: PathBuf,

    /// mkdocs configuration in the working directory
    pub site_config: PathBuf,

    /// Where the built site is published
    pub output_dir: PathBuf,

    /// Site generator executable
    pub generator: String,

    /// Extra arguments placed before the generator's `build` subcommand
    pub generator_args: Vec<String>,

    pub serve: ServeSettings,

    /// Component READMEs copied into the developer section
    pub readmes: Vec<ReadmeEntry>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServeSettings {
    pub host: IpAddr,
    pub port: u16,
    pub port_count: u16,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReadmeEntry {
    pub component: String,
    #[serde(default = "default_readme")]
    pub readme: String,
}

fn default_readme() -> String {
    "README.md".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repo: PathBuf::from("../PlanExe"),
            docs_source_dir: PathBuf::from("docs"),
            site_config: PathBuf::from("mkdocs.yml"),
            output_dir: PathBuf::from("site"),
            generator: "mkdocs".to_string(),
            generator_args: Vec::new(),
            serve: ServeSettings::default(),
            readmes: default_readmes(),
        }
    }
}

impl Default for ServeSettings {
    fn default() -> Self {
        let ports = PortRange::default();
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: ports.start,
            port_count: ports.count,
        }
    }
}

fn default_readmes() -> Vec<ReadmeEntry> {
    [
        "database_postgres",
        "frontend_multi_user",
        "frontend_single_user",
        "mcp_cloud",
        "mcp_local",
        "worker_plan",
        "worker_plan_database",
    ]
    .into_iter()
    .map(|component| ReadmeEntry {
        component: component.to_string(),
        readme: default_readme(),
    })
    .collect()
}

impl Settings {
    /// Load settings from `path` if it exists, then apply the environment.
    ///
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Self::from_file(path)?;
        Ok(settings.with_env(|key| std::env::var(key).ok()))
    }

    fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Override settings from environment variables read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(repo) = lookup(REPO_ENV).filter(|v| !v.is_empty()) {
            self.repo = PathBuf::from(repo);
        }
        if let Some(dir) = lookup(DOCS_DIR_ENV).filter(|v| !v.is_empty()) {
            self.docs_source_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn stage_config(&self) -> StageConfig {
        StageConfig {
            repo_dir: self.repo.clone(),
            docs_source_dir: self.docs_source_dir.clone(),
            site_config: self.site_config.clone(),
            readmes: self
                .readmes
                .iter()
                .map(|r| ReadmeSource::new(&r.component, &r.readme))
                .collect(),
            ..Default::default()
        }
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            program: self.generator.clone(),
            leading_args: self.generator_args.clone(),
            ..Default::default()
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            site_dir: self.output_dir.clone(),
            host: self.serve.host,
            ports: PortRange::new(self.serve.port, self.serve.port_count),
        }
    }
}
