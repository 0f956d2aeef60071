//! mkdocs invocation and publishing of the built site.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::process::Command;

use crate::stager::copy_tree;

/// Configuration for the external site generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Executable to run
    pub program: String,

    /// Arguments placed before `build --site-dir <dir>`
    pub leading_args: Vec<String>,

    /// Name of the output directory, relative to the staging root
    pub output_name: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "mkdocs".to_string(),
            leading_args: Vec::new(),
            output_name: "site".to_string(),
        }
    }
}

/// Result of a generator run.
#[derive(Debug)]
pub struct BuildResult {
    /// Directory the generator wrote to
    pub output_dir: PathBuf,

    /// Generator run time in milliseconds
    pub duration_ms: u64,
}

/// Errors that can occur while building or publishing.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("{0} command not found. Please install mkdocs-material.")]
    ToolNotFound(String),

    #[error("{program} build failed: {status}")]
    GeneratorFailed { program: String, status: String },

    #[error("{program} did not produce {path}")]
    MissingOutput { program: String, path: String },

    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Failed to publish to {path}: {message}")]
    Publish { path: String, message: String },
}

/// Runs the site generator against a staged tree.
pub struct SiteBuilder {
    config: GeneratorConfig,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Run the generator with `staging_root` as its working directory.
    pub async fn build(&self, staging_root: &Path) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let program = &self.config.program;

        tracing::debug!(
            "Running {} {:?} build --site-dir {} in {}",
            program,
            self.config.leading_args,
            self.config.output_name,
            staging_root.display()
        );

        let status = Command::new(program)
            .args(&self.config.leading_args)
            .arg("build")
            .arg("--site-dir")
            .arg(&self.config.output_name)
            .current_dir(staging_root)
            .status()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => BuildError::ToolNotFound(program.clone()),
                _ => BuildError::Spawn {
                    program: program.clone(),
                    message: e.to_string(),
                },
            })?;

        if !status.success() {
            return Err(BuildError::GeneratorFailed {
                program: program.clone(),
                status: status.to_string(),
            });
        }

        let output_dir = staging_root.join(&self.config.output_name);
        if !output_dir.is_dir() {
            return Err(BuildError::MissingOutput {
                program: program.clone(),
                path: output_dir.display().to_string(),
            });
        }

        Ok(BuildResult {
            output_dir,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

/// Move a freshly built site to `destination`, replacing what was there.
///
/// The old tree is removed before the move, so an interruption in between
/// leaves no output at all rather than a mix of old and new.
pub fn publish(built: &Path, destination: &Path) -> Result<(), BuildError> {
    let publish_error = |e: io::Error| BuildError::Publish {
        path: destination.display().to_string(),
        message: e.to_string(),
    };

    if destination.is_dir() {
        fs::remove_dir_all(destination).map_err(publish_error)?;
    } else if destination.exists() {
        fs::remove_file(destination).map_err(publish_error)?;
    }

    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(publish_error)?;
        }
    }

    // rename fails across filesystems, e.g. from a tmpfs staging dir
    if let Err(e) = fs::rename(built, destination) {
        tracing::debug!("rename failed ({}), copying instead", e);
        copy_tree(built, destination).map_err(|e| BuildError::Publish {
            path: destination.display().to_string(),
            message: e.to_string(),
        })?;
        fs::remove_dir_all(built).map_err(publish_error)?;
    }

    Ok(())
}
