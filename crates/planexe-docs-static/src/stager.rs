//! Staging of the documentation sources into a temporary tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

/// Stylesheet override written into every staged tree.
pub const EXTRA_CSS: &str = r#"/* Generated by planexe-docs. Local edits are overwritten on build. */
.md-grid {
  max-width: 1440px;
}

.md-typeset table:not([class]) {
  display: table;
  width: 100%;
}

.md-typeset pre > code {
  white-space: pre-wrap;
}
"#;

/// A component README copied into the developer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadmeSource {
    /// Component directory in the repository, also the target page name
    pub component: String,

    /// README filename inside the component directory
    pub readme: String,
}

impl ReadmeSource {
    pub fn new(component: impl Into<String>, readme: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            readme: readme.into(),
        }
    }
}

/// Configuration for staging a documentation tree.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Root of the source repository
    pub repo_dir: PathBuf,

    /// Docs directory, relative to `repo_dir`
    pub docs_source_dir: PathBuf,

    /// Site configuration copied next to the staged docs
    pub site_config: PathBuf,

    /// Stylesheet override path, relative to the staged docs
    pub stylesheet: PathBuf,

    /// Folder for copied READMEs, relative to the staged docs
    pub developer_dir: PathBuf,

    /// READMEs to pull in
    pub readmes: Vec<ReadmeSource>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            repo_dir: PathBuf::from("../PlanExe"),
            docs_source_dir: PathBuf::from("docs"),
            site_config: PathBuf::from("mkdocs.yml"),
            stylesheet: PathBuf::from("stylesheets/extra.css"),
            developer_dir: PathBuf::from("developer"),
            readmes: Vec::new(),
        }
    }
}

/// Errors that can occur while staging.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("PlanExe repo not found at {0}")]
    RepoNotFound(String),

    #[error("Documentation source directory not found at {0}")]
    DocsNotFound(String),

    #[error("{0} not found")]
    SiteConfigNotFound(String),

    #[error("Failed to copy {path}: {message}")]
    Copy { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

impl StageError {
    /// A one-line hint on how to fix the error, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::RepoNotFound(_) => {
                Some("Set PLANEXE_REPO environment variable to point to the PlanExe repository")
            }
            Self::DocsNotFound(_) => Some(
                "Set DOCS_SOURCE_DIR environment variable if your docs are in a different directory",
            ),
            _ => None,
        }
    }
}

/// A populated staging tree. The directory is removed when this is dropped.
#[derive(Debug)]
pub struct StagedDocs {
    dir: TempDir,
    config_name: PathBuf,

    /// Files copied from the source docs tree
    pub files_copied: usize,

    /// READMEs copied into the developer section
    pub readmes_copied: usize,

    /// READMEs that were configured but not found
    pub missing_readmes: Vec<PathBuf>,
}

impl StagedDocs {
    /// The staging root, used as the generator's working directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The staged `docs` directory.
    pub fn docs_dir(&self) -> PathBuf {
        self.dir.path().join("docs")
    }

    /// The staged copy of the site configuration.
    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join(&self.config_name)
    }
}

/// Assembles a staging tree from the source repository.
pub struct DocStager {
    config: StageConfig,
}

impl DocStager {
    /// Create a new stager.
    pub fn new(config: StageConfig) -> Self {
        Self { config }
    }

    /// Check that the repository, its docs directory and the site
    /// configuration all exist.
    pub fn preflight(&self) -> Result<PathBuf, StageError> {
        let repo = &self.config.repo_dir;
        if !repo.is_dir() {
            return Err(StageError::RepoNotFound(repo.display().to_string()));
        }

        let docs_source = repo.join(&self.config.docs_source_dir);
        if !docs_source.is_dir() {
            return Err(StageError::DocsNotFound(docs_source.display().to_string()));
        }

        if !self.config.site_config.is_file() {
            return Err(StageError::SiteConfigNotFound(
                self.config.site_config.display().to_string(),
            ));
        }

        Ok(docs_source)
    }

    /// Check the sources, then create and populate a staging tree.
    pub fn stage(&self) -> Result<StagedDocs, StageError> {
        let docs_source = self.preflight()?;
        self.stage_from(&docs_source)
    }

    /// Create and populate a staging tree from a docs directory already
    /// returned by [`DocStager::preflight`].
    pub fn stage_from(&self, docs_source: &Path) -> Result<StagedDocs, StageError> {
        let dir = tempfile::Builder::new()
            .prefix("planexe-docs-")
            .tempdir()
            .map_err(|e| write_error(Path::new("<tempdir>"), e))?;

        let docs_dir = dir.path().join("docs");
        fs::create_dir(&docs_dir).map_err(|e| write_error(&docs_dir, e))?;

        tracing::info!("Copying documentation from {}", docs_source.display());
        let files_copied = copy_tree(docs_source, &docs_dir)?;
        tracing::debug!("Copied {} files", files_copied);

        let config_name = self
            .config
            .site_config
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("mkdocs.yml"));
        let staged_config = dir.path().join(&config_name);
        fs::copy(&self.config.site_config, &staged_config).map_err(|e| StageError::Copy {
            path: self.config.site_config.display().to_string(),
            message: e.to_string(),
        })?;

        let css_path = docs_dir.join(&self.config.stylesheet);
        write_file(&css_path, EXTRA_CSS)?;

        let mut readmes_copied = 0;
        let mut missing_readmes = Vec::new();
        let developer_dir = docs_dir.join(&self.config.developer_dir);

        for source in &self.config.readmes {
            let from = self
                .config
                .repo_dir
                .join(&source.component)
                .join(&source.readme);

            if !from.is_file() {
                tracing::warn!("README not found, skipping: {}", from.display());
                missing_readmes.push(from);
                continue;
            }

            fs::create_dir_all(&developer_dir).map_err(|e| write_error(&developer_dir, e))?;
            let to = developer_dir.join(format!("{}.md", source.component));
            fs::copy(&from, &to).map_err(|e| StageError::Copy {
                path: from.display().to_string(),
                message: e.to_string(),
            })?;
            tracing::debug!("Copied {} -> {}", from.display(), to.display());
            readmes_copied += 1;
        }

        Ok(StagedDocs {
            dir,
            config_name,
            files_copied,
            readmes_copied,
            missing_readmes,
        })
    }
}

/// Merge-copy `from` into `to`, overwriting files that already exist.
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, StageError> {
    let mut count = 0;

    for entry in WalkDir::new(from).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| StageError::Copy {
            path: from.display().to_string(),
            message: e.to_string(),
        })?;

        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| write_error(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| StageError::Copy {
                path: entry.path().display().to_string(),
                message: e.to_string(),
            })?;
            count += 1;
        }
    }

    Ok(count)
}

fn write_file(path: &Path, content: &str) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    fs::write(path, content).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, e: io::Error) -> StageError {
    StageError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    /// Lay out a fake repo and a local mkdocs.yml under `root`.
    fn fixture(root: &Path) -> StageConfig {
        let repo = root.join("PlanExe");
        let docs = repo.join("docs");
        fs::create_dir_all(docs.join("guide")).unwrap();
        fs::write(docs.join("index.md"), "# Home\n").unwrap();
        fs::write(docs.join("guide").join("setup.md"), "# Setup\n").unwrap();

        fs::create_dir_all(repo.join("worker_plan")).unwrap();
        fs::write(repo.join("worker_plan").join("README.md"), "# Worker\n").unwrap();

        let mkdocs = root.join("mkdocs.yml");
        fs::write(&mkdocs, "site_name: PlanExe\n").unwrap();

        StageConfig {
            repo_dir: repo,
            site_config: mkdocs,
            readmes: vec![
                ReadmeSource::new("worker_plan", "README.md"),
                ReadmeSource::new("mcp_cloud", "README.md"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn stages_docs_css_and_readmes() {
        let temp = tempdir().unwrap();
        let staged = DocStager::new(fixture(temp.path())).stage().unwrap();
        let docs = staged.docs_dir();

        assert_eq!(staged.files_copied, 2);
        assert!(docs.join("index.md").is_file());
        assert!(docs.join("guide/setup.md").is_file());
        assert_eq!(
            fs::read_to_string(docs.join("stylesheets/extra.css")).unwrap(),
            EXTRA_CSS
        );
        assert_eq!(
            fs::read_to_string(docs.join("developer/worker_plan.md")).unwrap(),
            "# Worker\n"
        );
        assert!(staged.config_path().is_file());
    }

    #[test]
    fn missing_readme_is_not_fatal() {
        let temp = tempdir().unwrap();
        let staged = DocStager::new(fixture(temp.path())).stage().unwrap();

        assert_eq!(staged.readmes_copied, 1);
        assert_eq!(staged.missing_readmes.len(), 1);
        assert!(staged.missing_readmes[0].ends_with("mcp_cloud/README.md"));
        assert!(!staged.docs_dir().join("developer/mcp_cloud.md").exists());
    }

    #[test]
    fn stages_from_checked_docs_dir() {
        let temp = tempdir().unwrap();
        let stager = DocStager::new(fixture(temp.path()));
        let docs_source = stager.preflight().unwrap();

        let staged = stager.stage_from(&docs_source).unwrap();

        assert_eq!(docs_source, temp.path().join("PlanExe/docs"));
        assert_eq!(staged.files_copied, 2);
        assert_eq!(staged.readmes_copied, 1);
        assert!(staged.docs_dir().join("guide/setup.md").is_file());
    }

    #[test]
    fn staging_dir_removed_on_drop() {
        let temp = tempdir().unwrap();
        let staged = DocStager::new(fixture(temp.path())).stage().unwrap();
        let root = staged.root().to_path_buf();
        assert!(root.is_dir());

        drop(staged);

        assert!(!root.exists());
    }

    #[test]
    fn distinguishes_missing_repo_and_docs() {
        let temp = tempdir().unwrap();
        let mut config = fixture(temp.path());

        config.docs_source_dir = PathBuf::from("documentation");
        let err = DocStager::new(config.clone()).stage().unwrap_err();
        assert!(matches!(err, StageError::DocsNotFound(_)));
        assert!(err.to_string().contains("Documentation source directory"));

        config.repo_dir = temp.path().join("missing");
        let err = DocStager::new(config).stage().unwrap_err();
        assert!(matches!(err, StageError::RepoNotFound(_)));
        assert!(err.to_string().contains("PlanExe repo not found"));
    }

    #[test]
    fn errors_without_site_config() {
        let temp = tempdir().unwrap();
        let mut config = fixture(temp.path());
        config.site_config = temp.path().join("absent.yml");

        let err = DocStager::new(config).stage().unwrap_err();

        assert!(matches!(err, StageError::SiteConfigNotFound(_)));
    }

    #[test]
    fn copy_tree_overwrites_without_clearing() {
        let temp = tempdir().unwrap();
        let from = temp.path().join("from");
        let to = temp.path().join("to");
        fs::create_dir_all(&from).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(from.join("a.md"), "new").unwrap();
        fs::write(to.join("a.md"), "old").unwrap();
        fs::write(to.join("keep.md"), "keep").unwrap();

        let count = copy_tree(&from, &to).unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read_to_string(to.join("a.md")).unwrap(), "new");
        assert_eq!(fs::read_to_string(to.join("keep.md")).unwrap(), "keep");
    }
}
