//! Site assembly for the PlanExe documentation.
//!
//! Stages the PlanExe docs tree into a temporary directory, runs mkdocs
//! against it, and moves the result into place.

pub mod builder;
pub mod stager;

pub use builder::{publish, BuildError, BuildResult, GeneratorConfig, SiteBuilder};
pub use stager::{
    copy_tree, DocStager, ReadmeSource, StageConfig, StageError, StagedDocs, EXTRA_CSS,
};
