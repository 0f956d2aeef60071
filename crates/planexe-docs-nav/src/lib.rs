//! mkdocs.yml handling for the PlanExe documentation build.
//!
//! Loads the site configuration without choking on Python-specific YAML tags,
//! lists proposal documents, and regenerates the Proposals navigation group.

pub mod config;
pub mod merge;
pub mod proposals;

pub use config::{
    display_tag, ConfigError, OpaqueScalar, PreserveTags, SiteConfig, TagStrategy,
    SECONDARY_TAG_PREFIX,
};
pub use merge::{MergeOutcome, NavError, NavMerger, NavSettings};
pub use proposals::{discover_proposals, proposal_title, ProposalDoc};
