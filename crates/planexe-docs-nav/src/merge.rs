//! Injection of the generated Proposals group into the site navigation.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::config::{ConfigError, SiteConfig, TagStrategy};
use crate::proposals::{discover_proposals, ProposalDoc};

/// Names used when locating and regenerating the Proposals group.
#[derive(Debug, Clone)]
pub struct NavSettings {
    /// Top-level config key holding the navigation
    pub nav_key: String,

    /// Nav group the proposals are attached to
    pub parent_group: String,

    /// Title of the generated group
    pub group_title: String,

    /// Proposals directory, relative to the docs directory
    pub proposals_dir: String,

    /// Filename never listed as a proposal (case-insensitive)
    pub reserved_name: String,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            nav_key: "nav".to_string(),
            parent_group: "Development".to_string(),
            group_title: "Proposals".to_string(),
            proposals_dir: "proposals".to_string(),
            reserved_name: "AGENTS.md".to_string(),
        }
    }
}

/// What a merge did to the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The group was regenerated with this many entries
    Injected(usize),

    /// No parent group with a list value was found
    NoParentGroup,

    /// There is no proposals directory in the staged docs
    NoProposalsDir,
}

/// Errors that can occur while injecting proposals.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to list proposals in {path}: {message}")]
    Scan { path: String, message: String },
}

/// Rewrites the Proposals group of a site configuration.
pub struct NavMerger {
    settings: NavSettings,
}

impl NavMerger {
    /// Create a new merger.
    pub fn new(settings: NavSettings) -> Self {
        Self { settings }
    }

    /// Replace the Proposals group under the parent group with `proposals`.
    ///
    /// Only the first parent group whose value is a list is touched. Any
    /// existing Proposals entry there is removed before the new one is
    /// appended, so repeated merges never accumulate entries.
    pub fn merge(&self, config: &mut SiteConfig, proposals: &[ProposalDoc]) -> MergeOutcome {
        let Some(Value::Sequence(nav)) = config.get_mut(&self.settings.nav_key) else {
            return MergeOutcome::NoParentGroup;
        };

        for entry in nav.iter_mut() {
            let Some(children) = entry
                .get_mut(self.settings.parent_group.as_str())
                .and_then(Value::as_sequence_mut)
            else {
                continue;
            };

            children.retain(|child| {
                !child
                    .as_mapping()
                    .is_some_and(|m| m.contains_key(self.settings.group_title.as_str()))
            });

            let items: Vec<Value> = proposals
                .iter()
                .map(|doc| {
                    let mut item = Mapping::new();
                    item.insert(
                        Value::from(doc.title.as_str()),
                        Value::from(doc.path.as_str()),
                    );
                    Value::Mapping(item)
                })
                .collect();

            let mut group = Mapping::new();
            group.insert(
                Value::from(self.settings.group_title.as_str()),
                Value::Sequence(items),
            );
            children.push(Value::Mapping(group));

            return MergeOutcome::Injected(proposals.len());
        }

        MergeOutcome::NoParentGroup
    }

    /// Regenerate the Proposals group of the config file at `config_path`
    /// from the proposals found under `docs_dir`.
    ///
    /// Does nothing when the proposals directory is absent. The file is
    /// written back in place otherwise, even when no parent group exists.
    pub fn inject(
        &self,
        config_path: &Path,
        docs_dir: &Path,
        tags: &dyn TagStrategy,
    ) -> Result<MergeOutcome, NavError> {
        let proposals_dir = docs_dir.join(&self.settings.proposals_dir);
        if !proposals_dir.is_dir() {
            tracing::debug!("No proposals directory at {}", proposals_dir.display());
            return Ok(MergeOutcome::NoProposalsDir);
        }

        let mut config = SiteConfig::load(config_path, tags)?;

        let proposals = discover_proposals(
            &proposals_dir,
            &self.settings.reserved_name,
            &self.settings.proposals_dir,
        )
        .map_err(|e| NavError::Scan {
            path: proposals_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let outcome = self.merge(&mut config, &proposals);
        match outcome {
            MergeOutcome::Injected(count) => {
                tracing::info!("Injected {} proposals into nav", count);
            }
            _ => {
                tracing::debug!(
                    "No '{}' nav group, leaving nav unchanged",
                    self.settings.parent_group
                );
            }
        }

        config.save(config_path)?;

        Ok(outcome)
    }
}

impl Default for NavMerger {
    fn default() -> Self {
        Self::new(NavSettings::default())
    }
}
