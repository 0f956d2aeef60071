//! Documentation build command.

use anyhow::Result;
use planexe_docs_nav::{MergeOutcome, NavMerger, NavSettings, PreserveTags};
use planexe_docs_static::{publish, DocStager, SiteBuilder};

use crate::output::Output;
use crate::settings::Settings;

/// Run the build command.
///
/// The staging directory lives until the end of this function, so it is
/// removed on success and on every error path.
pub async fn run(settings: &Settings) -> Result<()> {
    let output = Output::new();
    output.success("Building PlanExe documentation...");

    let stager = DocStager::new(settings.stage_config());
    let docs_source = stager.preflight()?;

    output.warning(&format!(
        "Copying documentation from {}...",
        docs_source.display()
    ));
    let staged = stager.stage_from(&docs_source)?;
    output.info(&format!(
        "Copied {} files and {} READMEs",
        staged.files_copied, staged.readmes_copied
    ));
    for missing in &staged.missing_readmes {
        output.warning(&format!(
            "Warning: README not found, skipping: {}",
            missing.display()
        ));
    }

    let outcome = NavMerger::new(NavSettings::default()).inject(
        &staged.config_path(),
        &staged.docs_dir(),
        &PreserveTags,
    )?;
    if let MergeOutcome::Injected(count) = outcome {
        output.info(&format!("Added {} proposals to the navigation", count));
    }

    output.warning(&format!("Building with {}...", settings.generator));
    let result = SiteBuilder::new(settings.generator_config())
        .build(staged.root())
        .await?;
    tracing::debug!("Generator finished in {}ms", result.duration_ms);

    publish(&result.output_dir, &settings.output_dir)?;

    output.success("✓ Documentation built successfully!");
    output.success(&format!(
        "Output is in the '{}' directory",
        settings.output_dir.display()
    ));

    Ok(())
}
