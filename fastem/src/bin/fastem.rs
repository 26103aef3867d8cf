//! Batch run over one stack: unpack mipmaps, then flag artefacts per section.
//!
//! Usage: `fastem <config.yaml>`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fastem::{
    create_stack_mipmaps, flag_section_artefacts, BatchProgress, ProgressCallback, SectionOutcome,
    WorkflowConfig,
};

const REPORT_FILE_NAME: &str = "artefacts.yaml";

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: fastem <config.yaml>")?;

    let config = WorkflowConfig::load(&config_path)?;
    common::log_setup::setup_logging(&config.log_level, config.log_dir.as_deref())?;

    let layout = config.layout();
    std::fs::create_dir_all(layout.stack_dir())
        .with_context(|| format!("creating {}", layout.stack_dir().display()))?;

    let progress = ProgressCallback::new(Arc::new(|p: BatchProgress| {
        tracing::debug!(
            section = %p.section,
            stage = ?p.stage,
            current = p.current,
            total = p.total,
            "Progress"
        );
    }));

    let summaries = create_stack_mipmaps(&layout, &config.source_dir, &progress)?;
    let skipped = summaries
        .iter()
        .filter(|s| s.outcome == SectionOutcome::Skipped)
        .count();

    let mut flagged_total = 0;
    for summary in &summaries {
        let source_section_dir = config.source_dir.join(&summary.section);
        if let SectionOutcome::Unpacked { tiles: 0 } = summary.outcome {
            continue;
        }

        let report = flag_section_artefacts(&source_section_dir, &config.artefacts, &progress)?;
        flagged_total += report.flagged.len();

        if config.write_reports {
            let report_path = layout.section_dir(&summary.section).join(REPORT_FILE_NAME);
            report.write(&report_path)?;
        }
    }

    tracing::info!(
        stack = %layout.stack,
        sections = summaries.len(),
        skipped,
        flagged = flagged_total,
        "Stack processed"
    );

    Ok(())
}
