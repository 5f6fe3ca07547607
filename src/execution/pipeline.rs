//! End-to-end run: scan, extract, write.

use crate::core::config::PipelineConfig;
use crate::core::error::{DatasetError, ExtractionError, FeatureResult};
use crate::dataset::scan::DatasetIndex;
use crate::execution::engine::{ExtractionEngine, ExtractionOptions, ExtractionStats};
use crate::output::{ArffHeader, OutputLayout, SubsetWriter, WriteSummary};
use std::path::PathBuf;

/// What a pipeline run did.
#[derive(Debug)]
pub struct PipelineReport {
    /// Extraction statistics.
    pub stats: ExtractionStats,
    /// Images that were skipped and why.
    pub skipped: Vec<(PathBuf, ExtractionError)>,
    /// Number of feature columns in the master table.
    pub columns: usize,
    /// Files written.
    pub written: WriteSummary,
}

/// Run the whole pipeline described by `config`.
///
/// `options` overrides the `[execution]` section, e.g. to attach a
/// progress callback.
pub fn run_pipeline(
    config: &PipelineConfig,
    options: Option<ExtractionOptions>,
) -> FeatureResult<PipelineReport> {
    let engine = ExtractionEngine::from_config(config)?;
    log::info!(
        "Running {} extractors ({} columns per image)",
        engine.registry().enabled_count(),
        engine.registry().enabled_column_count()
    );

    let layout = OutputLayout::new(&config.output.root);
    layout.create_all()?;

    let dataset = DatasetIndex::scan(&config.dataset.root, config.dataset.pattern.as_deref())?;
    log::info!(
        "Dataset {}: {} classes, {} files",
        dataset.root().display(),
        dataset.classes().len(),
        dataset.file_count()
    );

    let output = engine.execute(&dataset, options)?;
    if output.table.is_empty() {
        return Err(DatasetError::NoImagesExtracted {
            skipped: output.stats.images_skipped,
        }
        .into());
    }

    let header = ArffHeader {
        relation: config.output.relation.clone(),
        description: config.output.description.clone(),
    };
    let writer = SubsetWriter::new(layout, header);
    let written = writer.write_all(&output.table, &config.glcm, config.output.write_subsets)?;

    Ok(PipelineReport {
        stats: output.stats,
        skipped: output.skipped,
        columns: output.table.columns().len(),
        written,
    })
}
