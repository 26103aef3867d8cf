//! Section-level batch flows over a stack.
//!
//! Raw data is organised as `<source stack>/<section>/<row>_<col>_0.tif`, one
//! pyramidal file per tile. Mipmaps go to
//! `<project>/<stack>/<section>/<row>_<col>/<level>.tif`.
//!
//! Sections are independent: nothing here depends on the order in which they
//! are processed, so callers may fan out over sections as long as each worker
//! writes to its own section directory.

mod progress;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::artefacts::{level_percentile, ArtefactConfig, ArtefactThreshold};
use crate::error::{Error, Result};
use crate::mipmaps::unpack_file;
use crate::tile::TileId;

pub use progress::{report_progress, BatchProgress, BatchStage, ProgressCallback};

/// Output location of one stack inside a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub project_dir: PathBuf,
    pub stack: String,
}

impl ProjectLayout {
    pub fn new(project_dir: impl Into<PathBuf>, stack: impl Into<String>) -> Self {
        Self {
            project_dir: project_dir.into(),
            stack: stack.into(),
        }
    }

    pub fn stack_dir(&self) -> PathBuf {
        self.project_dir.join(&self.stack)
    }

    pub fn section_dir(&self, section: &str) -> PathBuf {
        self.stack_dir().join(section)
    }

    /// `<project>/<stack>/<section>/<row>_<col>`.
    pub fn tile_dir(&self, section: &str, tile: TileId) -> PathBuf {
        self.section_dir(section).join(tile.dir_name())
    }
}

/// A raw pyramidal tile file and the grid position parsed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTile {
    pub tile: TileId,
    pub path: PathBuf,
}

/// Lists the TIFF tiles of a raw section directory, sorted by grid position.
///
/// Fails if any TIFF file name does not carry a row and column.
pub fn source_tiles(section_dir: &Path) -> Result<Vec<SourceTile>> {
    let files = common::file_utils::tiff_files(section_dir).map_err(|e| Error::io(section_dir, e))?;

    let mut tiles = files
        .into_iter()
        .map(|path| -> Result<SourceTile> {
            Ok(SourceTile {
                tile: TileId::from_path(&path)?,
                path,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tiles.sort_by(|a, b| a.tile.cmp(&b.tile).then_with(|| a.path.cmp(&b.path)));

    for pair in tiles.windows(2) {
        if pair[0].tile == pair[1].tile {
            tracing::warn!(
                tile = %pair[0].tile,
                first = %pair[0].path.display(),
                second = %pair[1].path.display(),
                "Two source files map to the same tile directory"
            );
        }
    }

    Ok(tiles)
}

fn section_name(section_dir: &Path) -> Result<String> {
    section_dir
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidPath(section_dir.to_path_buf()))
}

/// True when the section has tiles and every tile's output directory exists
/// and is non-empty.
///
/// This is advisory: a tile interrupted after its first level was written
/// still counts as done.
pub fn section_is_complete(
    layout: &ProjectLayout,
    section: &str,
    tiles: &[SourceTile],
) -> Result<bool> {
    if tiles.is_empty() {
        return Ok(false);
    }
    for tile in tiles {
        let dir = layout.tile_dir(section, tile.tile);
        if !common::file_utils::is_non_empty_dir(&dir).map_err(|e| Error::io(&dir, e))? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// What happened to one section during mipmap generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionOutcome {
    Unpacked { tiles: usize },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub section: String,
    pub outcome: SectionOutcome,
}

/// Unpacks every tile of one raw section into per-tile mipmap directories.
///
/// A section whose tiles have all been unpacked before is skipped with a
/// notice. Otherwise every tile is (re)written.
pub fn create_section_mipmaps(
    layout: &ProjectLayout,
    source_section_dir: &Path,
    progress: &ProgressCallback,
) -> Result<SectionOutcome> {
    let section = section_name(source_section_dir)?;
    let tiles = source_tiles(source_section_dir)?;

    if tiles.is_empty() {
        tracing::warn!(section = %section, "Section has no tiles");
        return Ok(SectionOutcome::Unpacked { tiles: 0 });
    }

    if section_is_complete(layout, &section, &tiles)? {
        tracing::info!(
            section = %section,
            tiles = tiles.len(),
            "Section already unpacked, skipping"
        );
        return Ok(SectionOutcome::Skipped);
    }

    let total = tiles.len();
    for (index, source) in tiles.iter().enumerate() {
        report_progress(progress, &section, index, total, BatchStage::Unpacking);

        let output_dir = layout.tile_dir(&section, source.tile);
        fs::create_dir_all(&output_dir).map_err(|e| Error::io(&output_dir, e))?;

        let levels = unpack_file(&source.path, &output_dir)?;
        tracing::debug!(
            section = %section,
            tile = %source.tile,
            levels,
            "Unpacked tile"
        );
    }
    report_progress(progress, &section, total, total, BatchStage::Unpacking);

    tracing::info!(section = %section, tiles = total, "Section unpacked");
    Ok(SectionOutcome::Unpacked { tiles: total })
}

/// Runs [`create_section_mipmaps`] for every section subdirectory of the raw
/// stack directory, in name order.
pub fn create_stack_mipmaps(
    layout: &ProjectLayout,
    source_stack_dir: &Path,
    progress: &ProgressCallback,
) -> Result<Vec<SectionSummary>> {
    let sections = common::file_utils::subdirectories(source_stack_dir)
        .map_err(|e| Error::io(source_stack_dir, e))?;

    tracing::info!(
        stack = %layout.stack,
        sections = sections.len(),
        "Creating mipmaps for stack"
    );

    sections
        .iter()
        .map(|dir| -> Result<SectionSummary> {
            let outcome = create_section_mipmaps(layout, dir, progress)?;
            Ok(SectionSummary {
                section: section_name(dir)?,
                outcome,
            })
        })
        .collect()
}

/// A tile classified as corrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedTile {
    pub tile: TileId,
    pub file: PathBuf,
    /// The tile's coarsest-level percentile.
    pub value: f64,
}

/// Outcome of artefact detection over one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtefactReport {
    pub section: String,
    pub percentile: f64,
    pub scale: f64,
    pub central: f64,
    pub dispersion: f64,
    pub tiles: usize,
    pub flagged: Vec<FlaggedTile>,
}

impl ArtefactReport {
    /// Writes the report as YAML or JSON, chosen by the file extension.
    pub fn write(&self, path: &Path) -> Result<()> {
        let report_error = |reason: String| Error::Report {
            path: path.to_path_buf(),
            reason,
        };

        let format =
            common::FileFormat::from_file_name(path).map_err(|e| report_error(e.to_string()))?;
        let text = common::serialize(self, format).map_err(|e| report_error(e.to_string()))?;
        fs::write(path, text).map_err(|e| Error::io(path, e))
    }

    pub fn is_flagged(&self, tile: TileId) -> bool {
        self.flagged.iter().any(|f| f.tile == tile)
    }
}

/// Flags corrupted tiles in a raw section, using all of its tiles as the
/// reference set.
///
/// Each tile's coarsest level is decoded once; the reference statistics are
/// computed once and reused for every tile.
pub fn flag_section_artefacts(
    source_section_dir: &Path,
    config: &ArtefactConfig,
    progress: &ProgressCallback,
) -> Result<ArtefactReport> {
    let section = section_name(source_section_dir)?;
    let tiles = source_tiles(source_section_dir)?;
    if tiles.is_empty() {
        return Err(Error::EmptyReferenceSet);
    }

    let total = tiles.len();
    let mut values = Vec::with_capacity(total);
    for (index, source) in tiles.iter().enumerate() {
        report_progress(progress, &section, index, total, BatchStage::Measuring);
        values.push(level_percentile(source.path.as_path(), config.percentile)?);
    }

    let threshold = ArtefactThreshold::from_percentiles(&values, config.percentile);
    let (low, high) = threshold.bounds(config.scale);

    let mut flagged = Vec::new();
    for (index, (source, &value)) in tiles.iter().zip(&values).enumerate() {
        report_progress(progress, &section, index, total, BatchStage::Classifying);
        if threshold.classify(value, config.scale) {
            tracing::warn!(
                section = %section,
                tile = %source.tile,
                value,
                low,
                high,
                "Tile flagged as artefact"
            );
            flagged.push(FlaggedTile {
                tile: source.tile,
                file: source.path.clone(),
                value,
            });
        }
    }
    report_progress(progress, &section, total, total, BatchStage::Classifying);

    tracing::info!(
        section = %section,
        tiles = total,
        flagged = flagged.len(),
        "Artefact detection finished"
    );

    Ok(ArtefactReport {
        section,
        percentile: config.percentile,
        scale: config.scale,
        central: threshold.central,
        dispersion: threshold.dispersion,
        tiles: total,
        flagged,
    })
}
