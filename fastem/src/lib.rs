//! FAST-EM post-processing.
//!
//! Two independent tools over pyramidal 16-bit TIFF tiles:
//! - Mipmap unpacking: every pyramid level becomes its own single-page file,
//!   carrying the source's first-page metadata.
//! - Artefact detection: tiles whose coarsest-level low percentile deviates
//!   too far (in MAD units) from the median over a reference set are flagged.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fastem::{ArtefactThreshold, DEFAULT_PERCENTILE, DEFAULT_SCALE};
//!
//! // One reference computation per megafield...
//! let threshold = ArtefactThreshold::from_reference(&tile_paths, DEFAULT_PERCENTILE)?;
//!
//! // ...reused for every tile.
//! for path in &tile_paths {
//!     if threshold.is_artefact(path, DEFAULT_SCALE)? {
//!         println!("{} is corrupted", path.display());
//!     }
//! }
//! ```

pub mod artefacts;
pub mod batch;
pub mod config;
mod error;
pub(crate) mod math;
pub mod mipmaps;
pub mod pyramid;
pub mod tile;

// ============================================================================
// Core types
// ============================================================================

pub use error::{Error, Result};
pub use pyramid::{Level, Metadata, MetadataValue, PyramidalImage};
pub use tile::TileId;

// ============================================================================
// Mipmaps
// ============================================================================

pub use mipmaps::{mipmap_path, unpack, unpack_file, MIPMAP_EXTENSION};

// ============================================================================
// Artefact detection
// ============================================================================

pub use artefacts::{
    compute_central, compute_dispersion, is_artefact, level_percentile, ArtefactConfig,
    ArtefactThreshold, CoarsestLevel, DEFAULT_PERCENTILE, DEFAULT_SCALE,
};

// ============================================================================
// Batch flows
// ============================================================================

pub use batch::{
    create_section_mipmaps, create_stack_mipmaps, flag_section_artefacts, report_progress,
    section_is_complete, source_tiles, ArtefactReport, BatchProgress, BatchStage, FlaggedTile,
    ProgressCallback, ProjectLayout, SectionOutcome, SectionSummary, SourceTile,
};
pub use config::WorkflowConfig;

