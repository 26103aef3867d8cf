//! Percentile-based artefact detection for megafield tiles.
//!
//! # Algorithm
//!
//! Each tile is reduced to one number: the `pct`-th percentile of its coarsest
//! pyramid level. Over a reference set of tiles (typically a whole megafield):
//!
//! - **central** = median of the per-tile percentiles
//! - **dispersion** = median of `|percentile_i - central|` (MAD)
//!
//! A tile is flagged when its percentile falls strictly outside
//! `[central - scale * dispersion, central + scale * dispersion]`. This is a
//! two-sided Hampel identifier. The bounds themselves are not flagged.
//!
//! `(central, dispersion)` is computed once per reference set and then reused
//! for every tile that is classified against it; see [`ArtefactThreshold`].

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::{mad_f64, median_f64_mut};
use crate::pyramid::{validate_percentile, Level, PyramidalImage};

/// Default percentile of the coarsest level used as the per-tile statistic.
pub const DEFAULT_PERCENTILE: f64 = 1.0;

/// Default MAD multiplier for the acceptance band.
pub const DEFAULT_SCALE: f64 = 3.0;

/// Anything whose coarsest pyramid level can be obtained.
///
/// File paths decode only the last page, so a reference set of paths never
/// holds more than one coarsest level in memory at a time.
pub trait CoarsestLevel {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>>;
}

impl CoarsestLevel for Level {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>> {
        Ok(Cow::Borrowed(self))
    }
}

impl CoarsestLevel for PyramidalImage {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>> {
        Ok(Cow::Borrowed(self.coarsest()))
    }
}

impl CoarsestLevel for Path {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>> {
        PyramidalImage::read_coarsest(self).map(Cow::Owned)
    }
}

impl CoarsestLevel for PathBuf {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>> {
        self.as_path().coarsest_level()
    }
}

impl<T: CoarsestLevel + ?Sized> CoarsestLevel for &T {
    fn coarsest_level(&self) -> Result<Cow<'_, Level>> {
        (**self).coarsest_level()
    }
}

/// Percentile settings for artefact detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtefactConfig {
    /// Percentile (0-100) of the coarsest level used as the per-tile statistic.
    pub percentile: f64,
    /// MAD multiplier; larger values tolerate larger deviations.
    pub scale: f64,
}

impl Default for ArtefactConfig {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_PERCENTILE,
            scale: DEFAULT_SCALE,
        }
    }
}

impl ArtefactConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(format!(
                "percentile must be within [0, 100], got {}",
                self.percentile
            ));
        }
        if !self.scale.is_finite() || self.scale < 0.0 {
            return Err(format!(
                "scale must be finite and non-negative, got {}",
                self.scale
            ));
        }
        Ok(())
    }
}

/// The `pct`-th percentile of the coarsest level of `image`.
pub fn level_percentile<I: CoarsestLevel + ?Sized>(image: &I, pct: f64) -> Result<f64> {
    validate_percentile(pct)?;
    image.coarsest_level()?.percentile(pct)
}

fn reference_percentiles<I: CoarsestLevel>(images: &[I], pct: f64) -> Result<Vec<f64>> {
    validate_percentile(pct)?;
    if images.is_empty() {
        return Err(Error::EmptyReferenceSet);
    }
    images
        .iter()
        .map(|image| level_percentile(image, pct))
        .collect()
}

/// Median over `images` of each image's coarsest-level `pct`-th percentile.
pub fn compute_central<I: CoarsestLevel>(images: &[I], pct: f64) -> Result<f64> {
    let mut values = reference_percentiles(images, pct)?;
    Ok(median_f64_mut(&mut values))
}

/// Median absolute deviation of each image's coarsest-level `pct`-th
/// percentile from `central`.
///
/// `pct` must match the one `central` was computed with.
pub fn compute_dispersion<I: CoarsestLevel>(images: &[I], central: f64, pct: f64) -> Result<f64> {
    let values = reference_percentiles(images, pct)?;
    Ok(mad_f64(&values, central))
}

/// True if the coarsest-level `pct`-th percentile of `image` lies strictly
/// outside `[central - scale * dispersion, central + scale * dispersion]`.
pub fn is_artefact<I: CoarsestLevel + ?Sized>(
    image: &I,
    central: f64,
    dispersion: f64,
    pct: f64,
    scale: f64,
) -> Result<bool> {
    let value = level_percentile(image, pct)?;
    Ok(outside_band(value, central, dispersion, scale))
}

#[inline]
fn outside_band(value: f64, central: f64, dispersion: f64, scale: f64) -> bool {
    value < central - scale * dispersion || value > central + scale * dispersion
}

/// Reference statistics for one batch of tiles, computed once and reused for
/// every classification against that batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArtefactThreshold {
    pub central: f64,
    pub dispersion: f64,
    /// Percentile the statistics were computed with.
    pub percentile: f64,
}

impl ArtefactThreshold {
    /// Reads each reference image once and derives both central and dispersion.
    pub fn from_reference<I: CoarsestLevel>(images: &[I], pct: f64) -> Result<Self> {
        let values = reference_percentiles(images, pct)?;
        Ok(Self::from_percentiles(&values, pct))
    }

    /// Builds the threshold from per-tile percentiles that are already known.
    pub(crate) fn from_percentiles(values: &[f64], pct: f64) -> Self {
        debug_assert!(!values.is_empty());

        let mut scratch = values.to_vec();
        let central = median_f64_mut(&mut scratch);
        let dispersion = mad_f64(values, central);

        tracing::info!(
            reference_count = values.len(),
            percentile = pct,
            central,
            dispersion,
            "Computed artefact reference statistics"
        );

        Self {
            central,
            dispersion,
            percentile: pct,
        }
    }

    /// Inclusive acceptance band `(low, high)` for the given scale.
    pub fn bounds(&self, scale: f64) -> (f64, f64) {
        (
            self.central - scale * self.dispersion,
            self.central + scale * self.dispersion,
        )
    }

    /// Classifies a percentile value that was already measured with
    /// [`Self::percentile`].
    pub fn classify(&self, value: f64, scale: f64) -> bool {
        outside_band(value, self.central, self.dispersion, scale)
    }

    pub fn is_artefact<I: CoarsestLevel + ?Sized>(&self, image: &I, scale: f64) -> Result<bool> {
        is_artefact(image, self.central, self.dispersion, self.percentile, scale)
    }
}
