//! Pyramidal 16-bit grayscale images stored as multi-page TIFF files.
//!
//! Page 0 holds the finest level; every following page is strictly smaller.
//! Each level is a row-major `u16` buffer. Metadata lives beside the pixels
//! and is forwarded unchanged when levels are written out.

mod metadata;

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

use crate::error::{Error, Result};
use crate::math::percentile_u16;

pub use metadata::{Metadata, MetadataValue, DESCRIPTION_KEY};

/// One resolution level: a 2D array of unsigned 16-bit intensities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    width: u32,
    height: u32,
    samples: Vec<u16>,
}

impl Level {
    pub fn new(width: u32, height: u32, samples: Vec<u16>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if samples.len() != expected {
            return Err(Error::LevelSize {
                width,
                height,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    /// A level with every sample set to `value`.
    pub fn filled(width: u32, height: u32, value: u16) -> Self {
        Self {
            width,
            height,
            samples: vec![value; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u16> {
        self.samples
    }

    /// The `pct`-th percentile of this level's samples, linearly interpolated.
    pub fn percentile(&self, pct: f64) -> Result<f64> {
        validate_percentile(pct)?;
        if self.samples.is_empty() {
            return Err(Error::EmptyLevel);
        }
        Ok(percentile_u16(&self.samples, pct))
    }

    /// True if `self` is smaller than `previous` in at least one dimension and
    /// larger in none.
    fn is_coarser_than(&self, previous: &Level) -> bool {
        self.width <= previous.width
            && self.height <= previous.height
            && (self.width < previous.width || self.height < previous.height)
    }

    /// Reads the first page of a TIFF file as a single level.
    pub fn read_tiff(path: &Path) -> Result<Self> {
        let mut decoder = open_decoder(path)?;
        read_level(&mut decoder, path, 0)
    }

    /// Writes this level as a standalone single-page TIFF carrying `metadata`.
    /// An existing file at `path` is overwritten.
    pub fn write_tiff(&self, path: &Path, metadata: &Metadata) -> Result<()> {
        let description = metadata.to_description()?;

        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut encoder = TiffEncoder::new(&mut writer).map_err(|e| Error::encode(path, e))?;
        write_page(&mut encoder, self, description.as_deref()).map_err(|e| Error::encode(path, e))?;
        drop(encoder);

        writer.flush().map_err(|e| Error::io(path, e))
    }
}

/// An ordered, non-empty sequence of levels, finest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidalImage {
    levels: Vec<Level>,
}

impl PyramidalImage {
    /// Builds a pyramid, checking that resolution strictly decreases level by level.
    pub fn new(levels: Vec<Level>) -> Result<Self> {
        if levels.is_empty() {
            return Err(Error::EmptyPyramid);
        }
        for (index, pair) in levels.windows(2).enumerate() {
            if !pair[1].is_coarser_than(&pair[0]) {
                return Err(Error::LevelOrder {
                    index: index + 1,
                    width: pair[1].width,
                    height: pair[1].height,
                });
            }
        }
        Ok(Self { levels })
    }

    /// Builds a pyramid by repeated 2x2 mean downsampling of `base` until either
    /// dimension would drop below `min_size` or `max_levels` is reached.
    pub fn from_base(base: Level, max_levels: usize, min_size: u32) -> Result<Self> {
        let mut levels = vec![base];
        while levels.len() < max_levels {
            let Some(previous) = levels.last() else {
                break;
            };
            if previous.width / 2 < min_size.max(1) || previous.height / 2 < min_size.max(1) {
                break;
            }
            let next = downsample_2x(previous);
            levels.push(next);
        }
        Self::new(levels)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// The lowest-resolution level (the last page).
    pub fn coarsest(&self) -> &Level {
        // `new` rejects empty pyramids.
        &self.levels[self.levels.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Reads every page of a pyramidal TIFF file.
    pub fn read(path: &Path) -> Result<Self> {
        let mut decoder = open_decoder(path)?;
        read_pages(&mut decoder, path)
    }

    /// Reads every page of a pyramidal TIFF file together with its first-page
    /// metadata, through a single decoder.
    pub fn read_with_metadata(path: &Path) -> Result<(Self, Metadata)> {
        let mut decoder = open_decoder(path)?;
        let metadata = Metadata::from_decoder(&mut decoder).map_err(|e| Error::decode(path, e))?;
        let image = read_pages(&mut decoder, path)?;
        Ok((image, metadata))
    }

    /// Decodes only the last page of a pyramidal TIFF file.
    pub fn read_coarsest(path: &Path) -> Result<Level> {
        let mut decoder = open_decoder(path)?;

        let mut page = 0;
        while decoder.more_images() {
            decoder.next_image().map_err(|e| Error::decode(path, e))?;
            page += 1;
        }

        read_level(&mut decoder, path, page)
    }

    /// Writes the whole pyramid as one multi-page TIFF, `metadata` on every page.
    pub fn write(&self, path: &Path, metadata: &Metadata) -> Result<()> {
        let description = metadata.to_description()?;

        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut encoder = TiffEncoder::new(&mut writer).map_err(|e| Error::encode(path, e))?;
        for level in &self.levels {
            write_page(&mut encoder, level, description.as_deref())
                .map_err(|e| Error::encode(path, e))?;
        }
        drop(encoder);

        writer.flush().map_err(|e| Error::io(path, e))
    }
}

pub(crate) fn validate_percentile(pct: f64) -> Result<()> {
    if (0.0..=100.0).contains(&pct) {
        Ok(())
    } else {
        Err(Error::InvalidPercentile(pct))
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<File>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    // Megafield tiles exceed the default decoding limits.
    let decoder = Decoder::new(file)
        .map_err(|e| Error::decode(path, e))?
        .with_limits(Limits::unlimited());
    Ok(decoder)
}

/// Decodes every page from the one the decoder currently points at.
fn read_pages<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<PyramidalImage> {
    let mut levels = Vec::new();
    loop {
        levels.push(read_level(decoder, path, levels.len())?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(|e| Error::decode(path, e))?;
    }

    tracing::debug!(path = %path.display(), levels = levels.len(), "Read pyramid");
    PyramidalImage::new(levels)
}

fn read_level<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path, page: usize) -> Result<Level> {
    let colortype = decoder.colortype().map_err(|e| Error::decode(path, e))?;
    if colortype != tiff::ColorType::Gray(16) {
        return Err(Error::UnsupportedSampleFormat {
            path: path.to_path_buf(),
            page,
            found: format!("{:?}", colortype),
        });
    }

    let (width, height) = decoder.dimensions().map_err(|e| Error::decode(path, e))?;
    let samples = match decoder.read_image().map_err(|e| Error::decode(path, e))? {
        DecodingResult::U16(buf) => buf,
        other => {
            return Err(Error::UnsupportedSampleFormat {
                path: path.to_path_buf(),
                page,
                found: sample_kind(&other).to_string(),
            });
        }
    };

    Level::new(width, height, samples)
}

fn sample_kind(result: &DecodingResult) -> &'static str {
    match result {
        DecodingResult::U8(_) => "u8",
        DecodingResult::U16(_) => "u16",
        DecodingResult::U32(_) => "u32",
        DecodingResult::U64(_) => "u64",
        DecodingResult::F32(_) => "f32",
        DecodingResult::F64(_) => "f64",
        DecodingResult::I8(_) => "i8",
        DecodingResult::I16(_) => "i16",
        DecodingResult::I32(_) => "i32",
        DecodingResult::I64(_) => "i64",
        _ => "unknown",
    }
}

fn write_page<W: Write + Seek>(
    encoder: &mut TiffEncoder<W>,
    level: &Level,
    description: Option<&str>,
) -> tiff::TiffResult<()> {
    let mut image = encoder.new_image::<colortype::Gray16>(level.width, level.height)?;
    if let Some(description) = description {
        image.encoder().write_tag(Tag::ImageDescription, description)?;
    }
    image.write_data(&level.samples)
}

fn downsample_2x(level: &Level) -> Level {
    let width = level.width / 2;
    let height = level.height / 2;
    let src_width = level.width as usize;

    let mut samples = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height as usize {
        let top = 2 * y * src_width;
        let bottom = top + src_width;
        for x in 0..width as usize {
            let sum = u32::from(level.samples[top + 2 * x])
                + u32::from(level.samples[top + 2 * x + 1])
                + u32::from(level.samples[bottom + 2 * x])
                + u32::from(level.samples[bottom + 2 * x + 1]);
            samples.push(((sum + 2) / 4) as u16);
        }
    }

    Level {
        width,
        height,
        samples,
    }
}
