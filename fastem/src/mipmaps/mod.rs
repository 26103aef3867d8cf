//! Unpacks a pyramidal image into one single-page file per level.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pyramid::{Metadata, PyramidalImage};

/// Extension of every unpacked level file.
pub const MIPMAP_EXTENSION: &str = "tif";

/// Path of the file holding pyramid level `index` inside `output_dir`.
pub fn mipmap_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("{}.{}", index, MIPMAP_EXTENSION))
}

/// Writes level `i` of `image` to `<output_dir>/<i>.tif`, finest first, each
/// carrying `metadata` unchanged.
///
/// `output_dir` must already exist. Existing level files are overwritten
/// without warning.
pub fn unpack(image: &PyramidalImage, output_dir: &Path, metadata: &Metadata) -> Result<()> {
    if !output_dir.is_dir() {
        return Err(Error::io(
            output_dir,
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "output directory does not exist",
            ),
        ));
    }

    for (index, level) in image.levels().iter().enumerate() {
        let path = mipmap_path(output_dir, index);
        level.write_tiff(&path, metadata)?;
        tracing::debug!(
            path = %path.display(),
            width = level.width(),
            height = level.height(),
            "Wrote mipmap level"
        );
    }

    Ok(())
}

/// Reads the pyramid at `source` with its first-page metadata and unpacks it
/// into `output_dir`. Returns the number of levels written.
pub fn unpack_file(source: &Path, output_dir: &Path) -> Result<usize> {
    let (image, metadata) = PyramidalImage::read_with_metadata(source)?;
    unpack(&image, output_dir, &metadata)?;
    Ok(image.len())
}
