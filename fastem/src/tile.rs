//! Tile identification from raw file names.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid pattern"));

/// Grid position of a field-of-view tile within its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId {
    pub row: u32,
    pub col: u32,
}

impl TileId {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parses row and column from the first two numeric groups of the file stem,
    /// e.g. `005_012_0.tiff` -> (5, 12).
    pub fn from_path(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
        Self::from_name(stem)
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let tile_name_error = || Error::TileName {
            name: name.to_string(),
        };

        let mut numbers = NUMBER
            .find_iter(name)
            .map(|m| m.as_str().parse::<u32>().map_err(|_| tile_name_error()));

        let row = numbers.next().ok_or_else(tile_name_error)??;
        let col = numbers.next().ok_or_else(tile_name_error)??;
        Ok(Self { row, col })
    }

    /// Output directory name: row and column zero-padded to three digits.
    pub fn dir_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}_{:03}", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_row_and_column() {
        let tile = TileId::from_path(Path::new("/raw/S001/005_012_0.tiff")).unwrap();
        assert_eq!(tile, TileId::new(5, 12));
        assert_eq!(tile.dir_name(), "005_012");
    }

    #[test]
    fn extra_numbers_are_ignored() {
        assert_eq!(
            TileId::from_name("tile_3_14_15_92").unwrap(),
            TileId::new(3, 14)
        );
    }

    #[test]
    fn non_numeric_separators() {
        assert_eq!(TileId::from_name("r7c21").unwrap(), TileId::new(7, 21));
    }

    #[test]
    fn fewer_than_two_numbers_is_an_error() {
        assert!(matches!(
            TileId::from_name("overview_1"),
            Err(Error::TileName { .. })
        ));
        assert!(matches!(
            TileId::from_path(Path::new("thumbnail.tif")),
            Err(Error::TileName { .. })
        ));
    }

    #[test]
    fn overflowing_number_is_an_error() {
        assert!(matches!(
            TileId::from_name("99999999999_1"),
            Err(Error::TileName { .. })
        ));
    }

    #[test]
    fn wide_indices_are_not_truncated() {
        assert_eq!(TileId::new(1234, 5).dir_name(), "1234_005");
    }

    #[test]
    fn tiles_sort_row_major() {
        let mut tiles = vec![TileId::new(1, 0), TileId::new(0, 2), TileId::new(0, 1)];
        tiles.sort();
        assert_eq!(
            tiles,
            vec![TileId::new(0, 1), TileId::new(0, 2), TileId::new(1, 0)]
        );
    }
}
