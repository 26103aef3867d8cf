//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Supported TIFF file extensions.
pub const TIFF_EXTENSIONS: &[&str] = &["tif", "tiff"];

/// Returns paths to all files in a directory matching the given extensions,
/// sorted by path. Extensions are matched case-insensitively.
pub fn files_with_extensions(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        if extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Returns paths to all TIFF files in the given directory.
pub fn tiff_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    files_with_extensions(dir, TIFF_EXTENSIONS)
}

/// Returns all immediate subdirectories of `dir`, sorted by path.
pub fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// True if `dir` exists and contains at least one entry.
pub fn is_non_empty_dir(dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    Ok(fs::read_dir(dir)?.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_output_dir;

    #[test]
    fn tiff_files_filters_and_sorts() {
        let dir = test_output_dir("common_tiff_files");
        for name in ["b_0.TIF", "a_0.tiff", "notes.txt", "c_0.png"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        fs::create_dir(dir.join("nested.tif")).unwrap();

        let files = tiff_files(&dir).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_0.tiff", "b_0.TIF"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = test_output_dir("common_missing_dir").join("absent");
        assert!(tiff_files(&dir).is_err());
        assert!(!is_non_empty_dir(&dir).unwrap());
    }

    #[test]
    fn subdirectories_and_emptiness() {
        let dir = test_output_dir("common_subdirectories");
        fs::create_dir(dir.join("S002")).unwrap();
        fs::create_dir(dir.join("S001")).unwrap();
        fs::write(dir.join("S001").join("0.tif"), b"x").unwrap();
        fs::write(dir.join("file.txt"), b"x").unwrap();

        let dirs = subdirectories(&dir).unwrap();
        assert_eq!(dirs, vec![dir.join("S001"), dir.join("S002")]);
        assert!(is_non_empty_dir(&dir.join("S001")).unwrap());
        assert!(!is_non_empty_dir(&dir.join("S002")).unwrap());
    }
}
