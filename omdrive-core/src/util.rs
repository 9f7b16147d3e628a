//! Contains a collection of useful utility functions.

#![allow(unused)]

extern crate strsim;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::Result;

/// Splits a colon-delimited list into its raw entries.
///
/// Interior empty entries are kept, they carry positional meaning when
/// two lists get paired up. A fully empty input yields no entries at all.
pub fn split_list(list: &str) -> Vec<String> {
    if list.trim().is_empty() {
        return Vec::new();
    }
    list.split(':').map(|s| s.to_string()).collect()
}

/// Splits a colon-delimited list of paths, dropping empty entries.
pub fn split_paths_list(list: &str) -> Vec<PathBuf> {
    split_list(list)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Removes the directory with everything in it, then creates it anew.
pub fn clear_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    if dir.exists() {
        debug!("clearing directory: {}", dir.to_string_lossy());
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Copies a file to the target path, replacing anything already there.
pub fn copy_file_overwrite<P: AsRef<Path>>(src: P, dst: P) -> Result<()> {
    let (src, dst) = (src.as_ref(), dst.as_ref());
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    Ok(())
}

/// Turns a path into its canonical absolute form.
pub fn absolutize<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let canon = dunce::canonicalize(path.as_ref())?;
    Ok(canon)
}

/// Create a static deser object from given path using serde.
pub fn deser_struct_from_path<T>(file_path: PathBuf) -> Result<T>
where
    for<'de> T: serde::Deserialize<'de>,
{
    let bytes = fs::read(file_path)?;
    let d: T = toml::from_slice(&bytes)?;
    Ok(d)
}

/// Get a similar name based on string similarity.
pub fn get_similar(original: &str, list: &[&str]) -> Option<String> {
    use self::strsim::normalized_damerau_levenshtein;
    let mut highest_sim = 0f64;
    let mut best_string = "";
    for candidate in list {
        let j = normalized_damerau_levenshtein(candidate, original);
        if j > highest_sim {
            highest_sim = j;
            best_string = candidate;
        }
    }
    if highest_sim > 0.4f64 {
        Some(best_string.to_owned())
    } else {
        None
    }
}
