use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Extracts `archive` into `dest`, clearing `dest` first if it already
/// exists, and returns the effective source root after applying the
/// single-root collapse rule.
pub fn extract(archive: &Path, dest: &Path) -> Result<PathBuf> {
    if dest.exists() {
        std::fs::remove_dir_all(dest)?;
    }
    std::fs::create_dir_all(dest)?;

    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if ends_with_any(name, &[".tar.gz", ".tgz", ".tar.bz2", ".tbz2", ".tar.xz", ".txz"]) {
        extract_tar_builtin(archive, dest)?;
    } else if name.ends_with(".tar.zst") {
        extract_tar_zstd_external(archive, dest)?;
    } else if name.ends_with(".zip") {
        extract_zip_builtin(archive, dest)?;
    } else if ends_with_any(name, &[".7z", ".7zip"]) {
        extract_7z_external(archive, dest)?;
    } else {
        return Err(Error::UnsupportedArchive(name.to_string()));
    }

    collapse_single_root(dest)
}

fn ends_with_any(name: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|s| name.ends_with(s))
}

fn extract_tar_builtin(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if ends_with_any(name, &[".tar.gz", ".tgz"]) {
        let decoder = flate2::read::GzDecoder::new(file);
        tar::Archive::new(decoder).unpack(dest)?;
    } else if ends_with_any(name, &[".tar.bz2", ".tbz2"]) {
        let decoder = bzip2::read::BzDecoder::new(file);
        tar::Archive::new(decoder).unpack(dest)?;
    } else if ends_with_any(name, &[".tar.xz", ".txz"]) {
        let decoder = xz2::read::XzDecoder::new(file);
        tar::Archive::new(decoder).unpack(dest)?;
    }
    Ok(())
}

fn extract_tar_zstd_external(archive: &Path, dest: &Path) -> Result<()> {
    let status = Command::new("tar")
        .arg("--zstd")
        .arg("-xf")
        .arg(archive)
        .arg("-C")
        .arg(dest)
        .status()?;
    if !status.success() {
        return Err(Error::ExternalCommandFailed {
            command: "tar --zstd".to_string(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

fn extract_zip_builtin(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| Error::Other(e.to_string()))?;
    zip.extract(dest).map_err(|e| Error::Other(e.to_string()))?;
    Ok(())
}

fn extract_7z_external(archive: &Path, dest: &Path) -> Result<()> {
    let status = Command::new("7z")
        .arg("x")
        .arg(archive)
        .arg(format!("-o{}", dest.display()))
        .arg("-y")
        .status()?;
    if !status.success() {
        return Err(Error::ExternalCommandFailed {
            command: "7z".to_string(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}

/// If `dest` contains exactly one entry that is itself a directory, that
/// directory is the effective source root; otherwise `dest` itself is.
fn collapse_single_root(dest: &Path) -> Result<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dest)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    if entries.len() == 1 && entries[0].is_dir() {
        return Ok(entries.pop().unwrap());
    }
    Ok(dest.to_path_buf())
}
