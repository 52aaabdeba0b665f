use std::path::{Path, PathBuf};
use std::process::Command;

use crate::checksum;
use crate::error::{Error, Result};
use crate::fetcher::Fetcher;
use crate::recipe::PatchSpec;

/// Applies every `PatchSpec` in declaration order against `src_root`.
pub fn apply_all(patches: &[PatchSpec], src_root: &Path, patches_dir: &Path, fetcher: &Fetcher) -> Result<()> {
    std::fs::create_dir_all(patches_dir)?;
    for patch in patches {
        let local = resolve(patch, patches_dir, fetcher)?;
        checksum::verify(&local, patch.sha256.as_deref())?;
        apply_one(&local, src_root, patch.strip)?;
    }
    Ok(())
}

fn resolve(patch: &PatchSpec, patches_dir: &Path, fetcher: &Fetcher) -> Result<PathBuf> {
    if let Some(path) = &patch.path {
        return Ok(PathBuf::from(path));
    }
    if let Some(url) = &patch.url {
        let filename = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Other(format!("cannot derive filename from {url}")))?;
        let dest = patches_dir.join(filename);
        if !dest.is_file() {
            let _ = fetcher;
            fetch_patch(url, &dest)?;
        }
        return Ok(dest);
    }
    Err(Error::Other("patch spec has neither path nor url".to_string()))
}

fn fetch_patch(url: &str, dest: &Path) -> Result<()> {
    let downloader = which::which("wget")
        .or_else(|_| which::which("curl"))
        .map_err(|_| Error::NoDownloader)?;
    let is_wget = downloader
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains("wget"))
        .unwrap_or(false);
    let status = if is_wget {
        Command::new(&downloader).arg("-O").arg(dest).arg(url).status()
    } else {
        Command::new(&downloader).arg("-L").arg("-o").arg(dest).arg(url).status()
    }
    .map_err(|e| Error::NetworkError {
        url: url.to_string(),
        reason: e.to_string(),
        code: None,
    })?;
    if !status.success() {
        return Err(Error::NetworkError {
            url: url.to_string(),
            reason: format!("downloader exited with {status}"),
            code: status.code(),
        });
    }
    Ok(())
}

/// Applies one patch file using the external `patch` tool in strict
/// non-interactive, reverse-rejects-to-stderr mode.
fn apply_one(patch_file: &Path, src_root: &Path, strip: u32) -> Result<()> {
    let status = Command::new("patch")
        .arg(format!("-p{strip}"))
        .args(["-t", "-N", "-r", "-"])
        .arg("-i")
        .arg(patch_file)
        .current_dir(src_root)
        .status()?;
    if !status.success() {
        return Err(Error::PatchFailed {
            path: patch_file.to_path_buf(),
            code: status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
