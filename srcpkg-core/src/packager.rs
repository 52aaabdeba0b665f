use std::fs::File;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::buildlog::BuildLog;
use crate::error::Result;

/// Optionally strips binaries/shared objects in `staging_root`, then
/// packages it into `<name>-<version>-1.tar.xz` under `output_dir`.
pub fn package(
    staging_root: &Path,
    output_dir: &Path,
    name: &str,
    version: &str,
    strip: bool,
    log: &mut BuildLog,
) -> Result<PathBuf> {
    if strip {
        strip_tree(staging_root, log);
    }
    std::fs::create_dir_all(output_dir)?;
    let archive_path = output_dir.join(format!("{name}-{version}-1.tar.xz"));
    write_tar_xz(staging_root, &archive_path)?;
    Ok(archive_path)
}

fn is_strippable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    let owner_exec = meta.permissions().mode() & 0o100 != 0;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let so_marker = name.ends_with(".so") || name.contains(".so.");
    owner_exec || so_marker
}

fn strip_tree(root: &Path, log: &mut BuildLog) {
    for entry in walk(root) {
        if is_strippable(&entry) {
            let status = Command::new("strip").arg("--strip-unneeded").arg(&entry).status();
            match status {
                Ok(s) if s.success() => {}
                _ => log.warn(format!("strip failed on {}", entry.display())),
            }
        }
    }
}

fn walk(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(root) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}

fn write_tar_xz(staging_root: &Path, archive_path: &Path) -> Result<()> {
    let file = File::create(archive_path)?;
    let encoder = xz2::write::XzEncoder::new(file, 6);
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all("./", staging_root)?;
    let encoder = builder.into_inner()?;
    encoder.finish()?;
    Ok(())
}
