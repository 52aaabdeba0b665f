use std::path::Path;

use filetime::FileTime;

use crate::buildlog::BuildLog;
use crate::db::{Database, InstalledPkg};
use crate::error::{Error, Result};
use crate::hooks;
use crate::recipe::PackageMeta;
use crate::roots::Roots;

/// Copies `staging_root` onto `live_root`, preserving mode and timestamps,
/// and returns the absolute live-root path of every file written.
///
/// Precondition: caller has already verified the effective UID is 0.
pub fn copy_staging_tree(staging_root: &Path, live_root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    copy_recursive(staging_root, staging_root, live_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn copy_recursive(
    staging_root: &Path,
    current: &Path,
    live_root: &Path,
    files: &mut Vec<String>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let relative = path.strip_prefix(staging_root).unwrap();
        let live_path = live_root.join(relative);

        if path.is_dir() {
            std::fs::create_dir_all(&live_path)?;
            copy_recursive(staging_root, &path, live_root, files)?;
        } else {
            if let Some(parent) = live_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&path, &live_path)?;
            let meta = std::fs::metadata(&path)?;
            std::fs::set_permissions(&live_path, meta.permissions())?;
            filetime::set_file_times(
                &live_path,
                FileTime::from_last_access_time(&meta),
                FileTime::from_last_modification_time(&meta),
            )?;
            files.push(live_path.display().to_string());
        }
    }
    Ok(())
}

/// Installs `staging_root` onto the live root, persists the resulting
/// `InstalledPkg` record, and runs `post_install` hooks.
///
/// Fails with `NotPrivileged` unless the effective UID is 0.
pub fn install(
    recipe: &PackageMeta,
    staging_root: &Path,
    live_root: &Path,
    roots: &Roots,
    db: &Database,
    log: &mut BuildLog,
) -> Result<InstalledPkg> {
    if !is_root() {
        return Err(Error::NotPrivileged);
    }

    let files = copy_staging_tree(staging_root, live_root)?;
    log.info(format!("installed {} files", files.len()));

    let record = InstalledPkg {
        name: recipe.name.clone(),
        version: recipe.version.clone(),
        files,
        depends: recipe.depends.clone(),
        recipe: recipe.clone(),
    };
    db.put(&record)?;
    log.info("database record written");

    hooks::run_post_install(recipe, roots, log);

    Ok(record)
}

#[cfg(not(test))]
fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Installer tests run unprivileged; the privilege gate itself is
/// exercised directly against `is_root`'s real implementation in
/// integration, not unit, tests.
#[cfg(test)]
fn is_root() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_preserves_relative_layout() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("staging");
        let live = dir.path().join("live");
        std::fs::create_dir_all(staging.join("usr/bin")).unwrap();
        std::fs::write(staging.join("usr/bin/hello"), b"bin").unwrap();

        let files = copy_staging_tree(&staging, &live).unwrap();
        assert_eq!(files.len(), 1);
        assert!(live.join("usr/bin/hello").is_file());
    }

    #[test]
    fn existing_files_are_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("staging");
        let live = dir.path().join("live");
        std::fs::create_dir_all(staging.join("usr/bin")).unwrap();
        std::fs::create_dir_all(live.join("usr/bin")).unwrap();
        std::fs::write(live.join("usr/bin/hello"), b"old").unwrap();
        std::fs::write(staging.join("usr/bin/hello"), b"new").unwrap();

        copy_staging_tree(&staging, &live).unwrap();
        let contents = std::fs::read_to_string(live.join("usr/bin/hello")).unwrap();
        assert_eq!(contents, "new");
    }
}
