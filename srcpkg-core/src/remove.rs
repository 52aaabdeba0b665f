use std::path::{Path, PathBuf};

use crate::buildlog::BuildLog;
use crate::db::Database;
use crate::hooks;
use crate::roots::Roots;

/// Removes an installed package: its files, then hooks, then the
/// database record. Returns `true` if a record existed and was removed.
///
/// Paths are deleted deepest-first so files are unlinked before their
/// parent directories are attempted. After each file removal, empty
/// parent directories are unlinked walking up toward root, but only if
/// no other installed package's manifest has that directory as an
/// ancestor, so one package's uninstall never deletes a directory another
/// installed package's manifest still points into.
/// Per-path errors are logged and do not abort the overall removal.
pub fn remove(name: &str, roots: &Roots, db: &Database, log: &mut BuildLog) -> crate::error::Result<bool> {
    let Some(record) = db.get(name)? else {
        log.warn(format!("package {name} is not installed"));
        return Ok(false);
    };

    let other_manifests: Vec<Vec<PathBuf>> = db
        .list()?
        .into_iter()
        .filter(|r| r.name != name)
        .map(|r| r.files.iter().map(PathBuf::from).collect())
        .collect();

    let mut paths: Vec<PathBuf> = record.files.iter().map(PathBuf::from).collect();
    paths.sort_by_key(|p| std::cmp::Reverse(p.as_os_str().len()));

    for path in &paths {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log.warn(format!("failed to remove {}: {e}", path.display()));
            }
            continue;
        }
        unlink_empty_parents(path, &other_manifests, log);
    }

    hooks::run_post_remove(&record.recipe, roots, log);
    db.remove(name)?;
    log.info(format!("removed {name}"));
    Ok(true)
}

fn unlink_empty_parents(file: &Path, other_manifests: &[Vec<PathBuf>], log: &mut BuildLog) {
    let mut dir = match file.parent() {
        Some(d) => d.to_path_buf(),
        None => return,
    };
    loop {
        if dir.as_os_str().is_empty() || dir == Path::new("/") {
            break;
        }
        if is_ancestor_of_other_manifest(&dir, other_manifests) {
            break;
        }
        let is_empty = std::fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if !is_empty {
            break;
        }
        if let Err(e) = std::fs::remove_dir(&dir) {
            log.warn(format!("failed to remove directory {}: {e}", dir.display()));
            break;
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => break,
        }
    }
}

fn is_ancestor_of_other_manifest(dir: &Path, other_manifests: &[Vec<PathBuf>]) -> bool {
    other_manifests
        .iter()
        .flatten()
        .any(|p| p.starts_with(dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InstalledPkg;
    use crate::recipe::{BuildSpec, Hooks, PackageOptions, PackageMeta, SourceSpec};

    fn meta(name: &str) -> PackageMeta {
        PackageMeta {
            name: name.to_string(),
            version: "1.0".to_string(),
            category: "extras".to_string(),
            homepage: None,
            source: SourceSpec::Archive {
                url: "https://example.com/x.tar.gz".into(),
                sha256: None,
            },
            git: None,
            patches: vec![],
            depends: vec![],
            build: BuildSpec::default(),
            package: PackageOptions::default(),
            hooks: Hooks::default(),
        }
    }

    #[test]
    fn removes_files_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let live = root.join("usr/bin/hello");
        std::fs::create_dir_all(live.parent().unwrap()).unwrap();
        std::fs::write(&live, b"x").unwrap();

        let roots = Roots::resolve(Some(root.clone()), None, None, None);
        let db = Database::open(&roots.db).unwrap();
        db.put(&InstalledPkg {
            name: "hello".to_string(),
            version: "1.0".to_string(),
            files: vec![live.display().to_string()],
            depends: vec![],
            recipe: meta("hello"),
        })
        .unwrap();

        let mut log = BuildLog::open(&roots.log_file("hello"), "hello").unwrap();
        let removed = remove("hello", &roots, &db, &mut log).unwrap();
        assert!(removed);
        assert!(!live.is_file());
        assert!(db.get("hello").unwrap().is_none());
    }

    #[test]
    fn shared_directory_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let bin_dir = root.join("usr/bin");
        std::fs::create_dir_all(&bin_dir).unwrap();
        let a_file = bin_dir.join("a");
        let b_file = bin_dir.join("b");
        std::fs::write(&a_file, b"x").unwrap();
        std::fs::write(&b_file, b"y").unwrap();

        let roots = Roots::resolve(Some(root.clone()), None, None, None);
        let db = Database::open(&roots.db).unwrap();
        db.put(&InstalledPkg {
            name: "a".to_string(),
            version: "1.0".to_string(),
            files: vec![a_file.display().to_string()],
            depends: vec![],
            recipe: meta("a"),
        })
        .unwrap();
        db.put(&InstalledPkg {
            name: "b".to_string(),
            version: "1.0".to_string(),
            files: vec![b_file.display().to_string()],
            depends: vec![],
            recipe: meta("b"),
        })
        .unwrap();

        let mut log = BuildLog::open(&roots.log_file("a"), "a").unwrap();
        remove("a", &roots, &db, &mut log).unwrap();
        assert!(!a_file.is_file());
        // usr/bin still used by b's manifest, so it must survive
        assert!(bin_dir.is_dir());
    }

    #[test]
    fn removing_absent_package_warns_and_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let roots = Roots::resolve(Some(root), None, None, None);
        let db = Database::open(&roots.db).unwrap();
        let mut log = BuildLog::open(&roots.log_file("ghost"), "ghost").unwrap();
        assert!(!remove("ghost", &roots, &db, &mut log).unwrap());
    }
}
