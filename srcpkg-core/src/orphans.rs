use std::collections::HashSet;

use crate::db::Database;
use crate::error::Result;

/// A package is an orphan iff no other installed package lists it among
/// its `depends`. Detection is a single pass over the current installed
/// set, not a fixpoint: removing the returned orphans may create new
/// orphans that a second call would report.
pub fn find(db: &Database) -> Result<Vec<String>> {
    let records = db.list()?;
    let required: HashSet<&str> = records
        .iter()
        .flat_map(|r| r.depends.iter().map(String::as_str))
        .collect();

    let mut orphans: Vec<String> = records
        .iter()
        .map(|r| r.name.clone())
        .filter(|name| !required.contains(name.as_str()))
        .collect();
    orphans.sort();
    Ok(orphans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InstalledPkg;
    use crate::recipe::{BuildSpec, Hooks, PackageOptions, SourceSpec};

    fn record(name: &str, depends: &[&str]) -> InstalledPkg {
        InstalledPkg {
            name: name.to_string(),
            version: "1.0".to_string(),
            files: vec![],
            depends: depends.iter().map(|s| s.to_string()).collect(),
            recipe: crate::recipe::PackageMeta {
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
                depends: depends.iter().map(|s| s.to_string()).collect(),
                build: BuildSpec::default(),
                package: PackageOptions::default(),
                hooks: Hooks::default(),
            },
        }
    }

    #[test]
    fn no_dependents_means_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.put(&record("b", &[])).unwrap();
        db.put(&record("c", &[])).unwrap();
        assert_eq!(find(&db).unwrap(), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn depended_upon_package_is_not_an_orphan() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.put(&record("a", &["b"])).unwrap();
        db.put(&record("b", &[])).unwrap();
        assert_eq!(find(&db).unwrap(), vec!["a".to_string()]);
    }

    #[test]
    fn detection_is_single_pass_not_recursive() {
        // after removing `a`, both b and c become orphans in one report
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.put(&record("b", &["c"])).unwrap();
        db.put(&record("c", &[])).unwrap();
        assert_eq!(find(&db).unwrap(), vec!["b".to_string(), "c".to_string()]);
    }
}
