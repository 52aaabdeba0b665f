use crate::db::Database;
use crate::error::Result;
use crate::recipe::PackageMeta;
use crate::version;

pub enum UpgradeDecision {
    NotInstalled,
    NoOp,
    Upgrade,
}

/// Decides whether `recipe` should trigger an upgrade of the currently
/// installed package of the same name, based on version comparison.
pub fn decide(recipe: &PackageMeta, db: &Database) -> Result<UpgradeDecision> {
    let Some(installed) = db.get(&recipe.name)? else {
        return Ok(UpgradeDecision::NotInstalled);
    };
    if version::gt(&recipe.version, &installed.version) {
        Ok(UpgradeDecision::Upgrade)
    } else {
        Ok(UpgradeDecision::NoOp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InstalledPkg;
    use crate::recipe::{BuildSpec, Hooks, PackageOptions, SourceSpec};

    fn meta(name: &str, version: &str) -> PackageMeta {
        PackageMeta {
            name: name.to_string(),
            version: version.to_string(),
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

    fn install(db: &Database, name: &str, version: &str) {
        db.put(&InstalledPkg {
            name: name.to_string(),
            version: version.to_string(),
            files: vec![],
            depends: vec![],
            recipe: meta(name, version),
        })
        .unwrap();
    }

    #[test]
    fn not_installed_is_reported_as_such() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        let recipe = meta("pkg", "1.2");
        assert!(matches!(
            decide(&recipe, &db).unwrap(),
            UpgradeDecision::NotInstalled
        ));
    }

    #[test]
    fn same_version_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        install(&db, "pkg", "1.2");
        let recipe = meta("pkg", "1.2");
        assert!(matches!(decide(&recipe, &db).unwrap(), UpgradeDecision::NoOp));
    }

    #[test]
    fn strictly_greater_version_triggers_upgrade() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        install(&db, "pkg", "1.2");
        let recipe = meta("pkg", "1.10");
        assert!(matches!(decide(&recipe, &db).unwrap(), UpgradeDecision::Upgrade));
    }

    #[test]
    fn lesser_version_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        install(&db, "pkg", "1.10");
        let recipe = meta("pkg", "1.2");
        assert!(matches!(decide(&recipe, &db).unwrap(), UpgradeDecision::NoOp));
    }
}
