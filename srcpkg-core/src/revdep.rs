use std::collections::{HashMap, HashSet};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use regex::Regex;

use crate::db::Database;
use crate::error::Result;

/// basename (e.g. `libfoo.so.1`) -> package names that ship a file with
/// that basename.
pub type ProviderMap = HashMap<String, HashSet<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyPackage {
    pub name: String,
    pub missing: Vec<MissingSoname>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSoname {
    pub soname: String,
    pub providers: Vec<String>,
}

/// Phase 1: builds the provider map from every installed record's files.
/// A basename is a provider candidate if it starts with `lib` and
/// contains `.so`.
pub fn build_provider_map(db: &Database) -> Result<ProviderMap> {
    let mut map: ProviderMap = HashMap::new();
    for record in db.list()? {
        for file in &record.files {
            let basename = Path::new(file)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("");
            if basename.starts_with("lib") && basename.contains(".so") {
                map.entry(basename.to_string())
                    .or_default()
                    .insert(record.name.clone());
            }
        }
    }
    Ok(map)
}

fn is_auditable(path: &Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    let owner_exec = meta.permissions().mode() & 0o100 != 0;
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    owner_exec || name.contains(".so")
}

/// Extracts every missing soname from `ldd` output: lines containing the
/// literal `not found`, parsed with the pattern `<token> => not found`.
fn parse_missing_sonames(ldd_output: &str) -> Vec<String> {
    let re = Regex::new(r"(\S+)\s*=>\s*not found").unwrap();
    ldd_output
        .lines()
        .filter(|line| line.contains("not found"))
        .filter_map(|line| {
            re.captures(line)
                .map(|c| c.get(1).unwrap().as_str().to_string())
        })
        .collect()
}

/// Phase 2 + 3: audits every installed package's auditable files with
/// `ldd` and reports dirty packages with provider hints.
pub fn scan(db: &Database, provider_map: &ProviderMap) -> Result<Vec<DirtyPackage>> {
    let mut dirty = Vec::new();
    for record in db.list()? {
        let mut missing: Vec<MissingSoname> = Vec::new();
        let mut seen = HashSet::new();
        for file in &record.files {
            let path = Path::new(file);
            if !is_auditable(path) {
                continue;
            }
            let Ok(output) = Command::new("ldd").arg(path).output() else {
                continue;
            };
            let text = String::from_utf8_lossy(&output.stdout);
            for soname in parse_missing_sonames(&text) {
                if seen.insert(soname.clone()) {
                    let providers = provider_map
                        .get(&soname)
                        .map(|set| {
                            let mut v: Vec<String> = set.iter().cloned().collect();
                            v.sort();
                            v
                        })
                        .unwrap_or_default();
                    missing.push(MissingSoname { soname, providers });
                }
            }
        }
        if !missing.is_empty() {
            dirty.push(DirtyPackage {
                name: record.name,
                missing,
            });
        }
    }
    dirty.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(dirty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_not_found_lines() {
        let output = "\tlinux-vdso.so.1 (0x00007fff)\n\tlibfoo.so.1 => not found\n\tlibc.so.6 => /lib/libc.so.6 (0x1234)\n";
        assert_eq!(parse_missing_sonames(output), vec!["libfoo.so.1".to_string()]);
    }

    #[test]
    fn ignores_resolved_lines() {
        let output = "\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f)\n";
        assert!(parse_missing_sonames(output).is_empty());
    }

    #[test]
    fn provider_map_registers_lib_so_basenames_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path()).unwrap();
        db.put(&crate::db::InstalledPkg {
            name: "libfoo".to_string(),
            version: "1.0".to_string(),
            files: vec![
                "/usr/lib/libfoo.so.1".to_string(),
                "/usr/share/doc/libfoo/README".to_string(),
            ],
            depends: vec![],
            recipe: sample_meta("libfoo"),
        })
        .unwrap();

        let map = build_provider_map(&db).unwrap();
        assert!(map.contains_key("libfoo.so.1"));
        assert_eq!(map.len(), 1);
    }

    fn sample_meta(name: &str) -> crate::recipe::PackageMeta {
        use crate::recipe::{BuildSpec, Hooks, PackageOptions, SourceSpec};
        crate::recipe::PackageMeta {
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
}
