use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::repo::RecipeRepo;

/// Immutable description of one package, as loaded from a recipe document.
///
/// Unknown fields in the source document are ignored; defaulted fields take
/// the defaults documented on each field below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMeta {
    pub name: String,
    pub version: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub homepage: Option<String>,
    pub source: SourceSpec,
    #[serde(default)]
    pub git: Option<GitSpec>,
    #[serde(default)]
    pub patches: Vec<PatchSpec>,
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub build: BuildSpec,
    #[serde(default)]
    pub package: PackageOptions,
    #[serde(default)]
    pub hooks: Hooks,
}

fn default_category() -> String {
    "extras".to_string()
}

impl PackageMeta {
    /// Parses a recipe document, failing with `RecipeMalformed` rather than
    /// a bare deserialization error so callers can report a consistent kind.
    pub fn from_json(path: &Path, data: &str) -> Result<Self> {
        let meta: PackageMeta =
            serde_json::from_str(data).map_err(|e| Error::RecipeMalformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if meta.name.trim().is_empty() {
            return Err(Error::RecipeMalformed {
                path: path.to_path_buf(),
                reason: "name must be present".to_string(),
            });
        }
        if meta.version.trim().is_empty() {
            return Err(Error::RecipeMalformed {
                path: path.to_path_buf(),
                reason: "version must be present".to_string(),
            });
        }
        Ok(meta)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|_| Error::RecipeNotFound(
            path.display().to_string(),
        ))?;
        Self::from_json(path, &data)
    }

    /// Resolves `reference` to a `PackageMeta`: a filesystem path if it
    /// names an existing file, otherwise a bare name consulted against
    /// `repo` and finally `<name>.json` in the current directory.
    pub fn load(reference: &str, repo: Option<&RecipeRepo>) -> Result<Self> {
        let as_path = Path::new(reference);
        if as_path.is_file() {
            return Self::load_file(as_path);
        }
        if let Some(repo) = repo {
            if let Some(path) = repo.lookup(reference) {
                return Self::load_file(&path);
            }
        }
        let fallback = PathBuf::from(format!("{reference}.json"));
        if fallback.is_file() {
            return Self::load_file(&fallback);
        }
        Err(Error::RecipeNotFound(reference.to_string()))
    }

    /// The clone URL and rev a `Git` source should actually use: the
    /// `git` block overrides the source's own url/rev when present, since
    /// it is an explicit clone target override rather than a fallback.
    /// Returns `None` for archive sources, where the field has no effect.
    pub fn effective_git_target(&self) -> Option<(&str, Option<&str>)> {
        let SourceSpec::Git { url, rev } = &self.source else {
            return None;
        };
        match &self.git {
            Some(git) => Some((git.repo.as_str(), git.branch.as_deref().or(rev.as_deref()))),
            None => Some((url.as_str(), rev.as_deref())),
        }
    }
}

/// Discriminated source of a package's upstream material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceSpec {
    Archive {
        url: String,
        #[serde(default)]
        sha256: Option<String>,
    },
    Git {
        url: String,
        #[serde(default)]
        rev: Option<String>,
    },
}

impl Default for SourceSpec {
    fn default() -> Self {
        SourceSpec::Archive {
            url: String::new(),
            sha256: None,
        }
    }
}

impl SourceSpec {
    /// The cache filename for an archive source: the URL's trailing path
    /// component. Not meaningful for `Git`.
    pub fn cache_filename(&self) -> Option<String> {
        match self {
            SourceSpec::Archive { url, .. } => url
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            SourceSpec::Git { .. } => None,
        }
    }
}

/// Legacy-style nested git block; present alongside `source: {type: git}`
/// recipes that also carry an explicit clone target override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSpec {
    pub repo: String,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSpec {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildSpec {
    #[serde(default)]
    pub prepare: Vec<String>,
    #[serde(default)]
    pub compile: Vec<String>,
    #[serde(default)]
    pub install: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageOptions {
    #[serde(default)]
    pub strip: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Hooks {
    #[serde(default)]
    pub post_install: Vec<String>,
    #[serde(default)]
    pub post_remove: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_category_and_strip() {
        let json = r#"{
            "name": "hello",
            "version": "1.0",
            "source": {"type": "archive", "url": "https://example.com/hello-1.0.tar.gz"}
        }"#;
        let meta = PackageMeta::from_json(Path::new("hello.json"), json).unwrap();
        assert_eq!(meta.category, "extras");
        assert!(meta.build.compile.is_empty());
        assert!(!meta.package.strip);
        assert_eq!(meta.patches.len(), 0);
    }

    #[test]
    fn missing_name_is_malformed() {
        let json = r#"{"version": "1.0", "source": {"type": "archive", "url": "x"}}"#;
        let err = PackageMeta::from_json(Path::new("bad.json"), json);
        assert!(err.is_err());
    }

    #[test]
    fn archive_cache_filename_is_trailing_component() {
        let src = SourceSpec::Archive {
            url: "https://example.com/dl/hello-1.0.tar.gz".to_string(),
            sha256: None,
        };
        assert_eq!(src.cache_filename().as_deref(), Some("hello-1.0.tar.gz"));
    }

    #[test]
    fn git_source_has_no_cache_filename() {
        let src = SourceSpec::Git {
            url: "https://example.com/hello.git".to_string(),
            rev: None,
        };
        assert_eq!(src.cache_filename(), None);
    }

    #[test]
    fn git_block_overrides_source_url_and_rev() {
        let json = r#"{
            "name": "hello",
            "version": "1.0",
            "source": {"type": "git", "url": "https://example.com/mirror.git", "rev": "main"},
            "git": {"repo": "https://example.com/upstream.git", "branch": "release"}
        }"#;
        let meta = PackageMeta::from_json(Path::new("hello.json"), json).unwrap();
        assert_eq!(
            meta.effective_git_target(),
            Some(("https://example.com/upstream.git", Some("release")))
        );
    }

    #[test]
    fn git_block_branch_falls_back_to_source_rev_when_absent() {
        let json = r#"{
            "name": "hello",
            "version": "1.0",
            "source": {"type": "git", "url": "https://example.com/mirror.git", "rev": "main"},
            "git": {"repo": "https://example.com/upstream.git"}
        }"#;
        let meta = PackageMeta::from_json(Path::new("hello.json"), json).unwrap();
        assert_eq!(
            meta.effective_git_target(),
            Some(("https://example.com/upstream.git", Some("main")))
        );
    }

    #[test]
    fn archive_source_has_no_effective_git_target() {
        let json = r#"{
            "name": "hello",
            "version": "1.0",
            "source": {"type": "archive", "url": "https://example.com/hello-1.0.tar.gz"}
        }"#;
        let meta = PackageMeta::from_json(Path::new("hello.json"), json).unwrap();
        assert_eq!(meta.effective_git_target(), None);
    }

    #[test]
    fn round_trips_through_json() {
        let meta = PackageMeta {
            name: "hello".into(),
            version: "1.0".into(),
            category: "base".into(),
            homepage: Some("https://example.com".into()),
            source: SourceSpec::Archive {
                url: "https://example.com/hello-1.0.tar.gz".into(),
                sha256: Some("a".repeat(64)),
            },
            git: None,
            patches: vec![],
            depends: vec!["libfoo".into()],
            build: BuildSpec {
                compile: vec!["make".into()],
                ..Default::default()
            },
            package: PackageOptions { strip: true },
            hooks: Hooks::default(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        let back: PackageMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "hello");
        assert_eq!(back.depends, vec!["libfoo".to_string()]);
    }
}
