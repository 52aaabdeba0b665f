use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::roots::REPO_CATEGORIES;

/// A name→recipe-path mapping built by scanning the recipe-repository
/// layout: four top-level category directories, each globbed recursively
/// for `*.json`. On name collision the last recipe scanned wins.
#[derive(Debug, Clone, Default)]
pub struct RecipeRepo {
    by_name: HashMap<String, PathBuf>,
}

impl RecipeRepo {
    pub fn scan(root: &Path) -> Self {
        let mut by_name = HashMap::new();
        for category in REPO_CATEGORIES {
            let category_root = root.join(category);
            if !category_root.is_dir() {
                continue;
            }
            let pattern = format!("{}/**/*.json", category_root.display());
            let Ok(paths) = glob::glob(&pattern) else {
                continue;
            };
            for entry in paths.flatten() {
                if let Some(name) = entry.file_stem().and_then(|s| s.to_str()) {
                    by_name.insert(name.to_string(), entry);
                }
            }
        }
        RecipeRepo { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.by_name.get(name).cloned()
    }

    pub fn search(&self, term: &str) -> Vec<&str> {
        let mut hits: Vec<&str> = self
            .by_name
            .keys()
            .filter(|name| name.contains(term))
            .map(|s| s.as_str())
            .collect();
        hits.sort_unstable();
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scan_finds_recipes_across_categories_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        let extras = dir.path().join("extras");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&extras).unwrap();
        fs::write(base.join("hello.json"), "{}").unwrap();
        fs::write(extras.join("hello.json"), "{}").unwrap();

        let repo = RecipeRepo::scan(dir.path());
        assert!(repo.lookup("hello").is_some());
    }

    #[test]
    fn search_matches_substring_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base");
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("libfoo.json"), "{}").unwrap();
        fs::write(base.join("libbar.json"), "{}").unwrap();
        fs::write(base.join("zzz.json"), "{}").unwrap();

        let repo = RecipeRepo::scan(dir.path());
        assert_eq!(repo.search("lib"), vec!["libbar", "libfoo"]);
    }
}
