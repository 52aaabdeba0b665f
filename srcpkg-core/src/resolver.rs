use std::collections::HashSet;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::recipe::PackageMeta;

/// Depth-first, install-first dependency closure.
///
/// For each dependency of `recipe` not already installed, `locate` finds
/// its recipe and the closure recurses into it before `install` is
/// invoked for that dependency. A visited-set keyed by name guards
/// against cycles in malformed recipe graphs; a cycle short-circuits
/// traversal rather than failing the installation.
pub fn install_closure<L, I>(
    recipe: &PackageMeta,
    db: &Database,
    mut locate: L,
    mut install: I,
) -> Result<()>
where
    L: FnMut(&str) -> Option<PackageMeta>,
    I: FnMut(&PackageMeta) -> Result<()>,
{
    let mut visited = HashSet::new();
    resolve(recipe, db, &mut locate, &mut install, &mut visited)
}

fn resolve<L, I>(
    recipe: &PackageMeta,
    db: &Database,
    locate: &mut L,
    install: &mut I,
    visited: &mut HashSet<String>,
) -> Result<()>
where
    L: FnMut(&str) -> Option<PackageMeta>,
    I: FnMut(&PackageMeta) -> Result<()>,
{
    if !visited.insert(recipe.name.clone()) {
        return Ok(());
    }

    for dep_name in &recipe.depends {
        if db.is_installed(dep_name) {
            continue;
        }
        if visited.contains(dep_name) {
            continue;
        }
        let dep_recipe = locate(dep_name).ok_or_else(|| Error::UnresolvedDependency {
            dependency: dep_name.clone(),
            required_by: recipe.name.clone(),
        })?;
        resolve(&dep_recipe, db, locate, install, visited)?;
        install(&dep_recipe)?;
    }

    Ok(())
}
