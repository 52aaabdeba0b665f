use std::path::PathBuf;
use std::process::Command;

use crate::buildlog::BuildLog;
use crate::builder::Builder;
use crate::db::{Database, InstalledPkg};
use crate::error::{Error, Result};
use crate::extractor;
use crate::fetcher::Fetcher;
use crate::installer;
use crate::orphans;
use crate::packager;
use crate::patcher;
use crate::recipe::PackageMeta;
use crate::remove;
use crate::repo::RecipeRepo;
use crate::resolver;
use crate::revdep::{self, DirtyPackage};
use crate::roots::Roots;
use crate::upgrade::{self, UpgradeDecision};

/// Facade tying the recipe pipeline, database, resolver and revdep
/// scanner together into the operations the CLI exposes.
pub struct Engine {
    pub roots: Roots,
    pub repo: RecipeRepo,
    pub repo_root: PathBuf,
    pub db: Database,
}

impl Engine {
    pub fn open(roots: Roots, repo: RecipeRepo, repo_root: PathBuf) -> Result<Self> {
        roots.create_all()?;
        let db = Database::open(&roots.db)?;
        Ok(Engine {
            roots,
            repo,
            repo_root,
            db,
        })
    }

    pub fn repo_root(&self) -> PathBuf {
        self.repo_root.clone()
    }

    fn log_for(&self, package: &str) -> Result<BuildLog> {
        BuildLog::open(&self.roots.log_file(package), package)
    }

    fn load(&self, reference: &str) -> Result<PackageMeta> {
        PackageMeta::load(reference, Some(&self.repo))
    }

    /// Runs fetch, extract and patch, then the `prepare`/`compile` phases
    /// (and `install` too, unless `build_only`), returning the work tree's
    /// source root and staging root.
    fn build_one(&self, recipe: &PackageMeta, build_only: bool, log: &mut BuildLog) -> Result<(PathBuf, PathBuf)> {
        let work = self.roots.work_dir(&recipe.name);
        if work.exists() {
            std::fs::remove_dir_all(&work)?;
        }
        std::fs::create_dir_all(&work)?;
        let patches_dir = work.join("patches");
        let destdir = work.join("destdir");
        std::fs::create_dir_all(&destdir)?;

        log.info(format!("fetching source for {}", recipe.name));
        let fetcher = Fetcher::new(self.roots.src.clone());
        let fetched = fetcher.fetch(recipe)?;

        let src_dest = work.join("src");
        let src_root = match &recipe.source {
            crate::recipe::SourceSpec::Archive { .. } => {
                log.info("extracting source");
                extractor::extract(&fetched, &src_dest)?
            }
            crate::recipe::SourceSpec::Git { .. } => fetched,
        };

        if !recipe.patches.is_empty() {
            log.info(format!("applying {} patch(es)", recipe.patches.len()));
            patcher::apply_all(&recipe.patches, &src_root, &patches_dir, &fetcher)?;
        }

        let builder = Builder::new(&src_root, &destdir);
        builder.build(&recipe.build, &recipe.name, build_only, log)?;

        Ok((src_root, destdir))
    }

    pub fn build(&self, reference: &str) -> Result<PathBuf> {
        let recipe = self.load(reference)?;
        let mut log = self.log_for(&recipe.name)?;
        let (src_root, _destdir) = self.build_one(&recipe, true, &mut log)?;
        Ok(src_root)
    }

    pub fn package(&self, reference: &str) -> Result<PathBuf> {
        let recipe = self.load(reference)?;
        let mut log = self.log_for(&recipe.name)?;
        let (_src_root, destdir) = self.build_one(&recipe, false, &mut log)?;
        let archive = packager::package(
            &destdir,
            &self.roots.pkgs,
            &recipe.name,
            &recipe.version,
            recipe.package.strip,
            &mut log,
        )?;
        log.info(format!("packaged {}", archive.display()));
        Ok(archive)
    }

    /// Runs the full pipeline for a single package onto the live root,
    /// without recursing into its dependencies. Used both directly and
    /// as the per-node installer called by the dependency resolver.
    fn install_one(&self, recipe: &PackageMeta) -> Result<InstalledPkg> {
        let mut log = self.log_for(&recipe.name)?;
        let (_src_root, destdir) = self.build_one(recipe, false, &mut log)?;
        packager::package(
            &destdir,
            &self.roots.pkgs,
            &recipe.name,
            &recipe.version,
            recipe.package.strip,
            &mut log,
        )?;
        installer::install(
            recipe,
            &destdir,
            std::path::Path::new("/"),
            &self.roots,
            &self.db,
            &mut log,
        )
    }

    /// Installs `reference` and its full transitive dependency closure,
    /// leaves before roots.
    pub fn install(&self, reference: &str) -> Result<InstalledPkg> {
        let target = self.load(reference)?;
        let repo = &self.repo;
        resolver::install_closure(
            &target,
            &self.db,
            |name| PackageMeta::load(name, Some(repo)).ok(),
            |dep| self.install_one(dep).map(|_| ()),
        )?;
        self.install_one(&target)
    }

    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut log = self.log_for(name)?;
        remove::remove(name, &self.roots, &self.db, &mut log)
    }

    pub fn list(&self) -> Result<Vec<InstalledPkg>> {
        self.db.list()
    }

    pub fn info(&self, reference: &str) -> Result<PackageMeta> {
        if let Some(record) = self.db.get(reference)? {
            return Ok(record.recipe);
        }
        self.load(reference)
    }

    pub fn orphans(&self, remove_them: bool) -> Result<Vec<String>> {
        let found = orphans::find(&self.db)?;
        if remove_them {
            for name in &found {
                self.remove(name)?;
            }
        }
        Ok(found)
    }

    pub fn search(&self, term: &str) -> Vec<String> {
        self.repo.search(term).into_iter().map(String::from).collect()
    }

    /// `pull --rebase` on the recipe repository. Deliberately does not
    /// also `push`: an automatic push is unusual for a read-mostly
    /// package manager and would leak a personal workflow habit into a
    /// shared tool.
    pub fn sync(&self, repo_root: &std::path::Path) -> Result<()> {
        let status = Command::new("git")
            .arg("-C")
            .arg(repo_root)
            .args(["pull", "--rebase"])
            .status()?;
        if !status.success() {
            return Err(Error::ExternalCommandFailed {
                command: "git pull --rebase".to_string(),
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }

    pub fn upgrade(&self, reference: &str) -> Result<bool> {
        let recipe = self.load(reference)?;
        match upgrade::decide(&recipe, &self.db)? {
            UpgradeDecision::NotInstalled => Ok(false),
            UpgradeDecision::NoOp => Ok(false),
            UpgradeDecision::Upgrade => {
                self.install_one(&recipe)?;
                Ok(true)
            }
        }
    }

    pub fn revdep(&self, rebuild: bool) -> Result<Vec<DirtyPackage>> {
        let provider_map = revdep::build_provider_map(&self.db)?;
        let dirty = revdep::scan(&self.db, &provider_map)?;

        if rebuild {
            for pkg in &dirty {
                let Some(record) = self.db.get(&pkg.name)? else {
                    continue;
                };
                let repo = &self.repo;
                resolver::install_closure(
                    &record.recipe,
                    &self.db,
                    |name| PackageMeta::load(name, Some(repo)).ok(),
                    |dep| self.install_one(dep).map(|_| ()),
                )?;
                self.install_one(&record.recipe)?;
            }
        }

        Ok(dirty)
    }
}
