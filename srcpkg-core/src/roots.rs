use std::env;
use std::path::PathBuf;

/// Filesystem locations the core operates under, resolved once at startup.
///
/// Resolution order for every overridable root: explicit override, then the
/// named environment variable, then the documented default.
#[derive(Debug, Clone)]
pub struct Roots {
    pub root: PathBuf,
    pub build: PathBuf,
    pub pkgs: PathBuf,
    pub src: PathBuf,
    pub db: PathBuf,
    pub logs: PathBuf,
    pub hooks: PathBuf,
}

impl Roots {
    pub fn from_env() -> Self {
        Self::resolve(None, None, None, None)
    }

    pub fn resolve(
        root: Option<PathBuf>,
        build: Option<PathBuf>,
        pkgs: Option<PathBuf>,
        src: Option<PathBuf>,
    ) -> Self {
        let root = root
            .or_else(|| env::var_os("SRCPKG_ROOT").map(PathBuf::from))
            .unwrap_or_else(default_root);

        let build = build
            .or_else(|| env::var_os("SRCPKG_BUILD").map(PathBuf::from))
            .unwrap_or_else(|| root.join("build"));
        let pkgs = pkgs
            .or_else(|| env::var_os("SRCPKG_PKGS").map(PathBuf::from))
            .unwrap_or_else(|| root.join("pkgs"));
        let src = src
            .or_else(|| env::var_os("SRCPKG_SRC").map(PathBuf::from))
            .unwrap_or_else(|| root.join("src"));

        let db = root.join("db");
        let logs = root.join("logs");
        let hooks = root.join("hooks");

        Roots {
            root,
            build,
            pkgs,
            src,
            db,
            logs,
            hooks,
        }
    }

    pub fn post_install_hooks_dir(&self) -> PathBuf {
        self.hooks.join("post-install.d")
    }

    pub fn post_remove_hooks_dir(&self) -> PathBuf {
        self.hooks.join("post-remove.d")
    }

    pub fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            &self.root,
            &self.build,
            &self.pkgs,
            &self.src,
            &self.db,
            &self.logs,
            &self.hooks,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::create_dir_all(self.post_install_hooks_dir())?;
        std::fs::create_dir_all(self.post_remove_hooks_dir())?;
        Ok(())
    }

    pub fn work_dir(&self, package: &str) -> PathBuf {
        self.build.join(package)
    }

    pub fn log_file(&self, package: &str) -> PathBuf {
        self.logs.join(format!("{package}.log"))
    }
}

fn default_root() -> PathBuf {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/root"));
    home.join(".local/share/srcpkg")
}

/// Default recipe repository root, an external collaborator's concern.
pub fn default_repo_root() -> PathBuf {
    env::var_os("REPO")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/root"));
            home.join("srcpkg-repo")
        })
}

/// The four top-level categories scanned under the repo root.
pub const REPO_CATEGORIES: [&str; 4] = ["base", "x11", "extras", "desktop"];
