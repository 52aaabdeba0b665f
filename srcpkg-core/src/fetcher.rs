use std::path::{Path, PathBuf};
use std::process::Command;

use crate::checksum;
use crate::error::{Error, Result};
use crate::recipe::{PackageMeta, SourceSpec};

/// Downloads or clones a package's source into the sources cache,
/// returning the path to the cached archive (or clone directory).
pub struct Fetcher {
    sources_cache: PathBuf,
}

impl Fetcher {
    pub fn new(sources_cache: PathBuf) -> Self {
        Fetcher { sources_cache }
    }

    /// Fetches `recipe`'s source. For a `Git` source, an explicit `git`
    /// clone-target override on the recipe takes precedence over the
    /// URL/rev embedded in `source` itself.
    pub fn fetch(&self, recipe: &PackageMeta) -> Result<PathBuf> {
        match &recipe.source {
            SourceSpec::Archive { url, sha256 } => self.fetch_archive(url, sha256.as_deref()),
            SourceSpec::Git { .. } => {
                let (url, rev) = recipe
                    .effective_git_target()
                    .expect("source is SourceSpec::Git");
                self.fetch_git(url, rev)
            }
        }
    }

    fn fetch_archive(&self, url: &str, sha256: Option<&str>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.sources_cache)?;
        let filename = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Other(format!("cannot derive cache filename from {url}")))?;
        let dest = self.sources_cache.join(filename);

        if !dest.is_file() {
            self.download(url, &dest)?;
        }

        checksum::verify(&dest, sha256)?;
        Ok(dest)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let downloader = which::which("wget")
            .or_else(|_| which::which("curl"))
            .map_err(|_| Error::NoDownloader)?;
        let tmp = dest.with_extension("part");
        let is_wget = downloader
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.contains("wget"))
            .unwrap_or(false);

        let status = if is_wget {
            Command::new(&downloader)
                .arg("-O")
                .arg(&tmp)
                .arg(url)
                .status()
        } else {
            Command::new(&downloader)
                .arg("-L")
                .arg("-o")
                .arg(&tmp)
                .arg(url)
                .status()
        }
        .map_err(|e| Error::NetworkError {
            url: url.to_string(),
            reason: e.to_string(),
            code: None,
        })?;

        if !status.success() {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::NetworkError {
                url: url.to_string(),
                reason: format!("downloader exited with {status}"),
                code: status.code(),
            });
        }

        std::fs::rename(&tmp, dest)?;
        Ok(())
    }

    fn fetch_git(&self, url: &str, rev: Option<&str>) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.sources_cache)?;
        let name = url
            .rsplit('/')
            .next()
            .unwrap_or("repo")
            .trim_end_matches(".git");
        let dest = self.sources_cache.join(name);

        let status = if dest.is_dir() {
            Command::new("git")
                .arg("-C")
                .arg(&dest)
                .args(["fetch", "--all"])
                .status()
        } else {
            Command::new("git")
                .args(["clone", url])
                .arg(&dest)
                .status()
        }
        .map_err(|e| Error::NetworkError {
            url: url.to_string(),
            reason: e.to_string(),
            code: None,
        })?;

        if !status.success() {
            return Err(Error::NetworkError {
                url: url.to_string(),
                reason: format!("git exited with {status}"),
                code: status.code(),
            });
        }

        if let Some(rev) = rev {
            let status = Command::new("git")
                .arg("-C")
                .arg(&dest)
                .args(["checkout", rev])
                .status()
                .map_err(|e| Error::NetworkError {
                    url: url.to_string(),
                    reason: e.to_string(),
                    code: None,
                })?;
            if !status.success() {
                return Err(Error::NetworkError {
                    url: url.to_string(),
                    reason: format!("git checkout {rev} failed"),
                    code: status.code(),
                });
            }
        }

        Ok(dest)
    }
}
