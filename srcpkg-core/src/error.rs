use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("recipe malformed ({path}): {reason}")]
    RecipeMalformed { path: PathBuf, reason: String },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("no downloader available (tried wget, curl)")]
    NoDownloader,

    #[error("network error fetching {url}: {reason}")]
    NetworkError {
        url: String,
        reason: String,
        /// The failed process's exit code, when the failure came from a
        /// spawned downloader/git rather than from failing to spawn one.
        code: Option<i32>,
    },

    #[error("unsupported archive format: {0}")]
    UnsupportedArchive(String),

    #[error("build script failed in phase {phase} for {package} (exit {code})")]
    BuildScriptFailed {
        package: String,
        phase: &'static str,
        code: i32,
    },

    #[error("patch failed: {path} (exit {code})")]
    PatchFailed { path: PathBuf, code: i32 },

    #[error("external command failed: {command} (exit {code})")]
    ExternalCommandFailed { command: String, code: i32 },

    #[error("must be run as root to install onto the live root")]
    NotPrivileged,

    #[error("unresolved dependency {dependency} (required by {required_by})")]
    UnresolvedDependency {
        dependency: String,
        required_by: String,
    },

    #[error("hook failed: {0}")]
    HookFailed(String),

    #[error("strip failed on {0}")]
    StripFailed(PathBuf),

    #[error("removal of {path} partially failed: {reason}")]
    RemovalPartial { path: PathBuf, reason: String },

    #[error("interrupted")]
    Interrupted,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
