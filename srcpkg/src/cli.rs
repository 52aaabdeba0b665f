use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "srcpkg", version, about = "A source-based package manager")]
pub struct Cli {
    /// Increase logging verbosity (repeatable: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Override the base root (defaults to $SRCPKG_ROOT or ~/.local/share/srcpkg)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Override the recipe-repository root (defaults to $REPO or ~/srcpkg-repo)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, extract, patch and compile a recipe without installing it
    Build { recipe: String },
    /// Build and package a recipe into a compressed archive
    Package { recipe: String },
    /// Build, package and install a recipe and its dependencies
    Install { recipe: String },
    /// Remove an installed package by name
    Remove { name: String },
    /// List installed packages
    List,
    /// Show recipe/installed-record details for a name or recipe path
    Info { name: String },
    /// List (and optionally remove) packages no longer required by anything
    Orphans {
        #[arg(long)]
        remove: bool,
    },
    /// Search the recipe repository by substring
    Search { term: String },
    /// Pull the recipe repository (rebases local changes, does not push)
    Sync,
    /// Reinstall a recipe if its version is strictly newer than installed
    Upgrade { recipe: String },
    /// Scan installed packages for broken dynamic links
    Revdep {
        #[arg(long)]
        rebuild: bool,
    },
}
