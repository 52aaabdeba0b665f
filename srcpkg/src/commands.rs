use colored::Colorize;
use srcpkg_core::engine::Engine;

use crate::cli::Commands;
use crate::progress::SpinnerHandle;

/// Runs `f` with the spinner showing `message`, stopping it whether `f`
/// succeeds or fails so a failed fetch/build never leaves a stray
/// spinner spinning on the terminal.
fn with_spinner<T>(spinner: &SpinnerHandle, message: &str, f: impl FnOnce() -> srcpkg_core::Result<T>) -> srcpkg_core::Result<T> {
    spinner.start(message);
    let result = f();
    spinner.stop();
    result
}

pub fn dispatch(engine: &Engine, command: Commands, spinner: &SpinnerHandle) -> srcpkg_core::Result<()> {
    match command {
        Commands::Build { recipe } => {
            let src_root = with_spinner(spinner, &format!("building {recipe}"), || engine.build(&recipe))?;
            println!("{} {}", "built".green().bold(), src_root.display());
        }
        Commands::Package { recipe } => {
            let archive = with_spinner(spinner, &format!("packaging {recipe}"), || engine.package(&recipe))?;
            println!("{} {}", "packaged".green().bold(), archive.display());
        }
        Commands::Install { recipe } => {
            let record = with_spinner(spinner, &format!("installing {recipe}"), || engine.install(&recipe))?;
            println!(
                "{} {} {}",
                "installed".green().bold(),
                record.name,
                record.version
            );
        }
        Commands::Remove { name } => {
            if engine.remove(&name)? {
                println!("{} {}", "removed".green().bold(), name);
            } else {
                println!("{} {} is not installed", "warning:".yellow().bold(), name);
            }
        }
        Commands::List => {
            for record in engine.list()? {
                println!("{} {}", record.name, record.version);
            }
        }
        Commands::Info { name } => {
            let meta = engine.info(&name)?;
            println!("{}: {}", "name".bold(), meta.name);
            println!("{}: {}", "version".bold(), meta.version);
            println!("{}: {}", "category".bold(), meta.category);
            if let Some(homepage) = &meta.homepage {
                println!("{}: {}", "homepage".bold(), homepage);
            }
            println!("{}: {}", "depends".bold(), meta.depends.join(", "));
        }
        Commands::Orphans { remove } => {
            let found = engine.orphans(remove)?;
            if found.is_empty() {
                println!("no orphans");
            } else {
                for name in found {
                    println!("{name}");
                }
            }
        }
        Commands::Search { term } => {
            for name in engine.search(&term) {
                println!("{name}");
            }
        }
        Commands::Sync => {
            engine.sync(&engine.repo_root())?;
            println!("{}", "synced".green().bold());
        }
        Commands::Upgrade { recipe } => {
            let upgraded = with_spinner(spinner, &format!("checking {recipe}"), || engine.upgrade(&recipe))?;
            if upgraded {
                println!("{} {}", "upgraded".green().bold(), recipe);
            } else {
                println!("{} {} is already up to date", "info:".cyan().bold(), recipe);
            }
        }
        Commands::Revdep { rebuild } => {
            let message = if rebuild { "scanning and rebuilding" } else { "scanning" };
            let dirty = with_spinner(spinner, message, || engine.revdep(rebuild))?;
            if dirty.is_empty() {
                println!("no broken packages");
            }
            for pkg in dirty {
                println!("{}: {}", pkg.name.red().bold(), "broken links".red());
                for missing in pkg.missing {
                    let hint = if missing.providers.is_empty() {
                        "no known provider".to_string()
                    } else {
                        format!("provided by: {}", missing.providers.join(", "))
                    };
                    println!("  missing {} ({hint})", missing.soname);
                }
            }
        }
    }
    Ok(())
}
