use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;

use crate::buildlog::BuildLog;
use crate::recipe::PackageMeta;
use crate::roots::Roots;

pub fn run_post_install(recipe: &PackageMeta, roots: &Roots, log: &mut BuildLog) {
    run_recipe_hooks(&recipe.hooks.post_install, log);
    run_global_hooks(&roots.post_install_hooks_dir(), &recipe.name, log);
}

pub fn run_post_remove(recipe: &PackageMeta, roots: &Roots, log: &mut BuildLog) {
    run_recipe_hooks(&recipe.hooks.post_remove, log);
    run_global_hooks(&roots.post_remove_hooks_dir(), &recipe.name, log);
}

/// Runs per-recipe hook command strings with inherited environment.
/// Failures are logged as `HookFailed` but never abort the caller.
fn run_recipe_hooks(commands: &[String], log: &mut BuildLog) {
    for command in commands {
        let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
        match Command::new(&shell).arg("-c").arg(command).status() {
            Ok(status) if status.success() => {
                log.info(format!("hook ok: {command}"));
            }
            Ok(status) => {
                log.warn(format!("hook failed ({status}): {command}"));
            }
            Err(e) => {
                log.warn(format!("hook failed to spawn: {command} ({e})"));
            }
        }
    }
}

/// Runs every executable entry of `dir` in lexicographic order with
/// `package` as the sole argument. Non-executable entries are skipped.
fn run_global_hooks(dir: &Path, package: &str, log: &mut BuildLog) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        let Ok(meta) = std::fs::metadata(&path) else {
            continue;
        };
        if !meta.is_file() || meta.permissions().mode() & 0o111 == 0 {
            continue;
        }
        match Command::new(&path).arg(package).status() {
            Ok(status) if status.success() => {
                log.info(format!("global hook ok: {}", path.display()));
            }
            Ok(status) => {
                log.warn(format!("global hook failed ({status}): {}", path.display()));
            }
            Err(e) => {
                log.warn(format!("global hook failed to spawn: {} ({e})", path.display()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_executable_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let hook = dir.path().join("01-noop");
        std::fs::write(&hook, "#!/bin/sh\nexit 0\n").unwrap();
        // deliberately not chmod +x

        let log_path = dir.path().join("pkg.log");
        let mut log = BuildLog::open(&log_path, "pkg").unwrap();
        run_global_hooks(dir.path(), "pkg", &mut log);
        // no panic, and the log records no "ok" line since it never ran
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(!contents.contains("global hook ok"));
    }

    #[test]
    fn executable_hooks_run_in_lexicographic_order_with_package_arg() {
        let dir = tempfile::tempdir().unwrap();
        let out_file = dir.path().join("order.txt");

        for (i, tag) in ["a", "b"].iter().enumerate() {
            let hook = dir.path().join(format!("{i:02}-{tag}"));
            std::fs::write(
                &hook,
                format!("#!/bin/sh\necho {tag}:$1 >> {}\n", out_file.display()),
            )
            .unwrap();
            let mut perms = std::fs::metadata(&hook).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&hook, perms).unwrap();
        }

        let log_path = dir.path().join("pkg.log");
        let mut log = BuildLog::open(&log_path, "pkg").unwrap();
        run_global_hooks(dir.path(), "hello", &mut log);

        let contents = std::fs::read_to_string(&out_file).unwrap_or_default();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["a:hello", "b:hello"]);
    }
}
