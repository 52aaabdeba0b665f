use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use crate::buildlog::BuildLog;
use crate::error::{Error, Result};
use crate::recipe::BuildSpec;

enum OutputLine {
    Line(String),
    Done,
}

/// Runs a recipe's build phases against a work tree.
pub struct Builder<'a> {
    pub src_root: &'a Path,
    pub destdir: &'a Path,
}

impl<'a> Builder<'a> {
    pub fn new(src_root: &'a Path, destdir: &'a Path) -> Self {
        Builder { src_root, destdir }
    }

    /// Constructs the environment for a phase: process env, overlaid by
    /// the recipe's `env` map, overlaid by injected variables, then
    /// `$VAR`/`${VAR}` expansion of every value against the accumulated
    /// environment.
    fn env_vars(&self, spec: &BuildSpec) -> HashMap<String, String> {
        let mut env: HashMap<String, String> = std::env::vars().collect();
        for (k, v) in &spec.env {
            env.insert(k.clone(), v.clone());
        }
        env.insert(
            "DESTDIR".to_string(),
            self.destdir.display().to_string(),
        );

        let expanded: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.clone(), expand(v, &env)))
            .collect();
        expanded
    }

    /// Runs `prepare`, `compile`, and (unless `build_only`) `install`, in
    /// order. Any non-zero shell exit aborts the build.
    pub fn build(&self, spec: &BuildSpec, package: &str, build_only: bool, log: &mut BuildLog) -> Result<()> {
        let env = self.env_vars(spec);

        self.run_phase("prepare", &spec.prepare, &env, package, log)?;
        self.run_phase("compile", &spec.compile, &env, package, log)?;
        if !build_only {
            self.run_phase("install", &spec.install, &env, package, log)?;
        }
        Ok(())
    }

    fn run_phase(
        &self,
        phase: &'static str,
        lines: &[String],
        env: &HashMap<String, String>,
        package: &str,
        log: &mut BuildLog,
    ) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let script = lines.join("\n");
        let shell = env
            .get("SHELL")
            .cloned()
            .unwrap_or_else(|| "/bin/sh".to_string());

        log.info(format!("running {phase} phase"));

        let mut child = Command::new(&shell)
            .arg("-exc")
            .arg(&script)
            .current_dir(self.src_root)
            .env_clear()
            .envs(env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");
        let (tx, rx) = mpsc::channel::<OutputLine>();

        let tx_out = tx.clone();
        let out_handle = thread::spawn(move || stream_lines(stdout, tx_out));
        let err_handle = thread::spawn(move || stream_lines(stderr, tx));

        while let Ok(OutputLine::Line(line)) = rx.recv() {
            log.raw_line(&line);
        }

        let _ = out_handle.join();
        let _ = err_handle.join();

        let status = child.wait()?;
        if !status.success() {
            log.error(format!("{phase} phase failed with {status}"));
            return Err(Error::BuildScriptFailed {
                package: package.to_string(),
                phase,
                code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

fn stream_lines<R: std::io::Read>(reader: R, tx: mpsc::Sender<OutputLine>) {
    let reader = BufReader::new(reader);
    for line in reader.lines().map_while(std::result::Result::ok) {
        if tx.send(OutputLine::Line(line)).is_err() {
            return;
        }
    }
    let _ = tx.send(OutputLine::Done);
}

/// Expands `$VAR` and `${VAR}` references within `value` against `env`.
/// Unknown variables expand to the empty string.
fn expand(value: &str, env: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{' {
                if let Some(end) = chars[i + 2..].iter().position(|&c| c == '}') {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    out.push_str(env.get(&name).map(String::as_str).unwrap_or(""));
                    i += 2 + end + 1;
                    continue;
                }
            } else if chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_' {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                let name: String = chars[i + 1..j].iter().collect();
                out.push_str(env.get(&name).map(String::as_str).unwrap_or(""));
                i = j;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}
