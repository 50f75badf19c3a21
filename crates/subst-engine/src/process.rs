//! Invocation of external tools with captured output

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{EngineError, Result};

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// An external binary looked up on `PATH`
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: String,
    install_hint: Option<String>,
}

impl ExternalTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            install_hint: None,
        }
    }

    /// Message shown when the binary is missing
    pub fn install_hint(mut self, hint: impl Into<String>) -> Self {
        self.install_hint = Some(hint.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolve the binary, failing with [`EngineError::ToolNotFound`]
    pub fn locate(&self) -> Result<PathBuf> {
        find_in_path(&self.name).ok_or_else(|| EngineError::ToolNotFound {
            tool: self.name.clone(),
            hint: self.install_hint.clone(),
        })
    }

    /// Run with `args`, optionally feeding `stdin`, and capture output
    pub fn run<I, S>(&self, args: I, stdin: Option<&[u8]>) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.run_with_env(args, &[], stdin)
    }

    /// Like [`run`](Self::run) with extra environment variables
    ///
    /// Variable values are not logged.
    pub fn run_with_env<I, S>(
        &self,
        args: I,
        env: &[(&str, &str)],
        stdin: Option<&[u8]>,
    ) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let binary = self.locate()?;
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let env_names: Vec<&str> = env.iter().map(|(name, _)| *name).collect();
        tracing::debug!(tool = %self.name, ?args, env = ?env_names, "running external tool");

        let mut child = Command::new(&binary)
            .args(&args)
            .envs(env.iter().copied())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is fed from its own thread while stdout is drained here
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => {
                let input = input.to_vec();
                Some(std::thread::spawn(move || pipe.write_all(&input)))
            }
            _ => None,
        };

        let output = child.wait_with_output()?;

        // A child that fails early closes its stdin; its stderr is the useful part then
        if let Some(writer) = writer {
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            if output.status.success() {
                written?;
            }
        }

        Ok(ToolOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Look a binary up on `PATH`
///
/// Names containing a path separator are checked as given.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    find_in_dirs(name, std::env::split_paths(&path_var))
}

/// First executable `name` in `dirs`, in order
fn find_in_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .flat_map(|dir| executable_names(name).into_iter().map(move |n| dir.join(n)))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(windows)]
fn executable_names(name: &str) -> Vec<String> {
    vec![format!("{}.exe", name), name.to_string()]
}

#[cfg(not(windows))]
fn executable_names(name: &str) -> Vec<String> {
    vec![name.to_string()]
}
