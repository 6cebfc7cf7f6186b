//! Running the external LaTeX compiler.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const FALLBACK_ERROR: &str = "Compilation failed - check logs";

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compiler timed out after {0:?}")]
    Timeout(Duration),
}

/// Console output of one compiler run. The run "finished" whatever its exit
/// status; success is judged by whether the artifact exists.
#[derive(Debug, Clone, Default)]
pub struct CompilerRun {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait LatexCompiler: Send + Sync {
    /// Compiles `tex_file`, writing outputs into `work_dir`.
    async fn run(&self, work_dir: &Path, tex_file: &Path) -> Result<CompilerRun, CompilerError>;
}

/// `pdflatex -interaction=nonstopmode -output-directory=<dir> <file>`.
#[derive(Debug, Clone)]
pub struct PdfLatex {
    command: String,
    timeout: Duration,
}

impl PdfLatex {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }
}

impl Default for PdfLatex {
    fn default() -> Self {
        Self::new("pdflatex", DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl LatexCompiler for PdfLatex {
    async fn run(&self, work_dir: &Path, tex_file: &Path) -> Result<CompilerRun, CompilerError> {
        let child = Command::new(&self.command)
            .arg("-interaction=nonstopmode")
            .arg(format!("-output-directory={}", work_dir.display()))
            .arg(tex_file)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CompilerError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // On timeout the child is dropped, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CompilerError::Timeout(self.timeout))?
            .map_err(|source| CompilerError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        debug!("{} exited with {}", self.command, output.status);
        Ok(CompilerRun {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Paths of the files a run over `tex_file` leaves behind.
pub fn output_paths(work_dir: &Path, tex_file: &Path) -> (PathBuf, PathBuf) {
    let stem = tex_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    (
        work_dir.join(format!("{stem}.pdf")),
        work_dir.join(format!("{stem}.log")),
    )
}

/// Lines starting with `!` and the line following each.
pub fn parse_latex_errors(log: &str) -> Vec<String> {
    let lines: Vec<&str> = log.lines().collect();
    let mut errors = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if line.starts_with('!') {
            errors.push(line.to_string());
            if let Some(next) = lines.get(i + 1) {
                errors.push(next.to_string());
            }
        }
    }

    if errors.is_empty() {
        errors.push(FALLBACK_ERROR.to_string());
    }
    errors
}
