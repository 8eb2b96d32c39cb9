//! helm invocation and the generated values file
use crate::resolver::Resolved;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Runs the deployment tool with a list of arguments
pub trait CommandRunner {
    fn run(&self, args: &[String]) -> Result<(), RunError>;
}

/// Runs a helm binary as a child process
///
/// stdout and stderr share one pipe, so warnings stay in place between regular output. The
/// output is printed once the process exited, whether it succeeded or not.
#[derive(Debug, Clone, derive_new::new)]
pub struct HelmRunner {
    binary: PathBuf,
}

impl HelmRunner {
    /// Runs the binary and returns its combined output
    pub fn run_captured(&self, args: &[String]) -> Result<(Vec<u8>, ExitStatus), RunError> {
        let spawn_error = |source| RunError::Spawn {
            binary: self.binary.clone(),
            source,
        };

        let (mut reader, writer) = std::io::pipe().map_err(spawn_error)?;

        // the command holds the write ends until it is dropped, reading would never finish
        let mut child = {
            let mut command = Command::new(&self.binary);
            command
                .args(args)
                .stdin(Stdio::null())
                .stdout(writer.try_clone().map_err(spawn_error)?)
                .stderr(writer);
            command.spawn().map_err(spawn_error)?
        };

        let output_error = |source| RunError::Output {
            binary: self.binary.clone(),
            source,
        };

        let mut output = vec![];
        reader.read_to_end(&mut output).map_err(output_error)?;
        let status = child.wait().map_err(output_error)?;

        Ok((output, status))
    }
}

impl CommandRunner for HelmRunner {
    fn run(&self, args: &[String]) -> Result<(), RunError> {
        tracing::info!(binary = %self.binary.display(), ?args, "running helm");

        let (output, status) = self.run_captured(args)?;
        print!("{}", String::from_utf8_lossy(&output));

        if !status.success() {
            return Err(RunError::Failed(status));
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("error running helm command: {0}")]
    Failed(ExitStatus),
    #[error("error running helm command: unable to start {}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error running helm command: lost output of {}", binary.display())]
    Output {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Suffix of generated values files, prefixed with a timestamp
pub const TEMP_VALUES_SUFFIX: &str = "-temp-values.yaml";

/// A values file written for a single helm run
///
/// Removal is explicit via [TempValuesFile::cleanup] so failures can be reported.
#[derive(Debug)]
pub struct TempValuesFile {
    path: PathBuf,
    keep: bool,
}

impl TempValuesFile {
    /// Path for a file created now in `dir`: `<YYYYmmddHHMMSS>-temp-values.yaml`
    pub fn path_in(dir: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
        dir.join(format!("{timestamp}{TEMP_VALUES_SUFFIX}"))
    }

    /// Writes `values` to a new file in `dir`
    ///
    /// Fails if the file already exists. A file that was created but could not be
    /// written completely is removed again.
    pub fn create(dir: &Path, values: &Resolved, keep: bool) -> Result<Self, TempFileError> {
        let path = Self::path_in(dir);
        tracing::info!(path = %path.display(), keep, "writing values file");

        let write_error = |source| TempFileError::Write {
            path: path.clone(),
            source,
        };

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_error)?;

        let written = {
            let mut writer = std::io::BufWriter::new(file);
            values.write_to(&mut writer).and_then(|_| writer.flush())
        };

        if let Err(source) = written {
            if let Err(cleanup) = std::fs::remove_file(&path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "could not remove partially written values file"
                );
            }
            return Err(write_error(source));
        }

        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the file unless it is meant to be kept
    pub fn cleanup(self) -> Result<(), TempFileError> {
        if self.keep {
            tracing::info!(path = %self.path.display(), "keeping values file");
            return Ok(());
        }

        std::fs::remove_file(&self.path).map_err(|source| TempFileError::Cleanup {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TempFileError {
    #[error("error writing temp values file {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error deleting temp values file {}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
