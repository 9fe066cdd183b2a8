use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{config::Configuration, error::SweepError};

/// Produces one throughput value per call for a configuration.
#[async_trait::async_trait]
pub trait TrialRunner: Send + Sync {
    async fn run(&self, config: &Configuration) -> Result<f64, SweepError>;
}

/// The external benchmark binary, spawned once per trial.
#[derive(Debug, Clone)]
pub struct BenchProcess {
    program: PathBuf,
    strict_exit: bool,
}

impl BenchProcess {
    /// With `strict_exit` a non-zero exit status fails the trial, otherwise
    /// it is only logged and the output is parsed regardless.
    pub fn new(program: impl Into<PathBuf>, strict_exit: bool) -> Self {
        Self {
            program: program.into(),
            strict_exit,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait::async_trait]
impl TrialRunner for BenchProcess {
    async fn run(&self, config: &Configuration) -> Result<f64, SweepError> {
        let args = config.args();
        info!("running command {} {}", self.program.display(), args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|source| SweepError::Launch {
                program: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            if self.strict_exit {
                return Err(SweepError::ExitStatus {
                    code: output.status.code(),
                    config: config.to_string(),
                });
            }
            warn!(
                "Benchmark exited with {} for {config}, parsing output anyway",
                output.status
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("stdout={stdout:?}");
        parse_output(&stdout)
    }
}

/// The benchmark prints a single finite number. Surrounding whitespace is
/// ignored, anything else separated by a space is an error.
pub fn parse_output(output: &str) -> Result<f64, SweepError> {
    let tokens = output.trim().split(' ').collect::<Vec<_>>();
    if tokens.len() != 1 {
        return Err(SweepError::TokenCount {
            count: tokens.len(),
            output: output.to_owned(),
        });
    }
    let value = tokens[0].parse::<f64>().map_err(|source| SweepError::Parse {
        token: tokens[0].to_owned(),
        source,
    })?;
    // the results file cannot represent inf or NaN
    if !value.is_finite() {
        return Err(SweepError::NonFinite(tokens[0].to_owned()));
    }
    Ok(value)
}
