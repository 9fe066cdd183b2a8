use std::num::ParseFloatError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Failed to launch {program}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Expected exactly one output token, got {count}: {output:?}")]
    TokenCount { count: usize, output: String },
    #[error("Could not parse benchmark output {token:?}")]
    Parse {
        token: String,
        #[source]
        source: ParseFloatError,
    },
    #[error("Benchmark output {0:?} is not a finite number")]
    NonFinite(String),
    #[error("Benchmark exited with code {code:?} for {config}")]
    ExitStatus { code: Option<i32>, config: String },
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Could not decode results")]
    Decode(#[from] serde_json::Error),
    #[error("Duplicate num-cpus {num_cpus} in category {category}")]
    DuplicatePoint { category: String, num_cpus: u32 },
    #[error("Category {0} has no points")]
    EmptyCategory(String),
    #[error("No trials for num-cpus {num_cpus} in category {category}")]
    EmptyTrials { category: String, num_cpus: u32 },
    #[error("Invalid results path {0}")]
    InvalidPath(String),
    #[error("Rendering failed with code {code:?}: {stderr}")]
    RenderFailed { code: Option<i32>, stderr: String },
}
