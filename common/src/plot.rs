use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    process::Stdio,
};

use eyre::{Context, Result};
use serde::Serialize;
use tokio::{
    fs::{create_dir_all, write},
    process::Command,
};
use tracing::debug;

use crate::{
    config::{AllocPolicy, Configuration},
    error::PlotError,
    result::ResultEntry,
    util::TrialStats,
};

pub const X_LABEL: &str = "num threads";
pub const Y_LABEL: &str = "per-core throughput (ops/sec/core)";

/// Legend label for a configuration. Pinning only distinguishes numa runs.
pub fn category_key(config: &Configuration) -> String {
    match config.alloc_policy {
        AllocPolicy::Once | AllocPolicy::PerThread => config.alloc_policy.to_string(),
        AllocPolicy::Numa => format!("{}-{}", config.alloc_policy, config.pin_policy),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: u32,
    pub stats: TrialStats,
}

/// One error bar line on the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn xs(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn medians(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.stats.median).collect()
    }
}

/// Per category: its name, sorted num-cpus and median throughput, one per line
pub fn diagnostics(series: &[Series]) -> String {
    series
        .iter()
        .map(|s| format!("{}\n{:?}\n{:?}\n", s.name, s.xs(), s.medians()))
        .collect()
}

/// Buckets trials by category and num-cpus, keeping categories in the order
/// they first appear. Each (category, num-cpus) pair may occur only once.
pub fn group_by_category(
    entries: &[ResultEntry],
) -> Result<Vec<(String, BTreeMap<u32, Vec<f64>>)>, PlotError> {
    let mut lines: Vec<(String, BTreeMap<u32, Vec<f64>>)> = Vec::new();
    for entry in entries {
        let key = category_key(entry.config());
        let idx = match lines.iter().position(|(name, _)| *name == key) {
            Some(idx) => idx,
            None => {
                lines.push((key.clone(), BTreeMap::new()));
                lines.len() - 1
            }
        };
        let num_cpus = entry.config().num_cpus;
        let points = &mut lines[idx].1;
        if points.contains_key(&num_cpus) {
            return Err(PlotError::DuplicatePoint {
                category: key,
                num_cpus,
            });
        }
        points.insert(num_cpus, entry.trials().to_vec());
    }
    Ok(lines)
}

/// Median, min and max per num-cpus for every category, x ascending.
pub fn aggregate(entries: &[ResultEntry]) -> Result<Vec<Series>, PlotError> {
    group_by_category(entries)?
        .into_iter()
        .map(|(name, points)| {
            let points = points
                .into_iter()
                .map(|(x, trials)| {
                    TrialStats::from_trials(&trials)
                        .map(|stats| Point { x, stats })
                        .ok_or_else(|| PlotError::EmptyTrials {
                            category: name.clone(),
                            num_cpus: x,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if points.is_empty() {
                return Err(PlotError::EmptyCategory(name));
            }
            Ok(Series { name, points })
        })
        .collect()
}

/// Chart file stem for a results file: its basename minus the last extension
pub fn output_stem(results_file: &Path) -> Result<String, PlotError> {
    results_file
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_owned())
        .ok_or_else(|| PlotError::InvalidPath(results_file.display().to_string()))
}

#[derive(Serialize)]
struct PlotSeries<'a> {
    name: &'a str,
    x: Vec<u32>,
    y: Vec<f64>,
    yerr_low: Vec<f64>,
    yerr_high: Vec<f64>,
}

#[derive(Serialize)]
struct PlotData<'a> {
    x_label: &'a str,
    y_label: &'a str,
    series: Vec<PlotSeries<'a>>,
}

pub struct ErrorBarJob<'a> {
    pub filepath: PathBuf,
    pub series: &'a [Series],
    pub python: &'a str,
    pub script: &'a Path,
}

/// Writes the series to `plot_data/<stem>.json` beside the chart and hands
/// it to the matplotlib script, which saves the figure to `filepath`.
pub async fn render_errorbars(job: &ErrorBarJob<'_>) -> Result<PathBuf> {
    let plot_dir = match job.filepath.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let plot_data_dir = plot_dir.join("plot_data");
    create_dir_all(&plot_data_dir)
        .await
        .context("Create plot data dir")?;

    let stem = output_stem(&job.filepath)?;
    let data_path = plot_data_dir.join(format!("{stem}.json"));
    let data = PlotData {
        x_label: X_LABEL,
        y_label: Y_LABEL,
        series: job
            .series
            .iter()
            .map(|s| {
                let (yerr_low, yerr_high): (Vec<_>, Vec<_>) =
                    s.points.iter().map(|p| p.stats.error()).unzip();
                PlotSeries {
                    name: &s.name,
                    x: s.xs(),
                    y: s.medians(),
                    yerr_low,
                    yerr_high,
                }
            })
            .collect(),
    };
    write(&data_path, serde_json::to_string(&data)?)
        .await
        .context(format!("Write plot data {}", data_path.display()))?;

    let args = vec![
        job.script.display().to_string(),
        "--data".to_owned(),
        data_path.display().to_string(),
        "--filepath".to_owned(),
        job.filepath.display().to_string(),
    ];
    debug!("{} {}", job.python, args.join(" "));
    let output = Command::new(job.python)
        .args(&args)
        .stdin(Stdio::null())
        .output()
        .await
        .context(format!("Running {}", job.python))?;

    if !output.status.success() {
        return Err(PlotError::RenderFailed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }
    Ok(data_path)
}
