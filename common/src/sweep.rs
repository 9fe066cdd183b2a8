use std::path::Path;

use eyre::{Context, Result};
use indicatif::ProgressBar;
use tracing::{debug, info};

use crate::{
    bench::TrialRunner,
    config::Grid,
    result::{ResultEntry, write_results},
};

pub const NUM_TRIALS: u32 = 3;

/// Runs every configuration of every grid `trials` times, in order.
///
/// After each grid the output file is rewritten with all entries collected
/// so far, so a failure part way through keeps every finished grid on disk.
/// Any failed trial aborts the sweep.
pub async fn run_sweep(
    grids: &[Grid],
    bench: &dyn TrialRunner,
    trials: u32,
    output: &Path,
    progress: &ProgressBar,
) -> Result<Vec<ResultEntry>> {
    for (idx, grid) in grids.iter().enumerate() {
        grid.validate().context(format!("Grid {idx}"))?;
    }

    let mut results = Vec::new();
    for (idx, grid) in grids.iter().enumerate() {
        debug!("grid={idx} {grid:?}");
        for config in grid.configurations() {
            info!("running config {config}");
            progress.set_message(config.to_string());

            let mut values = Vec::with_capacity(trials as usize);
            for trial in 0..trials {
                let value = bench
                    .run(&config)
                    .await
                    .context(format!("Trial {trial} of {config}"))?;
                debug!("trial={trial} value={value}");
                values.push(value);
            }
            results.push(ResultEntry::new(config, values));
            progress.inc(1);
        }

        write_results(output, &results).await?;
        info!(
            "Grid {idx} done, {} entries written to {}",
            results.len(),
            output.display()
        );
    }
    Ok(results)
}
