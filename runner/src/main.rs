use std::path::PathBuf;

use clap::Parser;
use common::{
    bench::BenchProcess,
    config::{Grid, cpu_counts, default_grids},
    sweep::{NUM_TRIALS, run_sweep},
    util::init_tracing,
};
use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

#[derive(Parser)]
#[command(about = "Sweep the benchmark over its cpu, pinning and allocation grids")]
struct Cli {
    /// Results file, rewritten after every grid
    output_file: PathBuf,
    /// Benchmark binary
    #[arg(long, default_value = "./bench")]
    program: PathBuf,
    /// Runs per configuration
    #[arg(long, default_value_t = NUM_TRIALS, value_parser = clap::value_parser!(u32).range(1..))]
    trials: u32,
    #[arg(long, default_value_t = 80)]
    max_cpus: u32,
    #[arg(long, default_value_t = 8)]
    cpu_step: u32,
    /// Treat a non-zero benchmark exit status as a failed trial
    #[arg(long, default_value_t = false)]
    strict_exit: bool,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&["runner", "common"], &args.log)?;

    let cpus = cpu_counts(args.max_cpus, args.cpu_step)?;
    let host_cpus = num_cpus::get();
    if let Some(max) = cpus.iter().max()
        && *max as usize > host_cpus
    {
        warn!("Sweep goes up to {max} cpus but only {host_cpus} are available");
    }
    let grids = default_grids(&cpus);
    debug!("cpus={cpus:?}");

    let bench = BenchProcess::new(args.program, args.strict_exit);
    let total = grids.iter().map(Grid::len).sum::<usize>() as u64;
    info!(
        "Running {total} configurations x {} trials of {}",
        args.trials,
        bench.program().display()
    );

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(total);
        bar.set_style(ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
        )?);
        bar
    };

    match run_sweep(&grids, &bench, args.trials, &args.output_file, &progress).await {
        Ok(results) => {
            progress.finish_and_clear();
            info!(
                "{} results written to {}",
                results.len(),
                args.output_file.display()
            );
            Ok(())
        }
        Err(err) => {
            progress.abandon();
            error!("{err:#?}");
            Err(err)
        }
    }
}
