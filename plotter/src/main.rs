use std::path::PathBuf;

use clap::Parser;
use common::{
    plot::{ErrorBarJob, aggregate, diagnostics, output_stem, render_errorbars},
    result::read_results,
    util::init_tracing,
};
use eyre::Result;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(about = "Plot per-core throughput from a sweep results file")]
struct Cli {
    /// Results file written by the runner
    results_file: PathBuf,
    /// Directory the chart is saved to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
    /// Rendering script
    #[arg(long, default_value = "plots/errorbar.py")]
    script: PathBuf,
    #[arg(long, default_value = "python3")]
    python: String,
    #[arg(short, long)]
    log: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&["plotter", "common"], &args.log)?;

    if let Err(err) = plot(&args).await {
        error!("{err:#?}");
        return Err(err);
    }
    Ok(())
}

async fn plot(args: &Cli) -> Result<()> {
    let entries = read_results(&args.results_file).await?;
    if entries.is_empty() {
        warn!("{} has no results", args.results_file.display());
    }

    let series = aggregate(&entries)?;
    print!("{}", diagnostics(&series));

    let filepath = args
        .output_dir
        .join(format!("{}.pdf", output_stem(&args.results_file)?));
    render_errorbars(&ErrorBarJob {
        filepath: filepath.clone(),
        series: &series,
        python: &args.python,
        script: &args.script,
    })
    .await?;
    info!("Saved {}", filepath.display());
    Ok(())
}
