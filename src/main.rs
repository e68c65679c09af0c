use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use container_bench_plots::catalog::{Catalog, KNOWN_DATASETS};
use container_bench_plots::report::{
    builtin_charts, generate_report, overhead_table, print_overhead_table, select_charts,
    ReportConfig, MEMORY_DATASETS,
};
use container_bench_plots::spec::ChartSpec;
use container_bench_plots::transform::DEFAULT_POINTER_WIDTH;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "container-bench-plots")]
#[command(about = "Render comparison charts from container benchmark dumps")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render charts to SVG
    Render {
        /// Directory containing benchmark dumps (<dataset>.py / .json)
        #[arg(short, long, default_value = "./data")]
        data: PathBuf,

        /// Output directory for charts
        #[arg(short, long, default_value = "./plots")]
        output: PathBuf,

        /// JSON report definition replacing the built-in charts
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only render the named chart (repeatable)
        #[arg(long = "chart")]
        charts: Vec<String>,
    },

    /// List the available charts and the datasets they need
    Charts {
        /// JSON report definition replacing the built-in charts
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List datasets found in the data directory
    Datasets {
        /// Directory containing benchmark dumps
        #[arg(short, long, default_value = "./data")]
        data: PathBuf,
    },

    /// Print per-element memory overhead of memory benchmark runs
    Overhead {
        /// Directory containing benchmark dumps
        #[arg(short, long, default_value = "./data")]
        data: PathBuf,

        /// Bytes per element treated as raw value storage
        #[arg(short, long, default_value_t = DEFAULT_POINTER_WIDTH)]
        pointer_width: f64,

        /// Datasets to include (defaults to the set memory runs)
        datasets: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Render {
            data,
            output,
            config,
            charts,
        } => {
            render_charts(&data, &output, config.as_deref(), &charts)?;
        }
        Commands::Charts { config } => {
            list_charts(config.as_deref())?;
        }
        Commands::Datasets { data } => {
            list_datasets(&data)?;
        }
        Commands::Overhead {
            data,
            pointer_width,
            datasets,
        } => {
            print_overhead(&data, pointer_width, &datasets)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_charts(config: Option<&Path>, output_dir: &Path) -> Result<Vec<ChartSpec>> {
    match config {
        Some(path) => Ok(ReportConfig::from_file(path)?.into_charts(output_dir)?),
        None => Ok(builtin_charts(output_dir)),
    }
}

fn render_charts(
    data_dir: &Path,
    output_dir: &Path,
    config: Option<&Path>,
    names: &[String],
) -> Result<()> {
    let charts = select_charts(load_charts(config, output_dir)?, names)?;

    // Constant-only charts need no data, so a missing directory is not fatal yet
    let catalog = if data_dir.exists() {
        Catalog::from_dir(data_dir)?
    } else {
        tracing::warn!(dir = %data_dir.display(), "data directory not found, no datasets loaded");
        Catalog::new()
    };

    std::fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    println!("\nGenerating {} charts...", charts.len());
    for path in generate_report(&charts, &catalog)? {
        println!("Generated: {}", path.display());
    }
    Ok(())
}

fn list_charts(config: Option<&Path>) -> Result<()> {
    let charts = load_charts(config, Path::new(""))?;

    println!("\n{:<36} {:<6} {:>8}  Datasets", "Chart", "Kind", "Variants");
    println!("{:-<100}", "");
    for chart in &charts {
        let datasets = chart.datasets();
        println!(
            "{:<36} {:<6} {:>8}  {}",
            chart.name,
            chart.kind_name(),
            chart.variant_count(),
            if datasets.is_empty() {
                "-".to_string()
            } else {
                datasets.join(", ")
            }
        );
    }
    Ok(())
}

fn list_datasets(data_dir: &Path) -> Result<()> {
    let catalog = Catalog::from_dir(data_dir)?;

    println!("\n{:<44} {:>8} {:>10}", "Dataset", "Samples", "Max size");
    println!("{:-<64}", "");
    for id in catalog.ids() {
        let series = catalog.load(id)?;
        println!("{:<44} {:>8} {:>10.0}", id, series.len(), series.last().0);
    }

    let missing: Vec<&str> = KNOWN_DATASETS
        .iter()
        .copied()
        .filter(|id| !catalog.contains(id))
        .collect();
    if !missing.is_empty() {
        println!("\nMissing from catalog ({}):", missing.len());
        for id in missing {
            println!("  {id}");
        }
    }
    Ok(())
}

fn print_overhead(data_dir: &Path, pointer_width: f64, datasets: &[String]) -> Result<()> {
    let catalog = Catalog::from_dir(data_dir)?;

    let ids: Vec<&str> = if datasets.is_empty() {
        MEMORY_DATASETS.iter().map(|(id, _, _)| *id).collect()
    } else {
        datasets.iter().map(String::as_str).collect()
    };

    let rows = overhead_table(&catalog, &ids, pointer_width)?;
    print_overhead_table(&rows, pointer_width);
    Ok(())
}
