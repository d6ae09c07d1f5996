use crate::cli::args::{Cli, Commands, InputArgs};
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::processors::{AnalysisPipeline, IntegrityChecker, SolarAnalysis};
use crate::renderers::{Figure, ReportRenderer};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ParquetWriter, TableKind};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run {
            inputs,
            output_dir,
            figures,
            all_figures,
            no_export,
            compression,
            max_workers,
        } => {
            let mut config = load_config(cli.config.as_deref(), &inputs)?;
            if let Some(dir) = output_dir {
                config.output_dir = Some(dir);
            }
            if let Some(compression) = compression {
                config.compression = compression;
            }
            config.check()?;

            // Fail on a bad codec before any work is done
            let writer = ParquetWriter::new().with_compression(&config.compression)?;
            let output_dir = config.output_dir();

            println!("Analysing Singapore solar deployment...");
            println!("System database: {}", config.inputs.system_database.display());
            println!("Boundary archive: {}", config.inputs.boundary_archive.display());
            println!("Output directory: {}", output_dir.display());

            let pipeline = AnalysisPipeline::new(config);
            let analysis = analyse(&pipeline)?;

            if !analysis.integrity.is_clean() {
                println!(
                    "⚠️  Found {} integrity issues; outputs are written anyway",
                    analysis.integrity.violations.len()
                );
            }

            if no_export {
                println!("Skipping Parquet export");
            } else {
                let paths = writer.write_analysis(&analysis, &output_dir)?;
                println!("\nExported {} tables:", paths.len());
                print_paths(&paths);
            }

            let figures = if all_figures {
                Figure::ALL.to_vec()
            } else if figures.is_empty() {
                Figure::defaults()
            } else {
                figures
            };

            let progress =
                ProgressReporter::new(figures.len() as u64, "Rendering figures...", false);
            let paths = ReportRenderer::new(&analysis, pipeline.config(), &output_dir)
                .with_max_workers(max_workers)
                .render(&figures, &progress)?;
            progress.finish_with_message(&format!("Rendered {} figures", paths.len()));

            println!("\nFigures:");
            print_paths(&paths);
            println!("Analysis complete!");
        }

        Commands::Validate { inputs } => {
            let config = load_config(cli.config.as_deref(), &inputs)?;
            config.check()?;

            println!("Validating solar deployment data...");
            println!("System database: {}", config.inputs.system_database.display());

            let pipeline = AnalysisPipeline::new(config);
            let analysis = analyse(&pipeline)?;

            if analysis.integrity.is_clean() {
                println!("✅ All data passed validation checks");
            } else {
                println!(
                    "⚠️  Found {} validation issues",
                    analysis.integrity.violations.len()
                );
                return Err(ProcessingError::IntegrityFailed(
                    analysis.integrity.violations.len(),
                ));
            }
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            let kind = writer.detect_table_kind(&file)?;

            println!("\nTable type: {:?}", kind);
            println!("{}", file_info.summary());

            if sample > 0 && kind == TableKind::Systems {
                println!("\nSample Records (showing up to {} records):", sample);
                match writer.read_sample_systems(&file, sample) {
                    Ok(records) => {
                        for (i, record) in records.iter().enumerate() {
                            println!(
                                "{}. {} ({}, {}): {:.0} kWp commissioned {} [{}]",
                                i + 1,
                                record.name,
                                record.planning_area,
                                record.region,
                                record.capacity_kwp,
                                record.commissioned,
                                record.technology
                            );
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>, inputs: &InputArgs) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig::load(path)?;
    inputs.apply(&mut config);
    Ok(config)
}

/// Run the in-memory pipeline behind a spinner and print both reports
fn analyse(pipeline: &AnalysisPipeline) -> Result<SolarAnalysis> {
    let progress = ProgressReporter::new_spinner("Processing data...", false);
    let analysis = pipeline.run(&progress)?;
    progress.finish_with_message(&format!("Processed {} systems", analysis.records.len()));

    println!("\n{}", analysis.reconciliation.generate_summary());
    let checker = IntegrityChecker::new(&analysis.boundary, pipeline.config());
    println!("{}", checker.generate_summary(&analysis.integrity));

    Ok(analysis)
}

fn print_paths(paths: &[PathBuf]) {
    for path in paths {
        println!("  - {}", path.display());
    }
}

/// `--verbose` raises the default level to debug; `RUST_LOG` wins over both
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    // A subscriber may already be installed when running inside a test harness
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already set");
    }
    Ok(())
}
