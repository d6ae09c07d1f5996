use crate::config::AnalysisConfig;
use crate::renderers::Figure;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sg-solar")]
#[command(about = "Singapore solar deployment analysis: reconcile, aggregate, export and plot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file [default: solar-analysis.toml if present]"
    )]
    pub config: Option<PathBuf>,
}

/// Input file overrides shared by `run` and `validate`
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    #[arg(long, help = "Zipped planning area boundary shapefile")]
    pub boundary_archive: Option<PathBuf>,

    #[arg(long, help = "System database (CSV)")]
    pub system_database: Option<PathBuf>,

    #[arg(long, help = "Location corrections, Listed -> Actual (CSV)")]
    pub location_corrections: Option<PathBuf>,

    #[arg(long, help = "System name corrections, System name -> Actual (CSV)")]
    pub name_corrections: Option<PathBuf>,
}

impl InputArgs {
    /// Command-line paths take precedence over file and environment settings
    pub fn apply(&self, config: &mut AnalysisConfig) {
        let inputs = &mut config.inputs;
        if let Some(path) = &self.boundary_archive {
            inputs.boundary_archive = path.clone();
        }
        if let Some(path) = &self.system_database {
            inputs.system_database = path.clone();
        }
        if let Some(path) = &self.location_corrections {
            inputs.location_corrections = path.clone();
        }
        if let Some(path) = &self.name_corrections {
            inputs.name_corrections = path.clone();
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis and write tables and figures
    Run {
        #[command(flatten)]
        inputs: InputArgs,

        #[arg(
            short,
            long,
            help = "Output directory [default: output/solar-report-{YYMMDD}]"
        )]
        output_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            value_enum,
            value_delimiter = ',',
            help = "Figures to render [default: the six report figures]"
        )]
        figures: Vec<Figure>,

        #[arg(long, conflicts_with = "figures", help = "Render every figure")]
        all_figures: bool,

        #[arg(long, help = "Skip the Parquet export")]
        no_export: bool,

        #[arg(long, help = "Parquet compression: snappy, gzip, lz4, zstd or none")]
        compression: Option<String>,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Check the inputs and the derived tables without writing anything
    Validate {
        #[command(flatten)]
        inputs: InputArgs,
    },

    /// Display information about an exported Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_figures() {
        let cli = Cli::try_parse_from([
            "sg-solar",
            "run",
            "--system-database",
            "systems.csv",
            "--figures",
            "treemap,log-map",
            "--no-export",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                inputs,
                figures,
                no_export,
                all_figures,
                ..
            } => {
                assert_eq!(figures, vec![Figure::Treemap, Figure::LogMap]);
                assert!(no_export);
                assert!(!all_figures);

                let mut config = AnalysisConfig::default();
                inputs.apply(&mut config);
                assert_eq!(config.inputs.system_database, PathBuf::from("systems.csv"));
                assert_eq!(
                    config.inputs.boundary_archive,
                    AnalysisConfig::default().inputs.boundary_archive
                );
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_all_figures_conflicts_with_list() {
        let result = Cli::try_parse_from([
            "sg-solar",
            "run",
            "--figures",
            "treemap",
            "--all-figures",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sg-solar", "validate", "-v", "--config", "a.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }
}
