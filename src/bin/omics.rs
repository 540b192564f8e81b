//! omics - cross-omics analysis CLI
//!
//! Command-line interface over the composable-omics engine.

use clap::{Args, Parser, Subcommand, ValueEnum};
use composable_omics::composition::DEFAULT_TOP_N;
use composable_omics::context::OmicsContext;
use composable_omics::correlate::CorrelationConfig;
use composable_omics::data::DEFAULT_RANK;
use composable_omics::error::{OmicsError, Result};
use composable_omics::integrate::IntegrationConfig;
use composable_omics::ordination::{OrdinationConfig, OrdinationMethod};
use composable_omics::pipeline::{Pipeline, PipelineConfig, PipelineStep, StepOutput};
use std::path::{Path, PathBuf};

const GROUP_COLUMN: &str = "Disease severity";

/// CLI-friendly ordination method
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOrdination {
    /// Metric MDS from seeded random starts
    Smacof,
    /// Classical scaling (PCoA)
    Classical,
}

impl From<CliOrdination> for OrdinationMethod {
    fn from(method: CliOrdination) -> Self {
        match method {
            CliOrdination::Smacof => OrdinationMethod::Smacof,
            CliOrdination::Classical => OrdinationMethod::Classical,
        }
    }
}

/// Cross-omics analysis of expression counts and taxonomic abundance
#[derive(Parser)]
#[command(name = "omics")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Worker threads for parallel computation (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Input datasets shared by every analysis.
#[derive(Args)]
struct DataArgs {
    /// Path to sample metadata TSV
    #[arg(short, long)]
    metadata: PathBuf,

    /// Path to expression count matrix TSV (may be .gz)
    #[arg(short = 'c', long)]
    counts: PathBuf,

    /// Path to long-form abundance CSV (may be .gz)
    #[arg(short, long)]
    abundance: PathBuf,
}

impl DataArgs {
    fn load(&self) -> Result<OmicsContext> {
        OmicsContext::load(&self.metadata, &self.counts, &self.abundance)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the loaded datasets
    Summary {
        #[command(flatten)]
        data: DataArgs,

        /// Metadata column holding group labels
        #[arg(short, long, default_value = GROUP_COLUMN)]
        group_column: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Differential expression between two groups
    De {
        #[command(flatten)]
        data: DataArgs,

        /// Metadata column holding group labels
        #[arg(short, long, default_value = GROUP_COLUMN)]
        group_column: String,

        /// First group (positive logFC means higher here)
        #[arg(long)]
        group1: String,

        /// Second group
        #[arg(long)]
        group2: String,

        /// Output path for results TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Alpha diversity and Bray-Curtis ordination
    Diversity {
        #[command(flatten)]
        data: DataArgs,

        /// Taxonomic rank to aggregate at
        #[arg(short, long, default_value = DEFAULT_RANK)]
        rank: String,

        /// Metadata column used to label samples
        #[arg(short, long, default_value = GROUP_COLUMN)]
        group_column: String,

        /// Ordination method
        #[arg(long, value_enum, default_value = "smacof")]
        method: CliOrdination,

        /// Random seed for SMACOF starts
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output path for results TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Relative abundance of the most abundant taxa
    Composition {
        #[command(flatten)]
        data: DataArgs,

        /// Taxonomic rank to aggregate at
        #[arg(short, long, default_value = DEFAULT_RANK)]
        rank: String,

        /// Number of taxa to report
        #[arg(long, default_value_t = DEFAULT_TOP_N)]
        top_n: usize,

        /// Output path for results TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Spearman correlation between expression and abundance
    Correlation {
        #[command(flatten)]
        data: DataArgs,

        /// Taxonomic rank to aggregate at
        #[arg(short, long, default_value = DEFAULT_RANK)]
        rank: String,

        /// Number of highest-variance features
        #[arg(long, default_value = "50")]
        top_features: usize,

        /// Number of most abundant taxa
        #[arg(long, default_value = "20")]
        top_taxa: usize,

        /// Output path for results TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// PLS-canonical integration of expression and abundance
    Integration {
        #[command(flatten)]
        data: DataArgs,

        /// Taxonomic rank to aggregate at
        #[arg(short, long, default_value = DEFAULT_RANK)]
        rank: String,

        /// Metadata column used to label samples
        #[arg(short, long, default_value = GROUP_COLUMN)]
        group_column: String,

        /// Number of latent components
        #[arg(short, long, default_value = "2")]
        n_components: usize,

        /// Output path for results TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// PCA of log-CPM expression
    Pca {
        #[command(flatten)]
        data: DataArgs,

        /// Number of principal components
        #[arg(short, long, default_value = "2")]
        n_components: usize,

        /// Output path for scores TSV (JSON to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(long)]
        config: PathBuf,

        /// Directory for step outputs
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Write an example pipeline configuration
    Example {
        /// Output path for the YAML file
        #[arg(short, long, default_value = "pipeline.yaml")]
        output: PathBuf,
    },
}

fn init_logging(level: &str) {
    let level = level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Warning: Invalid log level '{}' provided. Defaulting to Info.", level);
        log::LevelFilter::Info
    });
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_micros()
        .init();
}

fn init_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| OmicsError::InvalidParameter(format!("Thread pool: {}", e)))?;
        log::info!("Using {} threads for parallel operations", n);
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = init_threads(cli.threads).and_then(|_| match cli.command {
        Commands::Summary {
            data,
            group_column,
            format,
        } => cmd_summary(&data, &group_column, &format),

        Commands::De {
            data,
            group_column,
            group1,
            group2,
            output,
        } => cmd_step(
            &data,
            PipelineStep::DifferentialExpression {
                group_column,
                group1,
                group2,
            },
            output.as_deref(),
        ),

        Commands::Diversity {
            data,
            rank,
            group_column,
            method,
            seed,
            output,
        } => cmd_step(
            &data,
            PipelineStep::Diversity {
                rank,
                group_column,
                ordination: OrdinationConfig {
                    method: method.into(),
                    seed,
                    ..OrdinationConfig::default()
                },
            },
            output.as_deref(),
        ),

        Commands::Composition {
            data,
            rank,
            top_n,
            output,
        } => cmd_step(&data, PipelineStep::Composition { rank, top_n }, output.as_deref()),

        Commands::Correlation {
            data,
            rank,
            top_features,
            top_taxa,
            output,
        } => cmd_step(
            &data,
            PipelineStep::Correlation {
                rank,
                config: CorrelationConfig {
                    top_n_features: top_features,
                    top_n_taxa: top_taxa,
                },
            },
            output.as_deref(),
        ),

        Commands::Integration {
            data,
            rank,
            group_column,
            n_components,
            output,
        } => cmd_step(
            &data,
            PipelineStep::Integration {
                rank,
                label_column: group_column,
                config: IntegrationConfig { n_components },
            },
            output.as_deref(),
        ),

        Commands::Pca {
            data,
            n_components,
            output,
        } => cmd_step(&data, PipelineStep::Pca { n_components }, output.as_deref()),

        Commands::Run { config, output_dir } => cmd_run(&config, &output_dir),

        Commands::Example { output } => cmd_example(&output),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print a dataset summary
fn cmd_summary(data: &DataArgs, group_column: &str, format: &str) -> Result<()> {
    let ctx = data.load()?;
    let summary = ctx.summary(group_column)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "text" => print!("{}", summary),
        other => {
            return Err(OmicsError::InvalidParameter(format!(
                "Unknown format '{}' (expected text or json)",
                other
            )))
        }
    }
    Ok(())
}

/// Run one analysis and write or print its output
fn cmd_step(data: &DataArgs, step: PipelineStep, output: Option<&Path>) -> Result<()> {
    let ctx = data.load()?;
    let report = Pipeline::new().name(step.name()).step(step).run(&ctx)?;

    for (_, result) in &report.outputs {
        report_step(result);
        match output {
            Some(path) => {
                for file in result.write(path)? {
                    eprintln!("Wrote {:?}", file);
                }
            }
            None => println!("{}", serde_json::to_string_pretty(&result.to_json()?)?),
        }
    }
    Ok(())
}

fn report_step(output: &StepOutput) {
    match output {
        StepOutput::DifferentialExpression(results) => {
            eprintln!("Comparison: {}", results.comparison);
            eprint!("{}", results.summary());
        }
        StepOutput::Correlation(matrix) if matrix.is_empty() => {
            eprintln!("Too few shared samples; no correlations computed");
        }
        StepOutput::Integration(None) => {
            eprintln!("Insufficient overlapping samples for integration");
        }
        StepOutput::Pca(result) => {
            let ratios: Vec<String> = result
                .explained_variance_ratio
                .iter()
                .map(|r| format!("{:.1}%", r * 100.0))
                .collect();
            eprintln!("Explained variance: {}", ratios.join(", "));
        }
        _ => {}
    }
}

/// Run a pipeline from configuration
fn cmd_run(config_path: &Path, output_dir: &Path) -> Result<()> {
    eprintln!("Loading pipeline configuration from {:?}...", config_path);
    let config = PipelineConfig::from_file(config_path)?;

    eprintln!("Running pipeline '{}' ({} steps)...", config.name, config.steps.len());
    let report = config.run()?;

    let files = report.write_outputs(output_dir)?;
    eprintln!("Done! Wrote {} files to {:?}", files.len(), output_dir);
    Ok(())
}

/// Write an example pipeline configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let yaml = PipelineConfig::example().to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example pipeline to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(())
}
