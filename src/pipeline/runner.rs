//! Pipeline runner for composing and executing analysis steps.

use crate::composition::DEFAULT_TOP_N;
use crate::context::{DatasetSummary, OmicsContext};
use crate::correlate::CorrelationConfig;
use crate::data::{CorrelationMatrix, DeResultSet, SampleTable, DEFAULT_RANK};
use crate::error::{OmicsError, Result};
use crate::integrate::IntegrationConfig;
use crate::ordination::{OrdinationConfig, PcaResult};
use crate::report::AnnotatedTable;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn default_rank() -> String {
    DEFAULT_RANK.to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_components() -> usize {
    2
}

/// A step in the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineStep {
    /// Dataset sizes and group labels.
    Summary { group_column: String },
    /// Welch's t-test between two levels of a metadata column.
    DifferentialExpression {
        group_column: String,
        group1: String,
        group2: String,
    },
    /// Alpha diversity plus Bray-Curtis ordination, labeled by a metadata column.
    Diversity {
        #[serde(default = "default_rank")]
        rank: String,
        group_column: String,
        #[serde(default)]
        ordination: OrdinationConfig,
    },
    /// Relative abundance of the most abundant taxa.
    Composition {
        #[serde(default = "default_rank")]
        rank: String,
        #[serde(default = "default_top_n")]
        top_n: usize,
    },
    /// Spearman correlations between expression and abundance.
    Correlation {
        #[serde(default = "default_rank")]
        rank: String,
        #[serde(default)]
        config: CorrelationConfig,
    },
    /// PLS-canonical scores for shared samples.
    Integration {
        #[serde(default = "default_rank")]
        rank: String,
        label_column: String,
        #[serde(default)]
        config: IntegrationConfig,
    },
    /// PCA of log-CPM expression.
    Pca {
        #[serde(default = "default_components")]
        n_components: usize,
    },
}

impl PipelineStep {
    /// Short name used for logging and output files.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStep::Summary { .. } => "summary",
            PipelineStep::DifferentialExpression { .. } => "de",
            PipelineStep::Diversity { .. } => "diversity",
            PipelineStep::Composition { .. } => "composition",
            PipelineStep::Correlation { .. } => "correlation",
            PipelineStep::Integration { .. } => "integration",
            PipelineStep::Pca { .. } => "pca",
        }
    }

    fn apply(&self, ctx: &OmicsContext) -> Result<StepOutput> {
        let output = match self {
            PipelineStep::Summary { group_column } => StepOutput::Summary(ctx.summary(group_column)?),
            PipelineStep::DifferentialExpression {
                group_column,
                group1,
                group2,
            } => StepOutput::DifferentialExpression(ctx.differential_expression(
                group_column,
                group1,
                group2,
            )?),
            PipelineStep::Diversity {
                rank,
                group_column,
                ordination,
            } => StepOutput::Diversity(ctx.diversity(rank, group_column, ordination)?),
            PipelineStep::Composition { rank, top_n } => {
                StepOutput::Composition(ctx.composition(rank, *top_n)?)
            }
            PipelineStep::Correlation { rank, config } => {
                StepOutput::Correlation(ctx.correlation(rank, config)?)
            }
            PipelineStep::Integration {
                rank,
                label_column,
                config,
            } => StepOutput::Integration(ctx.integration(rank, label_column, config)?),
            PipelineStep::Pca { n_components } => StepOutput::Pca(ctx.pca(*n_components)?),
        };
        Ok(output)
    }
}

/// Result of one pipeline step.
#[derive(Debug, Clone)]
pub enum StepOutput {
    Summary(DatasetSummary),
    DifferentialExpression(DeResultSet),
    Diversity(AnnotatedTable),
    Composition(SampleTable),
    Correlation(CorrelationMatrix),
    /// `None` when too few samples were shared.
    Integration(Option<AnnotatedTable>),
    Pca(PcaResult),
}

impl StepOutput {
    /// JSON rendering, one record per row where the output is tabular.
    pub fn to_json(&self) -> Result<Value> {
        let value = match self {
            StepOutput::Summary(summary) => serde_json::to_value(summary)?,
            StepOutput::DifferentialExpression(results) => serde_json::to_value(results)?,
            StepOutput::Diversity(table) => Value::Array(table.to_records()),
            StepOutput::Composition(table) => Value::Array(table.to_records()),
            StepOutput::Correlation(matrix) => matrix.to_heatmap(),
            StepOutput::Integration(Some(table)) => Value::Array(table.to_records()),
            StepOutput::Integration(None) => Value::Null,
            StepOutput::Pca(result) => json!({
                "scores": result.scores.to_records(),
                "explained_variance_ratio": result.explained_variance_ratio,
            }),
        };
        Ok(value)
    }

    /// Write the output next to `stem`, returning the files written.
    ///
    /// Tables go to `<stem>.tsv`; the summary goes to `<stem>.json`.
    pub fn write(&self, stem: &Path) -> Result<Vec<PathBuf>> {
        let tsv = stem.with_extension("tsv");
        match self {
            StepOutput::Summary(summary) => {
                let path = stem.with_extension("json");
                let writer = BufWriter::new(File::create(&path)?);
                serde_json::to_writer_pretty(writer, summary)?;
                return Ok(vec![path]);
            }
            StepOutput::DifferentialExpression(results) => results.to_tsv(&tsv)?,
            StepOutput::Diversity(table) => table.to_tsv(&tsv)?,
            StepOutput::Composition(table) => table.to_tsv(&tsv)?,
            StepOutput::Correlation(matrix) => {
                if matrix.is_empty() {
                    return Ok(Vec::new());
                }
                matrix.to_tsv(&tsv)?
            }
            StepOutput::Integration(Some(table)) => table.to_tsv(&tsv)?,
            StepOutput::Integration(None) => return Ok(Vec::new()),
            StepOutput::Pca(result) => result.scores.to_tsv(&tsv)?,
        }
        Ok(vec![tsv])
    }
}

/// Input files for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Sample metadata TSV.
    pub metadata: PathBuf,
    /// Expression count matrix TSV.
    pub counts: PathBuf,
    /// Long-form abundance CSV.
    pub abundance: PathBuf,
}

impl DataConfig {
    /// Load the three datasets.
    pub fn load(&self) -> Result<OmicsContext> {
        OmicsContext::load(&self.metadata, &self.counts, &self.abundance)
    }
}

/// Pipeline configuration for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Input files; may instead be supplied by the caller.
    #[serde(default)]
    pub data: Option<DataConfig>,
    /// Steps to execute.
    pub steps: Vec<PipelineStep>,
}

impl PipelineConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(OmicsError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(OmicsError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// A configuration exercising every step.
    pub fn example() -> Self {
        Pipeline::new()
            .name("severity-overview")
            .summary("Disease severity")
            .differential_expression("Disease severity", "severe", "mild")
            .diversity(DEFAULT_RANK, "Disease severity", OrdinationConfig::default())
            .composition(DEFAULT_RANK, DEFAULT_TOP_N)
            .correlation(DEFAULT_RANK, CorrelationConfig::default())
            .integration(DEFAULT_RANK, "Disease severity", IntegrationConfig::default())
            .pca(2)
            .to_config(
                Some("Expression and microbiome overview across severity groups"),
                Some(DataConfig {
                    metadata: PathBuf::from("data/metadata.tsv"),
                    counts: PathBuf::from("data/counts.tsv.gz"),
                    abundance: PathBuf::from("data/abundance.csv.gz"),
                }),
            )
    }

    /// Load the configured data and run every step.
    pub fn run(&self) -> Result<PipelineReport> {
        let data = self.data.as_ref().ok_or_else(|| {
            OmicsError::Pipeline(format!("Pipeline '{}' has no data section", self.name))
        })?;
        Pipeline::from_config(self).run(&data.load()?)
    }
}

/// Outputs of a pipeline run, in step order.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub name: String,
    pub outputs: Vec<(PipelineStep, StepOutput)>,
}

impl PipelineReport {
    /// Write every output into `dir` as `NN_<step>.{tsv,json}`.
    pub fn write_outputs<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for (i, (step, output)) in self.outputs.iter().enumerate() {
            let stem = dir.join(format!("{:02}_{}", i + 1, step.name()));
            let files = output.write(&stem)?;
            if files.is_empty() {
                log::warn!("Step {} ({}) produced no output", i + 1, step.name());
            }
            written.extend(files);
        }
        Ok(written)
    }

    /// All outputs as a JSON object keyed by `NN_<step>`.
    pub fn to_json(&self) -> Result<Value> {
        let mut map = serde_json::Map::new();
        for (i, (step, output)) in self.outputs.iter().enumerate() {
            map.insert(format!("{:02}_{}", i + 1, step.name()), output.to_json()?);
        }
        Ok(json!({ "name": self.name, "outputs": Value::Object(map) }))
    }
}

/// Builder for constructing and running analysis pipelines.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
    name: String,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
        }
    }

    /// Set the pipeline name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Append an already constructed step.
    pub fn step(mut self, step: PipelineStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Add a dataset summary.
    pub fn summary(mut self, group_column: &str) -> Self {
        self.steps.push(PipelineStep::Summary {
            group_column: group_column.to_string(),
        });
        self
    }

    /// Add differential expression of `group1` against `group2`.
    pub fn differential_expression(mut self, group_column: &str, group1: &str, group2: &str) -> Self {
        self.steps.push(PipelineStep::DifferentialExpression {
            group_column: group_column.to_string(),
            group1: group1.to_string(),
            group2: group2.to_string(),
        });
        self
    }

    /// Add a diversity report at `rank`.
    pub fn diversity(mut self, rank: &str, group_column: &str, ordination: OrdinationConfig) -> Self {
        self.steps.push(PipelineStep::Diversity {
            rank: rank.to_string(),
            group_column: group_column.to_string(),
            ordination,
        });
        self
    }

    /// Add a composition table of the `top_n` most abundant taxa.
    pub fn composition(mut self, rank: &str, top_n: usize) -> Self {
        self.steps.push(PipelineStep::Composition {
            rank: rank.to_string(),
            top_n,
        });
        self
    }

    /// Add a cross-omics correlation matrix.
    pub fn correlation(mut self, rank: &str, config: CorrelationConfig) -> Self {
        self.steps.push(PipelineStep::Correlation {
            rank: rank.to_string(),
            config,
        });
        self
    }

    /// Add PLS integration.
    pub fn integration(mut self, rank: &str, label_column: &str, config: IntegrationConfig) -> Self {
        self.steps.push(PipelineStep::Integration {
            rank: rank.to_string(),
            label_column: label_column.to_string(),
            config,
        });
        self
    }

    /// Add PCA of log-CPM expression.
    pub fn pca(mut self, n_components: usize) -> Self {
        self.steps.push(PipelineStep::Pca { n_components });
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>, data: Option<DataConfig>) -> PipelineConfig {
        PipelineConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            data,
            steps: self.steps.clone(),
        }
    }

    /// Run every step against `ctx`.
    ///
    /// Steps are independent; the first failure aborts the run.
    pub fn run(&self, ctx: &OmicsContext) -> Result<PipelineReport> {
        let mut outputs = Vec::with_capacity(self.steps.len());

        for (i, step) in self.steps.iter().enumerate() {
            log::info!("[{}] step {}/{}: {}", self.name, i + 1, self.steps.len(), step.name());
            let output = step.apply(ctx).map_err(|e| {
                OmicsError::Pipeline(format!("Step {} ({}) failed: {}", i + 1, step.name(), e))
            })?;
            outputs.push((step.clone(), output));
        }

        Ok(PipelineReport {
            name: self.name.clone(),
            outputs,
        })
    }
}
