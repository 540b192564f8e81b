//! Pipeline composition and execution for cross-omics analyses.

mod runner;

pub use runner::{DataConfig, Pipeline, PipelineConfig, PipelineReport, PipelineStep, StepOutput};
