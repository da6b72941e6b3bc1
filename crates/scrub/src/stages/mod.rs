//! Cleansing stages and the contract they share with the pipeline.

mod changes;
mod duplicates;
mod missing;
mod outliers;
mod standardization;
mod validation;

pub use changes::{Metric, StageChanges};
pub use duplicates::{DuplicatesStage, similarity};
pub use missing::MissingDataStage;
pub use outliers::OutliersStage;
pub use standardization::StandardizationStage;
pub use validation::ValidationStage;

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;

/// Output of one stage: the transformed dataset and what changed.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub data: Dataset,
    pub changes: StageChanges,
}

impl StageResult {
    pub fn new(data: Dataset, changes: StageChanges) -> Self {
        Self { data, changes }
    }
}

/// A transformation step of the cleansing pipeline.
///
/// Stages take ownership of their input and never mutate the configuration.
pub trait Stage: Send + Sync {
    /// Human-readable name used in reports.
    fn name(&self) -> &'static str;

    /// Run the stage over a complete dataset.
    fn apply(&self, data: Dataset, config: &PipelineConfig) -> Result<StageResult>;
}
