//! Fixed-order composition of the cleansing stages.

use tracing::{debug, info, info_span};

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::job::{NoopSink, ProgressSink};
use crate::profile::Profiler;
use crate::report::{CleansingReport, ReportBuilder};
use crate::stages::{
    DuplicatesStage, MissingDataStage, OutliersStage, Stage, StandardizationStage,
    ValidationStage,
};

/// Runs every stage, in order, over a dataset.
///
/// Standardization runs first so type-sensitive checks see normalized
/// text; validation drops rows before imputation and outlier statistics
/// are computed; duplicates are removed before outlier bounds are taken.
pub struct Pipeline {
    config: PipelineConfig,
    profiler: Profiler,
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Validate the configuration and assemble the stages.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            profiler: Profiler::new(),
            stages: vec![
                Box::new(StandardizationStage::new()),
                Box::new(ValidationStage::new()),
                Box::new(MissingDataStage::new()),
                Box::new(DuplicatesStage::new()),
                Box::new(OutliersStage::new()),
            ],
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run the pipeline to completion.
    pub fn run(&self, data: Dataset) -> Result<(Dataset, CleansingReport)> {
        self.run_with_progress(data, &NoopSink)
    }

    /// Run the pipeline, notifying `sink` around every stage.
    ///
    /// Any stage error aborts the run; no partial report is returned.
    pub fn run_with_progress(
        &self,
        data: Dataset,
        sink: &dyn ProgressSink,
    ) -> Result<(Dataset, CleansingReport)> {
        let span = info_span!("pipeline", rows = data.len(), columns = data.column_count());
        let _guard = span.enter();

        data.check_consistent()?;
        let mut report = ReportBuilder::new(&data, self.profiler.profile(&data));
        let total = self.stages.len();
        let mut data = data;

        for (index, stage) in self.stages.iter().enumerate() {
            sink.stage_started(stage.name(), index, total);

            let result = stage.apply(data, &self.config)?;
            result.data.check_consistent()?;
            data = result.data;

            debug!(stage = stage.name(), rows = data.len(), "Stage finished");
            let step = report.record(stage.name(), result.changes);
            sink.stage_completed(step, index, total);
        }

        let report = report.finish(&data, self.profiler.profile(&data));
        info!(
            rows_removed = report.final_summary.rows_removed,
            values_corrected = report.final_summary.values_corrected,
            "Pipeline finished"
        );
        Ok((data, report))
    }
}

/// Run the default stage sequence over `data` with `config`.
pub fn run(data: Dataset, config: &PipelineConfig) -> Result<(Dataset, CleansingReport)> {
    Pipeline::new(config.clone())?.run(data)
}
