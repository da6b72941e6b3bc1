//! Descriptive profiling: type inference and column statistics.

mod column;
mod profiler;
pub mod stats;
mod types;

pub use column::{ColumnProfile, DatasetProfile, NumericStatistics};
pub use profiler::Profiler;
pub use types::ColumnType;
