//! Job records, their persistence, and progress reporting.

mod record;
mod sink;
mod store;

pub use record::{
    FileCorrections, FileIssues, FileReport, FileStatus, JobFile, JobRecord, JobReport, JobStatus,
};
pub use sink::{NoopSink, ProgressSink};
pub use store::{JobStore, read_record};
