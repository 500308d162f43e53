//! The release-processing pipeline.
//!
//! Per candidate the driver runs `fetch -> eligibility -> validate ->
//! process -> mark-seen`, with the seen set flushed after every candidate's
//! terminal transition. The processor fans out over missing formats with
//! per-format failure isolation.

mod candidates;
mod driver;
mod eligibility;
mod gaps;
mod processor;
mod types;
mod workdir;

pub use candidates::{gather_candidates, parse_reference};
pub use driver::{PipelineDriver, RunOptions};
pub use eligibility::{check_eligibility, Eligibility};
pub use gaps::missing_formats;
pub use processor::{release_basename, FormatProcessor};
pub use types::{Candidate, PipelineDeps, ProcessSummary, RunSummary};
pub use workdir::WorkDir;
