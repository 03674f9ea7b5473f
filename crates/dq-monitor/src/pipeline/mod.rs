//! Orchestration of a single monitoring run.
//!
//! [`Pipeline::run`] executes load -> detect -> summarize sequentially and
//! reports each stage through an optional [`ProgressReporter`]. There is no
//! cancellation: a started run either completes or fails.

mod progress;
mod runner;

pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
pub use runner::{Pipeline, PipelineBuilder};
