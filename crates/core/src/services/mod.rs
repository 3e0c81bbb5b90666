//! Services that tie the analysis layers to a project on disk.

pub mod slicing;

pub use slicing::{run_pipeline, PipelineError, SliceOutcome, SliceRequest, SliceRunner};
