//! Batch ingestion of the raw corpus into the record store, with
//! status reporting for the background job running it.

pub mod pipeline;
pub mod progress;

pub use pipeline::BatchIngestionPipeline;
pub use progress::{
    new_task_id, MemoryProgressSink, ProgressSink, TaskProgress, TaskStatus, TracingProgressSink,
};
