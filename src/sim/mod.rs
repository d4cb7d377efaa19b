//! Per-sample pipeline and batch execution.

pub mod batch;
pub mod buffers;
pub mod kernel;
pub mod native;
pub mod results;
pub mod sample;
pub mod survey;

pub use batch::{
    BatchOptions, BatchOrchestrator, BatchProgress, BatchSummary, CancelToken, SampleErrorPolicy,
};
pub use buffers::SampleBuffers;
pub use kernel::{FieldKernel, KernelFlags, KernelInput};
pub use native::NativeKernel;
pub use results::{ResultAggregator, SampleFailure, SampleResult};
pub use sample::{NpySampleLoader, SampleLoader};
pub use survey::{Survey, SurveyContext};
