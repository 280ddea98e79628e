// storefront-core/src/pipeline/mod.rs

//! Named-step async pipelines. Checkout and every payment flow are built on
//! these: each step is a small handler over a shared `ContextData<T>`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline, SkipCondition, StepDef};
