//! The scene generation workflow.
//!
//! One workflow run drives the script → visual → audio sequence for a
//! single scene, assembles the finished [`Scene`](artie_core::scene::Scene),
//! and reports stage transitions to an observer. Retry lives below this
//! layer (in the collaborator client); the session's submit gate above it
//! keeps at most one run in flight.

pub mod error;
pub mod workflow;

pub use error::PipelineError;
pub use workflow::{
    GenerationStage, GenerationWorkflow, MediaKind, MediaSink, StageObserver, StoryContext,
};
