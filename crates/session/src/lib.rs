//! The top-level studio session.
//!
//! [`StudioSession`](controller::StudioSession) owns the scene store, the
//! working brief, the story context, the drag controller, and the submit
//! gate, and wires the generation workflow, the export pipeline, and the
//! durable history store together. Persistence is a side effect of store
//! mutation here, never interleaved into the business logic below.

pub mod controller;
pub mod error;
pub mod history;
pub mod vault;

pub use controller::StudioSession;
pub use error::SessionError;
