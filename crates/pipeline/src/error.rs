use artie_core::error::CoreError;

/// Message shown when a story extension is attempted without a reusable
/// visual handle on the story. Precondition, not a retryable failure: the
/// user has to regenerate the first scene before continuing.
pub const MISSING_CONTINUATION_MESSAGE: &str =
    "Cannot add a scene because the previous scene's video data is missing. \
     Please regenerate the first scene.";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Story context present but no continuation handle to extend from.
    /// Raised before any collaborator call.
    #[error("{MISSING_CONTINUATION_MESSAGE}")]
    MissingContinuation,

    /// A collaborator failed terminally; the message is surfaced verbatim.
    #[error("{0}")]
    Generation(String),

    /// Storing generated media failed.
    #[error("Failed to store generated media: {0}")]
    Media(String),

    /// Scene assembly violated a graph invariant (logic error).
    #[error(transparent)]
    Core(#[from] CoreError),
}
