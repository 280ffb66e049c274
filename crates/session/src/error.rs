use artie_core::error::CoreError;
use artie_export::error::ExportError;
use artie_genai::error::GenAiError;
use artie_pipeline::error::PipelineError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The submit gate rejected an overlapping generation.
    #[error("A generation is already in progress.")]
    Busy,

    /// Video generation needs a selected API key; the user was prompted.
    #[error("Select an API key to generate videos, then try again.")]
    CredentialRequired,

    /// No scene is selected for a selection-scoped operation.
    #[error("No scene is selected.")]
    NoSelection,

    /// No overlay is active for an overlay-scoped operation.
    #[error("No overlay is selected.")]
    NoActiveOverlay,

    /// A generation run failed; the message passes through verbatim.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// An ideation call (brainstorm, idea spark) failed.
    #[error("{0}")]
    Collaborator(String),

    /// An export was aborted.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A graph or validation invariant was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Media vault I/O failed.
    #[error("Media storage failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<GenAiError> for SessionError {
    fn from(e: GenAiError) -> Self {
        Self::Collaborator(e.to_string())
    }
}
