//! Narrow contracts the studio core consumes.
//!
//! The workflow layer only ever sees these traits; whether they are backed
//! by the production client in [`crate::gemini`] or by fixtures in tests
//! is invisible to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use artie_core::brief::AdBrief;
use artie_core::scene::VisualHandle;

use crate::error::GenAiError;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// One brainstormed ad concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub headline: String,
    pub tagline: String,
    pub tone: String,
    pub visual_idea: String,
}

/// A randomly sparked product idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaSeed {
    pub product: String,
    pub visual_idea: String,
}

/// A generated still image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// A generated video clip plus the handle that lets a follow-up scene
/// extend it.
#[derive(Debug, Clone)]
pub struct GeneratedVideo {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub handle: VisualHandle,
}

/// A synthesized voiceover track.
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
}

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// Script and ideation generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the ordered script lines for one scene. `prior_script`
    /// carries the preceding scenes' lines when continuing a story.
    async fn generate_script(
        &self,
        brief: &AdBrief,
        prior_script: Option<&[String]>,
    ) -> Result<Vec<String>, GenAiError>;

    /// Brainstorm distinct ad concepts for a product.
    async fn brainstorm(
        &self,
        product: &str,
        notes: Option<&str>,
    ) -> Result<Vec<Concept>, GenAiError>;

    /// Spark a random product idea.
    async fn random_idea(&self) -> Result<IdeaSeed, GenAiError>;
}

/// Still-image and video generation.
#[async_trait]
pub trait VisualGenerator: Send + Sync {
    async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, GenAiError>;

    /// Generate a video clip. When `continuation` is present the generator
    /// extends that prior clip. Long-running generation is polled inside
    /// the implementation; callers only await the final outcome.
    async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: &str,
        continuation: Option<&VisualHandle>,
    ) -> Result<GeneratedVideo, GenAiError>;
}

/// Voiceover synthesis.
#[async_trait]
pub trait SpeechGenerator: Send + Sync {
    async fn generate_audio(&self, text: &str, voice: &str)
        -> Result<GeneratedAudio, GenAiError>;
}
