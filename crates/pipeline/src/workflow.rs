//! Workflow state machine: script → visual → audio → scene assembly.
//!
//! Stages run strictly in sequence; the single `Failed` state absorbs a
//! failure at any point and is reported to the observer together with the
//! message that will be surfaced to the user.

use async_trait::async_trait;

use artie_core::brief::{AdBrief, VisualType};
use artie_core::overlay::auto_overlays;
use artie_core::scene::{MediaRef, Scene, StoryLink, VisualHandle};
use artie_genai::contract::{SpeechGenerator, TextGenerator, VisualGenerator};

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// States of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    Idle,
    Scripting,
    RenderingVisual,
    RenderingAudio,
    Complete,
    Failed,
}

impl GenerationStage {
    /// Human-visible progress message for this stage.
    pub fn message(self, visual_type: VisualType, continuing_story: bool) -> &'static str {
        match self {
            Self::Scripting if continuing_story => "Generating next scene script...",
            Self::Scripting => "Generating script...",
            Self::RenderingVisual => match visual_type {
                VisualType::Image => "Generating image...",
                VisualType::Video => "Generating video (this may take a minute)...",
            },
            Self::RenderingAudio => "Generating voiceover...",
            Self::Idle | Self::Complete | Self::Failed => "",
        }
    }
}

/// Receives stage transitions as they happen. The second argument is the
/// progress message for entered stages, or the failure message for
/// [`GenerationStage::Failed`].
pub type StageObserver<'a> = dyn FnMut(GenerationStage, &str) + Send + 'a;

// ---------------------------------------------------------------------------
// Story context
// ---------------------------------------------------------------------------

/// Continuation input when adding a scene to an existing story.
///
/// Prepared by the session controller from the scene store at submit time:
/// the prior script is the story's lines in scene order, and the
/// continuation handle comes from the story's latest scene.
#[derive(Debug, Clone)]
pub struct StoryContext {
    pub root_id: String,
    pub next_scene_number: u32,
    pub prior_script: Vec<String>,
    pub continuation: Option<VisualHandle>,
}

// ---------------------------------------------------------------------------
// Media sink
// ---------------------------------------------------------------------------

/// What a stored blob is, for naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Visual,
    Audio,
}

impl MediaKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Audio => "audio",
        }
    }
}

/// Destination for generated media bytes; implemented by the session's
/// media vault.
#[async_trait]
pub trait MediaSink: Send + Sync {
    async fn store_media(
        &self,
        scene_id: &str,
        kind: MediaKind,
        bytes: &[u8],
        mime: &str,
    ) -> Result<MediaRef, PipelineError>;
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Drives one generation run against the collaborator contracts.
pub struct GenerationWorkflow<'a> {
    text: &'a dyn TextGenerator,
    visual: &'a dyn VisualGenerator,
    speech: &'a dyn SpeechGenerator,
    media: &'a dyn MediaSink,
}

impl<'a> GenerationWorkflow<'a> {
    pub fn new(
        text: &'a dyn TextGenerator,
        visual: &'a dyn VisualGenerator,
        speech: &'a dyn SpeechGenerator,
        media: &'a dyn MediaSink,
    ) -> Self {
        Self {
            text,
            visual,
            speech,
            media,
        }
    }

    /// Run the full sequence and assemble the finished scene.
    ///
    /// On failure the observer sees [`GenerationStage::Failed`] with the
    /// message that is also returned in the error; collaborator failure
    /// messages pass through verbatim.
    pub async fn run(
        &self,
        brief: &AdBrief,
        story: Option<&StoryContext>,
        observer: &mut StageObserver<'_>,
    ) -> Result<Scene, PipelineError> {
        match self.run_inner(brief, story, observer).await {
            Ok(scene) => {
                observer(GenerationStage::Complete, "");
                Ok(scene)
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(error = %message, "Generation run failed");
                observer(GenerationStage::Failed, &message);
                Err(e)
            }
        }
    }

    async fn run_inner(
        &self,
        brief: &AdBrief,
        story: Option<&StoryContext>,
        observer: &mut StageObserver<'_>,
    ) -> Result<Scene, PipelineError> {
        let continuing = story.is_some();

        // Precondition: a story can only be extended from a scene that left
        // a reusable visual handle behind. Checked before any collaborator
        // call is made.
        if let Some(context) = story {
            if context.continuation.is_none() {
                return Err(PipelineError::MissingContinuation);
            }
        }

        // Stage 1: script.
        observer(
            GenerationStage::Scripting,
            GenerationStage::Scripting.message(brief.visual_type, continuing),
        );
        let prior = story.map(|c| c.prior_script.as_slice());
        let script = self
            .text
            .generate_script(brief, prior)
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;
        tracing::info!(lines = script.len(), product = %brief.product, "Script ready");

        // Stage 2: visual.
        observer(
            GenerationStage::RenderingVisual,
            GenerationStage::RenderingVisual.message(brief.visual_type, continuing),
        );
        let scene_id = Scene::new_id();
        let prompt = brief.visual_idea.as_deref().unwrap_or_default();

        let (visual_ref, continuation) = match brief.visual_type {
            VisualType::Image => {
                let image = self
                    .visual
                    .generate_image(prompt, &brief.aspect_ratio)
                    .await
                    .map_err(|e| PipelineError::Generation(e.to_string()))?;
                let media_ref = self
                    .media
                    .store_media(&scene_id, MediaKind::Visual, &image.bytes, &image.mime)
                    .await?;
                (media_ref, None)
            }
            VisualType::Video => {
                let handle = story.and_then(|c| c.continuation.as_ref());
                let video = self
                    .visual
                    .generate_video(prompt, &brief.aspect_ratio, handle)
                    .await
                    .map_err(|e| PipelineError::Generation(e.to_string()))?;
                let media_ref = self
                    .media
                    .store_media(&scene_id, MediaKind::Visual, &video.bytes, &video.mime)
                    .await?;
                (media_ref, Some(video.handle))
            }
        };

        // Stage 3: audio, only for a voiced video with a non-empty script.
        let audio_ref = if brief.visual_type == VisualType::Video
            && brief.voice.is_some()
            && !script.is_empty()
        {
            observer(
                GenerationStage::RenderingAudio,
                GenerationStage::RenderingAudio.message(brief.visual_type, continuing),
            );
            let voice = brief.voice.as_deref().unwrap_or_default();
            let audio = self
                .speech
                .generate_audio(&script.join(" "), voice)
                .await
                .map_err(|e| PipelineError::Generation(e.to_string()))?;
            let media_ref = self
                .media
                .store_media(&scene_id, MediaKind::Audio, &audio.bytes, &audio.mime)
                .await?;
            Some(media_ref)
        } else {
            None
        };

        // Assembly.
        let link = match story {
            Some(context) => StoryLink::child(context.root_id.clone(), context.next_scene_number)?,
            None => StoryLink::Root,
        };
        let mut scene = Scene::from_brief(
            scene_id,
            chrono::Utc::now(),
            brief,
            script.clone(),
            link,
        );
        scene.visual = Some(visual_ref);
        scene.continuation = continuation;
        scene.audio = audio_ref;
        scene.text_overlays = auto_overlays(&script);

        tracing::info!(scene_id = %scene.id, scene_number = scene.scene_number(), "Scene assembled");
        Ok(scene)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use artie_genai::contract::{
        Concept, GeneratedAudio, GeneratedImage, GeneratedVideo, IdeaSeed,
    };
    use artie_genai::error::GenAiError;

    // ---- fixtures ----

    #[derive(Default)]
    struct FakeText {
        calls: AtomicUsize,
        fail_with: Option<String>,
        prior_seen: Mutex<Option<Vec<String>>>,
    }

    #[async_trait]
    impl TextGenerator for FakeText {
        async fn generate_script(
            &self,
            _brief: &AdBrief,
            prior: Option<&[String]>,
        ) -> Result<Vec<String>, GenAiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.prior_seen.lock().unwrap() = prior.map(|p| p.to_vec());
            if let Some(message) = &self.fail_with {
                return Err(GenAiError::Empty(message.clone()));
            }
            Ok(vec!["Taste the stars.".to_string(), "Tonight.".to_string()])
        }

        async fn brainstorm(
            &self,
            _product: &str,
            _notes: Option<&str>,
        ) -> Result<Vec<Concept>, GenAiError> {
            unimplemented!("not exercised by the workflow")
        }

        async fn random_idea(&self) -> Result<IdeaSeed, GenAiError> {
            unimplemented!("not exercised by the workflow")
        }
    }

    #[derive(Default)]
    struct FakeVisual {
        calls: AtomicUsize,
        continuation_seen: Mutex<Option<Option<VisualHandle>>>,
    }

    #[async_trait]
    impl VisualGenerator for FakeVisual {
        async fn generate_image(
            &self,
            _prompt: &str,
            _aspect_ratio: &str,
        ) -> Result<GeneratedImage, GenAiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeneratedImage {
                bytes: vec![1, 2, 3],
                mime: "image/jpeg".to_string(),
            })
        }

        async fn generate_video(
            &self,
            _prompt: &str,
            aspect_ratio: &str,
            continuation: Option<&VisualHandle>,
        ) -> Result<GeneratedVideo, GenAiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.continuation_seen.lock().unwrap() = Some(continuation.cloned());
            Ok(GeneratedVideo {
                bytes: vec![4, 5, 6],
                mime: "video/mp4".to_string(),
                handle: VisualHandle {
                    uri: "https://example/video/next".to_string(),
                    aspect_ratio: aspect_ratio.to_string(),
                },
            })
        }
    }

    #[derive(Default)]
    struct FakeSpeech {
        calls: AtomicUsize,
        text_seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl SpeechGenerator for FakeSpeech {
        async fn generate_audio(
            &self,
            text: &str,
            _voice: &str,
        ) -> Result<GeneratedAudio, GenAiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.text_seen.lock().unwrap() = Some(text.to_string());
            Ok(GeneratedAudio {
                bytes: vec![7, 8, 9],
                mime: "audio/wav".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct FakeSink;

    #[async_trait]
    impl MediaSink for FakeSink {
        async fn store_media(
            &self,
            scene_id: &str,
            kind: MediaKind,
            _bytes: &[u8],
            mime: &str,
        ) -> Result<MediaRef, PipelineError> {
            Ok(MediaRef {
                rel_path: format!("{scene_id}_{}", kind.name()),
                mime: mime.to_string(),
            })
        }
    }

    fn video_brief() -> AdBrief {
        AdBrief::default()
    }

    fn image_brief() -> AdBrief {
        let mut brief = AdBrief::default();
        brief.visual_type = VisualType::Image;
        brief
    }

    fn story_context(continuation: Option<VisualHandle>) -> StoryContext {
        StoryContext {
            root_id: "scene_root".to_string(),
            next_scene_number: 2,
            prior_script: vec!["Earlier line.".to_string()],
            continuation,
        }
    }

    fn handle() -> VisualHandle {
        VisualHandle {
            uri: "https://example/video/root".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }

    async fn run_collecting(
        workflow: &GenerationWorkflow<'_>,
        brief: &AdBrief,
        story: Option<&StoryContext>,
    ) -> (Result<Scene, PipelineError>, Vec<GenerationStage>) {
        let mut stages = Vec::new();
        let result = workflow
            .run(brief, story, &mut |stage, _msg| stages.push(stage))
            .await;
        (result, stages)
    }

    // ---- tests ----

    #[tokio::test]
    async fn video_run_walks_all_stages_in_order() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, stages) = run_collecting(&workflow, &video_brief(), None).await;

        assert!(result.is_ok());
        assert_eq!(
            stages,
            vec![
                GenerationStage::Scripting,
                GenerationStage::RenderingVisual,
                GenerationStage::RenderingAudio,
                GenerationStage::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn image_run_skips_audio() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, stages) = run_collecting(&workflow, &image_brief(), None).await;

        let scene = result.unwrap();
        assert!(scene.audio.is_none());
        assert!(scene.continuation.is_none());
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
        assert!(!stages.contains(&GenerationStage::RenderingAudio));
    }

    #[tokio::test]
    async fn video_without_voice_skips_audio() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let mut brief = video_brief();
        brief.voice = None;
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, _) = run_collecting(&workflow, &brief, None).await;

        assert!(result.unwrap().audio.is_none());
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn audio_input_is_script_joined_by_spaces() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, _) = run_collecting(&workflow, &video_brief(), None).await;

        assert!(result.is_ok());
        assert_eq!(
            speech.text_seen.lock().unwrap().as_deref(),
            Some("Taste the stars. Tonight.")
        );
    }

    #[tokio::test]
    async fn missing_continuation_fails_before_any_call() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let context = story_context(None);
        let (result, stages) = run_collecting(&workflow, &video_brief(), Some(&context)).await;

        assert_matches!(result, Err(PipelineError::MissingContinuation));
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
        assert_eq!(visual.calls.load(Ordering::SeqCst), 0);
        assert_eq!(stages, vec![GenerationStage::Failed]);
    }

    #[tokio::test]
    async fn missing_continuation_message_is_distinct() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let context = story_context(None);
        let (result, _) = run_collecting(&workflow, &video_brief(), Some(&context)).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("regenerate the first scene"));
    }

    #[tokio::test]
    async fn story_run_passes_prior_script_and_continuation() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let context = story_context(Some(handle()));
        let (result, _) = run_collecting(&workflow, &video_brief(), Some(&context)).await;

        let scene = result.unwrap();
        assert_eq!(scene.parent_id(), Some("scene_root"));
        assert_eq!(scene.scene_number(), 2);
        assert_eq!(
            text.prior_seen.lock().unwrap().as_deref(),
            Some(["Earlier line.".to_string()].as_slice())
        );
        let seen = visual.continuation_seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.unwrap().uri, "https://example/video/root");
    }

    #[tokio::test]
    async fn fresh_run_builds_root_scene_with_auto_overlays() {
        let (text, visual, speech, sink) = (
            FakeText::default(),
            FakeVisual::default(),
            FakeSpeech::default(),
            FakeSink,
        );
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, _) = run_collecting(&workflow, &video_brief(), None).await;

        let scene = result.unwrap();
        assert!(scene.is_root());
        assert_eq!(scene.scene_number(), 1);
        assert_eq!(scene.text_overlays.len(), 2);
        assert_eq!(scene.text_overlays[0].position.y, 75.0);
        assert_eq!(scene.text_overlays[1].position.y, 85.0);
        assert_eq!(scene.continuation.as_ref().unwrap().uri, "https://example/video/next");
        assert!(scene.visual.is_some());
        assert!(scene.audio.is_some());
    }

    #[tokio::test]
    async fn collaborator_failure_is_surfaced_verbatim() {
        let text = FakeText {
            fail_with: Some("Requested entity was not found.".to_string()),
            ..Default::default()
        };
        let (visual, speech, sink) = (FakeVisual::default(), FakeSpeech::default(), FakeSink);
        let workflow = GenerationWorkflow::new(&text, &visual, &speech, &sink);
        let (result, stages) = run_collecting(&workflow, &video_brief(), None).await;

        let message = result.unwrap_err().to_string();
        assert_eq!(message, "Requested entity was not found.");
        assert_eq!(stages.last(), Some(&GenerationStage::Failed));
        // Later stages never ran.
        assert_eq!(visual.calls.load(Ordering::SeqCst), 0);
        assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stage_messages() {
        assert_eq!(
            GenerationStage::Scripting.message(VisualType::Video, false),
            "Generating script..."
        );
        assert_eq!(
            GenerationStage::Scripting.message(VisualType::Video, true),
            "Generating next scene script..."
        );
        assert_eq!(
            GenerationStage::RenderingVisual.message(VisualType::Image, false),
            "Generating image..."
        );
        assert_eq!(
            GenerationStage::RenderingVisual.message(VisualType::Video, false),
            "Generating video (this may take a minute)..."
        );
        assert_eq!(
            GenerationStage::RenderingAudio.message(VisualType::Video, false),
            "Generating voiceover..."
        );
    }
}
