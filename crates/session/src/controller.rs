//! The studio session controller.
//!
//! One [`StudioSession`] is the single owner of all mutable studio state:
//! the scene store, the working brief, the pending story context, the
//! drag controller, and the active overlay selection. Every mutation runs
//! on the owner's task through `&mut self`, so derived views never observe
//! a half-updated collection; the durable history is rewritten after each
//! mutation as a side effect.

use std::path::Path;
use std::sync::Arc;

use artie_core::brief::{validate_font, AdBrief, VisualType};
use artie_core::color::parse_hex_color;
use artie_core::drag::{DragController, PointPx, SizePx};
use artie_core::error::CoreError;
use artie_core::graph::SceneStore;
use artie_core::overlay::{LogoOverlay, OverlayKind, TextOverlay};
use artie_core::scene::Scene;
use artie_export::bundle::{
    bundle_single_video, bundle_story, single_zip_name, story_zip_name, safe_file_stem,
    SceneBundleItem,
};
use artie_export::compose::ImageComposer;
use artie_export::text::{FontLibrary, TextRasterizer};
use artie_genai::contract::{Concept, SpeechGenerator, TextGenerator, VisualGenerator};
use artie_genai::key::{is_entity_not_found, CredentialGate};
use artie_pipeline::workflow::{GenerationStage, GenerationWorkflow, StoryContext};

use crate::error::SessionError;
use crate::history::{HistoryStore, JsonHistoryStore};
use crate::vault::{ext_for_mime, MediaVault};

/// Story extension armed by "add next scene", consumed by the next submit.
#[derive(Debug, Clone)]
struct PendingStory {
    root_id: String,
    next_scene_number: u32,
}

/// The top-level session controller.
pub struct StudioSession {
    store: SceneStore,
    brief: AdBrief,
    pending_story: Option<PendingStory>,
    stage: GenerationStage,
    busy: bool,

    drag: DragController,
    active_overlay: Option<(OverlayKind, String)>,

    history: Box<dyn HistoryStore>,
    vault: MediaVault,
    composer: ImageComposer,

    text_gen: Arc<dyn TextGenerator>,
    visual_gen: Arc<dyn VisualGenerator>,
    speech_gen: Arc<dyn SpeechGenerator>,
    credentials: Arc<dyn CredentialGate>,
}

impl StudioSession {
    /// Open a session over `data_dir`, loading any stored history.
    pub async fn new(
        data_dir: &Path,
        fonts: FontLibrary,
        text_gen: Arc<dyn TextGenerator>,
        visual_gen: Arc<dyn VisualGenerator>,
        speech_gen: Arc<dyn SpeechGenerator>,
        credentials: Arc<dyn CredentialGate>,
    ) -> Self {
        let history: Box<dyn HistoryStore> = Box::new(JsonHistoryStore::new(data_dir));
        let mut store = SceneStore::new();
        store.replace_all(history.load_all().await);

        Self {
            store,
            brief: AdBrief::default(),
            pending_story: None,
            stage: GenerationStage::Idle,
            busy: false,
            drag: DragController::new(),
            active_overlay: None,
            history,
            vault: MediaVault::new(data_dir),
            composer: ImageComposer::new(TextRasterizer::new(fonts)),
            text_gen,
            visual_gen,
            speech_gen,
            credentials,
        }
    }

    // -- reads ---------------------------------------------------------------

    pub fn brief(&self) -> &AdBrief {
        &self.brief
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn stage(&self) -> GenerationStage {
        self.stage
    }

    /// Armed story context, as `(root id, next scene number)`.
    pub fn pending_story(&self) -> Option<(&str, u32)> {
        self.pending_story
            .as_ref()
            .map(|p| (p.root_id.as_str(), p.next_scene_number))
    }

    pub fn history_scenes(&self) -> Vec<&Scene> {
        self.store.history()
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.store.get(id)
    }

    pub fn selected_scene(&self) -> Option<&Scene> {
        self.store.selected()
    }

    pub fn derive_story(&self, id: &str) -> Result<Vec<&Scene>, SessionError> {
        Ok(self.store.derive_story(id)?)
    }

    pub fn active_overlay(&self) -> Option<(OverlayKind, &str)> {
        self.active_overlay
            .as_ref()
            .map(|(kind, id)| (*kind, id.as_str()))
    }

    // -- brief editing -------------------------------------------------------

    pub fn set_brief(&mut self, brief: AdBrief) -> Result<(), SessionError> {
        brief.validate()?;
        self.brief = brief;
        Ok(())
    }

    /// "Ask Artie": merge a sparked idea into the working brief.
    pub async fn spark_idea(&mut self) -> Result<(), SessionError> {
        let idea = self.text_gen.random_idea().await?;
        self.brief.product = idea.product;
        self.brief.visual_idea = Some(idea.visual_idea);
        Ok(())
    }

    /// Randomize the brief's style fields, then spark an idea to match.
    pub async fn randomize_brief(&mut self) -> Result<(), SessionError> {
        self.brief.randomize_style();
        self.spark_idea().await
    }

    /// Brainstorm concepts for the current product.
    pub async fn brainstorm(&self) -> Result<Vec<Concept>, SessionError> {
        Ok(self
            .text_gen
            .brainstorm(&self.brief.product, self.brief.notes.as_deref())
            .await?)
    }

    /// Apply a brainstormed concept's tone and visual idea to the brief.
    pub fn apply_concept(&mut self, concept: &Concept) -> Result<(), SessionError> {
        artie_core::brief::validate_tone(&concept.tone)?;
        self.brief.tone = concept.tone.clone();
        self.brief.visual_idea = Some(concept.visual_idea.clone());
        Ok(())
    }

    // -- story context -------------------------------------------------------

    /// Arm story continuation for the story `scene_id` belongs to. The
    /// brief resets to the root's style with a blank idea for the new
    /// scene.
    pub fn begin_add_scene(&mut self, scene_id: &str) -> Result<(), SessionError> {
        let (root_id, brief) = {
            let story = self.store.derive_story(scene_id)?;
            let root = story[0];
            (
                root.id.clone(),
                AdBrief {
                    product: root.product.clone(),
                    era: root.era.clone(),
                    tone: root.tone.clone(),
                    aspect_ratio: root.aspect_ratio.clone(),
                    visual_type: root.visual_type,
                    voice: root.voice.clone(),
                    visual_idea: None,
                    notes: None,
                },
            )
        };
        let next_scene_number = self.store.next_scene_number(&root_id);
        self.brief = brief;
        self.pending_story = Some(PendingStory {
            root_id,
            next_scene_number,
        });
        Ok(())
    }

    /// Disarm story continuation and restore the brief from the selection.
    pub fn cancel_add_scene(&mut self) {
        self.pending_story = None;
        self.brief = match self.store.selected() {
            Some(scene) => brief_from_scene(scene),
            None => AdBrief::default(),
        };
    }

    // -- generation ----------------------------------------------------------

    /// Run the generation workflow for the current brief and commit the
    /// resulting scene. Returns the new scene's id.
    ///
    /// At most one run is in flight; an overlapping submit is rejected at
    /// this gate. Video briefs require a selected credential — if none is,
    /// the user is prompted and the submit is not started.
    pub async fn submit(&mut self) -> Result<String, SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        if self.brief.visual_type == VisualType::Video && !self.credentials.is_key_selected().await
        {
            self.credentials.prompt_select().await.map_err(SessionError::from)?;
            return Err(SessionError::CredentialRequired);
        }
        self.brief.validate()?;

        self.busy = true;
        let result = self.run_generation().await;
        self.busy = false;

        match result {
            Ok(scene) => {
                let id = scene.id.clone();
                self.store.append(scene)?;
                self.pending_story = None;
                self.active_overlay = None;
                self.persist().await;
                tracing::info!(scene_id = %id, "Scene committed");
                Ok(id)
            }
            Err(e) => {
                let message = e.to_string();
                if is_entity_not_found(&message) {
                    tracing::warn!("Authorization failure; invalidating cached credential state");
                    self.credentials.invalidate().await;
                }
                Err(e)
            }
        }
    }

    async fn run_generation(&mut self) -> Result<Scene, SessionError> {
        let story = match &self.pending_story {
            Some(pending) => Some(self.build_story_context(pending)?),
            None => None,
        };

        let workflow = GenerationWorkflow::new(
            self.text_gen.as_ref(),
            self.visual_gen.as_ref(),
            self.speech_gen.as_ref(),
            &self.vault,
        );

        let mut last_stage = GenerationStage::Idle;
        let result = workflow
            .run(&self.brief, story.as_ref(), &mut |stage, message| {
                last_stage = stage;
                tracing::info!(?stage, message, "Generation stage");
            })
            .await;
        self.stage = last_stage;
        Ok(result?)
    }

    /// Collect continuity input for the armed story: all prior script
    /// lines in scene order, and the latest scene's continuation handle.
    fn build_story_context(&self, pending: &PendingStory) -> Result<StoryContext, SessionError> {
        let story = self.store.derive_story(&pending.root_id)?;
        let prior_script: Vec<String> = story
            .iter()
            .flat_map(|scene| scene.script.iter().cloned())
            .collect();
        let continuation = story
            .last()
            .and_then(|scene| scene.continuation.clone());
        Ok(StoryContext {
            root_id: pending.root_id.clone(),
            next_scene_number: pending.next_scene_number,
            prior_script,
            continuation,
        })
    }

    // -- selection and deletion ----------------------------------------------

    pub fn select_scene(&mut self, id: &str) -> Result<(), SessionError> {
        self.store.select(id)?;
        self.active_overlay = None;
        self.drag.end_drag();
        Ok(())
    }

    /// Delete a scene (cascading to children for roots) and persist.
    pub async fn delete_scene(&mut self, id: &str) {
        self.store.delete(id);
        self.active_overlay = None;
        self.drag.end_drag();
        self.persist().await;
    }

    // -- overlay selection and editing ---------------------------------------

    /// Make an overlay active. Selecting one kind deselects the other.
    pub fn select_overlay(&mut self, kind: OverlayKind, id: &str) -> Result<(), SessionError> {
        let scene = self.store.selected().ok_or(SessionError::NoSelection)?;
        let exists = match kind {
            OverlayKind::Text => scene.text_overlays.iter().any(|o| o.id == id),
            OverlayKind::Logo => scene.logo.as_ref().is_some_and(|l| l.id == id),
        };
        if !exists {
            return Err(SessionError::Core(CoreError::NotFound {
                entity: "overlay",
                id: id.to_string(),
            }));
        }
        self.active_overlay = Some((kind, id.to_string()));
        Ok(())
    }

    pub fn clear_overlay_selection(&mut self) {
        self.active_overlay = None;
    }

    pub async fn set_overlay_text(&mut self, text: String) -> Result<(), SessionError> {
        self.edit_active_text(|overlay| overlay.text = text)?;
        self.persist().await;
        Ok(())
    }

    pub async fn set_overlay_font(&mut self, font: String) -> Result<(), SessionError> {
        validate_font(&font)?;
        self.edit_active_text(|overlay| overlay.font = font)?;
        self.persist().await;
        Ok(())
    }

    pub async fn set_overlay_color(&mut self, color: String) -> Result<(), SessionError> {
        parse_hex_color(&color)?;
        self.edit_active_text(|overlay| overlay.color = color)?;
        self.persist().await;
        Ok(())
    }

    pub async fn set_overlay_size(&mut self, size: f64) -> Result<(), SessionError> {
        validate_positive("size", size)?;
        self.edit_active_text(|overlay| overlay.size = size)?;
        self.persist().await;
        Ok(())
    }

    pub async fn set_overlay_width(&mut self, width: f64) -> Result<(), SessionError> {
        validate_positive("width", width)?;
        self.edit_active_text(|overlay| overlay.width = width)?;
        self.persist().await;
        Ok(())
    }

    /// Snap the active text overlay's horizontal anchor to 50%.
    pub async fn align_center(&mut self) -> Result<(), SessionError> {
        self.edit_active_text(|overlay| overlay.align_center())?;
        self.persist().await;
        Ok(())
    }

    /// Attach a logo to the selected scene and make it active.
    pub async fn add_logo(&mut self, bytes: &[u8], mime: &str) -> Result<(), SessionError> {
        let scene_id = self.selected_scene_id()?;
        let file_name = format!("{scene_id}_logo.{}", ext_for_mime(mime));
        let media = self.vault.store_blob(&file_name, bytes, mime).await?;
        let logo = LogoOverlay::centered(media);
        let logo_id = logo.id.clone();
        self.store.set_logo(&scene_id, Some(logo))?;
        self.active_overlay = Some((OverlayKind::Logo, logo_id));
        self.persist().await;
        Ok(())
    }

    pub async fn resize_logo(&mut self, size: f64) -> Result<(), SessionError> {
        validate_positive("logo size", size)?;
        let scene_id = self.selected_scene_id()?;
        let mut logo = self
            .store
            .get(&scene_id)
            .and_then(|s| s.logo.clone())
            .ok_or(SessionError::NoActiveOverlay)?;
        logo.size = size;
        self.store.set_logo(&scene_id, Some(logo))?;
        self.persist().await;
        Ok(())
    }

    pub async fn remove_logo(&mut self) -> Result<(), SessionError> {
        let scene_id = self.selected_scene_id()?;
        self.store.set_logo(&scene_id, None)?;
        if matches!(self.active_overlay, Some((OverlayKind::Logo, _))) {
            self.active_overlay = None;
        }
        self.persist().await;
        Ok(())
    }

    // -- dragging ------------------------------------------------------------

    /// Pointer-down on an overlay: select it and grab it.
    pub fn begin_overlay_drag(
        &mut self,
        kind: OverlayKind,
        id: &str,
        pointer: PointPx,
        overlay_top_left: PointPx,
    ) -> Result<(), SessionError> {
        self.select_overlay(kind, id)?;
        self.drag.begin_drag(kind, id, pointer, overlay_top_left)?;
        Ok(())
    }

    /// Pointer-move: update the dragged overlay's anchor in place.
    pub fn move_overlay_drag(
        &mut self,
        pointer: PointPx,
        container: SizePx,
        overlay: SizePx,
    ) -> Result<(), SessionError> {
        let Some((kind, id, position)) = self.drag.update_drag(pointer, container, overlay) else {
            return Ok(());
        };
        let scene_id = self.selected_scene_id()?;
        match kind {
            OverlayKind::Text => {
                let mut overlays = self
                    .store
                    .get(&scene_id)
                    .ok_or(SessionError::NoSelection)?
                    .text_overlays
                    .clone();
                if let Some(target) = overlays.iter_mut().find(|o| o.id == id) {
                    target.position = position;
                }
                self.store.set_text_overlays(&scene_id, overlays)?;
            }
            OverlayKind::Logo => {
                if let Some(mut logo) = self.store.get(&scene_id).and_then(|s| s.logo.clone()) {
                    logo.position = position;
                    self.store.set_logo(&scene_id, Some(logo))?;
                }
            }
        }
        Ok(())
    }

    /// Pointer-up anywhere: release the drag and persist the final spot.
    pub async fn end_overlay_drag(&mut self) {
        self.drag.end_drag();
        self.persist().await;
    }

    // -- exports -------------------------------------------------------------

    /// Composite a scene into a downloadable JPEG.
    pub async fn export_scene_image(
        &self,
        scene_id: &str,
    ) -> Result<(String, Vec<u8>), SessionError> {
        let scene = self.require_scene(scene_id)?;
        let visual = scene.visual.as_ref().ok_or(SessionError::Export(
            artie_export::ExportError::MissingVisual,
        ))?;
        let visual_bytes = self.vault.read(visual).await?;

        let logo_bytes = match &scene.logo {
            Some(logo) => Some(self.vault.read(&logo.image).await?),
            None => None,
        };
        let logo = scene
            .logo
            .as_ref()
            .zip(logo_bytes.as_deref());

        let jpeg = self.composer.compose_scene_image(
            &visual_bytes,
            &scene.aspect_ratio,
            &scene.text_overlays,
            logo,
        )?;
        Ok((format!("{}.jpg", safe_file_stem(&scene.product)), jpeg))
    }

    /// Bundle a video scene's raw media into a zip.
    pub async fn export_scene_video(
        &self,
        scene_id: &str,
    ) -> Result<(String, Vec<u8>), SessionError> {
        let scene = self.require_scene(scene_id)?;
        let visual = scene.visual.as_ref().ok_or(SessionError::Export(
            artie_export::ExportError::MissingVisual,
        ))?;
        let visual_bytes = self.vault.read(visual).await?;
        let audio_bytes = match &scene.audio {
            Some(audio) => Some(self.vault.read(audio).await?),
            None => None,
        };

        let bytes = bundle_single_video(&scene.product, &visual_bytes, audio_bytes.as_deref())?;
        Ok((single_zip_name(&scene.product), bytes))
    }

    /// Bundle the whole story a scene belongs to, reporting progress as a
    /// percentage of files processed.
    pub async fn export_story(
        &self,
        scene_id: &str,
        progress: &mut dyn FnMut(f64),
    ) -> Result<(String, Vec<u8>), SessionError> {
        let story = self.store.derive_story(scene_id)?;
        let product = story[0].product.clone();

        let mut items = Vec::with_capacity(story.len());
        for scene in &story {
            let visual = match &scene.visual {
                Some(media) => Some((self.vault.read(media).await?, scene.visual_type)),
                None => None,
            };
            let audio = match &scene.audio {
                Some(media) => Some(self.vault.read(media).await?),
                None => None,
            };
            items.push(SceneBundleItem { visual, audio });
        }

        let bytes = bundle_story(&product, &items, progress).await?;
        Ok((story_zip_name(&product), bytes))
    }

    // -- internals -----------------------------------------------------------

    async fn persist(&self) {
        self.history.save_all(self.store.scenes()).await;
    }

    fn selected_scene_id(&self) -> Result<String, SessionError> {
        self.store
            .selected_id()
            .map(str::to_string)
            .ok_or(SessionError::NoSelection)
    }

    fn require_scene(&self, id: &str) -> Result<&Scene, SessionError> {
        self.store.get(id).ok_or_else(|| {
            SessionError::Core(CoreError::NotFound {
                entity: "scene",
                id: id.to_string(),
            })
        })
    }

    fn edit_active_text(
        &mut self,
        edit: impl FnOnce(&mut TextOverlay),
    ) -> Result<(), SessionError> {
        let scene_id = self.selected_scene_id()?;
        let overlay_id = match &self.active_overlay {
            Some((OverlayKind::Text, id)) => id.clone(),
            _ => return Err(SessionError::NoActiveOverlay),
        };
        let mut overlays = self
            .store
            .get(&scene_id)
            .ok_or(SessionError::NoSelection)?
            .text_overlays
            .clone();
        let overlay = overlays
            .iter_mut()
            .find(|o| o.id == overlay_id)
            .ok_or(SessionError::NoActiveOverlay)?;
        edit(overlay);
        self.store.set_text_overlays(&scene_id, overlays)?;
        Ok(())
    }
}

fn brief_from_scene(scene: &Scene) -> AdBrief {
    AdBrief {
        product: scene.product.clone(),
        era: scene.era.clone(),
        tone: scene.tone.clone(),
        aspect_ratio: scene.aspect_ratio.clone(),
        visual_type: scene.visual_type,
        voice: scene.voice.clone(),
        visual_idea: scene.visual_idea.clone(),
        notes: scene.notes.clone(),
    }
}

fn validate_positive(field: &str, value: f64) -> Result<(), SessionError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SessionError::Core(CoreError::Validation(format!(
            "Overlay {field} must be a positive number, got {value}"
        ))));
    }
    Ok(())
}
