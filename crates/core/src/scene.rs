//! Scenes and story linkage.
//!
//! A scene is one generated creative unit: the brief it came from, the
//! generated script/visual/audio payload, and its overlay presentation
//! layer. Scenes are immutable once created except for the overlay
//! collections, which the store replaces wholesale on edit.
//!
//! Story chains are exactly two levels deep: a root plus directly linked
//! children. [`StoryLink`] makes that a tagged representation validated at
//! construction instead of a nullable field trusted at every read site.

use serde::{Deserialize, Serialize};

use crate::brief::{AdBrief, VisualType};
use crate::error::CoreError;
use crate::overlay::{LogoOverlay, TextOverlay};
use crate::types::{Id, Timestamp};

// ---------------------------------------------------------------------------
// Media references
// ---------------------------------------------------------------------------

/// Opaque handle to a stored media blob.
///
/// `rel_path` is relative to the session media vault; the core never reads
/// the bytes itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub rel_path: String,
    pub mime: String,
}

/// Opaque handle returned by the visual generator for a generated video,
/// reusable to extend that video in a follow-up scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualHandle {
    pub uri: String,
    pub aspect_ratio: String,
}

// ---------------------------------------------------------------------------
// Story linkage
// ---------------------------------------------------------------------------

/// A scene is either a story root or a child of exactly one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryLink {
    Root,
    Child { parent_id: Id, scene_number: u32 },
}

impl StoryLink {
    /// Build a child link. Children start at scene number 2; the root is
    /// always scene 1.
    pub fn child(parent_id: impl Into<Id>, scene_number: u32) -> Result<Self, CoreError> {
        if scene_number < 2 {
            return Err(CoreError::Validation(format!(
                "Child scene number must be >= 2, got {scene_number}"
            )));
        }
        Ok(Self::Child {
            parent_id: parent_id.into(),
            scene_number,
        })
    }

    /// Parent scene id, if this is a child link.
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Root => None,
            Self::Child { parent_id, .. } => Some(parent_id),
        }
    }

    /// 1-based position within the story. Roots are always 1.
    pub fn scene_number(&self) -> u32 {
        match self {
            Self::Root => 1,
            Self::Child { scene_number, .. } => *scene_number,
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// One generated creative unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: Id,
    pub created_at: Timestamp,

    // Brief provenance, copied from the originating request.
    pub product: String,
    pub era: String,
    pub tone: String,
    pub aspect_ratio: String,
    pub visual_type: VisualType,
    pub voice: Option<String>,
    pub visual_idea: Option<String>,
    pub notes: Option<String>,

    // Generated payload.
    pub script: Vec<String>,
    pub visual: Option<MediaRef>,
    pub continuation: Option<VisualHandle>,
    pub audio: Option<MediaRef>,

    // Presentation payload. Overlay order is z-stacking only.
    pub text_overlays: Vec<TextOverlay>,
    pub logo: Option<LogoOverlay>,

    pub link: StoryLink,
}

impl Scene {
    /// Mint a fresh scene id.
    pub fn new_id() -> Id {
        format!("scene_{}", uuid::Uuid::new_v4())
    }

    /// Copy the brief's provenance fields into a scene under construction.
    pub fn from_brief(
        id: Id,
        created_at: Timestamp,
        brief: &AdBrief,
        script: Vec<String>,
        link: StoryLink,
    ) -> Self {
        Self {
            id,
            created_at,
            product: brief.product.clone(),
            era: brief.era.clone(),
            tone: brief.tone.clone(),
            aspect_ratio: brief.aspect_ratio.clone(),
            visual_type: brief.visual_type,
            voice: brief.voice.clone(),
            visual_idea: brief.visual_idea.clone(),
            notes: brief.notes.clone(),
            script,
            visual: None,
            continuation: None,
            audio: None,
            text_overlays: Vec::new(),
            logo: None,
            link,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.link, StoryLink::Root)
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.link.parent_id()
    }

    pub fn scene_number(&self) -> u32 {
        self.link.scene_number()
    }

    pub fn is_video(&self) -> bool {
        self.visual_type == VisualType::Video
    }

    /// Id of the story this scene belongs to (its own id for roots).
    pub fn story_root_id(&self) -> &str {
        self.link.parent_id().unwrap_or(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
