//! Text and logo overlays in normalized coordinate space.
//!
//! All positions and sizes are percentages of the rendering container's
//! current box, so placement survives viewport and export-size changes.
//! The two overlay kinds use different anchor conventions:
//!
//! - text overlays anchor at **top-center**: `x` is measured at the
//!   overlay's horizontal center, `y` at its top edge;
//! - logo overlays anchor at **center-center**: both coordinates are
//!   measured at the overlay's midpoint.
//!
//! The same conversion methods here are used by interactive editing and by
//! the export compositor; keeping them in one place is what stops dragged
//! elements from jumping between the two contexts.

use serde::{Deserialize, Serialize};

use crate::scene::MediaRef;
use crate::types::Id;

// ---------------------------------------------------------------------------
// Defaults for auto-generated and newly added overlays
// ---------------------------------------------------------------------------

/// Font family applied to auto-generated script overlays.
pub const DEFAULT_TEXT_FONT: &str = "Bebas Neue";
/// Text size as a percentage of container height.
pub const DEFAULT_TEXT_SIZE_PCT: f64 = 8.0;
/// Text block width as a percentage of container width.
pub const DEFAULT_TEXT_WIDTH_PCT: f64 = 80.0;
/// Default overlay text color.
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
/// Vertical start of the auto-generated script stack (% of height).
pub const AUTO_STACK_TOP_PCT: f64 = 75.0;
/// Vertical spacing between stacked script lines (% of height).
pub const AUTO_STACK_SPACING_PCT: f64 = 10.0;

/// Default logo width as a percentage of container width.
pub const DEFAULT_LOGO_SIZE_PCT: f64 = 15.0;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Normalized overlay anchor position, both axes in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Which overlay kind an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Text,
    Logo,
}

/// Shared capability of both overlay kinds: normalized position and size.
///
/// The anchor convention stays out of this trait on purpose; pixel
/// conversion is a kind-specific method.
pub trait Positionable {
    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
    fn size_pct(&self) -> f64;
    fn set_size_pct(&mut self, size: f64);
}

// ---------------------------------------------------------------------------
// Text overlay
// ---------------------------------------------------------------------------

/// A positionable block of styled text composited over a scene's visual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub id: Id,
    pub text: String,
    /// Font family name from the catalog.
    pub font: String,
    /// Font size as a percentage of container height.
    pub size: f64,
    /// `#rrggbb` fill color.
    pub color: String,
    /// Block width as a percentage of container width.
    pub width: f64,
    /// Top-center anchor.
    pub position: Position,
}

impl TextOverlay {
    /// Mint a fresh text overlay id.
    pub fn new_id() -> Id {
        format!("txt_{}", uuid::Uuid::new_v4())
    }

    /// Snap the horizontal anchor to the container center.
    pub fn align_center(&mut self) {
        self.position.x = 50.0;
    }

    /// Anchor in pixel space: `(center_x, top_y)`.
    pub fn anchor_px(&self, container_w: f64, container_h: f64) -> (f64, f64) {
        (
            self.position.x / 100.0 * container_w,
            self.position.y / 100.0 * container_h,
        )
    }

    /// Block width in pixels.
    pub fn width_px(&self, container_w: f64) -> f64 {
        self.width / 100.0 * container_w
    }

    /// Font size in pixels (size is a height percentage).
    pub fn font_px(&self, container_h: f64) -> f64 {
        self.size / 100.0 * container_h
    }
}

impl Positionable for TextOverlay {
    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn size_pct(&self) -> f64 {
        self.size
    }

    fn set_size_pct(&mut self, size: f64) {
        self.size = size;
    }
}

// ---------------------------------------------------------------------------
// Logo overlay
// ---------------------------------------------------------------------------

/// A positionable logo image composited over a scene's visual.
///
/// At most one logo per scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoOverlay {
    pub id: Id,
    pub image: MediaRef,
    /// Width as a percentage of container width; height follows the image's
    /// own aspect ratio.
    pub size: f64,
    /// Center-center anchor.
    pub position: Position,
}

impl LogoOverlay {
    /// Mint a fresh logo overlay id.
    pub fn new_id() -> Id {
        format!("logo_{}", uuid::Uuid::new_v4())
    }

    /// Build a logo with default size, centered.
    pub fn centered(image: MediaRef) -> Self {
        Self {
            id: Self::new_id(),
            image,
            size: DEFAULT_LOGO_SIZE_PCT,
            position: Position { x: 50.0, y: 50.0 },
        }
    }

    /// Anchor in pixel space: the overlay's center point.
    pub fn center_px(&self, container_w: f64, container_h: f64) -> (f64, f64) {
        (
            self.position.x / 100.0 * container_w,
            self.position.y / 100.0 * container_h,
        )
    }

    /// Rendered width in pixels.
    pub fn width_px(&self, container_w: f64) -> f64 {
        self.size / 100.0 * container_w
    }
}

impl Positionable for LogoOverlay {
    fn position(&self) -> Position {
        self.position
    }

    fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    fn size_pct(&self) -> f64 {
        self.size
    }

    fn set_size_pct(&mut self, size: f64) {
        self.size = size;
    }
}

// ---------------------------------------------------------------------------
// Auto-generated overlays
// ---------------------------------------------------------------------------

/// Build one default-styled text overlay per script line, stacked
/// vertically from [`AUTO_STACK_TOP_PCT`] with [`AUTO_STACK_SPACING_PCT`]
/// between lines.
pub fn auto_overlays(script: &[String]) -> Vec<TextOverlay> {
    script
        .iter()
        .enumerate()
        .map(|(index, line)| TextOverlay {
            id: TextOverlay::new_id(),
            text: line.clone(),
            font: DEFAULT_TEXT_FONT.to_string(),
            size: DEFAULT_TEXT_SIZE_PCT,
            color: DEFAULT_TEXT_COLOR.to_string(),
            width: DEFAULT_TEXT_WIDTH_PCT,
            position: Position {
                x: 50.0,
                y: AUTO_STACK_TOP_PCT + index as f64 * AUTO_STACK_SPACING_PCT,
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
