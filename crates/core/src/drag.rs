//! Session-scoped drag controller for overlay repositioning.
//!
//! Converts pointer movement into normalized anchor updates. The
//! controller is independent of any rendering surface: callers feed it
//! pointer coordinates relative to the rendering container plus the
//! overlay's rendered box, and get back the overlay's new percentage
//! anchor under that overlay kind's convention.
//!
//! One overlay may be dragged at a time; pointer-up always releases the
//! slot, even when the pointer left the container.

use crate::error::CoreError;
use crate::overlay::{OverlayKind, Position};
use crate::types::Id;

/// A point in container-relative pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPx {
    pub x: f64,
    pub y: f64,
}

/// A box size in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizePx {
    pub width: f64,
    pub height: f64,
}

/// Bookkeeping for the overlay currently being dragged.
#[derive(Debug, Clone, PartialEq)]
struct DragState {
    kind: OverlayKind,
    id: Id,
    /// Pointer offset inside the overlay's rendered box at grab time.
    grab_offset: PointPx,
}

/// Holds the single "currently dragging" slot.
#[derive(Debug, Default)]
pub struct DragController {
    active: Option<DragState>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The overlay currently being dragged, if any.
    pub fn active(&self) -> Option<(OverlayKind, &str)> {
        self.active.as_ref().map(|d| (d.kind, d.id.as_str()))
    }

    /// Grab an overlay.
    ///
    /// `pointer` is the pointer position and `overlay_top_left` the
    /// overlay's rendered top-left corner, both container-relative. A
    /// second grab while one is active is a logic error (pointer devices
    /// produce one gesture at a time).
    pub fn begin_drag(
        &mut self,
        kind: OverlayKind,
        id: impl Into<Id>,
        pointer: PointPx,
        overlay_top_left: PointPx,
    ) -> Result<(), CoreError> {
        if self.active.is_some() {
            return Err(CoreError::Conflict(
                "A drag is already in progress".to_string(),
            ));
        }
        self.active = Some(DragState {
            kind,
            id: id.into(),
            grab_offset: PointPx {
                x: pointer.x - overlay_top_left.x,
                y: pointer.y - overlay_top_left.y,
            },
        });
        Ok(())
    }

    /// Translate a pointer move into the dragged overlay's new anchor.
    ///
    /// Returns `None` when no drag is active (stray move events are
    /// ignored). The anchor follows the overlay kind's convention: text
    /// anchors top-center, logo anchors center-center.
    pub fn update_drag(
        &self,
        pointer: PointPx,
        container: SizePx,
        overlay: SizePx,
    ) -> Option<(OverlayKind, Id, Position)> {
        let drag = self.active.as_ref()?;
        if container.width <= 0.0 || container.height <= 0.0 {
            return None;
        }

        let left = pointer.x - drag.grab_offset.x;
        let top = pointer.y - drag.grab_offset.y;

        let position = match drag.kind {
            OverlayKind::Text => Position {
                x: (left + overlay.width / 2.0) / container.width * 100.0,
                y: top / container.height * 100.0,
            },
            OverlayKind::Logo => Position {
                x: (left + overlay.width / 2.0) / container.width * 100.0,
                y: (top + overlay.height / 2.0) / container.height * 100.0,
            },
        };

        Some((drag.kind, drag.id.clone(), position))
    }

    /// Release the drag slot. Safe to call with no drag active.
    pub fn end_drag(&mut self) {
        self.active = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
