//! Export pipeline: still-image composites, media bundles, playlists.
//!
//! Three export paths, matching what the preview offers:
//!
//! - a still scene is composited (visual + text overlays + logo) onto a
//!   1920-wide canvas and encoded as JPEG;
//! - a video scene is bundled raw (video + optional voiceover) into a zip,
//!   overlays stay presentation-layer only;
//! - a story becomes a zip of per-scene files plus, when videos are
//!   present, a self-contained HTML playlist that auto-advances through
//!   them.
//!
//! Any failure aborts that export; partial artifacts are never returned.

pub mod bundle;
pub mod compose;
pub mod error;
pub mod playlist;
pub mod text;

pub use error::ExportError;
