//! Ad brief working state, catalog constants, and validation.
//!
//! The brief is the mutable form state a generation run is started from;
//! on success its fields are copied into the new [`Scene`](crate::scene::Scene)
//! for provenance. Era/tone/voice/ratio values are validated against the
//! fixed catalogs below.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

/// Selectable decade/era styles.
pub const ERAS: &[&str] = &[
    "1920s",
    "1950s",
    "1960s",
    "1970s",
    "1980s",
    "1990s",
    "2000s",
    "2010s",
    "2020s",
    "Futuristic",
];

/// Selectable ad tones.
pub const TONES: &[&str] = &[
    "Wholesome",
    "Edgy",
    "Nostalgic",
    "Sophisticated",
    "Humorous",
    "Dramatic",
    "Minimalist",
    "Surreal",
];

/// Selectable voiceover voices as `(display label, voice id)`.
pub const VOICES: &[(&str, &str)] = &[
    ("Kore (Female)", "Kore"),
    ("Puck (Male)", "Puck"),
    ("Charon (Male)", "Charon"),
    ("Fenrir (Male)", "Fenrir"),
    ("Zephyr (Female)", "Zephyr"),
];

/// Selectable output aspect ratios.
pub const ASPECT_RATIOS: &[&str] = &["16:9", "9:16", "1:1", "4:3", "3:4"];

/// Font families available for text overlays.
pub const AVAILABLE_FONTS: &[&str] = &[
    "Lato",
    "Montserrat",
    "Oswald",
    "Pacifico",
    "Orbitron",
    "Bebas Neue",
    "Lobster",
];

// ---------------------------------------------------------------------------
// Visual type
// ---------------------------------------------------------------------------

/// Kind of visual a scene carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualType {
    Image,
    Video,
}

impl VisualType {
    /// Catalog name, as persisted and as shown in the UI.
    pub fn name(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// File extension used when bundling the raw visual.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Image => "jpg",
            Self::Video => "mp4",
        }
    }
}

// ---------------------------------------------------------------------------
// Brief
// ---------------------------------------------------------------------------

/// In-progress form values for one generation request.
///
/// Not persisted on its own; a successful workflow run copies these fields
/// into the resulting scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdBrief {
    pub product: String,
    pub era: String,
    pub tone: String,
    pub aspect_ratio: String,
    pub visual_type: VisualType,
    pub voice: Option<String>,
    pub visual_idea: Option<String>,
    pub notes: Option<String>,
}

impl Default for AdBrief {
    /// The studio's starter brief.
    fn default() -> Self {
        Self {
            product: "Starlight Soda".to_string(),
            era: "1980s".to_string(),
            tone: "Nostalgic".to_string(),
            aspect_ratio: "16:9".to_string(),
            visual_type: VisualType::Video,
            voice: Some("Puck".to_string()),
            visual_idea: Some(
                "Teenagers at a retro arcade, sharing a can of Starlight Soda under neon lights."
                    .to_string(),
            ),
            notes: None,
        }
    }
}

impl AdBrief {
    /// Validate every catalog-backed field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.product.trim().is_empty() {
            return Err(CoreError::Validation(
                "Product name must not be empty".to_string(),
            ));
        }
        validate_era(&self.era)?;
        validate_tone(&self.tone)?;
        validate_aspect_ratio(&self.aspect_ratio)?;
        if let Some(voice) = &self.voice {
            validate_voice(voice)?;
        }
        Ok(())
    }

    /// Replace era, tone, voice, and aspect ratio with random catalog picks.
    pub fn randomize_style(&mut self) {
        let mut rng = rand::rng();
        // The catalogs are non-empty constants, so `choose` cannot fail.
        if let Some(era) = ERAS.choose(&mut rng) {
            self.era = (*era).to_string();
        }
        if let Some(tone) = TONES.choose(&mut rng) {
            self.tone = (*tone).to_string();
        }
        if let Some((_, voice)) = VOICES.choose(&mut rng) {
            self.voice = Some((*voice).to_string());
        }
        if let Some(ratio) = ASPECT_RATIOS.choose(&mut rng) {
            self.aspect_ratio = (*ratio).to_string();
        }
    }
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

/// Validate that an era is in the catalog.
pub fn validate_era(era: &str) -> Result<(), CoreError> {
    if ERAS.contains(&era) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown era '{era}'. Must be one of: {ERAS:?}"
        )))
    }
}

/// Validate that a tone is in the catalog.
pub fn validate_tone(tone: &str) -> Result<(), CoreError> {
    if TONES.contains(&tone) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown tone '{tone}'. Must be one of: {TONES:?}"
        )))
    }
}

/// Validate that a voice id is in the catalog.
pub fn validate_voice(voice: &str) -> Result<(), CoreError> {
    if VOICES.iter().any(|(_, id)| *id == voice) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Unknown voice '{voice}'")))
    }
}

/// Validate that an aspect ratio string is in the catalog.
pub fn validate_aspect_ratio(ratio: &str) -> Result<(), CoreError> {
    if ASPECT_RATIOS.contains(&ratio) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown aspect ratio '{ratio}'. Must be one of: {ASPECT_RATIOS:?}"
        )))
    }
}

/// Validate that a font family is in the catalog.
pub fn validate_font(font: &str) -> Result<(), CoreError> {
    if AVAILABLE_FONTS.contains(&font) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Unknown font '{font}'")))
    }
}

// ---------------------------------------------------------------------------
// Aspect ratio parsing
// ---------------------------------------------------------------------------

/// Parse an aspect ratio string like `"16:9"` into `(width, height)` parts.
pub fn parse_aspect_ratio(s: &str) -> Result<(u32, u32), CoreError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(CoreError::Validation(format!(
            "Invalid aspect ratio '{s}': expected W:H"
        )));
    }
    let width = parts[0]
        .parse::<u32>()
        .map_err(|_| CoreError::Validation(format!("Invalid width in aspect ratio '{s}'")))?;
    let height = parts[1]
        .parse::<u32>()
        .map_err(|_| CoreError::Validation(format!("Invalid height in aspect ratio '{s}'")))?;
    if width == 0 || height == 0 {
        return Err(CoreError::Validation(format!(
            "Aspect ratio parts must be > 0, got '{s}'"
        )));
    }
    Ok((width, height))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
