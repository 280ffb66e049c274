//! Font data, text shaping, and glyph rasterization for the compositor.
//!
//! [`FontLibrary`] maps catalog family names to raw font bytes supplied at
//! startup. [`TextRasterizer`] shapes single lines with Parley and draws
//! them into a `vello_cpu` render context; it also backs the
//! [`TextMeasurer`] seam the greedy wrapper in `artie-core` uses, so
//! wrapping decisions and drawn glyphs always agree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use artie_core::wrap::TextMeasurer;

use crate::error::ExportError;

// ---------------------------------------------------------------------------
// Brush
// ---------------------------------------------------------------------------

/// RGBA8 brush color carried through Parley layout styles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

// ---------------------------------------------------------------------------
// Font library
// ---------------------------------------------------------------------------

/// Raw font bytes keyed by catalog family name.
#[derive(Default)]
pub struct FontLibrary {
    fonts: HashMap<String, Arc<Vec<u8>>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font family's bytes (TTF/OTF).
    pub fn register(&mut self, family: impl Into<String>, bytes: Vec<u8>) {
        self.fonts.insert(family.into(), Arc::new(bytes));
    }

    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }

    pub fn bytes_for(&self, family: &str) -> Option<Arc<Vec<u8>>> {
        self.fonts.get(family).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rasterizer
// ---------------------------------------------------------------------------

/// Stateful Parley/vello text engine.
pub struct TextRasterizer {
    library: FontLibrary,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<BrushRgba8>,
    /// Family name Parley resolved for each registered library family.
    resolved: HashMap<String, String>,
    /// Glyph source data per library family, for vello.
    font_data: HashMap<String, vello_cpu::peniko::FontData>,
}

impl TextRasterizer {
    pub fn new(library: FontLibrary) -> Self {
        Self {
            library,
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            resolved: HashMap::new(),
            font_data: HashMap::new(),
        }
    }

    pub fn library(&self) -> &FontLibrary {
        &self.library
    }

    /// Ensure a family is registered with Parley, returning the name the
    /// collection resolved for it.
    fn resolve_family(&mut self, family: &str) -> Result<String, ExportError> {
        if let Some(name) = self.resolved.get(family) {
            return Ok(name.clone());
        }
        let bytes = self
            .library
            .bytes_for(family)
            .ok_or_else(|| ExportError::Font(family.to_string()))?;

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.as_ref().clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ExportError::Layout(format!("no faces in font data for '{family}'")))?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ExportError::Layout(format!("font family for '{family}' has no name")))?
            .to_string();

        self.resolved.insert(family.to_string(), name.clone());
        Ok(name)
    }

    /// Glyph source for vello, built from the same bytes Parley shapes with.
    fn font_data_for(&mut self, family: &str) -> Result<vello_cpu::peniko::FontData, ExportError> {
        if let Some(data) = self.font_data.get(family) {
            return Ok(data.clone());
        }
        let bytes = self
            .library
            .bytes_for(family)
            .ok_or_else(|| ExportError::Font(family.to_string()))?;
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        self.font_data.insert(family.to_string(), data.clone());
        Ok(data)
    }

    /// Shape one line of text (no internal breaking).
    fn layout_line(
        &mut self,
        text: &str,
        family: &str,
        size_px: f32,
        brush: BrushRgba8,
    ) -> Result<parley::Layout<BrushRgba8>, ExportError> {
        let resolved = self.resolve_family(family)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(resolved)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<BrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Resolve a family eagerly, before any wrapping or drawing uses it.
    pub fn ensure_family(&mut self, family: &str) -> Result<(), ExportError> {
        self.resolve_family(family).map(|_| ())
    }

    /// Advance width of `text` at `size_px`, in pixels.
    pub fn measure(&mut self, text: &str, family: &str, size_px: f64) -> Result<f64, ExportError> {
        let layout = self.layout_line(text, family, size_px as f32, BrushRgba8::default())?;
        Ok(f64::from(layout.width()))
    }

    /// Draw one already-wrapped line, horizontally centered on
    /// `center_x_px` with its top edge at `top_y_px`.
    pub fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        text: &str,
        family: &str,
        size_px: f64,
        color: [u8; 3],
        center_x_px: f64,
        top_y_px: f64,
    ) -> Result<(), ExportError> {
        let brush = BrushRgba8 {
            r: color[0],
            g: color[1],
            b: color[2],
            a: 255,
        };
        let layout = self.layout_line(text, family, size_px as f32, brush)?;
        let font = self.font_data_for(family)?;

        let left = center_x_px - f64::from(layout.width()) / 2.0;
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((left, top_y_px)));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        Ok(())
    }
}

/// Adapter exposing the rasterizer through the core measuring seam.
///
/// Families are resolved before wrapping starts, so measurement failures
/// cannot occur mid-wrap; any residual error measures as zero width.
pub struct SharedMeasurer<'a>(pub &'a RefCell<TextRasterizer>);

impl TextMeasurer for SharedMeasurer<'_> {
    fn measure(&self, text: &str, font: &str, font_px: f64) -> f64 {
        self.0
            .borrow_mut()
            .measure(text, font, font_px)
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
