//! Still-image composite rendering.
//!
//! Renders a scene's visual plus its overlays onto a fixed-width canvas.
//! Percentage coordinates convert to pixels with the same anchor
//! conventions the interactive editor uses; text wraps greedily to each
//! overlay's pixel width at 1.2x line height. Output is a JPEG.

use std::cell::RefCell;
use std::io::Cursor;

use artie_core::brief::parse_aspect_ratio;
use artie_core::color::parse_hex_color;
use artie_core::overlay::{LogoOverlay, TextOverlay};
use artie_core::wrap::{place_lines, wrap_text};

use crate::error::ExportError;
use crate::text::{SharedMeasurer, TextRasterizer};

/// Reference canvas width; height follows the scene's aspect ratio.
pub const EXPORT_WIDTH: u32 = 1920;

/// JPEG quality for the composite.
const JPEG_QUALITY: u8 = 90;

/// Canvas size for an aspect ratio at the reference width.
pub fn export_dimensions(aspect_ratio: &str) -> Result<(u32, u32), ExportError> {
    let (aw, ah) = parse_aspect_ratio(aspect_ratio)?;
    let height = (u64::from(EXPORT_WIDTH) * u64::from(ah) + u64::from(aw) / 2) / u64::from(aw);
    Ok((EXPORT_WIDTH, height as u32))
}

/// Composites scenes into downloadable stills.
///
/// Holds the text engine; one composer serves the whole session.
pub struct ImageComposer {
    rasterizer: RefCell<TextRasterizer>,
}

impl ImageComposer {
    pub fn new(rasterizer: TextRasterizer) -> Self {
        Self {
            rasterizer: RefCell::new(rasterizer),
        }
    }

    /// Render `visual_bytes` with the given overlays to a JPEG at the
    /// reference export size.
    pub fn compose_scene_image(
        &self,
        visual_bytes: &[u8],
        aspect_ratio: &str,
        text_overlays: &[TextOverlay],
        logo: Option<(&LogoOverlay, &[u8])>,
    ) -> Result<Vec<u8>, ExportError> {
        let (width, height) = export_dimensions(aspect_ratio)?;
        let (width_u16, height_u16) = canvas_u16(width, height)?;
        let (wf, hf) = (f64::from(width), f64::from(height));

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        // Base visual, resized to fill the canvas.
        let base = image::load_from_memory(visual_bytes)
            .map_err(|e| ExportError::Decode(e.to_string()))?
            .to_rgba8();
        let base = image::imageops::resize(&base, width, height, image::imageops::FilterType::Triangle);
        draw_rgba(&mut ctx, &base, 0.0, 0.0)?;

        // Text overlays, in z order. Families are resolved up front so the
        // wrap measurer cannot fail mid-line.
        for overlay in text_overlays {
            if overlay.text.trim().is_empty() {
                continue;
            }
            let color = parse_hex_color(&overlay.color)?;
            let font_px = overlay.font_px(hf);
            let max_width_px = overlay.width_px(wf);
            let (anchor_x, anchor_y) = overlay.anchor_px(wf, hf);

            // Fails here, before any wrapping, if the family is unknown.
            self.rasterizer.borrow_mut().ensure_family(&overlay.font)?;
            let lines = wrap_text(
                &SharedMeasurer(&self.rasterizer),
                &overlay.text,
                &overlay.font,
                font_px,
                max_width_px,
            );
            let placed = place_lines(lines, anchor_x, anchor_y, font_px);

            let mut rasterizer = self.rasterizer.borrow_mut();
            for line in placed {
                rasterizer.draw_line(
                    &mut ctx,
                    &line.text,
                    &overlay.font,
                    font_px,
                    color,
                    line.center_x_px,
                    line.top_y_px,
                )?;
            }
        }

        // Logo, center-anchored, aspect-preserved at its width percentage.
        if let Some((overlay, logo_bytes)) = logo {
            let decoded = image::load_from_memory(logo_bytes)
                .map_err(|e| ExportError::Decode(e.to_string()))?
                .to_rgba8();
            let target_w = overlay.width_px(wf).round().max(1.0) as u32;
            let target_h = ((u64::from(target_w) * u64::from(decoded.height()))
                / u64::from(decoded.width().max(1)))
            .max(1) as u32;
            let resized = image::imageops::resize(
                &decoded,
                target_w,
                target_h,
                image::imageops::FilterType::Triangle,
            );
            let (cx, cy) = overlay.center_px(wf, hf);
            let left = cx - f64::from(target_w) / 2.0;
            let top = cy - f64::from(target_h) / 2.0;
            draw_rgba(&mut ctx, &resized, left, top)?;
        }

        // Rasterize and encode.
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        encode_jpeg(&pixmap, width, height)
    }
}

// ---------------------------------------------------------------------------
// Drawing helpers
// ---------------------------------------------------------------------------

fn canvas_u16(width: u32, height: u32) -> Result<(u16, u16), ExportError> {
    let w = u16::try_from(width).map_err(|_| ExportError::CanvasSize { width, height })?;
    let h = u16::try_from(height).map_err(|_| ExportError::CanvasSize { width, height })?;
    Ok((w, h))
}

/// Paint an RGBA buffer at `(left, top)` in canvas space.
fn draw_rgba(
    ctx: &mut vello_cpu::RenderContext,
    rgba: &image::RgbaImage,
    left: f64,
    top: f64,
) -> Result<(), ExportError> {
    let paint = rgba_image_paint(rgba)?;
    let (w, h) = (f64::from(rgba.width()), f64::from(rgba.height()));
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((left, top)));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
    Ok(())
}

/// Convert straight-alpha RGBA into a premultiplied vello image paint.
fn rgba_image_paint(rgba: &image::RgbaImage) -> Result<vello_cpu::Image, ExportError> {
    let (width, height) = (rgba.width(), rgba.height());
    let w = u16::try_from(width).map_err(|_| ExportError::CanvasSize { width, height })?;
    let h = u16::try_from(height).map_err(|_| ExportError::CanvasSize { width, height })?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba.as_raw().chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: premul(px[0], a),
            g: premul(px[1], a),
            b: premul(px[2], a),
            a,
        });
    }

    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul(c: u8, a: u8) -> u8 {
    let af = u16::from(a) + 1;
    ((u16::from(c) * af) >> 8) as u8
}

/// Flatten the opaque premultiplied pixmap to RGB and encode as JPEG.
fn encode_jpeg(pixmap: &vello_cpu::Pixmap, width: u32, height: u32) -> Result<Vec<u8>, ExportError> {
    let data = pixmap.data_as_u8_slice();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in data.chunks_exact(4) {
        // The base visual covers the full canvas, so alpha is 255 and the
        // premultiplied channels equal the straight ones.
        rgb.extend_from_slice(&px[..3]);
    }
    let buffer = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ExportError::Encode("pixel buffer size mismatch".to_string()))?;

    let mut out = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    buffer
        .write_with_encoder(encoder)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::FontLibrary;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn composer() -> ImageComposer {
        ImageComposer::new(TextRasterizer::new(FontLibrary::new()))
    }

    // -- dimensions --

    #[test]
    fn dimensions_for_wide_ratio() {
        assert_eq!(export_dimensions("16:9").unwrap(), (1920, 1080));
    }

    #[test]
    fn dimensions_for_classic_ratios() {
        assert_eq!(export_dimensions("4:3").unwrap(), (1920, 1440));
        assert_eq!(export_dimensions("1:1").unwrap(), (1920, 1920));
    }

    #[test]
    fn dimensions_round_to_nearest_pixel() {
        // 1920 * 16 / 9 = 3413.33..
        assert_eq!(export_dimensions("9:16").unwrap(), (1920, 3413));
    }

    #[test]
    fn dimensions_reject_bad_ratio() {
        assert!(export_dimensions("bogus").is_err());
    }

    // -- compositing (no text path; glyph data needs registered fonts) --

    #[test]
    fn composes_plain_visual_to_jpeg() {
        let bytes = composer()
            .compose_scene_image(&png_fixture(64, 36), "16:9", &[], None)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 1920);
        assert_eq!(decoded.height(), 1080);
    }

    #[test]
    fn composes_logo_over_visual() {
        use artie_core::overlay::{LogoOverlay, Position};
        use artie_core::scene::MediaRef;

        let logo = LogoOverlay {
            id: LogoOverlay::new_id(),
            image: MediaRef {
                rel_path: "logo.png".to_string(),
                mime: "image/png".to_string(),
            },
            size: 10.0,
            position: Position { x: 50.0, y: 50.0 },
        };
        let bytes = composer()
            .compose_scene_image(
                &png_fixture(64, 36),
                "16:9",
                &[],
                Some((&logo, png_fixture(32, 32).as_slice())),
            )
            .unwrap();
        assert!(image::load_from_memory(&bytes).is_ok());
    }

    #[test]
    fn corrupt_visual_aborts_export() {
        let err = composer()
            .compose_scene_image(&[0, 1, 2, 3], "16:9", &[], None)
            .unwrap_err();
        assert!(matches!(err, ExportError::Decode(_)));
    }

    #[test]
    fn unknown_overlay_font_aborts_export() {
        use artie_core::overlay::{Position, TextOverlay};

        let overlay = TextOverlay {
            id: TextOverlay::new_id(),
            text: "Taste the stars".to_string(),
            font: "Bebas Neue".to_string(),
            size: 8.0,
            color: "#FFFFFF".to_string(),
            width: 80.0,
            position: Position { x: 50.0, y: 75.0 },
        };
        let err = composer()
            .compose_scene_image(&png_fixture(64, 36), "16:9", &[overlay], None)
            .unwrap_err();
        assert!(matches!(err, ExportError::Font(_)));
    }

    #[test]
    fn blank_text_overlays_are_skipped() {
        use artie_core::overlay::{Position, TextOverlay};

        // Whitespace-only text draws nothing, so no font data is needed.
        let overlay = TextOverlay {
            id: TextOverlay::new_id(),
            text: "   ".to_string(),
            font: "Bebas Neue".to_string(),
            size: 8.0,
            color: "#FFFFFF".to_string(),
            width: 80.0,
            position: Position { x: 50.0, y: 75.0 },
        };
        assert!(composer()
            .compose_scene_image(&png_fixture(64, 36), "16:9", &[overlay], None)
            .is_ok());
    }
}
