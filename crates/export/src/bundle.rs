//! Zip bundling for single-scene and story downloads.
//!
//! Archives are assembled fully in memory and only returned once complete;
//! a failure mid-assembly aborts the export with nothing handed out.
//! Story bundling reports progress per file and yields between files so a
//! progress indicator can repaint.

use std::io::{Cursor, Write};

use artie_core::brief::VisualType;

use crate::error::ExportError;
use crate::playlist::{playlist_html, PLAYLIST_FILE_NAME};

/// Replace whitespace runs so a product name is usable as a file stem.
pub fn safe_file_stem(product: &str) -> String {
    product.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Archive name for a single-scene video download.
pub fn single_zip_name(product: &str) -> String {
    format!("{}.zip", safe_file_stem(product))
}

/// Archive name for a story download.
pub fn story_zip_name(product: &str) -> String {
    format!("{}_story.zip", safe_file_stem(product))
}

/// One story scene's exportable media, in scene order.
#[derive(Debug, Default)]
pub struct SceneBundleItem {
    pub visual: Option<(Vec<u8>, VisualType)>,
    pub audio: Option<Vec<u8>>,
}

// ---------------------------------------------------------------------------
// Single-scene bundle
// ---------------------------------------------------------------------------

/// Bundle a video scene's raw media: the clip plus, when present, the
/// voiceover track. Overlays are never burned into video exports.
pub fn bundle_single_video(
    product: &str,
    visual: &[u8],
    audio: Option<&[u8]>,
) -> Result<Vec<u8>, ExportError> {
    let stem = safe_file_stem(product);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    writer
        .start_file(format!("{stem}_video.mp4"), options)
        .map_err(|e| ExportError::Zip(e.to_string()))?;
    writer.write_all(visual)?;

    if let Some(audio) = audio {
        writer
            .start_file(format!("{stem}_audio.wav"), options)
            .map_err(|e| ExportError::Zip(e.to_string()))?;
        writer.write_all(audio)?;
    }

    let cursor = writer.finish().map_err(|e| ExportError::Zip(e.to_string()))?;
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Story bundle
// ---------------------------------------------------------------------------

/// Bundle a story's media in scene order.
///
/// Visuals are named `scene_<n>_visual.<ext>` and voiceovers
/// `scene_<n>_audio.wav`. `progress` receives the percentage of files
/// processed after each addition. When at least one video was included, a
/// playlist document referencing the videos in order is added last.
pub async fn bundle_story(
    product: &str,
    items: &[SceneBundleItem],
    progress: &mut dyn FnMut(f64),
) -> Result<Vec<u8>, ExportError> {
    let total_files: usize = items
        .iter()
        .map(|i| usize::from(i.visual.is_some()) + usize::from(i.audio.is_some()))
        .sum();
    if total_files == 0 {
        return Err(ExportError::NothingToExport);
    }

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    let mut files_processed = 0usize;
    let mut video_files: Vec<String> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let scene_number = index + 1;

        if let Some((bytes, visual_type)) = &item.visual {
            let name = format!("scene_{scene_number}_visual.{}", visual_type.file_extension());
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| ExportError::Zip(e.to_string()))?;
            writer.write_all(bytes)?;
            if *visual_type == VisualType::Video {
                video_files.push(name);
            }

            files_processed += 1;
            progress(files_processed as f64 / total_files as f64 * 100.0);
            tokio::task::yield_now().await;
        }

        if let Some(bytes) = &item.audio {
            writer
                .start_file(format!("scene_{scene_number}_audio.wav"), options)
                .map_err(|e| ExportError::Zip(e.to_string()))?;
            writer.write_all(bytes)?;

            files_processed += 1;
            progress(files_processed as f64 / total_files as f64 * 100.0);
            tokio::task::yield_now().await;
        }
    }

    if !video_files.is_empty() {
        writer
            .start_file(PLAYLIST_FILE_NAME, options)
            .map_err(|e| ExportError::Zip(e.to_string()))?;
        writer.write_all(playlist_html(product, &video_files)?.as_bytes())?;
    }

    let cursor = writer.finish().map_err(|e| ExportError::Zip(e.to_string()))?;
    tracing::info!(
        files = files_processed,
        videos = video_files.len(),
        "Story bundle assembled"
    );
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
