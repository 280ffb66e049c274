//! Self-contained HTML playlist for story downloads.
//!
//! The generated document embeds the video file list and a small player
//! that auto-advances through the scenes in order, showing a
//! "Scene N of M" indicator and a terminal "Playlist finished." status.

use crate::error::ExportError;

/// File name of the playlist inside the story archive.
pub const PLAYLIST_FILE_NAME: &str = "play_story.html";

/// Build the playlist document for `video_files` in scene order.
pub fn playlist_html(product: &str, video_files: &[String]) -> Result<String, ExportError> {
    let files_json = serde_json::to_string(video_files)
        .map_err(|e| ExportError::Zip(format!("playlist file list: {e}")))?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{product} Story</title>
    <style>
        body {{ background-color: #111827; margin: 0; display: flex; flex-direction: column; align-items: center; justify-content: center; height: 100vh; color: #e5e7eb; font-family: sans-serif; }}
        video {{ max-width: 90%; max-height: 80vh; border: 1px solid #374151; border-radius: 8px; }}
        .container {{ text-align: center; }}
        h1 {{ font-size: 2em; margin-bottom: 1em; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{product}</h1>
        <video id="player" controls autoplay playsinline>
            <p>Your browser doesn't support HTML video.</p>
        </video>
        <p id="scene-indicator" style="margin-top: 1em;"></p>
        <script>
            const videoPlaylist = {files_json};
            let currentVideoIndex = 0;
            const videoPlayer = document.getElementById('player');
            const sceneIndicator = document.getElementById('scene-indicator');

            function playNextVideo() {{
                if (currentVideoIndex < videoPlaylist.length) {{
                    const currentFile = videoPlaylist[currentVideoIndex];
                    videoPlayer.src = currentFile;
                    videoPlayer.load();
                    videoPlayer.play().catch(e => console.error("Autoplay failed:", e));
                    sceneIndicator.textContent = 'Playing: Scene ' + (currentVideoIndex + 1) + ' of ' + videoPlaylist.length;
                }} else {{
                    sceneIndicator.textContent = 'Playlist finished.';
                }}
            }}

            videoPlayer.addEventListener('ended', () => {{
                currentVideoIndex++;
                playNextVideo();
            }});

            playNextVideo();
        </script>
    </div>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn files() -> Vec<String> {
        vec![
            "scene_1_visual.mp4".to_string(),
            "scene_2_visual.mp4".to_string(),
        ]
    }

    #[test]
    fn embeds_each_file_once_in_order() {
        let html = playlist_html("Starlight Soda", &files()).unwrap();
        let first = html.find("scene_1_visual.mp4").unwrap();
        let second = html.find("scene_2_visual.mp4").unwrap();
        assert!(first < second);
        assert_eq!(html.matches("scene_1_visual.mp4").count(), 1);
        assert_eq!(html.matches("scene_2_visual.mp4").count(), 1);
    }

    #[test]
    fn carries_product_title_and_statuses() {
        let html = playlist_html("Starlight Soda", &files()).unwrap();
        assert!(html.contains("<title>Starlight Soda Story</title>"));
        assert!(html.contains("'Playing: Scene ' + (currentVideoIndex + 1) + ' of '"));
        assert!(html.contains("Playlist finished."));
    }

    #[test]
    fn file_list_is_valid_json() {
        let html = playlist_html("Starlight Soda", &files()).unwrap();
        let start = html.find("const videoPlaylist = ").unwrap() + "const videoPlaylist = ".len();
        let end = html[start..].find(";\n").unwrap() + start;
        let parsed: Vec<String> = serde_json::from_str(&html[start..end]).unwrap();
        assert_eq!(parsed, files());
    }

    #[test]
    fn empty_playlist_is_still_a_document() {
        let html = playlist_html("Starlight Soda", &[]).unwrap();
        assert!(html.contains("const videoPlaylist = []"));
    }
}
