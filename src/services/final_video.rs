// Final cut assembly: pair each scene video with its voiceover, replace the
// audio track, then concatenate the scenes with the ffmpeg concat demuxer.

use crate::storage;
use crate::utils::execute_ffmpeg_command;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug)]
pub struct ScenePair {
    pub index: usize,
    pub video: PathBuf,
    pub audio: Option<PathBuf>,
}

/// Scene videos on disk for a draft, each with its voiceover if one exists
pub fn collect_scene_pairs(slug: &str) -> Vec<ScenePair> {
    let dir = storage::video_dir(slug);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut indices: Vec<usize> = entries
        .flatten()
        .filter_map(|e| e.file_name().to_str().and_then(scene_index_from_video_name))
        .collect();
    indices.sort_unstable();

    indices
        .into_iter()
        .map(|index| {
            let audio = storage::voiceover_path(slug, index);
            ScenePair {
                index,
                video: storage::scene_video_path(slug, index),
                audio: audio.exists().then_some(audio),
            }
        })
        .collect()
}

pub fn scene_index_from_video_name(name: &str) -> Option<usize> {
    storage::SCENE_VIDEO_RE
        .captures(name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Public URLs of a draft's scene videos, in scene order
pub fn existing_scene_videos(slug: &str) -> Vec<String> {
    storage::public_urls_matching(&storage::video_dir(slug), |name| {
        storage::SCENE_VIDEO_RE.is_match(name)
    })
}

/// Assemble `source_slug`'s scenes into `output_path`. The output slug can
/// differ from the source when a draft falls back to default assets.
pub fn stitch_final_video(source_slug: &str, output_path: &Path) -> Result<(), String> {
    let slug = source_slug;
    let pairs = collect_scene_pairs(slug);
    if pairs.is_empty() {
        return Err(format!("No scene videos found for '{}'", slug));
    }

    tracing::info!("🎬 Stitching {} scenes into final video for {}", pairs.len(), slug);

    let mut segments = Vec::with_capacity(pairs.len());
    let mut temp_files = Vec::new();

    for pair in &pairs {
        match &pair.audio {
            Some(audio) => {
                let muxed = storage::video_dir(slug).join(format!("muxed_scene{}.mp4", pair.index));
                mux_voiceover(&pair.video, audio, &muxed)?;
                segments.push(muxed.clone());
                temp_files.push(muxed);
            }
            None => segments.push(pair.video.clone()),
        }
    }

    let result = concat_videos(&segments, output_path);

    for temp in temp_files {
        let _ = std::fs::remove_file(temp);
    }

    result
}

// Replace the video's audio track with the voiceover, keeping the video stream
fn mux_voiceover(video: &Path, audio: &Path, output: &Path) -> Result<(), String> {
    let mut command = Command::new("ffmpeg");
    command
        .arg("-y")
        .args(["-i", &video.to_string_lossy()])
        .args(["-i", &audio.to_string_lossy()])
        .args(["-map", "0:v:0"])
        .args(["-map", "1:a:0"])
        .args(["-c:v", "copy"])
        .args(["-c:a", "aac"])
        .arg("-shortest")
        .arg(output);
    execute_ffmpeg_command(command).map(|_| ())
}

fn concat_videos(segments: &[PathBuf], output: &Path) -> Result<(), String> {
    crate::utils::ensure_parent_dir(output)?;

    let absolute: Vec<PathBuf> = segments
        .iter()
        .map(|p| {
            std::fs::canonicalize(p)
                .map_err(|e| format!("Cannot resolve segment {}: {}", p.display(), e))
        })
        .collect::<Result<_, _>>()?;

    let list_path = output.with_extension("txt");
    std::fs::write(&list_path, concat_list_contents(&absolute))
        .map_err(|e| format!("Failed to write concat list: {}", e))?;

    let mut command = Command::new("ffmpeg");
    command
        .arg("-y")
        .args(["-f", "concat"])
        .args(["-safe", "0"])
        .args(["-i", &list_path.to_string_lossy()])
        .args(["-c", "copy"])
        .arg(output);
    let result = execute_ffmpeg_command(command);

    let _ = std::fs::remove_file(&list_path);
    result.map(|_| ())
}

// concat demuxer format: one `file '...'` line per segment, quotes escaped
pub fn concat_list_contents(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_index_from_video_name() {
        assert_eq!(scene_index_from_video_name("scene3.mp4"), Some(3));
        assert_eq!(scene_index_from_video_name("scene12.mp4"), Some(12));
        assert_eq!(scene_index_from_video_name("muxed_scene3.mp4"), None);
        assert_eq!(scene_index_from_video_name("scene3.png"), None);
    }

    #[test]
    fn test_concat_list_contents() {
        let segments = vec![PathBuf::from("/tmp/a.mp4"), PathBuf::from("/tmp/b's.mp4")];
        let list = concat_list_contents(&segments);
        assert_eq!(list, "file '/tmp/a.mp4'\nfile '/tmp/b'\\''s.mp4'\n");
    }

    #[test]
    fn test_collect_scene_pairs_missing_dir_is_empty() {
        assert!(collect_scene_pairs("no-such-draft-slug").is_empty());
    }
}
