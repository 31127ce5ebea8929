// utils.rs - FFmpeg/FFprobe subprocess helpers shared by stitching and voiceover code
use std::path::Path;
use std::process::Command;

/// Execute an FFmpeg command with error handling
pub fn execute_ffmpeg_command(mut command: Command) -> Result<String, String> {
    tracing::debug!("Executing FFmpeg: {:?}", command);

    let output = command
        .output()
        .map_err(|e| format!("Failed to execute FFmpeg: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("FFmpeg error: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Execute FFprobe for media analysis
pub fn execute_ffprobe_command(args: &[&str]) -> Result<String, String> {
    let output = Command::new("ffprobe")
        .args(args)
        .output()
        .map_err(|e| format!("Failed to execute FFprobe: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("FFprobe error: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Media duration in seconds, or None when the file cannot be probed
pub fn media_duration(path: &Path) -> Option<f64> {
    let path_str = path.to_str()?;
    let args = [
        "-v",
        "quiet",
        "-show_entries",
        "format=duration",
        "-of",
        "csv=p=0",
        path_str,
    ];
    let output = execute_ffprobe_command(&args).ok()?;
    parse_probe_duration(&output)
}

pub fn parse_probe_duration(output: &str) -> Option<f64> {
    let value: f64 = output.trim().parse().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Trim an audio file in place to `max_seconds` (re-encoded as mp3)
pub fn clip_audio_to_duration(path: &Path, max_seconds: f64) -> Result<(), String> {
    let trimmed = path.with_extension("tmp.mp3");

    let mut command = Command::new("ffmpeg");
    command
        .arg("-i")
        .arg(path)
        .arg("-t")
        .arg(max_seconds.to_string())
        .arg("-acodec")
        .arg("libmp3lame")
        .arg("-y")
        .arg(&trimmed);

    execute_ffmpeg_command(command)?;
    std::fs::rename(&trimmed, path).map_err(|e| format!("Failed to replace clipped audio: {}", e))
}

/// Create the parent directory of an output path if it doesn't exist
pub fn ensure_parent_dir(output_path: &Path) -> Result<(), String> {
    if let Some(parent) = output_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create output directory: {}", e))?;
        }
    }
    Ok(())
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" => "video/mp4",
        "mp3" => "audio/mpeg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_probe_duration() {
        assert_eq!(parse_probe_duration("7.512000\n"), Some(7.512));
        assert_eq!(parse_probe_duration("N/A"), None);
        assert_eq!(parse_probe_duration(""), None);
        assert_eq!(parse_probe_duration("0.0"), None);
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(&PathBuf::from("a/scene1.mp4")), "video/mp4");
        assert_eq!(
            content_type_for(&PathBuf::from("scene1_voiceover.mp3")),
            "audio/mpeg"
        );
        assert_eq!(content_type_for(&PathBuf::from("scene1.PNG")), "image/png");
        assert_eq!(
            content_type_for(&PathBuf::from("noext")),
            "application/octet-stream"
        );
    }
}
