//! External audio extractor (yt-dlp)

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Retry count handed to the extractor for downloads
pub const DOWNLOAD_RETRIES: u32 = 3;

/// Metadata returned without fetching any media bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub duration_seconds: u64,
}

/// Result of a completed download. `file_path` is what the extractor
/// reported and may not exist if it lied about success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAudio {
    pub metadata: VideoMetadata,
    pub file_path: PathBuf,
}

/// The two operations the dashboard needs from an extractor.
/// Failures are arbitrary message strings.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, String>;

    async fn download_audio(&self, url: &str, output_template: &str) -> Result<DownloadedAudio, String>;
}

/// Subset of yt-dlp's info JSON we care about
#[derive(Debug, Deserialize)]
struct InfoJson {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    /// Set when the JSON is dumped alongside a real download
    filename: Option<String>,
    #[serde(rename = "_filename")]
    legacy_filename: Option<String>,
}

impl InfoJson {
    fn target_path(&self) -> Option<PathBuf> {
        self.filename
            .as_ref()
            .or(self.legacy_filename.as_ref())
            .filter(|name| !name.is_empty())
            .map(PathBuf::from)
    }

    fn into_metadata(self, fallback_id: &str) -> VideoMetadata {
        VideoMetadata {
            video_id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| fallback_id.to_string()),
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            duration_seconds: self.duration.map(|d| d.max(0.0) as u64).unwrap_or(0),
        }
    }
}

/// Parse the output of `--dump-single-json`
pub fn parse_metadata(json: &str, fallback_id: &str) -> Result<VideoMetadata, String> {
    let info: InfoJson =
        serde_json::from_str(json).map_err(|e| format!("Failed to read video metadata: {}", e))?;
    Ok(info.into_metadata(fallback_id))
}

/// Parse the info JSON printed by a real download (`--dump-json --no-simulate`)
pub fn parse_download(json: &str, fallback_id: &str) -> Result<DownloadedAudio, String> {
    let info: InfoJson =
        serde_json::from_str(json).map_err(|e| format!("Unexpected yt-dlp output: {}", e))?;
    let file_path = info
        .target_path()
        .ok_or_else(|| "yt-dlp did not report a file path".to_string())?;
    Ok(DownloadedAudio {
        metadata: info.into_metadata(fallback_id),
        file_path,
    })
}

/// Last non-empty line of process output
fn last_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_string)
}

fn stderr_message(stderr: &[u8]) -> String {
    last_line(stderr).unwrap_or_else(|| "yt-dlp exited with an error".to_string())
}

/// Extractor backed by the `yt-dlp` command line tool
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: String,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, String> {
        debug!("Running {} {:?}", self.binary, args);

        let output = Command::new(&self.binary)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.binary, e))?;

        if !output.status.success() {
            return Err(stderr_message(&output.stderr));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl AudioExtractor for YtDlpExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata, String> {
        let stdout = self
            .run(&[
                "--dump-single-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                url,
            ])
            .await?;

        let fallback = super::youtube_url::extract_video_id(url).unwrap_or_default();
        parse_metadata(&String::from_utf8_lossy(&stdout), &fallback)
    }

    async fn download_audio(&self, url: &str, output_template: &str) -> Result<DownloadedAudio, String> {
        let retries = DOWNLOAD_RETRIES.to_string();

        let stdout = self
            .run(&[
                "--format",
                "bestaudio/best",
                "--output",
                output_template,
                "--no-part",
                "--retries",
                &retries,
                "--no-playlist",
                "--no-warnings",
                "--dump-json",
                "--no-simulate",
                url,
            ])
            .await?;

        let json = last_line(&stdout).ok_or_else(|| "yt-dlp produced no output".to_string())?;
        let fallback = super::youtube_url::extract_video_id(url).unwrap_or_default();
        parse_download(&json, &fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_reads_id_title_duration() {
        let json = r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","duration":212.0,"ext":"webm"}"#;
        let meta = parse_metadata(json, "fallback").unwrap();
        assert_eq!(meta.video_id, "dQw4w9WgXcQ");
        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.duration_seconds, 212);
    }

    #[test]
    fn metadata_falls_back_on_missing_fields() {
        let meta = parse_metadata(r#"{"title":"","duration":null}"#, "dQw4w9WgXcQ").unwrap();
        assert_eq!(meta.video_id, "dQw4w9WgXcQ");
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.duration_seconds, 0);
    }

    #[test]
    fn metadata_rejects_non_json() {
        assert!(parse_metadata("ERROR: private video", "x").is_err());
    }

    #[test]
    fn download_reads_target_filename() {
        let json = r#"{"id":"dQw4w9WgXcQ","title":"T","duration":3.5,"_filename":"/cache/dQw4w9WgXcQ.webm"}"#;
        let audio = parse_download(json, "x").unwrap();
        assert_eq!(audio.file_path, PathBuf::from("/cache/dQw4w9WgXcQ.webm"));
        assert_eq!(audio.metadata.duration_seconds, 3);

        let json = r#"{"id":"dQw4w9WgXcQ","filename":"/cache/dQw4w9WgXcQ.m4a"}"#;
        assert_eq!(
            parse_download(json, "x").unwrap().file_path,
            PathBuf::from("/cache/dQw4w9WgXcQ.m4a")
        );
    }

    #[test]
    fn download_without_filename_is_an_error() {
        assert!(parse_download(r#"{"id":"dQw4w9WgXcQ"}"#, "x").is_err());
    }

    #[test]
    fn last_line_skips_blank_trailer() {
        assert_eq!(
            last_line(b"[info] something\n{\"id\":\"x\"}\n\n"),
            Some("{\"id\":\"x\"}".to_string())
        );
        assert_eq!(last_line(b"   \n"), None);
    }

    #[tokio::test]
    async fn missing_binary_is_a_message_not_a_panic() {
        let extractor = YtDlpExtractor::new("/nonexistent/yt-dlp-binary");
        let err = extractor
            .fetch_metadata("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap_err();
        assert!(err.starts_with("Failed to execute"));
    }
}
