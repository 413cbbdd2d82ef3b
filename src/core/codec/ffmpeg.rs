use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{AudioCodec, CodecError, CodecResult};

/// `ffmpeg`/`ffprobe` backed codec.
#[derive(Debug, Clone)]
pub struct FfmpegCodec {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Default for FfmpegCodec {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegCodec {
    pub fn new(ffmpeg_bin: impl Into<String>, ffprobe_bin: impl Into<String>) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            ffprobe_bin: ffprobe_bin.into(),
        }
    }

    /// Runs `ffmpeg -version` and returns its first output line.
    pub async fn version(&self) -> CodecResult<String> {
        let stdout = run(&self.ffmpeg_bin, &["-version".to_string()]).await?;
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }

    async fn ffmpeg(&self, args: Vec<String>) -> CodecResult<()> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("-y".to_string());
        full.extend(args);
        run(&self.ffmpeg_bin, &full).await.map(|_| ())
    }
}

async fn run(tool: &str, args: &[String]) -> CodecResult<String> {
    debug!("Running {} {}", tool, args.join(" "));

    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| CodecError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr
        };
        return Err(CodecError::Failed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn pcm_output_args(sample_rate_hz: u32, output: &Path) -> [String; 7] {
    [
        "-ac".to_string(),
        "1".to_string(),
        "-ar".to_string(),
        sample_rate_hz.to_string(),
        "-c:a".to_string(),
        "pcm_s16le".to_string(),
        path_arg(output),
    ]
}

fn normalize_args(input: &Path, output: &Path, sample_rate_hz: u32) -> Vec<String> {
    let mut args = vec!["-i".to_string(), path_arg(input)];
    args.extend(pcm_output_args(sample_rate_hz, output));
    args
}

fn silence_args(output: &Path, ms: u64, sample_rate_hz: u32) -> Vec<String> {
    let seconds = format!("{:.3}", ms as f64 / 1000.0);
    let mut args = vec![
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!("anullsrc=r={sample_rate_hz}:cl=mono"),
        "-t".to_string(),
        seconds,
    ];
    args.extend(pcm_output_args(sample_rate_hz, output));
    args
}

fn concat_args(list_path: &Path, output: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(list_path),
        "-c".to_string(),
        "copy".to_string(),
        path_arg(output),
    ]
}

fn mp3_args(input: &Path, output: &Path, bitrate_kbps: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        path_arg(input),
        "-codec:a".to_string(),
        "libmp3lame".to_string(),
        "-b:a".to_string(),
        format!("{bitrate_kbps}k"),
        path_arg(output),
    ]
}

/// Renders the concat demuxer input list, one `file '<path>'` line per part.
///
/// Single quotes inside paths are closed, escaped and reopened (`'\''`).
pub fn concat_list_contents(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'", path_arg(p).replace('\'', r"'\''")))
        .collect::<Vec<_>>()
        .join("\n")
}

fn absolute_parts(parts: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
    parts.iter().map(std::path::absolute).collect()
}

#[async_trait]
impl AudioCodec for FfmpegCodec {
    async fn normalize(
        &self,
        input: &Path,
        output: &Path,
        sample_rate_hz: u32,
    ) -> CodecResult<()> {
        self.ffmpeg(normalize_args(input, output, sample_rate_hz))
            .await
    }

    async fn silence(&self, output: &Path, ms: u64, sample_rate_hz: u32) -> CodecResult<()> {
        self.ffmpeg(silence_args(output, ms, sample_rate_hz)).await
    }

    async fn concat(&self, parts: &[PathBuf], list_path: &Path, output: &Path) -> CodecResult<()> {
        // The demuxer resolves relative entries against the list's own directory.
        let parts = absolute_parts(parts)?;
        tokio::fs::write(list_path, concat_list_contents(&parts)).await?;
        self.ffmpeg(concat_args(list_path, output)).await
    }

    async fn transcode_mp3(
        &self,
        input: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> CodecResult<()> {
        self.ffmpeg(mp3_args(input, output, bitrate_kbps)).await
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        let args = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .iter()
        .map(|s| s.to_string())
        .chain(std::iter::once(path_arg(path)))
        .collect::<Vec<_>>();

        match run(&self.ffprobe_bin, &args).await {
            Ok(stdout) => stdout.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Err(e) => {
                debug!("Duration probe failed for {:?}: {}", path, e);
                None
            }
        }
    }
}
