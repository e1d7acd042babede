//! Attaching the caption track to the video.
//!
//! Every video handed to [`Muxer::finalize`] ends up as exactly one file in
//! the output directory: muxed when possible, a plain copy otherwise.

use crate::config::{Config, MuxBackend};
use crate::error::{Result, SubfetchError};
use crate::fetch::VideoArtifact;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Video with the caption attached as the default track.
    Muxed,
    /// Byte-for-byte copy of the downloaded video.
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

pub struct Muxer<'a> {
    config: &'a Config,
}

impl<'a> Muxer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn output_path(&self, video: &VideoArtifact) -> PathBuf {
        self.config.output_dir.join(video.file_name())
    }

    /// mkvmerge arguments. Track options apply to the file that follows them,
    /// so they must sit between the video and the caption path.
    pub fn mkvmerge_args(&self, video: &Path, caption: &Path, output: &Path) -> Vec<String> {
        vec![
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            video.to_string_lossy().into_owned(),
            "--track-name".to_string(),
            format!("0:{}", self.config.track_name),
            "--language".to_string(),
            format!("0:{}", self.config.target_lang),
            "--default-track".to_string(),
            "0:true".to_string(),
            caption.to_string_lossy().into_owned(),
        ]
    }

    /// ffmpeg arguments. Subtitle streams already in the video are not
    /// mapped, so the new caption is subtitle stream 0.
    pub fn ffmpeg_args(&self, video: &Path, caption: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".to_string(), "-i".to_string()];
        args.push(video.to_string_lossy().into_owned());
        args.push("-i".to_string());
        args.push(caption.to_string_lossy().into_owned());
        args.extend(
            [
                "-map", "0:v", "-map", "0:a?", "-map", "1:0", "-c", "copy", "-c:s", "srt",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        args.push("-metadata:s:s:0".to_string());
        args.push(format!("language={}", self.config.target_lang));
        args.push("-metadata:s:s:0".to_string());
        args.push(format!("title={}", self.config.track_name));
        args.push("-disposition:s:0".to_string());
        args.push("default".to_string());
        args.push(output.to_string_lossy().into_owned());
        args
    }

    /// Produce the final artifact for `video`.
    ///
    /// A failed mux is logged and degrades to a copy; only a failed copy is
    /// returned as an error.
    pub async fn finalize(&self, video: &VideoArtifact, caption: Option<&Path>) -> Result<FinalArtifact> {
        let output = self.output_path(video);
        if same_file(&video.path, &output) {
            return Err(SubfetchError::Mux(format!(
                "{} is already in the output directory",
                video.path.display()
            )));
        }

        let Some(caption) = caption else {
            warn!("No captions for {}, copying video as-is", video.file_name());
            copy_video(&video.path, &output)?;
            return Ok(FinalArtifact {
                path: output,
                kind: ArtifactKind::Copied,
            });
        };

        match self.mux(&video.path, caption, &output).await {
            Ok(()) => {
                info!("Muxed captions into {}", output.display());
                Ok(FinalArtifact {
                    path: output,
                    kind: ArtifactKind::Muxed,
                })
            }
            Err(e) => {
                warn!("{}; copying video without captions", e);
                if output.exists() {
                    let _ = fs::remove_file(&output);
                }
                copy_video(&video.path, &output)?;
                Ok(FinalArtifact {
                    path: output,
                    kind: ArtifactKind::Copied,
                })
            }
        }
    }

    async fn mux(&self, video: &Path, caption: &Path, output: &Path) -> Result<()> {
        let program = self.config.mux_tool();
        let args = match self.config.mux_backend {
            MuxBackend::Mkvmerge => self.mkvmerge_args(video, caption, output),
            MuxBackend::Ffmpeg => self.ffmpeg_args(video, caption, output),
        };
        debug!("{} {}", program, args.join(" "));

        let result = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| SubfetchError::Mux(format!("could not start {}: {}", program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stdout = String::from_utf8_lossy(&result.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return Err(SubfetchError::Mux(format!(
                "{} exited with {}: {}",
                program,
                result.status,
                detail.trim()
            )));
        }
        Ok(())
    }
}

/// Copy `video` to `output` unchanged.
pub fn copy_video(video: &Path, output: &Path) -> Result<()> {
    fs::copy(video, output)?;
    info!("Copied {} to {}", video.display(), output.display());
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
