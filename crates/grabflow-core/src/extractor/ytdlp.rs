//! Default extractor: drives the `yt-dlp` executable.
//!
//! Discovery runs a simulate-only JSON dump. Acquisition streams stdout,
//! where a progress template emits one machine-readable line per update.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use super::{AcquireRequest, Extractor, ListedFormats, ProgressSink, TransferProgress};
use crate::control::CancelToken;
use crate::options::{FormatSelection, PostProcessor};
use crate::process::{command, run_streaming, run_with_cancel, stderr_tail};

const PROGRESS_PREFIX: &str = "grabflow:progress:";
const PROGRESS_TEMPLATE: &str = concat!(
    "download:grabflow:progress:",
    "%(progress.downloaded_bytes)s:",
    "%(progress.total_bytes)s:",
    "%(progress.total_bytes_estimate)s"
);

/// Extensions the tool writes for side artifacts; never the media itself.
const SIDE_ARTIFACT_EXTENSIONS: &[&str] = &[
    "description",
    "webp",
    "jpg",
    "jpeg",
    "png",
    "part",
    "ytdl",
];

#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

pub fn list_args(url: &str) -> Vec<String> {
    vec![
        "--dump-single-json".to_string(),
        "--simulate".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        url.to_string(),
    ]
}

/// Full argument list for one acquisition.
pub fn acquire_args(request: &AcquireRequest) -> Vec<String> {
    let plan = &request.plan;
    let mut args = vec![
        "--no-playlist".to_string(),
        "--newline".to_string(),
        "--no-warnings".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        "-o".to_string(),
        request.output_template().to_string_lossy().into_owned(),
    ];

    match &plan.selection {
        FormatSelection::Expression(expr) => {
            args.push("-f".to_string());
            args.push(expr.clone());
        }
        FormatSelection::NoMedia => args.push("--skip-download".to_string()),
    }

    for step in &plan.processing {
        match step {
            PostProcessor::ConvertContainer { container } => {
                args.push("--recode-video".to_string());
                args.push(container.clone());
            }
            PostProcessor::ExtractAudio {
                codec,
                quality_kbps,
            } => {
                args.push("-x".to_string());
                args.push("--audio-format".to_string());
                args.push(codec.clone());
                args.push("--audio-quality".to_string());
                args.push(format!("{quality_kbps}K"));
            }
        }
    }

    if plan.write_thumbnail {
        args.push("--write-thumbnail".to_string());
    }
    if plan.write_description {
        args.push("--write-description".to_string());
    }

    args.push(request.url.clone());
    args
}

fn parse_count(field: &str) -> Option<u64> {
    let value: f64 = field.trim().parse().ok()?;
    (value.is_finite() && value >= 0.0).then(|| value as u64)
}

/// Parses one line printed through the progress template; `None` for anything else.
pub fn parse_progress_line(line: &str) -> Option<TransferProgress> {
    let rest = line.trim().strip_prefix(PROGRESS_PREFIX)?;
    let mut fields = rest.split(':');
    let downloaded_bytes = parse_count(fields.next()?)?;
    let total_bytes = fields.next().and_then(parse_count);
    let total_bytes_estimate = fields.next().and_then(parse_count);
    Some(TransferProgress {
        downloaded_bytes,
        total_bytes,
        total_bytes_estimate,
    })
}

/// Where the media lands once the processing chain has run.
fn expected_media_path(request: &AcquireRequest) -> Option<PathBuf> {
    let ext = match request.plan.processing.last()? {
        PostProcessor::ConvertContainer { container } => container,
        PostProcessor::ExtractAudio { codec, .. } => codec,
    };
    Some(request.output_dir.join(format!("{}.{}", request.plan.stem, ext)))
}

/// Any `<stem>.<ext>` in `dir` that is not a side artifact.
fn scan_for_media(dir: &Path, stem: &str) -> Option<PathBuf> {
    let prefix = format!("{stem}.");
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| {
            let Some(name) = p.file_name().and_then(|n| n.to_str()) else {
                return false;
            };
            let Some(ext) = name.strip_prefix(&prefix) else {
                return false;
            };
            !ext.contains('.') && !SIDE_ARTIFACT_EXTENSIONS.contains(&ext)
        })
}

impl Extractor for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn list_formats(&self, url: &str, cancel: &CancelToken) -> Result<ListedFormats> {
        let args = list_args(url);
        tracing::debug!(program = %self.program, ?args, "listing formats");
        let output = run_with_cancel(command(&self.program).args(&args), cancel)?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr_tail(&output.stderr)
            );
        }
        let listed: ListedFormats = serde_json::from_slice(&output.stdout)
            .with_context(|| format!("parse {} JSON output", self.program))?;
        Ok(listed)
    }

    fn acquire(
        &self,
        request: &AcquireRequest,
        progress: &mut ProgressSink<'_>,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        let args = acquire_args(request);
        tracing::debug!(program = %self.program, ?args, "acquiring");

        let exit = run_streaming(command(&self.program).args(&args), cancel, &mut |line| {
            match parse_progress_line(line) {
                Some(p) => progress(p),
                None => {
                    tracing::trace!(line, "yt-dlp");
                    Ok(())
                }
            }
        })?;
        if !exit.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                exit.status,
                stderr_tail(&exit.stderr)
            );
        }

        if !request.plan.selection.downloads_media() {
            return Ok(request.stem_path());
        }
        let path = expected_media_path(request)
            .filter(|p| p.is_file())
            .or_else(|| scan_for_media(&request.output_dir, &request.plan.stem))
            .unwrap_or_else(|| request.stem_path());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{AcquisitionPlan, TargetKind};

    fn request(selection: FormatSelection, processing: Vec<PostProcessor>) -> AcquireRequest {
        AcquireRequest {
            url: "https://example.com/watch?v=abc".to_string(),
            plan: AcquisitionPlan {
                target: TargetKind::MergedVideoAudio,
                selection,
                processing,
                write_description: false,
                write_thumbnail: false,
                stem: "my-clip".to_string(),
            },
            output_dir: PathBuf::from("/tmp/out"),
        }
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn merged_request_args() {
        let req = request(
            FormatSelection::Expression("bestvideo+bestaudio".to_string()),
            vec![PostProcessor::ConvertContainer {
                container: "mkv".to_string(),
            }],
        );
        let args = acquire_args(&req);
        assert!(has_pair(&args, "-f", "bestvideo+bestaudio"));
        assert!(has_pair(&args, "--recode-video", "mkv"));
        assert!(has_pair(&args, "-o", "/tmp/out/my-clip.%(ext)s"));
        assert_eq!(args.last().unwrap(), "https://example.com/watch?v=abc");
        assert!(!args.contains(&"--skip-download".to_string()));
    }

    #[test]
    fn audio_request_args() {
        let req = request(
            FormatSelection::Expression("bestaudio/best".to_string()),
            vec![PostProcessor::ExtractAudio {
                codec: "mp3".to_string(),
                quality_kbps: 192,
            }],
        );
        let args = acquire_args(&req);
        assert!(args.contains(&"-x".to_string()));
        assert!(has_pair(&args, "--audio-format", "mp3"));
        assert!(has_pair(&args, "--audio-quality", "192K"));
    }

    #[test]
    fn side_artifact_request_skips_download() {
        let mut req = request(FormatSelection::NoMedia, Vec::new());
        req.plan.write_thumbnail = true;
        req.plan.write_description = true;
        let args = acquire_args(&req);
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(args.contains(&"--write-description".to_string()));
        assert!(!args.contains(&"-f".to_string()));
    }

    #[test]
    fn parses_template_lines() {
        let p = parse_progress_line("grabflow:progress:1024:4096:NA").unwrap();
        assert_eq!(p.downloaded_bytes, 1024);
        assert_eq!(p.total_bytes, Some(4096));
        assert_eq!(p.total_bytes_estimate, None);

        let p = parse_progress_line("grabflow:progress:10:NA:2000.5").unwrap();
        assert_eq!(p.total_bytes, None);
        assert_eq!(p.total_bytes_estimate, Some(2000));
        assert_eq!(p.percent(), Some(0));
    }

    #[test]
    fn ignores_other_output() {
        assert!(parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(parse_progress_line("grabflow:progress:NA:NA:NA").is_none());
    }

    #[test]
    fn media_path_follows_processing_chain() {
        let req = request(
            FormatSelection::Expression("x".to_string()),
            vec![PostProcessor::ConvertContainer {
                container: "mp4".to_string(),
            }],
        );
        assert_eq!(
            expected_media_path(&req),
            Some(PathBuf::from("/tmp/out/my-clip.mp4"))
        );
    }

    #[test]
    fn scan_skips_side_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my-clip.webp"), b"t").unwrap();
        std::fs::write(dir.path().join("my-clip.description"), b"d").unwrap();
        assert!(scan_for_media(dir.path(), "my-clip").is_none());
        std::fs::write(dir.path().join("my-clip.mkv"), b"m").unwrap();
        assert_eq!(
            scan_for_media(dir.path(), "my-clip"),
            Some(dir.path().join("my-clip.mkv"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn listing_stops_when_cancelled() {
        use crate::control::JobAborted;
        use std::os::unix::fs::PermissionsExt;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-yt-dlp");
        std::fs::write(&script, "#!/bin/sh\nsleep 30\necho '{}'\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ytdlp = YtDlp::new(script.to_string_lossy());
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            trigger.cancel();
        });
        let started = Instant::now();
        let err = ytdlp
            .list_formats("https://example.com/watch?v=abc", &cancel)
            .unwrap_err();
        canceller.join().unwrap();
        assert!(err.downcast_ref::<JobAborted>().is_some(), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
