//! Video re-encode collaborator.
//!
//! The default [`Ffmpeg`] writes to a staging sibling first and renames it
//! over the target on success, so re-encoding in place never leaves a
//! half-written file under the final name.

use anyhow::{bail, Context, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::control::CancelToken;
use crate::options::VideoCodec;
use crate::process::{command, run_with_cancel, stderr_tail};

pub trait VideoTranscoder: Send + Sync {
    /// Re-encodes `source` into `target`; the container follows `target`'s
    /// extension. `None` codec lets the transcoder pick per container.
    fn transcode(
        &self,
        source: &Path,
        target: &Path,
        codec: Option<VideoCodec>,
        cancel: &CancelToken,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    program: String,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Ffmpeg {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// `<dir>/<stem>.converting.<ext>` next to `target`.
pub fn staging_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{stem}.converting.{}", ext.to_string_lossy()),
        None => format!("{stem}.converting"),
    };
    target.with_file_name(name)
}

pub fn transcode_args(source: &Path, output: &Path, codec: Option<VideoCodec>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-nostdin", "-y", "-loglevel", "error", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(source.as_os_str().to_owned());
    match codec {
        Some(VideoCodec::Copy) => {
            args.push("-c".into());
            args.push("copy".into());
        }
        Some(codec) => {
            args.push("-c:v".into());
            args.push(codec.as_str().into());
        }
        None => {}
    }
    args.push(output.as_os_str().to_owned());
    args
}

impl VideoTranscoder for Ffmpeg {
    fn transcode(
        &self,
        source: &Path,
        target: &Path,
        codec: Option<VideoCodec>,
        cancel: &CancelToken,
    ) -> Result<()> {
        let staging = staging_path(target);
        let args = transcode_args(source, &staging, codec);
        tracing::debug!(program = %self.program, ?args, "transcoding");

        let result = run_with_cancel(command(&self.program).args(&args), cancel).and_then(|out| {
            if out.status.success() {
                Ok(())
            } else {
                bail!(
                    "{} exited with {}: {}",
                    self.program,
                    out.status,
                    stderr_tail(&out.stderr)
                )
            }
        });
        if let Err(e) = result {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, target).with_context(|| {
            format!("move {} to {}", staging.display(), target.display())
        })?;
        Ok(())
    }
}
