//! In-process stand-ins for yt-dlp and ffmpeg.

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use grabflow_core::control::CancelToken;
use grabflow_core::extractor::{
    AcquireRequest, Extractor, ListedFormats, ProgressSink, TransferProgress,
};
use grabflow_core::format::RawFormat;
use grabflow_core::options::VideoCodec;
use grabflow_core::transcode::VideoTranscoder;

#[derive(Debug, Clone)]
pub enum Acquire {
    /// Reports each byte count against `total`, then writes `<stem>.<ext>` for
    /// every file. Returns the first file when media was requested.
    Succeed {
        steps: Vec<u64>,
        total: u64,
        files: Vec<(String, Vec<u8>)>,
    },
    /// Keeps reporting 25% until cancelled.
    StallUntilCancel,
    Fail(String),
}

impl Acquire {
    pub fn media(ext: &str) -> Self {
        Acquire::Succeed {
            steps: vec![0, 512, 1024],
            total: 1024,
            files: vec![(ext.to_string(), b"media".to_vec())],
        }
    }
}

pub struct FakeExtractor {
    title: Option<String>,
    formats: Vec<RawFormat>,
    list_error: Option<String>,
    list_stalls: bool,
    acquire: Acquire,
    requests: Mutex<Vec<AcquireRequest>>,
}

impl FakeExtractor {
    pub fn new(title: Option<&str>, formats: Vec<RawFormat>, acquire: Acquire) -> Self {
        Self {
            title: title.map(str::to_string),
            formats,
            list_error: None,
            list_stalls: false,
            acquire,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_listing(msg: &str) -> Self {
        let mut fake = Self::new(None, Vec::new(), Acquire::Fail("unused".into()));
        fake.list_error = Some(msg.to_string());
        fake
    }

    /// Listing blocks until its token is cancelled.
    pub fn stalling_listing() -> Self {
        let mut fake = Self::new(None, Vec::new(), Acquire::Fail("unused".into()));
        fake.list_stalls = true;
        fake
    }

    pub fn requests(&self) -> Vec<AcquireRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Extractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake"
    }

    fn list_formats(&self, _url: &str, cancel: &CancelToken) -> Result<ListedFormats> {
        while self.list_stalls {
            cancel.check()?;
            thread::sleep(Duration::from_millis(5));
        }
        if let Some(msg) = &self.list_error {
            bail!("{msg}");
        }
        Ok(ListedFormats {
            title: self.title.clone(),
            formats: self.formats.clone(),
        })
    }

    fn acquire(
        &self,
        request: &AcquireRequest,
        progress: &mut ProgressSink<'_>,
        cancel: &CancelToken,
    ) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.acquire {
            Acquire::Succeed {
                steps,
                total,
                files,
            } => {
                for step in steps {
                    progress(TransferProgress {
                        downloaded_bytes: *step,
                        total_bytes: Some(*total),
                        total_bytes_estimate: None,
                    })?;
                }
                let mut written = Vec::new();
                for (ext, bytes) in files {
                    let path = request
                        .output_dir
                        .join(format!("{}.{}", request.plan.stem, ext));
                    fs::write(&path, bytes)?;
                    written.push(path);
                }
                if request.plan.selection.downloads_media() {
                    Ok(written.into_iter().next().unwrap_or_else(|| request.stem_path()))
                } else {
                    Ok(request.stem_path())
                }
            }
            Acquire::StallUntilCancel => loop {
                cancel.check()?;
                progress(TransferProgress {
                    downloaded_bytes: 25,
                    total_bytes: None,
                    total_bytes_estimate: Some(100),
                })?;
                thread::sleep(Duration::from_millis(5));
            },
            Acquire::Fail(msg) => bail!("{msg}"),
        }
    }
}

/// Copies the source to the target and records each call.
#[derive(Default)]
pub struct FakeTranscoder {
    stalls: bool,
    calls: Mutex<Vec<(PathBuf, PathBuf, Option<VideoCodec>)>>,
}

impl FakeTranscoder {
    /// Records the call, then blocks until its token is cancelled.
    pub fn stalling() -> Self {
        Self {
            stalls: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(PathBuf, PathBuf, Option<VideoCodec>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl VideoTranscoder for FakeTranscoder {
    fn transcode(
        &self,
        source: &Path,
        target: &Path,
        codec: Option<VideoCodec>,
        cancel: &CancelToken,
    ) -> Result<()> {
        cancel.check()?;
        self.calls
            .lock()
            .unwrap()
            .push((source.to_path_buf(), target.to_path_buf(), codec));
        while self.stalls {
            cancel.check()?;
            thread::sleep(Duration::from_millis(5));
        }
        fs::copy(source, target)?;
        Ok(())
    }
}
