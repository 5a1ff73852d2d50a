#![allow(dead_code)]

pub mod fakes;
pub mod recording;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use grabflow_core::codec::ImageCrateCodec;
use grabflow_core::format::RawFormat;
use grabflow_core::workflow::{Collaborators, Controller, WorkflowSettings};

use fakes::{FakeExtractor, FakeTranscoder};
use recording::RecordingPresenter;

pub const URL: &str = "https://media.example/watch?v=bbb";
pub const TITLE: &str = "Big Buck Bunny (4K)";
pub const STEM: &str = "big-buck-bunny-4k";

/// Generous bound for a fake job to finish.
pub const JOB_TIMEOUT: Duration = Duration::from_secs(10);

pub fn raw(
    id: &str,
    ext: &str,
    note: &str,
    vcodec: &str,
    acodec: &str,
    size: Option<f64>,
) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: Some(ext.to_string()),
        format_note: Some(note.to_string()),
        vcodec: Some(vcodec.to_string()),
        acodec: Some(acodec.to_string()),
        filesize: size,
        filesize_approx: None,
    }
}

/// Three selectable formats plus a storyboard that discovery must drop.
pub fn sample_formats() -> Vec<RawFormat> {
    vec![
        raw("140", "m4a", "medium", "none", "mp4a.40.2", Some(3.0 * 1024.0 * 1024.0)),
        raw("137", "mp4", "1080p", "avc1.640028", "none", Some(250.0 * 1024.0 * 1024.0)),
        raw("sb0", "mhtml", "storyboard", "none", "none", None),
        raw("247", "webm", "720p", "vp9", "none", Some(90.0 * 1024.0 * 1024.0)),
    ]
}

pub fn settings(output_dir: &Path) -> WorkflowSettings {
    WorkflowSettings {
        output_dir: output_dir.to_path_buf(),
        stem_max_len: 100,
        size_jitter: false,
    }
}

pub fn controller(
    output_dir: &Path,
    extractor: Arc<FakeExtractor>,
    transcoder: Arc<FakeTranscoder>,
) -> Controller<RecordingPresenter> {
    Controller::new(
        settings(output_dir),
        Collaborators::new(extractor, Arc::new(ImageCrateCodec), transcoder),
        RecordingPresenter::default(),
    )
}

/// Starts discovery for [`URL`] and waits for it to finish.
pub fn discover(c: &mut Controller<RecordingPresenter>) {
    c.start(URL).expect("start discovery");
    assert!(c.wait_until_idle(JOB_TIMEOUT), "discovery did not finish");
}

/// Small JPEG bytes, as a thumbnail would be written by the extractor.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(16, 9);
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}
