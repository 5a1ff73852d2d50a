//! Workflow controller: the stage machine that sequences the three jobs.
//!
//! The controller owns all workflow state and the single active job. Workers
//! never touch that state; they send [`JobEvent`]s over a channel which the
//! owning thread drains with [`Controller::poll_events`] or
//! [`Controller::wait_for_event`], and [`Controller::on_job_event`] applies
//! each one. Events from a job that is no longer active (cancelled by
//! `reset`) are dropped by id.

mod presenter;
mod stage;

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::codec::{ImageCodec, ImageCrateCodec};
use crate::config::GrabflowConfig;
use crate::error::WorkflowError;
use crate::extractor::{Extractor, YtDlp};
use crate::format::FormatDescriptor;
use crate::job::{
    self, AcquisitionJob, ConversionJob, DiscoveryJob, Job, JobEvent, JobEventKind, JobHandle,
    JobId, JobKind, JobOutput,
};
use crate::options::{derive_stem, reduce, OptionAction, TargetKind, WorkflowOptions};
use crate::transcode::{Ffmpeg, VideoTranscoder};

pub use presenter::{NullPresenter, Presenter};
pub use stage::WorkflowStage;

/// Per-controller settings, normally taken from [`GrabflowConfig`].
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub output_dir: PathBuf,
    pub stem_max_len: usize,
    pub size_jitter: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from(&GrabflowConfig::default())
    }
}

impl From<&GrabflowConfig> for WorkflowSettings {
    fn from(cfg: &GrabflowConfig) -> Self {
        Self {
            output_dir: cfg.output_dir.clone(),
            stem_max_len: cfg.stem_max_len,
            size_jitter: cfg.size_jitter,
        }
    }
}

/// External engines the jobs call into.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn Extractor>,
    pub image_codec: Arc<dyn ImageCodec>,
    pub transcoder: Arc<dyn VideoTranscoder>,
}

impl Collaborators {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        image_codec: Arc<dyn ImageCodec>,
        transcoder: Arc<dyn VideoTranscoder>,
    ) -> Self {
        Self {
            extractor,
            image_codec,
            transcoder,
        }
    }

    /// yt-dlp, the `image` crate and ffmpeg, with program paths from config.
    pub fn from_config(cfg: &GrabflowConfig) -> Self {
        Self::new(
            Arc::new(YtDlp::new(cfg.tools.yt_dlp.clone())),
            Arc::new(ImageCrateCodec),
            Arc::new(Ffmpeg::new(cfg.tools.ffmpeg.clone())),
        )
    }
}

fn parse_source_url(raw: &str) -> Result<String, WorkflowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(WorkflowError::validation("enter a URL"));
    }
    let url = url::Url::parse(raw)
        .map_err(|e| WorkflowError::validation(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(WorkflowError::validation(format!(
            "unsupported URL scheme '{other}' (expected http or https)"
        ))),
    }
}

pub struct Controller<P: Presenter = NullPresenter> {
    settings: WorkflowSettings,
    collaborators: Collaborators,
    presenter: P,
    stage: WorkflowStage,
    url: Option<String>,
    title: Option<String>,
    stem: Option<String>,
    descriptors: Vec<FormatDescriptor>,
    options: Option<WorkflowOptions>,
    /// Options snapshot the last acquisition was dispatched with.
    dispatched: Option<WorkflowOptions>,
    media_path: Option<PathBuf>,
    last_artifact: Option<PathBuf>,
    active: Option<JobHandle>,
    next_job_id: JobId,
    events_tx: Sender<JobEvent>,
    events_rx: Receiver<JobEvent>,
}

impl<P: Presenter> Controller<P> {
    pub fn new(settings: WorkflowSettings, collaborators: Collaborators, presenter: P) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            settings,
            collaborators,
            presenter,
            stage: WorkflowStage::UrlInput,
            url: None,
            title: None,
            stem: None,
            descriptors: Vec::new(),
            options: None,
            dispatched: None,
            media_path: None,
            last_artifact: None,
            active: None,
            next_job_id: 1,
            events_tx,
            events_rx,
        }
    }

    pub fn current_stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn descriptors(&self) -> &[FormatDescriptor] {
        &self.descriptors
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn stem(&self) -> Option<&str> {
        self.stem.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn options(&self) -> Option<&WorkflowOptions> {
        self.options.as_ref()
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// Most recent file produced by an acquisition or conversion.
    pub fn last_artifact(&self) -> Option<&Path> {
        self.last_artifact.as_deref()
    }

    pub fn active_job(&self) -> Option<&JobHandle> {
        self.active.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.active.as_ref().is_some_and(JobHandle::is_running)
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Validates `url` and dispatches format discovery for it.
    pub fn start(&mut self, url: &str) -> Result<JobId, WorkflowError> {
        if self.stage != WorkflowStage::UrlInput {
            return self.reject(WorkflowError::validation(format!(
                "a URL can only be started from the {} stage (currently {})",
                WorkflowStage::UrlInput,
                self.stage
            )));
        }
        if self.is_busy() {
            return self.reject(WorkflowError::validation("a job is already running"));
        }
        let url = match parse_source_url(url) {
            Ok(url) => url,
            Err(e) => return self.reject(e),
        };

        self.clear_pass();
        self.url = Some(url.clone());
        let job = DiscoveryJob::new(
            url,
            Arc::clone(&self.collaborators.extractor),
            self.settings.size_jitter,
        );
        self.dispatch(Box::new(job))
    }

    /// Moves forward from the current stage, dispatching that stage's job when
    /// it has one. Returns the dispatched job's id, or `None` for a plain
    /// transition.
    pub fn advance(&mut self) -> Result<Option<JobId>, WorkflowError> {
        if self.is_busy() {
            return self.reject(WorkflowError::validation(
                "wait for the running job to finish or cancel it",
            ));
        }
        match self.stage {
            WorkflowStage::UrlInput => {
                if self.descriptors.is_empty() || self.stem.is_none() {
                    return self.reject(WorkflowError::validation(
                        "no formats discovered yet; start with a URL",
                    ));
                }
                self.enter(WorkflowStage::OptionsAndDownload);
                Ok(None)
            }
            WorkflowStage::OptionsAndDownload => self.dispatch_acquisition().map(Some),
            WorkflowStage::Convert => {
                let wants_conversion = self
                    .options
                    .as_ref()
                    .is_some_and(WorkflowOptions::wants_conversion);
                if wants_conversion {
                    self.dispatch_conversion().map(Some)
                } else {
                    tracing::info!("conversion skipped");
                    self.enter(WorkflowStage::Finish);
                    Ok(None)
                }
            }
            WorkflowStage::Finish => self.reject(WorkflowError::validation(
                "the workflow is finished; reset to start over",
            )),
        }
    }

    /// Goes back exactly one stage, keeping everything gathered so far.
    pub fn back(&mut self) -> Result<(), WorkflowError> {
        if self.is_busy() {
            return self.reject(WorkflowError::validation(
                "cannot go back while a job is running",
            ));
        }
        let Some(previous) = self.stage.previous() else {
            return self.reject(WorkflowError::validation("already at the first stage"));
        };
        self.enter(previous);
        Ok(())
    }

    /// Cancels any running job without waiting for it, discards all state and
    /// returns to the first stage.
    pub fn reset(&mut self) {
        if let Some(handle) = self.active.take() {
            if handle.cancel() {
                tracing::info!(job_id = handle.id(), kind = %handle.kind(), "cancelled by reset");
            }
        }
        self.clear_pass();
        self.enter(WorkflowStage::UrlInput);
    }

    /// Requests cancellation of the running job. The job ends with a
    /// Cancelled event once it notices.
    pub fn cancel(&mut self) -> bool {
        match self.active.as_ref() {
            Some(handle) if handle.cancel() => {
                tracing::info!(
                    job_id = handle.id(),
                    kind = %handle.kind(),
                    "cancellation requested"
                );
                true
            }
            _ => false,
        }
    }

    /// Feeds one user selection through the option reducer.
    pub fn apply(&mut self, action: OptionAction) -> Result<(), WorkflowError> {
        if self.is_busy() {
            return self.reject(WorkflowError::validation(
                "options are locked while a job is running",
            ));
        }
        let allowed = match self.stage {
            WorkflowStage::OptionsAndDownload => true,
            WorkflowStage::Convert => action.is_conversion(),
            _ => false,
        };
        if !allowed {
            return self.reject(WorkflowError::validation(format!(
                "that option cannot be changed on the {} stage",
                self.stage
            )));
        }
        let Some(current) = self.options.as_ref() else {
            return self.reject(WorkflowError::validation("no formats discovered yet"));
        };
        let next = reduce(current, action);
        tracing::debug!(target_kind = next.target.as_str(), "options updated");
        self.options = Some(next);
        Ok(())
    }

    /// Selects a discovered format by id for merged video+audio.
    pub fn select_format(&mut self, id: &str) -> Result<(), WorkflowError> {
        let Some(descriptor) = self.descriptors.iter().find(|d| d.id == id).cloned() else {
            return self.reject(WorkflowError::validation(format!("unknown format id '{id}'")));
        };
        if descriptor.is_audio_only {
            return self.reject(WorkflowError::validation(format!(
                "format '{id}' is audio only; choose audio only instead of video+audio"
            )));
        }
        let target = self.options.as_ref().map(|o| o.target);
        if target != Some(TargetKind::MergedVideoAudio) {
            return self.reject(WorkflowError::validation(
                "choose video+audio before selecting a format",
            ));
        }
        self.apply(OptionAction::SelectFormat(Some(descriptor)))
    }

    /// Applies one job event: progress is forwarded, a terminal event for the
    /// active job drives the stage transition.
    pub fn on_job_event(&mut self, event: JobEvent) {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|h| h.id() == event.job_id && h.is_running());
        if !is_active {
            tracing::debug!(job_id = event.job_id, kind = %event.kind, "dropping stale job event");
            return;
        }

        let Some(state) = event.payload.terminal_state() else {
            if let JobEventKind::Progress(percent) = event.payload {
                self.presenter.progress(event.kind, percent);
            }
            return;
        };
        if let Some(mut handle) = self.active.take() {
            handle.mark_terminal(state);
        }

        match event.payload {
            JobEventKind::Progress(_) => {}
            JobEventKind::Succeeded(output) => self.on_success(output),
            JobEventKind::Failed(err) => {
                tracing::warn!(kind = %event.kind, stage = %self.stage, "{err}");
                self.presenter.job_failed(event.kind, &err);
            }
            JobEventKind::Cancelled => {
                tracing::info!(kind = %event.kind, stage = %self.stage, "job cancelled");
                self.presenter.job_cancelled(event.kind);
            }
        }
    }

    /// Applies every event already queued. Returns how many were applied.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.on_job_event(event);
            applied += 1;
        }
        applied
    }

    /// Blocks up to `timeout` for the next event, then drains the queue.
    /// Returns `false` if nothing arrived.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.on_job_event(event);
                self.poll_events();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Applies events until no job is running. Returns `false` on timeout.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            self.wait_for_event(remaining);
        }
        true
    }

    fn on_success(&mut self, output: JobOutput) {
        match output {
            JobOutput::Discovered { title, descriptors } => {
                if descriptors.is_empty() {
                    let err = WorkflowError::validation(format!(
                        "no downloadable formats found for '{title}'"
                    ));
                    tracing::warn!("{err}");
                    self.presenter.rejected(&err);
                    return;
                }
                let stem = derive_stem(&title, self.settings.stem_max_len);
                tracing::info!(%title, %stem, formats = descriptors.len(), "ready for options");
                self.presenter.formats_ready(&title, &descriptors);
                self.options = Some(WorkflowOptions::new(stem.clone()));
                self.title = Some(title);
                self.stem = Some(stem);
                self.descriptors = descriptors;
                self.enter(WorkflowStage::OptionsAndDownload);
            }
            JobOutput::Acquired { path } => {
                self.presenter.artifact_ready(JobKind::Acquisition, &path);
                let dispatched = self.dispatched.as_ref();
                let downloaded_media = dispatched.is_some_and(|o| o.target.downloads_media());
                let convert_next = dispatched.is_some_and(WorkflowOptions::enters_convert_stage);
                self.media_path = downloaded_media.then(|| path.clone());
                self.last_artifact = Some(path);
                if convert_next {
                    self.enter(WorkflowStage::Convert);
                } else {
                    self.enter(WorkflowStage::Finish);
                }
            }
            JobOutput::Converted { artifacts } => {
                for path in &artifacts {
                    self.presenter.artifact_ready(JobKind::Conversion, path);
                }
                if let Some(last) = artifacts.into_iter().last() {
                    self.last_artifact = Some(last);
                }
                self.enter(WorkflowStage::Finish);
            }
        }
    }

    fn dispatch_acquisition(&mut self) -> Result<JobId, WorkflowError> {
        let (Some(url), Some(options)) = (self.url.clone(), self.options.clone()) else {
            return self.reject(WorkflowError::validation("no formats discovered yet"));
        };
        let job = match AcquisitionJob::new(
            url,
            &options,
            self.settings.output_dir.clone(),
            Arc::clone(&self.collaborators.extractor),
        ) {
            Ok(job) => job,
            Err(e) => return self.reject(e),
        };
        self.dispatched = Some(options);
        self.media_path = None;
        self.dispatch(Box::new(job))
    }

    fn dispatch_conversion(&mut self) -> Result<JobId, WorkflowError> {
        let Some(options) = self.options.as_ref() else {
            return self.reject(WorkflowError::validation("no options to convert with"));
        };
        let job = ConversionJob::new(
            options,
            self.settings.output_dir.clone(),
            self.media_path.clone(),
            Arc::clone(&self.collaborators.image_codec),
            Arc::clone(&self.collaborators.transcoder),
        );
        self.dispatch(Box::new(job))
    }

    fn dispatch(&mut self, job: Box<dyn Job>) -> Result<JobId, WorkflowError> {
        let kind = job.kind();
        let id = self.next_job_id;
        self.next_job_id += 1;
        match job::spawn(id, job, self.events_tx.clone()) {
            Ok(handle) => {
                self.active = Some(handle);
                Ok(id)
            }
            Err(e) => {
                let err = kind.failure(format!("could not start worker thread: {e}"));
                tracing::error!("{err}");
                self.presenter.job_failed(kind, &err);
                Err(err)
            }
        }
    }

    fn clear_pass(&mut self) {
        self.url = None;
        self.title = None;
        self.stem = None;
        self.descriptors.clear();
        self.options = None;
        self.dispatched = None;
        self.media_path = None;
        self.last_artifact = None;
    }

    fn enter(&mut self, to: WorkflowStage) {
        let from = self.stage;
        if from == to {
            return;
        }
        tracing::info!(%from, %to, "stage changed");
        self.stage = to;
        self.presenter.stage_changed(from, to);
    }

    fn reject<T>(&mut self, err: WorkflowError) -> Result<T, WorkflowError> {
        tracing::warn!(stage = %self.stage, "rejected: {err}");
        self.presenter.rejected(&err);
        Err(err)
    }
}
