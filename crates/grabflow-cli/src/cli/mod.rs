//! CLI for the grabflow media workflow.

mod commands;
mod presenter;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use grabflow_core::config::{self, GrabflowConfig};
use grabflow_core::options::{ImageContainer, VideoCodec, VideoContainer};
use grabflow_core::workflow::{Collaborators, Controller, WorkflowSettings};
use std::path::PathBuf;

use commands::{run_formats, run_get};
use presenter::TerminalPresenter;

/// Top-level CLI for grabflow.
#[derive(Debug, Parser)]
#[command(name = "grabflow")]
#[command(about = "grabflow: list, download and convert media with yt-dlp", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the downloadable formats of a URL, largest first.
    Formats {
        /// Page or media URL (http/https).
        url: String,
    },

    /// Download (and optionally convert) media from a URL.
    Get(GetArgs),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Page or media URL (http/https).
    pub url: String,

    /// Format ID to download as merged video+audio (see `grabflow formats`).
    /// Defaults to the largest video format when nothing else is requested.
    #[arg(long, short = 'f', value_name = "ID")]
    pub format: Option<String>,

    /// Download audio only, extracted to mp3.
    #[arg(long, conflicts_with = "format")]
    pub audio: bool,

    /// Also save the thumbnail image.
    #[arg(long)]
    pub thumbnail: bool,

    /// Also save the description text.
    #[arg(long)]
    pub description: bool,

    /// Re-encode the video with this codec (libx264, libx265, vp9, copy).
    #[arg(long, value_name = "CODEC")]
    pub video_codec: Option<VideoCodec>,

    /// Re-encode the video into this container (mp4, mkv, avi, mov, webm).
    #[arg(long, value_name = "CONTAINER")]
    pub container: Option<VideoContainer>,

    /// Convert the thumbnail to this format (png, jpg, webp); needs --thumbnail.
    #[arg(long, value_name = "FORMAT")]
    pub image_format: Option<ImageContainer>,

    /// Write artifacts here instead of the configured output_dir.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

impl GetArgs {
    /// Any of the video codec, container or image format options was given.
    pub fn requests_conversion(&self) -> bool {
        self.video_codec.is_some() || self.container.is_some() || self.image_format.is_some()
    }
}

fn build_controller(
    cfg: &GrabflowConfig,
    output_dir: Option<PathBuf>,
) -> Controller<TerminalPresenter> {
    let mut settings = WorkflowSettings::from(cfg);
    if let Some(dir) = output_dir {
        settings.output_dir = dir;
    }
    Controller::new(
        settings,
        Collaborators::from_config(cfg),
        TerminalPresenter::default(),
    )
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Formats { url } => {
                let mut controller = build_controller(&cfg, None);
                run_formats(&mut controller, &url)?;
            }
            CliCommand::Get(args) => {
                let mut controller = build_controller(&cfg, args.output_dir.clone());
                run_get(&mut controller, &args)?;
            }
        }

        Ok(())
    }
}
