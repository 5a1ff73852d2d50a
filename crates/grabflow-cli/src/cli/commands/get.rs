//! `grabflow get <url>` – run the whole workflow non-interactively.

use anyhow::{bail, Result};
use grabflow_core::options::OptionAction;
use grabflow_core::workflow::{Controller, WorkflowStage};

use super::{drive, expect_stage};
use crate::cli::presenter::TerminalPresenter;
use crate::cli::GetArgs;

/// Largest format with a video track (descriptors are sorted largest first).
fn default_video_format(controller: &Controller<TerminalPresenter>) -> Option<String> {
    controller
        .descriptors()
        .iter()
        .find(|d| !d.is_audio_only)
        .map(|d| d.id.clone())
}

pub fn run_get(controller: &mut Controller<TerminalPresenter>, args: &GetArgs) -> Result<()> {
    controller.start(&args.url)?;
    drive(controller);
    expect_stage(controller, WorkflowStage::OptionsAndDownload)?;

    if args.audio {
        controller.apply(OptionAction::AudioOnly(true))?;
    } else {
        let format = match &args.format {
            Some(id) => Some(id.clone()),
            None if args.thumbnail || args.description => None,
            None => default_video_format(controller),
        };
        if let Some(id) = format {
            controller.apply(OptionAction::MergedVideoAudio(true))?;
            controller.select_format(&id)?;
        }
    }
    controller.apply(OptionAction::Thumbnail(args.thumbnail))?;
    controller.apply(OptionAction::Description(args.description))?;

    controller.advance()?;
    drive(controller);
    if controller.current_stage() == WorkflowStage::OptionsAndDownload {
        expect_stage(controller, WorkflowStage::Convert)?;
    }

    if controller.current_stage() == WorkflowStage::Convert {
        controller.apply(OptionAction::VideoCodec(args.video_codec))?;
        controller.apply(OptionAction::VideoContainer(args.container))?;
        controller.apply(OptionAction::ImageContainer(args.image_format))?;
        controller.advance()?;
        drive(controller);
    } else if args.requests_conversion() {
        tracing::warn!("conversion options ignored: nothing to convert for this download");
    }
    expect_stage(controller, WorkflowStage::Finish)?;

    match controller.last_artifact() {
        Some(path) => println!("done: {}", path.display()),
        None => bail!("workflow finished without an artifact"),
    }
    Ok(())
}
