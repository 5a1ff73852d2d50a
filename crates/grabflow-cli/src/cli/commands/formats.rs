//! `grabflow formats <url>` – list selectable formats.

use anyhow::Result;
use grabflow_core::workflow::{Controller, WorkflowStage};

use super::{drive, expect_stage};
use crate::cli::presenter::TerminalPresenter;

pub fn run_formats(controller: &mut Controller<TerminalPresenter>, url: &str) -> Result<()> {
    controller.start(url)?;
    drive(controller);
    expect_stage(controller, WorkflowStage::OptionsAndDownload)?;

    println!(
        "{:<10} {:<6} {:<12} {:<10} {}",
        "ID", "EXT", "RESOLUTION", "SIZE", "CODEC"
    );
    for d in controller.descriptors() {
        println!(
            "{:<10} {:<6} {:<12} {:<10} {}",
            d.id, d.container, d.resolution_label, d.approximate_size, d.codec_note
        );
    }
    Ok(())
}
