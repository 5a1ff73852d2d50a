//! CLI command handlers, one file per command.

mod formats;
mod get;

use anyhow::{anyhow, Result};
use grabflow_core::workflow::{Controller, WorkflowStage};
use std::time::Duration;

use super::presenter::TerminalPresenter;

pub use formats::run_formats;
pub use get::run_get;

const EVENT_WAIT: Duration = Duration::from_millis(250);

/// Applies job events until the controller is idle.
fn drive(controller: &mut Controller<TerminalPresenter>) {
    while controller.is_busy() {
        controller.wait_for_event(EVENT_WAIT);
    }
}

/// Errors unless the controller reached `expected`, preferring the reported cause.
fn expect_stage(
    controller: &mut Controller<TerminalPresenter>,
    expected: WorkflowStage,
) -> Result<()> {
    if controller.current_stage() == expected {
        return Ok(());
    }
    match controller.presenter_mut().take_error() {
        Some(err) => Err(err.into()),
        None => Err(anyhow!(
            "workflow stopped at {} (expected {})",
            controller.current_stage(),
            expected
        )),
    }
}
