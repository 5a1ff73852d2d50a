//! Cancellable external processes (yt-dlp, ffmpeg).
//!
//! Children run with piped output; the calling worker polls every
//! [`POLL_INTERVAL`] and kills the child as soon as its token is cancelled.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::control::{CancelToken, JobAborted};

pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How much of stderr is kept for error messages.
const STDERR_TAIL_BYTES: usize = 2048;

pub fn command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;

    // No console window per child process.
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}

fn kill_child_process_tree(child: &mut Child) {
    #[cfg(windows)]
    {
        let pid = child.id().to_string();
        let _ = command("taskkill").args(["/PID", &pid, "/T", "/F"]).status();
    }

    let _ = child.kill();
    let _ = child.wait();
}

fn spawn(cmd: &mut Command) -> Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let program = cmd.get_program().to_string_lossy().into_owned();
    cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "external tool '{program}' not found \
                 (install it or set its path under [tools] in config.toml)"
            )
        } else {
            anyhow::Error::new(e).context(format!("spawn {program}"))
        }
    })
}

fn read_all(mut pipe: impl Read + Send + 'static) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

/// Last part of a process's stderr, trimmed, for error messages.
pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Runs `cmd` to completion collecting its output, or kills it once `cancel` fires.
///
/// A cancelled run returns `JobAborted` (detectable with `downcast_ref`).
pub fn run_with_cancel(cmd: &mut Command, cancel: &CancelToken) -> Result<Output> {
    let mut child = spawn(cmd)?;
    let stdout = child.stdout.take().context("stdout pipe missing")?;
    let stderr = child.stderr.take().context("stderr pipe missing")?;
    let stdout_handle = read_all(stdout);
    let stderr_handle = read_all(stderr);

    loop {
        if cancel.is_cancelled() {
            // Readers are detached: grandchildren may still hold the pipes open.
            kill_child_process_tree(&mut child);
            return Err(JobAborted.into());
        }
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout_handle.join().unwrap_or_default();
                let stderr = stderr_handle.join().unwrap_or_default();
                return Ok(Output {
                    status,
                    stdout,
                    stderr,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                kill_child_process_tree(&mut child);
                let _ = stdout_handle.join();
                let _ = stderr_handle.join();
                return Err(anyhow::Error::new(err).context("wait for child process"));
            }
        }
    }
}

/// Exit status and captured stderr of a streamed run.
#[derive(Debug)]
pub struct StreamedExit {
    pub status: ExitStatus,
    pub stderr: Vec<u8>,
}

/// Runs `cmd`, handing each stdout line to `on_line` as it arrives.
///
/// The child is killed when `cancel` fires or when `on_line` returns
/// `JobAborted`; both cases return `JobAborted`.
pub fn run_streaming(
    cmd: &mut Command,
    cancel: &CancelToken,
    on_line: &mut dyn FnMut(&str) -> std::result::Result<(), JobAborted>,
) -> Result<StreamedExit> {
    let mut child = spawn(cmd)?;
    let stdout = child.stdout.take().context("stdout pipe missing")?;
    let stderr = child.stderr.take().context("stderr pipe missing")?;
    let stderr_handle = read_all(stderr);

    let (tx, rx) = mpsc::channel::<String>();
    let stdout_handle = thread::spawn(move || {
        // Lossy: paths may arrive in a non-UTF-8 code page.
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if tx.send(line.to_string()).is_err() {
                break;
            }
        }
    });

    let mut aborted = false;
    loop {
        if cancel.is_cancelled() {
            aborted = true;
            break;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                if on_line(&line).is_err() {
                    aborted = true;
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    if aborted {
        kill_child_process_tree(&mut child);
        return Err(JobAborted.into());
    }

    let status = child.wait().context("wait for child process")?;
    let _ = stdout_handle.join();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(StreamedExit { status, stderr })
}
