use std::{
    io::Read,
    process::{Child, Command, ExitStatus, Output, Stdio},
    thread::JoinHandle,
    time::Duration,
};

use bitflags::bitflags;
use tracing::{debug, trace, Level};

use crate::{
    cancel::Cancellation,
    result::{bail, Error, Result},
};

pub const YT_DL: &str = "youtube-dl";
pub const YT_DLP: &str = "yt-dlp";

/// Interval at which a running child process is checked for completion
const POLL_INTERVAL: Duration = Duration::from_millis(100);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

fn stdio(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

fn log_output(res: &Output) {
    debug!("status: {}", res.status);
    debug!("stdout: {} bytes long", res.stdout.len());
    trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
    debug!("stderr: {} bytes long", res.stderr.len());
    trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
}

/// Run a command, returning its raw output handle.
///
/// IO handles will be captured only if the caller required it or if the log level is Debug.
/// In that last case, `stdout` and `stderr` will be logged.
///
/// The function returns an error only if the command failed to execute.
/// If the program runs but returns a non-0 status code, it will not trigger an error.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = tracing::enabled!(Level::DEBUG);

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(stdio(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(stdio(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd.output()?;

    if is_debug {
        log_output(&res);
    }

    Ok(res)
}

/// Same as [`run_command`] but the child is killed as soon as `cancel` fires.
///
/// Return [`Error::Cancelled`] in that case.
pub fn run_command_cancellable<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
    cancel: &Cancellation,
) -> Result<Output> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let is_debug = tracing::enabled!(Level::DEBUG);

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(stdio(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(stdio(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let mut child = cmd.spawn()?;

    // Drain the pipes on the side or the child could block on a full pipe
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if cancel.sleep(POLL_INTERVAL) {
            kill(&mut child);
            return Err(Error::Cancelled);
        }
    };

    if interrupted(status, cancel) {
        debug!("Child process stopped with {status} after a cancellation");
        return Err(Error::Cancelled);
    }

    let res = Output {
        status,
        stdout: join_drain(stdout),
        stderr: join_drain(stderr),
    };

    if is_debug {
        log_output(&res);
    }

    Ok(res)
}

/// Ctrl-C reaches the whole process group, so the child may die from it
/// before the cancellation is noticed here
fn interrupted(status: ExitStatus, cancel: &Cancellation) -> bool {
    !status.success() && cancel.is_cancelled()
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error only truncates the captured output
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

fn kill(child: &mut Child) {
    debug!("Killing child process {}", child.id());
    if let Err(err) = child.kill() {
        debug!("Could not kill child process: {err}");
    }
    let _ = child.wait();
}

/// Run the command and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<()> {
    let res = run_command(program, f, Capture::empty())?;
    if res.status.success() {
        Ok(())
    } else {
        bail("Command did run but was not successful")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::time::Instant;

    use super::*;

    #[test]
    fn captures_stdout() {
        let res = run_command("sh", |cmd| cmd.args(["-c", "echo hello"]), Capture::STDOUT).unwrap();
        assert!(res.status.success());
        assert_eq!(String::from_utf8_lossy(&res.stdout).trim(), "hello");
    }

    #[test]
    fn failing_command_is_not_an_error_but_assert_is() {
        let res = run_command("sh", |cmd| cmd.args(["-c", "exit 3"]), Capture::empty()).unwrap();
        assert_eq!(res.status.code(), Some(3));
        assert!(assert_success_command("sh", |cmd| cmd.args(["-c", "exit 3"])).is_err());
        assert!(assert_success_command("sh", |cmd| cmd.args(["-c", "true"])).is_ok());
    }

    #[test]
    fn cancellable_captures_both_streams() {
        let res = run_command_cancellable(
            "sh",
            |cmd| cmd.args(["-c", "echo out; echo err >&2"]),
            Capture::STDOUT | Capture::STDERR,
            &Cancellation::new(),
        )
        .unwrap();
        assert_eq!(String::from_utf8_lossy(&res.stdout).trim(), "out");
        assert_eq!(String::from_utf8_lossy(&res.stderr).trim(), "err");
    }

    #[test]
    fn failure_after_cancel_counts_as_cancelled() {
        let failed = run_command("sh", |cmd| cmd.args(["-c", "exit 130"]), Capture::empty())
            .unwrap()
            .status;
        let succeeded = run_command("sh", |cmd| cmd.arg("-c").arg("true"), Capture::empty())
            .unwrap()
            .status;

        let cancel = Cancellation::new();
        assert!(!interrupted(failed, &cancel));

        cancel.cancel();
        assert!(interrupted(failed, &cancel));
        assert!(!interrupted(succeeded, &cancel));
    }

    #[test]
    fn cancel_kills_the_child() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            trigger.cancel();
        });

        let start = Instant::now();
        let res = run_command_cancellable(
            "sh",
            |cmd| cmd.args(["-c", "sleep 30"]),
            Capture::empty(),
            &cancel,
        );
        assert!(matches!(res, Err(Error::Cancelled)));
        assert!(start.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }
}
