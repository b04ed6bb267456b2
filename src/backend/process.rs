use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use futures::future::join_all;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::CancelSignal;
use crate::error::{BootsError, Result};
use crate::installer::LogSink;

/// How long reader tasks get to drain once the command itself is gone
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Run a command, sending each stdout/stderr line to `log` as it arrives.
///
/// stdout and stderr are drained concurrently, so their relative order is
/// not preserved. Both readers are joined before this returns, so every
/// line the command wrote is sent before the caller reports completion.
/// Output that isn't valid UTF-8 is logged lossily.
///
/// Background processes left behind by the command may keep the pipes
/// open. Their output is abandoned after `DRAIN_TIMEOUT` or on cancel.
pub async fn run_streaming(
    program: &str,
    args: &[String],
    log: &LogSink,
    cancel: &mut CancelSignal,
    grace: Duration,
) -> Result<()> {
    let argv: Vec<&str> = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect();
    log.line(format!("$ {}", shell_words::join(&argv)));
    debug!("Running: {:?}", argv);

    if cancel.is_cancelled() {
        return Err(BootsError::Cancelled);
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| BootsError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let readers: Vec<JoinHandle<()>> = [
        child.stdout.take().map(|out| spawn_reader(out, log.clone())),
        child.stderr.take().map(|err| spawn_reader(err, log.clone())),
    ]
    .into_iter()
    .flatten()
    .collect();

    let finished = tokio::select! {
        status = child.wait() => Some(status?),
        _ = cancel.cancelled() => None,
    };

    let Some(status) = finished else {
        warn!("Cancelling {}", program);
        terminate(&mut child, grace).await;
        drain_readers(program, readers, None).await;
        return Err(BootsError::Cancelled);
    };

    drain_readers(program, readers, Some(cancel)).await;

    if status.success() {
        Ok(())
    } else {
        Err(BootsError::ExitStatus {
            program: program.to_string(),
            status: status.to_string(),
        })
    }
}

fn spawn_reader<R>(reader: R, log: LogSink) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => log.line(decode_line(&buf)),
                Err(e) => {
                    warn!("Reading command output failed: {}", e);
                    break;
                }
            }
        }
    })
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Join the output readers, aborting them after `DRAIN_TIMEOUT` or once
/// `cancel` fires.
async fn drain_readers(
    program: &str,
    mut readers: Vec<JoinHandle<()>>,
    cancel: Option<&mut CancelSignal>,
) {
    let cancelled = async move {
        match cancel {
            Some(cancel) => cancel.cancelled().await,
            None => std::future::pending().await,
        }
    };

    let drained = tokio::select! {
        joined = tokio::time::timeout(DRAIN_TIMEOUT, join_all(readers.iter_mut())) => joined.is_ok(),
        _ = cancelled => false,
    };

    if !drained {
        warn!("Output of {} still open, detaching", program);
        for reader in &readers {
            reader.abort();
        }
    }
}

/// SIGTERM, then SIGKILL if the process outlives the grace period
async fn terminate(child: &mut Child, grace: Duration) {
    if let Some(pid) = child.id() {
        if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!("SIGTERM to {} failed: {}", pid, e);
        } else if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return;
        }
    }

    if let Err(e) = child.start_kill() {
        warn!("Kill failed: {}", e);
    }
    let _ = child.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::cancel_pair;
    use crate::installer::InstallerMessage;
    use tokio::sync::mpsc;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<InstallerMessage>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            if let InstallerMessage::LogLine(line) = msg {
                lines.push(line);
            }
        }
        lines
    }

    #[tokio::test]
    async fn streams_stdout_lines_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        run_streaming("sh", &sh("echo one; echo two; echo three"), &log, &mut cancel, Duration::from_secs(1))
            .await
            .unwrap();

        let lines = drain(&mut rx);
        assert_eq!(lines[0], "$ sh -c 'echo one; echo two; echo three'");
        assert_eq!(&lines[1..], ["one", "two", "three"]);
    }

    #[tokio::test]
    async fn captures_stderr_and_exit_status() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        let result = run_streaming("sh", &sh("echo oops >&2; exit 3"), &log, &mut cancel, Duration::from_secs(1)).await;

        assert!(matches!(result, Err(BootsError::ExitStatus { .. })));
        assert!(drain(&mut rx).contains(&"oops".to_string()));
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_stop_the_stream() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        run_streaming("sh", &sh("echo before; printf '\\377\\n'; echo after"), &log, &mut cancel, Duration::from_secs(1))
            .await
            .unwrap();

        let lines = drain(&mut rx);
        assert_eq!(&lines[1..], ["before", "\u{FFFD}", "after"]);
    }

    #[tokio::test]
    async fn invalid_utf8_keeps_the_pipe_open() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        // Enough output to fill the pipe after the bad line
        let result = run_streaming(
            "sh",
            &sh("printf '\\377\\n'; yes | head -c 400000"),
            &log,
            &mut cancel,
            Duration::from_secs(1),
        )
        .await;
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn decode_line_strips_line_endings() {
        assert_eq!(decode_line(b"plain\n"), "plain");
        assert_eq!(decode_line(b"crlf\r\n"), "crlf");
        assert_eq!(decode_line(b"caf\xe9\n"), "caf\u{FFFD}");
        assert_eq!(decode_line(b"no newline"), "no newline");
    }

    #[tokio::test]
    async fn background_child_does_not_hold_up_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        let started = std::time::Instant::now();
        let result = run_streaming("sh", &sh("sleep 6 & echo started"), &log, &mut cancel, Duration::from_secs(1)).await;

        assert!(result.is_ok());
        assert!(started.elapsed() < DRAIN_TIMEOUT + Duration::from_secs(2));
        assert!(drain(&mut rx).contains(&"started".to_string()));
    }

    #[tokio::test]
    async fn cancel_stops_waiting_on_background_output() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (handle, mut cancel) = cancel_pair();

        let run = tokio::spawn(async move {
            run_streaming("sh", &sh("sleep 6 & echo started"), &log, &mut cancel, Duration::from_secs(1)).await
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("cancel should stop the drain")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (_handle, mut cancel) = cancel_pair();

        let result = run_streaming("boots-no-such-program", &[], &log, &mut cancel, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(BootsError::Spawn { .. })));
    }

    #[tokio::test]
    async fn cancel_terminates_the_child() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let log = LogSink::new(tx);
        let (handle, mut cancel) = cancel_pair();

        let run = tokio::spawn(async move {
            run_streaming("sleep", &["30".to_string()], &log, &mut cancel, Duration::from_secs(1)).await
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("cancelled command should stop")
            .unwrap();
        assert!(matches!(result, Err(BootsError::Cancelled)));
    }
}
