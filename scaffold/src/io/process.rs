//! Short-lived probe commands (`adb`, `xcrun`) with a timeout and bounded output.

use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Captured output of a probe command.
#[derive(Debug)]
pub struct ProbeOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ProbeOutput {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.status.success()
    }
}

/// Run `program args...` with no stdin, killing it after `timeout`.
///
/// Both pipes are drained on their own threads so a chatty child cannot
/// deadlock; at most `output_limit_bytes` of each stream is kept.
#[instrument(skip_all, fields(program = %program, timeout_secs = timeout.as_secs()))]
pub fn run_probe(
    program: &str,
    args: &[&str],
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<ProbeOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(?args, "spawning probe");
    let mut child = cmd.spawn().with_context(|| format!("spawn {program}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let stdout_handle = thread::spawn(move || read_limited(stdout, output_limit_bytes));
    let stderr_handle = thread::spawn(move || read_limited(stderr, output_limit_bytes));

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for probe")? {
        Some(status) => status,
        None => {
            warn!(program, timeout_secs = timeout.as_secs(), "probe timed out, killing");
            timed_out = true;
            child.kill().context("kill probe")?;
            child.wait().context("wait probe after kill")?
        }
    };

    let stdout = join_reader(stdout_handle).context("join stdout")?;
    let stderr = join_reader(stderr_handle).context("join stderr")?;
    debug!(exit_code = ?status.code(), timed_out, "probe finished");
    Ok(ProbeOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
    })
}

fn join_reader(handle: thread::JoinHandle<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_limited<R: Read>(mut reader: R, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).context("read probe output")?;
        if n == 0 {
            break;
        }
        let keep = n.min(limit.saturating_sub(buf.len()));
        buf.extend_from_slice(&chunk[..keep]);
    }
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_of_a_quick_command() {
        let out = run_probe("sh", &["-c", "echo emulator-5554"], Duration::from_secs(5), 1024)
            .expect("probe");
        assert!(out.succeeded());
        assert_eq!(out.stdout.trim(), "emulator-5554");
    }

    #[test]
    fn output_is_bounded() {
        let out = run_probe("sh", &["-c", "yes | head -c 10000"], Duration::from_secs(5), 100)
            .expect("probe");
        assert_eq!(out.stdout.len(), 100);
    }

    #[test]
    fn slow_command_times_out() {
        let out = run_probe("sh", &["-c", "sleep 5"], Duration::from_millis(200), 1024)
            .expect("probe");
        assert!(out.timed_out);
        assert!(!out.succeeded());
    }

    #[test]
    fn missing_program_is_an_error() {
        assert!(run_probe("definitely-not-a-real-binary-xyz", &[], Duration::from_secs(1), 10).is_err());
    }
}
