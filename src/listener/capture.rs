use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time;

use super::parser::Parser;
use super::Settings;
use crate::config::Capture;
use crate::util::RingBuffer;

// Lines of stderr kept for the termination report.
const STDERR_TAIL: usize = 20;

pub type CaptureParser = Parser<BufReader<ChildStdout>>;

/// Handle to the external capture process.
///
/// The child is spawned with `kill_on_drop`, so it is released on every exit
/// path, [`CaptureProcess::shutdown`] additionally gives it a chance to exit cleanly.
pub struct CaptureProcess {
    child: Child,
    stderr: Option<JoinHandle<Vec<String>>>,
}

impl CaptureProcess {
    /// Build the capture command line for the configured interface and fields.
    pub fn command(config: &Capture) -> Command {
        let mut cmd = Command::new(&config.command);
        cmd.args(["-i", config.interface.as_str(), "-T", "fields"]);
        cmd.args(["-E", "header=y"]);
        cmd.arg("-E")
            .arg(format!("separator={}", Settings::CAPTURE_SEPARATOR));
        for field in &config.fields {
            cmd.args(["-e", field.as_str()]);
        }
        cmd
    }

    pub fn spawn(config: &Capture) -> Result<(Self, CaptureParser)> {
        info!("Starting packet capture on interface: {}", config.interface);
        Self::start(Self::command(config))
            .with_context(|| format!("Failed to start capture process {}", config.command))
    }

    fn start(mut cmd: Command) -> Result<(Self, CaptureParser)> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture stdout of capture process")?;
        let stderr = child.stderr.take().map(|stderr| tokio::spawn(drain_stderr(stderr)));

        Ok((
            CaptureProcess { child, stderr },
            Parser::new(BufReader::new(stdout)),
        ))
    }

    /// Stop the capture process: terminate, wait for the grace period, then kill.
    ///
    /// If the process had already exited on its own the tail of its stderr is
    /// logged as an error. With `interrupted` set the exit is expected, since
    /// a terminal Ctrl-C reaches the whole process group, and is only logged
    /// at debug level.
    pub async fn shutdown(mut self, interrupted: bool) -> Result<()> {
        if let Some((status, tail)) = self.exited().await? {
            if interrupted {
                debug!("Capture process exited on interrupt: {}", status);
            } else {
                error!(
                    "Capture process terminated unexpectedly ({}): {}",
                    status,
                    tail.join("\n")
                );
            }
            return Ok(());
        }
        self.terminate();

        match time::timeout(Settings::TERMINATE_GRACE, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!("Capture process exited with: {}", status);
            }
            Err(_) => {
                warn!("Capture process ignored terminate, killing it");
                self.child.kill().await?;
            }
        }

        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
        Ok(())
    }

    #[cfg(unix)]
    fn terminate(&mut self) {
        if let Some(pid) = self.child.id() {
            // SAFETY: plain signal delivery to a child we own and have not reaped
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc == 0 {
                return;
            }
            warn!("Failed to send SIGTERM to capture process {}", pid);
        }
        let _ = self.child.start_kill();
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) {
        let _ = self.child.start_kill();
    }

    /// Exit status and stderr tail, if the process has already exited.
    async fn exited(&mut self) -> Result<Option<(ExitStatus, Vec<String>)>> {
        let Some(status) = self.child.try_wait()? else {
            return Ok(None);
        };
        let tail = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        };
        Ok(Some((status, tail)))
    }
}

/// Keeps the pipe from filling up and remembers the last few lines.
async fn drain_stderr(stderr: ChildStderr) -> Vec<String> {
    let mut tail = RingBuffer::new(STDERR_TAIL);
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("capture: {}", line);
        tail.append(line);
    }
    tail.snapshot()
}
