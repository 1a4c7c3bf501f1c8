use crate::error::StageFailure;
use crate::shutdown::{self, ForegroundGroup};
use std::io::{BufRead, BufReader, Write};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

/// Owns a running child; kills its whole process group and reaps it if dropped before it finished
struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    fn wait(mut self) -> std::io::Result<ExitStatus> {
        match self.child.take() {
            Some(mut child) => child.wait(),
            None => Err(std::io::Error::other("child already reaped")),
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            tracing::debug!("terminating process group {}", child.id());
            shutdown::signal_group(child.id(), libc::SIGKILL);
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Run `command` through `bash -c` in `cwd`, copying each output line to `sink` as it arrives
///
/// stderr is merged into stdout so the sink sees both in the order they were written.
/// The command gets its own process group; a termination signal received by
/// the driver is forwarded to that group and the command is reaped before
/// this returns.
pub fn stream_command<W: Write>(
    command: &str,
    cwd: &Path,
    sink: &mut W,
) -> Result<(), StageFailure> {
    let failure = |status: Option<ExitStatus>, reason: Option<String>| StageFailure {
        command: command.to_string(),
        status,
        reason,
    };

    if shutdown::requested() {
        return Err(failure(None, Some("interrupted before start".to_string())));
    }

    tracing::debug!("running `{}` in {}", command, cwd.display());
    let mut cmd = Command::new("bash");
    cmd.arg("-c")
        .arg(format!("exec 2>&1; {}", command))
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| failure(None, Some(e.to_string())))?;

    let stdout = child.stdout.take();
    let _foreground = ForegroundGroup::enter(child.id());
    let guard = ChildGuard { child: Some(child) };

    if let Some(stdout) = stdout {
        for line in BufReader::new(stdout).split(b'\n') {
            let line = line.map_err(|e| failure(None, Some(e.to_string())))?;
            sink.write_all(&line)
                .and_then(|_| sink.write_all(b"\n"))
                .and_then(|_| sink.flush())
                .map_err(|e| failure(None, Some(e.to_string())))?;
        }
    }

    let status = guard
        .wait()
        .map_err(|e| failure(None, Some(e.to_string())))?;

    if shutdown::requested() {
        Err(failure(Some(status), Some("interrupted".to_string())))
    } else if status.success() {
        Ok(())
    } else {
        Err(failure(Some(status), None))
    }
}
