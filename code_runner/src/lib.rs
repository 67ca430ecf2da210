//! Sandboxed execution of student entry scripts.
//!
//! A [`ScriptRunner`] launches one script at a time through the Python driver in
//! [`driver`], with the script's own directory as the child's working directory.
//! The grader process never changes its own working directory, so nothing has to
//! be restored afterwards. Output is captured through pipes, capped in size, and
//! the run is killed once the configured wall-clock timeout elapses. In process
//! mode the student runs in its own process group, and the whole group is killed
//! when the run ends so helper processes it started cannot outlive it.

pub mod driver;
pub mod error;
pub mod validate_files;

pub use error::RunnerError;

use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    task::JoinHandle,
    time::{Duration, timeout},
};
use util::execution_config::{ExecutionLimits, SandboxMode};

use crate::driver::{DRIVER_FILE_NAME, STATUS_FILE_NAME};
use crate::validate_files::validate_entry_script;

/// How long to keep draining pipes after the child is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Interpreter used inside the runner image.
const CONTAINER_PYTHON: &str = "python3";

/// Environment variables passed through to the student process.
const PASSTHROUGH_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "CUDA_VISIBLE_DEVICES",
    "SYSTEMROOT",
];

/// How a student run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Script loaded and the entry point (if any) returned normally.
    Completed,
    /// Student code raised; carries the exception line.
    Raised(String),
    /// Interpreter exited non-zero without a driver report.
    Exited(i32),
    /// Killed by a signal (OOM killer, external kill).
    Signalled,
    /// Wall-clock limit reached, in seconds.
    TimedOut(u64),
}

impl RunOutcome {
    pub fn describe(&self) -> String {
        match self {
            RunOutcome::Completed => "completed".to_string(),
            RunOutcome::Raised(err) => format!("student code raised an exception: {err}"),
            RunOutcome::Exited(code) => format!("process exited with code {code}"),
            RunOutcome::Signalled => "process was terminated by a signal".to_string(),
            RunOutcome::TimedOut(secs) => format!("execution timed out after {secs}s"),
        }
    }
}

/// Everything observed while running one student script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRun {
    pub script: PathBuf,
    pub work_dir: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    /// Callable the driver invoked; `None` means only top-level code ran.
    pub entry_point: Option<String>,
    pub outcome: RunOutcome,
    pub elapsed_ms: u128,
}

impl ScriptRun {
    pub fn succeeded(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}

/// Runs student scripts under the configured [`ExecutionLimits`].
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    limits: ExecutionLimits,
    python: String,
    entry_points: Vec<String>,
}

impl ScriptRunner {
    pub fn new(limits: ExecutionLimits, entry_points: Vec<String>) -> Self {
        Self {
            limits,
            python: util::config::python_bin(),
            entry_points,
        }
    }

    /// Override the interpreter used in process mode.
    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Runs `script` with its parent directory as the working directory.
    ///
    /// Student failures are reported in the returned [`ScriptRun`]; `Err` is
    /// reserved for problems that stop the run from starting.
    pub async fn run(&self, script: &Path) -> Result<ScriptRun, RunnerError> {
        let (script, work_dir) = validate_entry_script(script)?;

        let sandbox = tempfile::Builder::new()
            .prefix("grader-")
            .tempdir()
            .map_err(RunnerError::Setup)?;
        driver::write_driver(sandbox.path()).map_err(RunnerError::Setup)?;
        let status_path = sandbox.path().join(STATUS_FILE_NAME);

        let container_name = format!("grader-{}", uuid::Uuid::new_v4());
        let (program, mut cmd) = match self.limits.sandbox {
            SandboxMode::Process => self.process_command(&script, &work_dir, &sandbox),
            SandboxMode::Docker => {
                self.docker_command(&script, &work_dir, &sandbox, &container_name)
            }
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        if self.limits.sandbox == SandboxMode::Process {
            cmd.process_group(0);
        }

        tracing::info!(
            script = %script.display(),
            sandbox = ?self.limits.sandbox,
            timeout_secs = self.limits.timeout_secs,
            "running student script"
        );

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|source| RunnerError::Spawn { program, source })?;
        let group = (self.limits.sandbox == SandboxMode::Process)
            .then(|| child.id())
            .flatten();

        let cap = self.limits.max_output_bytes;
        let stdout_task = tokio::spawn(read_capped(child.stdout.take(), cap));
        let stderr_task = tokio::spawn(read_capped(child.stderr.take(), cap));

        let waited = timeout(Duration::from_secs(self.limits.timeout_secs), child.wait()).await;
        let (exit_code, timed_out) = match waited {
            Ok(Ok(status)) => (status.code(), false),
            Ok(Err(e)) => return Err(RunnerError::Wait(e)),
            Err(_) => {
                tracing::warn!(script = %script.display(), "student script timed out, killing");
                kill_process_group(group);
                child.kill().await.ok();
                if self.limits.sandbox == SandboxMode::Docker {
                    kill_container(&container_name).await;
                }
                (None, true)
            }
        };
        // Leftover helpers would keep the output pipes open.
        kill_process_group(group);
        let elapsed_ms = started.elapsed().as_millis();

        let stdout = collect(stdout_task).await;
        let stderr = collect(stderr_task).await;
        let status = driver::read_status(&status_path);

        let outcome = if timed_out {
            RunOutcome::TimedOut(self.limits.timeout_secs)
        } else if let Some(err) = status.as_ref().and_then(|s| s.error.clone()) {
            RunOutcome::Raised(err)
        } else {
            match exit_code {
                Some(0) => RunOutcome::Completed,
                Some(code) => RunOutcome::Exited(code),
                None => RunOutcome::Signalled,
            }
        };

        tracing::debug!(
            script = %script.display(),
            ?exit_code,
            elapsed_ms,
            outcome = %outcome.describe(),
            "student script finished"
        );

        Ok(ScriptRun {
            script,
            work_dir,
            stdout,
            stderr,
            exit_code,
            entry_point: status.and_then(|s| s.entry_point),
            outcome,
            elapsed_ms,
        })
    }

    fn process_command(
        &self,
        script: &Path,
        work_dir: &Path,
        sandbox: &TempDir,
    ) -> (String, Command) {
        let mut cmd = Command::new(&self.python);
        cmd.arg("-u")
            .arg(sandbox.path().join(DRIVER_FILE_NAME))
            .arg(script)
            .arg(sandbox.path().join(STATUS_FILE_NAME))
            .args(&self.entry_points)
            .current_dir(work_dir)
            .env_clear()
            .envs(
                PASSTHROUGH_ENV
                    .iter()
                    .filter_map(|k| std::env::var_os(k).map(|v| (*k, v))),
            )
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .env("PYTHONUNBUFFERED", "1");
        (self.python.clone(), cmd)
    }

    fn docker_command(
        &self,
        script: &Path,
        work_dir: &Path,
        sandbox: &TempDir,
        container_name: &str,
    ) -> (String, Command) {
        let mount_root = ancestor(work_dir, self.limits.docker_mount_depth);
        let relative = work_dir.strip_prefix(&mount_root).unwrap_or(Path::new(""));
        let container_work = Path::new("/sandbox").join(relative);
        let container_script = container_work.join(script.file_name().unwrap_or_default());

        let mut cmd = Command::new("docker");
        cmd.arg("run")
            .arg("--rm")
            .arg(format!("--name={container_name}"))
            .arg("--network=none")
            .arg(format!("--memory={}", self.limits.max_memory))
            .arg(format!("--cpus={}", self.limits.max_cpus))
            .arg(format!("--pids-limit={}", self.limits.max_processes))
            .arg("--security-opt=no-new-privileges")
            .arg("-v")
            .arg(format!("{}:/sandbox:ro", mount_root.display()))
            .arg("-v")
            .arg(format!("{}:{}", work_dir.display(), container_work.display()))
            .arg("-v")
            .arg(format!("{}:/grader", sandbox.path().display()))
            .arg("-w")
            .arg(&container_work)
            .arg(&self.limits.docker_image)
            .arg(CONTAINER_PYTHON)
            .arg("-u")
            .arg(format!("/grader/{DRIVER_FILE_NAME}"))
            .arg(&container_script)
            .arg(format!("/grader/{STATUS_FILE_NAME}"))
            .args(&self.entry_points);
        ("docker".to_string(), cmd)
    }
}

/// Walks `depth` levels up from `dir`, stopping at the filesystem root.
fn ancestor(dir: &Path, depth: usize) -> PathBuf {
    let mut current = dir;
    for _ in 0..depth {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current.to_path_buf()
}

async fn kill_container(name: &str) {
    let result = Command::new("docker")
        .arg("kill")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(e) = result {
        tracing::warn!(container = name, error = %e, "failed to kill container");
    }
}

/// Sends SIGKILL to every process in the group led by `leader`.
#[cfg(unix)]
fn kill_process_group(leader: Option<u32>) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pid) = leader.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pgid = pid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_leader: Option<u32>) {}

/// Reads a pipe to the end, keeping at most `cap` bytes.
async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> String {
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = cap.saturating_sub(kept.len());
                kept.extend_from_slice(&buf[..n.min(room)]);
                if n > room {
                    truncated = true;
                }
            }
        }
    }

    let mut text = String::from_utf8_lossy(&kept).into_owned();
    if truncated {
        text.push_str("\n[output truncated]");
    }
    text
}

async fn collect(mut handle: JoinHandle<String>) -> String {
    match timeout(DRAIN_GRACE, &mut handle).await {
        Ok(Ok(text)) => text,
        Ok(Err(_)) => String::new(),
        Err(_) => {
            handle.abort();
            String::new()
        }
    }
}
