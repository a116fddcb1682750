//! # Process Spawning
//!
//! Seam between the conversion engine and the operating system. Both the
//! duration prober and the job runner start their child processes through
//! `ProcessSpawner`, so the whole job lifecycle can run against scripted
//! processes in tests.

use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncRead;
use tracing::debug;

/// Boxed readable half of a child pipe
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// A running child process with captured output streams
pub struct SpawnedProcess {
    pub stdout: BoxedReader,
    pub stderr: BoxedReader,
    /// Resolves with the exit code once the process terminates; `None` when
    /// it was killed by a signal.
    pub exit: BoxFuture<'static, std::io::Result<Option<i32>>>,
}

/// Starts external processes
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `program` with piped stdout/stderr. Errors here are spawn-level
    /// failures (missing executable, permission denied).
    fn spawn(&self, program: &Path, args: &[OsString]) -> std::io::Result<SpawnedProcess>;
}

/// Production spawner backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSpawner;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, program: &Path, args: &[OsString]) -> std::io::Result<SpawnedProcess> {
        debug!("Spawning {} {:?}", program.display(), args);

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        let mut child = cmd.spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

        Ok(SpawnedProcess {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            exit: Box::pin(async move { child.wait().await.map(|status| status.code()) }),
        })
    }
}
