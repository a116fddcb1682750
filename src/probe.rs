//! # Duration Probing
//!
//! Best-effort lookup of the source duration with ffprobe. Any failure
//! returns `None`: progress then falls back to the completion signal only.

use crate::process::ProcessSpawner;
use std::ffi::OsString;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Arguments asking ffprobe for the container duration as a bare number
pub fn probe_args(input_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=nokey=1:noprint_wrappers=1",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    args.push(input_path.as_os_str().to_owned());
    args
}

/// Parse ffprobe's duration output (seconds) into milliseconds
pub fn parse_duration_output(stdout: &str) -> Option<f64> {
    let seconds: f64 = stdout.trim().parse().ok()?;
    (seconds.is_finite() && seconds > 0.0).then_some(seconds * 1000.0)
}

/// Get the duration of `input_path` in milliseconds
pub async fn probe_duration_ms(
    spawner: &dyn ProcessSpawner,
    input_path: &Path,
    ffprobe: Option<&Path>,
) -> Option<f64> {
    let ffprobe = ffprobe?;

    let process = match spawner.spawn(ffprobe, &probe_args(input_path)) {
        Ok(process) => process,
        Err(e) => {
            debug!("Failed to execute ffprobe {}: {}", ffprobe.display(), e);
            return None;
        }
    };

    let mut stdout = process.stdout;
    let mut stderr = process.stderr;
    let mut out = Vec::new();
    let mut err = Vec::new();
    let (out_read, _) = tokio::join!(stdout.read_to_end(&mut out), stderr.read_to_end(&mut err));
    if let Err(e) = out_read {
        debug!("Failed to read ffprobe output: {}", e);
        return None;
    }

    match process.exit.await {
        Ok(Some(0)) => {}
        Ok(code) => {
            debug!(
                "ffprobe exited with {:?}: {}",
                code,
                String::from_utf8_lossy(&err).trim()
            );
            return None;
        }
        Err(e) => {
            debug!("Failed waiting for ffprobe: {}", e);
            return None;
        }
    }

    let duration = parse_duration_output(&String::from_utf8_lossy(&out));
    debug!("Probed duration for {}: {:?} ms", input_path.display(), duration);
    duration
}
