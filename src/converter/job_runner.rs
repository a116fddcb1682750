//! # Job Runner
//!
//! Esegue un singolo job di conversione dall'inizio alla fine.
//!
//! ## Flusso:
//! 1. Valida la richiesta (nessun evento emesso in caso di errore)
//! 2. Risolve ffmpeg (override esplicito o `ToolLocator`), altrimenti `failed` al 0%
//! 3. Risolve ffprobe e misura la durata (best-effort)
//! 4. Calcola la catena `atempo` e costruisce gli argomenti
//! 5. Avvia ffmpeg ed emette `running` al 0% con il nome del tool
//! 6. Legge stdout (progress) e stderr (coda diagnostica) in parallelo
//! 7. Risolve il risultato una sola volta all'uscita del processo

use crate::config::Config;
use crate::converter::job_tracker::JobTracker;
use crate::converter::path_resolver::PathResolver;
use crate::error::ConvertError;
use crate::job::{ConversionRequest, ConversionResult, ProgressSink, ValidatedRequest};
use crate::probe::probe_duration_ms;
use crate::process::{BoxedReader, ProcessSpawner, SpawnedProcess, TokioSpawner};
use crate::progress_parser::{ProgressParser, ProgressUpdate, StderrTail, DEFAULT_TAIL_CHARS};
use crate::tempo::FilterChain;
use crate::tool_resolver::ToolLocator;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Settings that apply to every job run by a `JobRunner`
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// ffmpeg used when the request carries no explicit path
    pub ffmpeg_path: Option<PathBuf>,
    /// ffprobe used instead of detection
    pub ffprobe_path: Option<PathBuf>,
    /// Directory for default output paths
    pub output_dir: Option<PathBuf>,
    pub stderr_tail_chars: usize,
    pub timeout: Option<Duration>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            output_dir: None,
            stderr_tail_chars: DEFAULT_TAIL_CHARS,
            timeout: None,
        }
    }
}

impl From<&Config> for RunnerOptions {
    fn from(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            output_dir: config.output_dir.clone(),
            stderr_tail_chars: config.stderr_tail_chars,
            timeout: config.timeout(),
        }
    }
}

/// Build the ffmpeg argument list for one conversion
pub fn ffmpeg_args(input_path: &Path, output_path: &Path, chain: &FilterChain) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input_path.as_os_str().to_owned(),
        "-filter:a".into(),
        chain.to_filter_expr().into(),
        "-progress".into(),
        "pipe:1".into(),
        "-nostats".into(),
        output_path.as_os_str().to_owned(),
    ]
}

/// Runs conversion jobs; each `run` call owns its process and state
pub struct JobRunner {
    locator: ToolLocator,
    spawner: Arc<dyn ProcessSpawner>,
    options: RunnerOptions,
}

impl JobRunner {
    /// Runner with auto-detection and real processes
    pub fn new(config: &Config) -> Self {
        Self::with_parts(
            ToolLocator::default(),
            Arc::new(TokioSpawner),
            RunnerOptions::from(config),
        )
    }

    pub fn with_parts(
        locator: ToolLocator,
        spawner: Arc<dyn ProcessSpawner>,
        options: RunnerOptions,
    ) -> Self {
        Self {
            locator,
            spawner,
            options,
        }
    }

    pub fn locator(&self) -> &ToolLocator {
        &self.locator
    }

    /// Run one job to completion. Never fails: every error becomes a failed result.
    pub async fn run(&self, request: &ConversionRequest, sink: &dyn ProgressSink) -> ConversionResult {
        let request = match request.validate() {
            Ok(validated) => validated,
            Err(e) => {
                debug!("Rejected conversion request: {}", e);
                let job_id = Some(request.job_id.trim().to_string()).filter(|id| !id.is_empty());
                return ConversionResult::failure(job_id, &e);
            }
        };

        let mut tracker = JobTracker::new(request.job_id.clone(), sink);
        let output_path = request.output_path.clone().unwrap_or_else(|| {
            PathResolver::default_output_path(
                &request.input_path,
                request.speed,
                self.options.output_dir.as_deref(),
            )
        });

        let ffmpeg = match self.resolve_ffmpeg(&request).await {
            Some(path) => path,
            None => {
                let error = ConvertError::ToolNotFound("FFmpeg".to_string());
                tracker.failed(error.to_string());
                return ConversionResult::failure(Some(request.job_id), &error);
            }
        };

        let ffprobe = match self.options.ffprobe_path.clone() {
            Some(path) => Some(path),
            None => self.locator.ffprobe(Some(&ffmpeg)).await,
        };
        let total_duration_ms =
            probe_duration_ms(self.spawner.as_ref(), &request.input_path, ffprobe.as_deref()).await;

        match self
            .execute(&request, &ffmpeg, &output_path, total_duration_ms, &mut tracker)
            .await
        {
            Ok(()) => {
                tracker.done();
                info!("Job {} finished: {}", request.job_id, output_path.display());
                ConversionResult::success(request.job_id, output_path)
            }
            Err(e) => {
                warn!("Job {} failed: {}", request.job_id, e);
                tracker.failed(e.to_string());
                ConversionResult::failure(Some(request.job_id), &e)
            }
        }
    }

    async fn resolve_ffmpeg(&self, request: &ValidatedRequest) -> Option<PathBuf> {
        if let Some(ref path) = request.tool_path {
            return Some(path.clone());
        }
        if let Some(ref path) = self.options.ffmpeg_path {
            return Some(path.clone());
        }
        self.locator.ffmpeg().await
    }

    /// Spawn ffmpeg and supervise it until exit
    async fn execute(
        &self,
        request: &ValidatedRequest,
        ffmpeg: &Path,
        output_path: &Path,
        total_duration_ms: Option<f64>,
        tracker: &mut JobTracker<'_>,
    ) -> Result<(), ConvertError> {
        let chain = FilterChain::plan(request.speed)?;
        let args = ffmpeg_args(&request.input_path, output_path, &chain);

        info!(
            "Job {}: {} -> {} ({})",
            request.job_id,
            request.input_path.display(),
            output_path.display(),
            chain
        );

        let process = self
            .spawner
            .spawn(ffmpeg, &args)
            .map_err(|source| ConvertError::Spawn {
                program: ffmpeg.to_path_buf(),
                source,
            })?;

        tracker.running(0.0, Some(tool_label(ffmpeg)));

        let parser = ProgressParser::new(total_duration_ms);
        let supervise = self.supervise(process, parser, ffmpeg, tracker);
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, supervise)
                .await
                .map_err(|_| ConvertError::TimedOut(limit))?,
            None => supervise.await,
        }
    }

    async fn supervise(
        &self,
        process: SpawnedProcess,
        mut parser: ProgressParser,
        ffmpeg: &Path,
        tracker: &mut JobTracker<'_>,
    ) -> Result<(), ConvertError> {
        let SpawnedProcess {
            mut stdout,
            stderr,
            exit,
        } = process;

        // `progress=end` only stops further running updates; the terminal
        // event waits for the exit code.
        let pump_stdout = async {
            let mut buf = vec![0u8; READ_CHUNK];
            let mut completed = false;
            loop {
                let n = match stdout.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        debug!("Stopped reading ffmpeg stdout: {}", e);
                        break;
                    }
                };
                for update in parser.feed(&buf[..n]) {
                    match update {
                        ProgressUpdate::Running(percent) if !completed => {
                            tracker.running(percent, None)
                        }
                        ProgressUpdate::Running(_) => {}
                        ProgressUpdate::Completed => {
                            debug!("ffmpeg reported end of progress, waiting for exit");
                            completed = true;
                        }
                    }
                }
            }
        };
        let (_, tail) = tokio::join!(
            pump_stdout,
            collect_tail(stderr, self.options.stderr_tail_chars)
        );

        let code = exit.await.map_err(|source| ConvertError::Spawn {
            program: ffmpeg.to_path_buf(),
            source,
        })?;
        debug!("ffmpeg exited with {:?}", code);

        match code {
            Some(0) => Ok(()),
            Some(code) => Err(ConvertError::Runtime(
                tail.message()
                    .unwrap_or_else(|| format!("FFmpeg exited with code {}", code)),
            )),
            None => Err(ConvertError::Runtime(
                tail.message()
                    .unwrap_or_else(|| "FFmpeg was terminated by a signal".to_string()),
            )),
        }
    }
}

async fn collect_tail(mut stderr: BoxedReader, max_chars: usize) -> StderrTail {
    let mut tail = StderrTail::new(max_chars);
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => tail.push(&buf[..n]),
            Err(e) => {
                debug!("Stopped reading ffmpeg stderr: {}", e);
                break;
            }
        }
    }
    tail
}

/// Base name of the tool, or the full path when it has none
fn tool_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, ProgressEvent};
    use crate::platform::{Platform, Tool};
    use crate::process::fake::{Script, ScriptedSpawner};
    use std::sync::Mutex;

    const FFMPEG: &str = "/fake/bin/ffmpeg";
    const FFPROBE: &str = "/fake/bin/ffprobe";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Recorder {
        fn emit(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<ProgressEvent> {
            self.0.lock().unwrap().clone()
        }
    }

    fn isolated_locator() -> ToolLocator {
        ToolLocator::new(Platform::Linux)
            .with_env(|_| None)
            .without_system_lookup()
            .with_candidates(Tool::Ffmpeg, vec![])
            .with_candidates(Tool::Ffprobe, vec![])
    }

    fn runner(spawner: Arc<ScriptedSpawner>, options: RunnerOptions) -> JobRunner {
        JobRunner::with_parts(isolated_locator(), spawner, options)
    }

    fn with_probe() -> RunnerOptions {
        RunnerOptions {
            ffprobe_path: Some(PathBuf::from(FFPROBE)),
            ..Default::default()
        }
    }

    fn request(speed: f64) -> ConversionRequest {
        ConversionRequest::new("job-1", "/music/in.mp3", speed)
            .with_output("/music/out.mp3")
            .with_tool_path(FFMPEG)
    }

    #[test]
    fn test_ffmpeg_args() {
        let chain = FilterChain::plan(3.0).unwrap();
        let args = ffmpeg_args(Path::new("in.mp3"), Path::new("out.mp3"), &chain);
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            [
                "-y", "-i", "in.mp3", "-filter:a", "atempo=2,atempo=1.5", "-progress", "pipe:1",
                "-nostats", "out.mp3"
            ]
        );
    }

    #[test]
    fn test_tool_label() {
        assert_eq!(tool_label(Path::new("/usr/bin/ffmpeg")), "ffmpeg");
        assert_eq!(tool_label(Path::new("/")), "/");
    }

    #[tokio::test]
    async fn test_validation_failure_emits_nothing() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let runner = runner(spawner.clone(), RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner
            .run(&ConversionRequest::new("   ", "/music/in.mp3", 1.5), &recorder)
            .await;
        assert!(!result.ok);
        assert_eq!(result.job_id, None);
        assert_eq!(result.error.as_deref(), Some("Job ID is required."));

        let result = runner.run(&request(-2.0), &recorder).await;
        assert!(!result.ok);
        assert_eq!(result.job_id.as_deref(), Some("job-1"));
        assert_eq!(result.error.as_deref(), Some("Speed must be greater than 0."));

        assert!(recorder.events().is_empty());
        assert!(spawner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_tool_not_found_does_not_spawn() {
        let spawner = Arc::new(ScriptedSpawner::new());
        let runner = runner(spawner.clone(), RunnerOptions::default());
        let recorder = Recorder::default();

        let request = ConversionRequest::new("job-1", "/music/in.mp3", 1.5);
        let result = runner.run(&request, &recorder).await;

        assert!(!result.ok);
        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, JobStatus::Failed);
        assert_eq!(events[0].percent, 0.0);
        assert_eq!(events[0].message, result.error);
        assert!(spawner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_success_with_progress() {
        let spawner = Arc::new(
            ScriptedSpawner::new()
                .with(FFPROBE, Script::exit(0).stdout("10.000000\n"))
                .with(
                    FFMPEG,
                    Script::exit(0)
                        .stdout("frame=0\nout_time_us=5000000\nprogress=cont")
                        .stdout("inue\nout_time_us=2000000\n")
                        .stdout("out_time=00:00:08.000000\nprogress=end\n")
                        .stdout("out_time_us=9000000\n")
                        .stderr("size=N/A time=00:00:08\n"),
                ),
        );
        let runner = runner(spawner.clone(), with_probe());
        let recorder = Recorder::default();

        let result = runner.run(&request(1.5), &recorder).await;
        assert!(result.ok);
        assert_eq!(result.output_path, Some(PathBuf::from("/music/out.mp3")));
        assert_eq!(result.error, None);

        let events = recorder.events();
        let summary: Vec<(JobStatus, f64)> = events.iter().map(|e| (e.status, e.percent)).collect();
        assert_eq!(
            summary,
            vec![
                (JobStatus::Running, 0.0),
                (JobStatus::Running, 50.0),
                (JobStatus::Running, 50.0),
                (JobStatus::Running, 80.0),
                (JobStatus::Done, 100.0),
            ]
        );
        assert_eq!(events[0].message.as_deref(), Some("ffmpeg"));
        assert_eq!(
            events.iter().filter(|e| e.status.is_terminal()).count(),
            1
        );

        let calls = spawner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, PathBuf::from(FFPROBE));
        assert_eq!(calls[1].0, PathBuf::from(FFMPEG));
        assert!(calls[1].1.contains(&OsString::from("atempo=1.5")));
    }

    #[tokio::test]
    async fn test_nonzero_exit_uses_stderr_tail() {
        let spawner = Arc::new(
            ScriptedSpawner::new().with(FFMPEG, Script::exit(1).stderr("codec not found\n")),
        );
        let runner = runner(spawner, RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner.run(&request(2.0), &recorder).await;
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("codec not found"));

        let events = recorder.events();
        let last = events.last().unwrap();
        assert_eq!(last.status, JobStatus::Failed);
        assert_eq!(last.message.as_deref(), Some("codec not found"));
    }

    #[tokio::test]
    async fn test_end_marker_then_failure_reports_failed_only() {
        let spawner = Arc::new(
            ScriptedSpawner::new().with(
                FFMPEG,
                Script::exit(1)
                    .stdout("progress=end\n")
                    .stderr("muxer failed\n"),
            ),
        );
        let runner = runner(spawner, RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner.run(&request(1.5), &recorder).await;
        assert!(!result.ok);
        assert_eq!(result.error.as_deref(), Some("muxer failed"));

        let events = recorder.events();
        let terminal: Vec<&ProgressEvent> =
            events.iter().filter(|e| e.status.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(terminal[0].status, JobStatus::Failed);
        assert_eq!(terminal[0].message, result.error);
        assert!(events.iter().all(|e| e.status != JobStatus::Done));
    }

    #[tokio::test]
    async fn test_stderr_split_character_is_preserved() {
        let spawner = Arc::new(
            ScriptedSpawner::new().with(
                FFMPEG,
                Script::exit(1)
                    .stderr_bytes(b"Fichier introuvable: caf\xC3")
                    .stderr_bytes(b"\xA9.mp3\n"),
            ),
        );
        let runner = runner(spawner, RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner.run(&request(2.0), &recorder).await;
        assert_eq!(
            result.error.as_deref(),
            Some("Fichier introuvable: café.mp3")
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_without_stderr() {
        let spawner = Arc::new(ScriptedSpawner::new().with(FFMPEG, Script::exit(183)));
        let runner = runner(spawner, RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner.run(&request(2.0), &recorder).await;
        assert_eq!(result.error.as_deref(), Some("FFmpeg exited with code 183"));
    }

    #[tokio::test]
    async fn test_stderr_tail_is_bounded() {
        let noise = "x".repeat(50);
        let spawner = Arc::new(
            ScriptedSpawner::new().with(
                FFMPEG,
                Script::exit(1).stderr(&noise).stderr("\nError opening output\n"),
            ),
        );
        let options = RunnerOptions {
            stderr_tail_chars: 25,
            ..Default::default()
        };
        let runner = runner(spawner, options);
        let recorder = Recorder::default();

        let result = runner.run(&request(2.0), &recorder).await;
        assert_eq!(result.error.as_deref(), Some("xxx\nError opening output"));
    }

    #[tokio::test]
    async fn test_spawn_error_fails_job() {
        let spawner = Arc::new(
            ScriptedSpawner::new()
                .with(FFMPEG, Script::spawn_error(std::io::ErrorKind::PermissionDenied)),
        );
        let runner = runner(spawner, RunnerOptions::default());
        let recorder = Recorder::default();

        let result = runner.run(&request(0.8), &recorder).await;
        assert!(!result.ok);
        let error = result.error.unwrap();
        assert!(error.contains("spawn refused"));

        let events = recorder.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, JobStatus::Failed);
        assert_eq!(events[0].message.as_deref(), Some(error.as_str()));
    }

    #[tokio::test]
    async fn test_timeout_fails_job() {
        let spawner = Arc::new(ScriptedSpawner::new().with(FFMPEG, Script::hang()));
        let options = RunnerOptions {
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let runner = runner(spawner, options);
        let recorder = Recorder::default();

        let result = runner.run(&request(1.5), &recorder).await;
        assert!(!result.ok);
        assert!(result.error.unwrap().contains("timed out"));
        assert_eq!(recorder.events().last().unwrap().status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_default_output_path_and_configured_ffmpeg() {
        let spawner = Arc::new(ScriptedSpawner::new().with(FFMPEG, Script::exit(0)));
        let options = RunnerOptions {
            ffmpeg_path: Some(PathBuf::from(FFMPEG)),
            output_dir: Some(PathBuf::from("/converted")),
            ..Default::default()
        };
        let runner = runner(spawner, options);
        let recorder = Recorder::default();

        let request = ConversionRequest::new("job-2", "/music/talk.m4a", 1.25);
        let result = runner.run(&request, &recorder).await;
        assert!(result.ok);
        assert_eq!(
            result.output_path,
            Some(PathBuf::from("/converted/talk_x1_25.m4a"))
        );
        assert_eq!(recorder.events().last().unwrap().status, JobStatus::Done);
    }
}
