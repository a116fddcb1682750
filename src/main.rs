//! # Audio Tempo - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Caricamento della configurazione e applicazione degli override CLI
//! - Avvio dei job di conversione e presentazione del progresso
//!
//! ## Comandi:
//! - `convert`: converte uno o più file (o directory) alla velocità richiesta
//! - `detect`: mostra i percorsi di ffmpeg/ffprobe rilevati
//! - `plan`: mostra la catena di filtri `atempo` per una velocità
//! - `suggest-output`: mostra il path di output di default
//! - `init-config`: scrive il file di configurazione
//!
//! ## Esempio di utilizzo:
//! ```bash
//! audio-tempo convert lecture.mp3 podcasts/ --speed 1.75 --workers 4
//! audio-tempo --json convert talk.m4a --speed 0.8 --output slow.m4a
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use audio_tempo::converter::PathResolver;
use audio_tempo::file_manager::FileManager;
use audio_tempo::json_output::{JsonMessage, JsonSink};
use audio_tempo::progress::ProgressManager;
use audio_tempo::{
    BatchConverter, Config, ConversionRequest, FilterChain, JobRunner, ProgressSink, ToolLocator,
};

#[derive(Parser)]
#[command(name = "audio-tempo")]
#[command(about = "Change audio speed without changing pitch, using ffmpeg")]
struct Args {
    /// Configuration file (default: <config dir>/audio-tempo/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output progress and results as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert audio files; directories are searched recursively
    Convert {
        /// Audio files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Speed multiplier (e.g. 1.5 = 50% faster)
        #[arg(short, long)]
        speed: Option<f64>,

        /// Output file (only with a single input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for converted files (default: next to each input)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// ffmpeg executable to use instead of auto-detection
        #[arg(long)]
        ffmpeg: Option<PathBuf>,

        /// ffprobe executable to use instead of auto-detection
        #[arg(long)]
        ffprobe: Option<PathBuf>,

        /// Number of parallel conversions
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-file timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Show the detected ffmpeg and ffprobe executables
    Detect,

    /// Print the atempo filter chain for a speed
    Plan {
        #[arg(short, long)]
        speed: f64,
    },

    /// Print the default output path for an input file
    SuggestOutput {
        input: PathBuf,

        #[arg(short, long)]
        speed: f64,
    },

    /// Write the effective configuration to the config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let json = args.json;
    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if json {
                JsonMessage::error(format!("{:#}", e)).emit();
            }
            Err(e)
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().or_else(Config::default_path);
    let mut config = match config_path {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if args.json {
        config.json_output = true;
    }

    match args.command {
        Command::Convert {
            inputs,
            speed,
            output,
            output_dir,
            ffmpeg,
            ffprobe,
            workers,
            timeout,
        } => {
            if let Some(speed) = speed {
                config.speed = speed;
            }
            if output_dir.is_some() {
                config.output_dir = output_dir;
            }
            if ffmpeg.is_some() {
                config.ffmpeg_path = ffmpeg;
            }
            if ffprobe.is_some() {
                config.ffprobe_path = ffprobe;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if timeout.is_some() {
                config.timeout_secs = timeout;
            }
            convert(&config, &inputs, output).await
        }
        Command::Detect => detect(&config).await,
        Command::Plan { speed } => {
            let chain = FilterChain::plan(speed)?;
            println!("{}", chain);
            Ok(())
        }
        Command::SuggestOutput { input, speed } => {
            FilterChain::plan(speed)?;
            let path =
                PathResolver::default_output_path(&input, speed, config.output_dir.as_deref());
            println!("{}", path.display());
            Ok(())
        }
        Command::InitConfig => {
            let path = config_path
                .ok_or_else(|| anyhow::anyhow!("Could not determine a config directory"))?;
            config.save_to_file(&path).await?;
            info!("Wrote configuration to {}", path.display());
            Ok(())
        }
    }
}

async fn convert(config: &Config, inputs: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    if let Some(ref output_dir) = config.output_dir {
        if !output_dir.exists() {
            tokio::fs::create_dir_all(output_dir).await?;
            info!("Created output directory: {}", output_dir.display());
        }
    }

    let files = FileManager::expand_inputs(inputs)?;
    if files.is_empty() {
        return Err(anyhow::anyhow!("No audio files found"));
    }
    if output.is_some() && files.len() != 1 {
        return Err(anyhow::anyhow!(
            "--output can only be used with a single input file ({} found)",
            files.len()
        ));
    }

    let requests: Vec<ConversionRequest> = files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let request = ConversionRequest::new(
                format!("job-{}", index + 1),
                file.to_string_lossy(),
                config.speed,
            );
            match output {
                Some(ref path) => request.with_output(path.to_string_lossy()),
                None => request,
            }
        })
        .collect();

    let runner = Arc::new(JobRunner::new(config));
    let batch = BatchConverter::new(runner, config.workers);

    let stats = if config.json_output {
        let (results, stats) = batch.run_with_stats(&requests, &JsonSink).await;
        for result in results {
            JsonMessage::Result(result).emit();
        }
        JsonMessage::summary(&stats).emit();
        stats
    } else {
        let manager = ProgressManager::new();
        for (request, file) in requests.iter().zip(&files) {
            let label = file
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| file.display().to_string());
            manager.add_job(&request.job_id, &label);
        }

        let sink: &dyn ProgressSink = &manager;
        let (results, stats) = batch.run_with_stats(&requests, sink).await;
        for result in &results {
            match (&result.output_path, &result.error) {
                (Some(path), _) => manager.println(&format!("✅ {}", path.display())),
                (None, Some(error)) => manager.println(&format!(
                    "❌ {}: {}",
                    result.job_id.as_deref().unwrap_or("job"),
                    error
                )),
                (None, None) => {}
            }
        }
        manager.println(&stats.format_summary());
        stats
    };

    if stats.failed > 0 {
        return Err(anyhow::anyhow!(
            "{} of {} conversions failed",
            stats.failed,
            stats.total()
        ));
    }
    Ok(())
}

async fn detect(config: &Config) -> Result<()> {
    let locator = ToolLocator::default();
    let ffmpeg = match config.ffmpeg_path.clone() {
        Some(path) => Some(path),
        None => locator.ffmpeg().await,
    };
    let ffprobe = match config.ffprobe_path.clone() {
        Some(path) => Some(path),
        None => locator.ffprobe(ffmpeg.as_deref()).await,
    };

    if config.json_output {
        JsonMessage::Tools { ffmpeg, ffprobe }.emit();
        return Ok(());
    }

    let show = |path: &Option<PathBuf>| match path {
        Some(path) => format!("✅ {}", path.display()),
        None => "❌ not found".to_string(),
    };
    println!("Platform: {:?}", locator.platform());
    println!("ffmpeg:  {}", show(&ffmpeg));
    println!("ffprobe: {}", show(&ffprobe));
    Ok(())
}
