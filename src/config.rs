//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri di conversione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `speed`: Velocità di default (default: 1.0)
//! - `workers`: Numero di job paralleli (default: 2)
//! - `ffmpeg_path` / `ffprobe_path`: Percorsi espliciti dei tool (default: auto-detect)
//! - `output_dir`: Directory di output (default: None = accanto al file di input)
//! - `stderr_tail_chars`: Caratteri di stderr conservati per la diagnostica (default: 6000)
//! - `timeout_secs`: Timeout per job (default: None = nessun timeout)
//! - `json_output`: Output JSON per la UI (default: false)
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     speed: 1.5,
//!     workers: 4,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::progress_parser::DEFAULT_TAIL_CHARS;
use crate::tempo::validate_speed;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for tempo conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default speed multiplier
    pub speed: f64,
    /// Number of conversions running at once
    pub workers: usize,
    /// Explicit ffmpeg executable
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit ffprobe executable
    pub ffprobe_path: Option<PathBuf>,
    /// Output directory for converted files (None = next to the input)
    pub output_dir: Option<PathBuf>,
    /// Stderr characters kept for failure messages
    pub stderr_tail_chars: usize,
    /// Per-job timeout in seconds (None = wait for ffmpeg to exit)
    pub timeout_secs: Option<u64>,
    /// Output progress and results as JSON lines
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: 1.0,
            workers: 2,
            ffmpeg_path: None,
            ffprobe_path: None,
            output_dir: None,
            stderr_tail_chars: DEFAULT_TAIL_CHARS,
            timeout_secs: None,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        validate_speed(self.speed)?;

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.stderr_tail_chars == 0 {
            return Err(anyhow::anyhow!("stderr_tail_chars must be greater than 0"));
        }

        if self.timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Timeout must be at least 1 second"));
        }

        if let Some(ref output_dir) = self.output_dir {
            if output_dir.exists() && !output_dir.is_dir() {
                return Err(anyhow::anyhow!(
                    "Output path is not a directory: {}",
                    output_dir.display()
                ));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Default location: `<config dir>/audio-tempo/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("audio-tempo").join("config.json"))
    }

    /// Load configuration from file; a missing file yields the defaults
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
