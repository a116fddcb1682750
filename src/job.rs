//! # Job Data Model
//!
//! Questo modulo definisce i tipi scambiati con l'applicazione ospite.
//!
//! ## Strutture dati:
//! - `ConversionRequest`: richiesta di conversione (job id, input, output, velocità, ffmpeg)
//! - `ProgressEvent`: evento di progresso emesso durante l'esecuzione
//! - `ConversionResult`: esito finale, prodotto una sola volta per job
//! - `ProgressSink`: destinazione degli eventi di progresso
//!
//! I nomi dei campi JSON sono in camelCase, come li invia e riceve la UI.

use crate::error::{ConvertError, Result};
use crate::tempo::validate_speed;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// A single conversion request from the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRequest {
    pub job_id: String,
    pub input_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub speed: f64,
    /// Explicit ffmpeg location, taking precedence over detection
    #[serde(default, alias = "ffmpegPath", skip_serializing_if = "Option::is_none")]
    pub tool_path: Option<String>,
}

/// Request fields after trimming and validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub speed: f64,
    pub tool_path: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(job_id: impl Into<String>, input_path: impl Into<String>, speed: f64) -> Self {
        Self {
            job_id: job_id.into(),
            input_path: input_path.into(),
            output_path: None,
            speed,
            tool_path: None,
        }
    }

    pub fn with_output(mut self, output_path: impl Into<String>) -> Self {
        self.output_path = Some(output_path.into());
        self
    }

    pub fn with_tool_path(mut self, tool_path: impl Into<String>) -> Self {
        self.tool_path = Some(tool_path.into());
        self
    }

    /// Trim and check the request. Blank optional paths count as absent.
    pub fn validate(&self) -> Result<ValidatedRequest> {
        let job_id = self.job_id.trim();
        if job_id.is_empty() {
            return Err(ConvertError::Validation("Job ID is required.".to_string()));
        }

        let input_path = self.input_path.trim();
        if input_path.is_empty() {
            return Err(ConvertError::Validation("Input file is required.".to_string()));
        }

        let speed = validate_speed(self.speed)?;

        Ok(ValidatedRequest {
            job_id: job_id.to_string(),
            input_path: PathBuf::from(input_path),
            output_path: non_blank(self.output_path.as_deref()),
            speed,
            tool_path: non_blank(self.tool_path.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Lifecycle state reported with each progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Progress notification for one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: String,
    pub status: JobStatus,
    /// In `[0, 100]`, rounded to two decimals
    pub percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Final outcome of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(job_id: impl Into<String>, output_path: PathBuf) -> Self {
        Self {
            ok: true,
            job_id: Some(job_id.into()),
            output_path: Some(output_path),
            error: None,
        }
    }

    pub fn failure(job_id: Option<String>, error: &ConvertError) -> Self {
        Self {
            ok: false,
            job_id,
            output_path: None,
            error: Some(error.to_string()),
        }
    }
}

/// Receives progress events while a job runs
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Forwards events into an unbounded channel; a closed receiver drops them.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub UnboundedSender<ProgressEvent>);

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.0.send(event);
    }
}
