//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per la comunicazione
//! con l'applicazione ospite (UI Electron o altro processo).
//!
//! ## Tipi di messaggi (una riga JSON per messaggio su stdout):
//! - `progress`: evento di progresso di un job
//! - `result`: esito finale di un job
//! - `tools`: percorsi di ffmpeg/ffprobe rilevati
//! - `summary`: statistiche finali del batch
//! - `error`: errore generale prima dell'avvio dei job

use crate::job::{ConversionResult, ProgressEvent, ProgressSink};
use crate::progress::BatchStats;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JsonMessage {
    Progress(ProgressEvent),

    Result(ConversionResult),

    Tools {
        ffmpeg: Option<PathBuf>,
        ffprobe: Option<PathBuf>,
    },

    Summary {
        converted: usize,
        failed: usize,
    },

    Error {
        message: String,
    },
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn summary(stats: &BatchStats) -> Self {
        Self::Summary {
            converted: stats.converted,
            failed: stats.failed,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Progress sink printing each event as a JSON line
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl ProgressSink for JsonSink {
    fn emit(&self, event: ProgressEvent) {
        JsonMessage::Progress(event).emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobStatus;

    #[test]
    fn test_progress_message_is_flat() {
        let message = JsonMessage::Progress(ProgressEvent {
            job_id: "j1".to_string(),
            status: JobStatus::Failed,
            percent: 12.5,
            message: Some("codec not found".to_string()),
        });
        let json: serde_json::Value = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["jobId"], "j1");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "codec not found");
    }

    #[test]
    fn test_result_message() {
        let message = JsonMessage::Result(ConversionResult::success(
            "j1",
            PathBuf::from("/music/a_x2.mp3"),
        ));
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(
            json,
            r#"{"type":"result","ok":true,"jobId":"j1","outputPath":"/music/a_x2.mp3"}"#
        );
    }

    #[test]
    fn test_tools_and_summary_round_trip() {
        let tools = JsonMessage::Tools {
            ffmpeg: Some(PathBuf::from("/usr/bin/ffmpeg")),
            ffprobe: None,
        };
        let json = serde_json::to_string(&tools).unwrap();
        assert_eq!(serde_json::from_str::<JsonMessage>(&json).unwrap(), tools);

        let mut stats = BatchStats::new();
        stats.converted = 3;
        let json = serde_json::to_value(JsonMessage::summary(&stats)).unwrap();
        assert_eq!(json["type"], "summary");
        assert_eq!(json["converted"], 3);
    }
}
