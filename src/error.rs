//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Categorie di errori:
//! - `Validation`: job id o path di input mancanti (prima dello spawn)
//! - `InvalidSpeed`: velocità non finita o non positiva
//! - `ToolNotFound`: ffmpeg non risolto (prima dello spawn)
//! - `Spawn`: il processo non è partito (messaggio del sistema operativo)
//! - `Runtime`: exit code diverso da zero, con la coda di stderr come messaggio
//! - `TimedOut`: job interrotto dal timeout opzionale
//!
//! I fallimenti di probing e le righe di progresso malformate non hanno
//! una variante: vengono tollerati e registrati solo nei log.
//!
//! ## Esempio:
//! ```ignore
//! if ffmpeg_path.is_none() {
//!     return Err(ConvertError::ToolNotFound("ffmpeg".to_string()));
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Custom error types for tempo conversion jobs
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidSpeed(String),

    #[error("{0} not found. Install it or select it manually.")]
    ToolNotFound(String),

    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Carries the process diagnostic verbatim.
    #[error("{0}")]
    Runtime(String),

    #[error("conversion timed out after {0:?}")]
    TimedOut(Duration),
}

pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_message_is_verbatim() {
        let err = ConvertError::Runtime("codec not found".to_string());
        assert_eq!(err.to_string(), "codec not found");
    }

    #[test]
    fn test_spawn_message_includes_os_error() {
        let err = ConvertError::Spawn {
            program: PathBuf::from("/opt/ffmpeg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        };
        let message = err.to_string();
        assert!(message.contains("/opt/ffmpeg"));
        assert!(message.contains("No such file or directory"));
    }

    #[test]
    fn test_timeout_message() {
        let err = ConvertError::TimedOut(Duration::from_secs(90));
        assert_eq!(err.to_string(), "conversion timed out after 90s");

        let err = ConvertError::TimedOut(Duration::from_millis(50));
        assert_eq!(err.to_string(), "conversion timed out after 50ms");
    }
}
