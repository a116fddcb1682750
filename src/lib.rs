//! # Audio Tempo Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Cambia la velocità di file audio senza alterarne il pitch, pilotando ffmpeg
//!   con una catena di filtri `atempo`
//! - Riporta il progresso dei job in tempo reale
//!
//! ## Architettura dei moduli:
//! - `tempo`: Scomposizione della velocità in stadi `atempo`
//! - `platform` / `tool_resolver`: Ricerca di ffmpeg e ffprobe
//! - `probe`: Durata del file sorgente con ffprobe
//! - `progress_parser`: Parsing dell'output `-progress` di ffmpeg
//! - `process`: Avvio dei processi esterni
//! - `job`: Richieste, eventi e risultati
//! - `converter`: Esecuzione dei job singoli e in batch
//! - `config`, `error`, `file_manager`, `json_output`, `progress`: layer applicativo
//!
//! ## Utilizzo:
//! ```ignore
//! use audio_tempo::{Config, ConversionRequest, JobRunner};
//!
//! let runner = JobRunner::new(&Config::default());
//! let request = ConversionRequest::new("job-1", "/music/talk.mp3", 1.5);
//! let result = runner.run(&request, &|event| println!("{:?}", event)).await;
//! ```

pub mod config;
pub mod converter;
pub mod error;
pub mod file_manager;
pub mod job;
pub mod json_output;
pub mod platform;
pub mod probe;
pub mod process;
pub mod progress;
pub mod progress_parser;
pub mod tempo;
pub mod tool_resolver;

pub use config::Config;
pub use converter::{BatchConverter, JobRunner, RunnerOptions};
pub use error::ConvertError;
pub use job::{ConversionRequest, ConversionResult, JobStatus, ProgressEvent, ProgressSink};
pub use tempo::FilterChain;
pub use tool_resolver::ToolLocator;
