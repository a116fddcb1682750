//! # Converter Module
//!
//! Modulo che separa le responsabilità in sottomoduli:
//! - `job_runner`: esecuzione di un singolo job
//! - `job_tracker`: emissione eventi con guardia sul terminale
//! - `batch`: più job in parallelo
//! - `path_resolver`: calcolo del path di output di default

pub mod batch;
pub mod job_runner;
pub mod job_tracker;
pub mod path_resolver;

pub use batch::BatchConverter;
pub use job_runner::{JobRunner, RunnerOptions};
pub use job_tracker::JobTracker;
pub use path_resolver::PathResolver;
