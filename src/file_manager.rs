//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file audio da convertire.
//!
//! ## Responsabilità:
//! - Espansione degli input della command line (file e directory)
//! - Discovery ricorsiva di file audio in directory
//! - Determinazione del formato tramite estensione
//!
//! ## Formati supportati:
//! - **Audio**: MP3, WAV, FLAC, M4A, AAC, OGG
//!
//! ## Esempio:
//! ```ignore
//! let files = FileManager::expand_inputs(&[PathBuf::from("/path/to/album")])?;
//! ```

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions offered by the input picker
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "m4a", "aac", "ogg"];

/// Manages input discovery
pub struct FileManager;

impl FileManager {
    /// Turn command line inputs into a list of audio files.
    /// Files are kept as given; directories are walked recursively.
    pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for input in inputs {
            if input.is_dir() {
                files.extend(Self::find_audio_files(input)?);
            } else if input.exists() {
                files.push(input.clone());
            } else {
                return Err(anyhow::anyhow!("Input does not exist: {}", input.display()));
            }
        }
        Ok(files)
    }

    /// Find all supported audio files in a directory, sorted by path
    pub fn find_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| Self::is_supported_audio(path))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Check if a file extension is a supported audio format
    pub fn is_supported_audio(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
    }
}
