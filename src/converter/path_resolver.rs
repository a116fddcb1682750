//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di output di default:
//! `<dir>/<stem>_x<velocità><ext>`, con il punto della velocità sostituito da `_`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Output path suggested for `input_path` at `speed`.
    /// With `output_dir` the file goes there instead of next to the input.
    pub fn default_output_path(input_path: &Path, speed: f64, output_dir: Option<&Path>) -> PathBuf {
        let file_name = Self::output_file_name(input_path, speed);
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(file_name)
    }

    /// `song.mp3` at 1.5 becomes `song_x1_5.mp3`
    fn output_file_name(input_path: &Path, speed: f64) -> OsString {
        let stem = input_path.file_stem().unwrap_or_default();
        let speed_token = Self::speed_token(speed);

        let mut name = OsString::from(stem);
        name.push(format!("_x{}", speed_token));
        if let Some(ext) = input_path.extension() {
            name.push(".");
            name.push(ext);
        }
        name
    }

    fn speed_token(speed: f64) -> String {
        speed.to_string().replacen('.', "_", 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_next_to_input() {
        assert_eq!(
            PathResolver::default_output_path(Path::new("/music/song.mp3"), 1.5, None),
            PathBuf::from("/music/song_x1_5.mp3")
        );
        assert_eq!(
            PathResolver::default_output_path(Path::new("/music/song.flac"), 2.0, None),
            PathBuf::from("/music/song_x2.flac")
        );
    }

    #[test]
    fn test_default_output_without_extension_or_dir() {
        assert_eq!(
            PathResolver::default_output_path(Path::new("podcast"), 0.75, None),
            PathBuf::from("podcast_x0_75")
        );
    }

    #[test]
    fn test_default_output_in_output_dir() {
        assert_eq!(
            PathResolver::default_output_path(
                Path::new("/music/album/track.ogg"),
                1.25,
                Some(Path::new("/tmp/out"))
            ),
            PathBuf::from("/tmp/out/track_x1_25.ogg")
        );
    }
}
