//! # Platform-specific tables
//!
//! Questo modulo centralizza i dati cross-platform per i tool esterni:
//! nome dell'eseguibile, comando di lookup nel PATH e percorsi di fallback.
//! Sono tabelle costanti selezionate tramite `Platform`, senza stato globale.

/// Operating system family, used to pick lookup commands and fallback paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

/// External tools driven by a conversion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Media processor running the atempo chain
    Ffmpeg,
    /// Prober used for the source duration
    Ffprobe,
}

const WINDOWS_FFMPEG: &[&str] = &[
    "C:\\ffmpeg\\bin\\ffmpeg.exe",
    "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
    "C:\\ProgramData\\chocolatey\\bin\\ffmpeg.exe",
];
const WINDOWS_FFPROBE: &[&str] = &[
    "C:\\ffmpeg\\bin\\ffprobe.exe",
    "C:\\Program Files\\ffmpeg\\bin\\ffprobe.exe",
    "C:\\ProgramData\\chocolatey\\bin\\ffprobe.exe",
];
const MACOS_FFMPEG: &[&str] = &[
    "/opt/homebrew/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/usr/bin/ffmpeg",
];
const MACOS_FFPROBE: &[&str] = &[
    "/opt/homebrew/bin/ffprobe",
    "/usr/local/bin/ffprobe",
    "/usr/bin/ffprobe",
];
const LINUX_FFMPEG: &[&str] = &["/usr/local/bin/ffmpeg", "/usr/bin/ffmpeg"];
const LINUX_FFPROBE: &[&str] = &["/usr/local/bin/ffprobe", "/usr/bin/ffprobe"];

impl Platform {
    /// Platform the binary was compiled for; other Unix systems use the Linux tables.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Command that prints the location of an executable found in PATH
    pub fn which_command(self) -> &'static str {
        match self {
            Self::Windows => "where",
            Self::MacOs | Self::Linux => "which",
        }
    }

    /// Executable file name of a tool on this platform
    pub fn executable_name(self, tool: Tool) -> &'static str {
        match (self, tool) {
            (Self::Windows, Tool::Ffmpeg) => "ffmpeg.exe",
            (Self::Windows, Tool::Ffprobe) => "ffprobe.exe",
            (_, Tool::Ffmpeg) => "ffmpeg",
            (_, Tool::Ffprobe) => "ffprobe",
        }
    }

    /// Fixed install locations checked after the PATH lookup, in order
    pub fn candidates(self, tool: Tool) -> &'static [&'static str] {
        match (self, tool) {
            (Self::Windows, Tool::Ffmpeg) => WINDOWS_FFMPEG,
            (Self::Windows, Tool::Ffprobe) => WINDOWS_FFPROBE,
            (Self::MacOs, Tool::Ffmpeg) => MACOS_FFMPEG,
            (Self::MacOs, Tool::Ffprobe) => MACOS_FFPROBE,
            (Self::Linux, Tool::Ffmpeg) => LINUX_FFMPEG,
            (Self::Linux, Tool::Ffprobe) => LINUX_FFPROBE,
        }
    }
}

impl Tool {
    /// Environment variable holding an explicit override path
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Ffmpeg => "FFMPEG_PATH",
            Self::Ffprobe => "FFPROBE_PATH",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
