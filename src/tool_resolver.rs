//! # Tool Path Resolver
//!
//! This module handles finding ffmpeg and ffprobe on the host:
//! - Environment variable overrides (`FFMPEG_PATH`, `FFPROBE_PATH`)
//! - ffprobe next to an already-resolved ffmpeg
//! - OS-native PATH lookup (`which` / `where`)
//! - Fixed per-platform install locations
//!
//! Every failure falls through to the next step; total failure is `None`.

use crate::platform::{Platform, Tool};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads an environment variable; injectable so lookups can be isolated.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Locates external tool executables for the current platform
#[derive(Clone)]
pub struct ToolLocator {
    platform: Platform,
    env: EnvLookup,
    system_lookup: bool,
    candidates: HashMap<Tool, Vec<PathBuf>>,
}

impl ToolLocator {
    /// Create a locator reading the process environment and the platform tables
    pub fn new(platform: Platform) -> Self {
        let candidates = [Tool::Ffmpeg, Tool::Ffprobe]
            .into_iter()
            .map(|tool| {
                let paths = platform
                    .candidates(tool)
                    .iter()
                    .map(PathBuf::from)
                    .collect();
                (tool, paths)
            })
            .collect();

        Self {
            platform,
            env: Arc::new(|name| std::env::var(name).ok()),
            system_lookup: true,
            candidates,
        }
    }

    /// Replace the environment source.
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    /// Skip the `which`/`where` step.
    pub fn without_system_lookup(mut self) -> Self {
        self.system_lookup = false;
        self
    }

    /// Replace the fixed fallback locations for one tool.
    pub fn with_candidates(mut self, tool: Tool, candidates: Vec<PathBuf>) -> Self {
        self.candidates.insert(tool, candidates);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Resolve ffmpeg: env override, PATH lookup, then fixed candidates
    pub async fn ffmpeg(&self) -> Option<PathBuf> {
        let path = self
            .locate(
                self.platform.executable_name(Tool::Ffmpeg),
                Tool::Ffmpeg.env_var(),
                self.candidates_for(Tool::Ffmpeg),
            )
            .await;
        if path.is_none() {
            warn!("Tool not found: ffmpeg");
        }
        path
    }

    /// Resolve ffprobe, preferring the binary shipped next to `ffmpeg`
    pub async fn ffprobe(&self, ffmpeg: Option<&Path>) -> Option<PathBuf> {
        let command = self.platform.executable_name(Tool::Ffprobe);

        if let Some(path) = self.env_override(Tool::Ffprobe.env_var()) {
            return Some(path);
        }

        if let Some(sibling) = ffmpeg.and_then(Path::parent).map(|dir| dir.join(command)) {
            debug!("Checking ffprobe next to ffmpeg: {:?}", sibling);
            if sibling.exists() {
                return Some(sibling);
            }
        }

        let path = self
            .locate(command, Tool::Ffprobe.env_var(), self.candidates_for(Tool::Ffprobe))
            .await;
        if path.is_none() {
            debug!("ffprobe not found, progress will not be duration based");
        }
        path
    }

    /// Generic resolution chain used by both tools
    pub async fn locate(
        &self,
        command: &str,
        env_var: &str,
        candidates: &[PathBuf],
    ) -> Option<PathBuf> {
        debug!("Resolving tool: {}", command);

        if let Some(path) = self.env_override(env_var) {
            return Some(path);
        }

        if self.system_lookup {
            if let Some(path) = self.find_in_system_path(command).await {
                debug!("Using system tool: {} -> {:?}", command, path);
                return Some(path);
            }
        }

        let found = candidates.iter().find(|path| path.exists()).cloned();
        if let Some(ref path) = found {
            debug!("Using fallback location: {} -> {:?}", command, path);
        }
        found
    }

    fn candidates_for(&self, tool: Tool) -> &[PathBuf] {
        self.candidates.get(&tool).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Override from the environment, only if it points at an existing path
    fn env_override(&self, env_var: &str) -> Option<PathBuf> {
        let value = (self.env)(env_var)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let path = PathBuf::from(trimmed);
        if path.exists() {
            debug!("Using {} override: {:?}", env_var, path);
            Some(path)
        } else {
            debug!("Ignoring {} override, path does not exist: {:?}", env_var, path);
            None
        }
    }

    /// Ask `which`/`where`; any failure is treated as "not found"
    async fn find_in_system_path(&self, command: &str) -> Option<PathBuf> {
        let output = tokio::process::Command::new(self.platform.which_command())
            .arg(command)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                first_non_empty_line(&String::from_utf8_lossy(&output.stdout)).map(PathBuf::from)
            }
            Ok(output) => {
                debug!("{} {} exited with {}", self.platform.which_command(), command, output.status);
                None
            }
            Err(e) => {
                debug!("Failed to run {}: {}", self.platform.which_command(), e);
                None
            }
        }
    }
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

fn first_non_empty_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
