//! # Progress Display and Statistics Module
//!
//! Questo modulo gestisce il feedback visuale nel terminale e le statistiche
//! di un batch di conversioni.
//!
//! ## Componenti principali:
//! - `ProgressManager`: una progress bar `indicatif` per ogni job
//! - `BatchStats`: conteggio dei job convertiti e falliti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [=========================>--------------]  62% podcast.mp3
//! ```

use crate::job::{ConversionResult, JobStatus, ProgressEvent, ProgressSink};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// One progress bar per job, driven by `ProgressEvent`s
pub struct ProgressManager {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
    style: ProgressStyle,
}

impl ProgressManager {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");

        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    /// Register a job bar labelled with `label`
    pub fn add_job(&self, job_id: &str, label: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(self.style.clone());
        bar.set_prefix(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(job_id.to_string(), bar);
        }
    }

    /// Update the bar belonging to the event's job
    pub fn apply(&self, event: &ProgressEvent) {
        let Ok(bars) = self.bars.lock() else {
            return;
        };
        let Some(bar) = bars.get(&event.job_id) else {
            return;
        };

        bar.set_position(event.percent.floor() as u64);
        match event.status {
            JobStatus::Pending | JobStatus::Running => {
                if let Some(ref message) = event.message {
                    bar.set_message(message.clone());
                }
            }
            JobStatus::Done => bar.finish_with_message("✅ done"),
            JobStatus::Failed => {
                let reason = event
                    .message
                    .as_deref()
                    .and_then(|m| m.lines().last())
                    .unwrap_or("failed");
                bar.abandon_with_message(format!("❌ {}", reason));
            }
        }
    }

    /// Print a line above the bars
    pub fn println(&self, message: &str) {
        let _ = self.multi.println(message);
    }
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressManager {
    fn emit(&self, event: ProgressEvent) {
        self.apply(&event);
    }
}

/// Statistics tracker for a batch of conversions
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchStats {
    pub converted: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &ConversionResult) {
        if result.ok {
            self.converted += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.converted + self.failed
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Converted: {} | Failed: {}",
            self.total(),
            self.converted,
            self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;
    use std::path::PathBuf;

    #[test]
    fn test_stats_summary() {
        let mut stats = BatchStats::new();
        stats.record(&ConversionResult::success("a", PathBuf::from("a_x2.mp3")));
        stats.record(&ConversionResult {
            ok: false,
            job_id: Some("b".to_string()),
            output_path: None,
            error: Some("boom".to_string()),
        });
        assert_eq!(stats.total(), 2);
        assert_eq!(
            stats.format_summary(),
            "Processed: 2 files | Converted: 1 | Failed: 1"
        );
    }

    #[test]
    fn test_apply_updates_bar() {
        let manager = ProgressManager::new();
        manager.multi.set_draw_target(ProgressDrawTarget::hidden());
        manager.add_job("job", "song.mp3");

        manager.emit(ProgressEvent {
            job_id: "job".to_string(),
            status: JobStatus::Running,
            percent: 42.7,
            message: None,
        });
        manager.emit(ProgressEvent {
            job_id: "unknown".to_string(),
            status: JobStatus::Done,
            percent: 100.0,
            message: None,
        });

        let bars = manager.bars.lock().unwrap();
        let bar = bars.get("job").unwrap();
        assert_eq!(bar.position(), 42);
        assert!(!bar.is_finished());
    }
}
