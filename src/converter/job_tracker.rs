//! # Job Progress Tracker
//!
//! Emette gli eventi di progresso di un singolo job e garantisce che venga
//! emesso al massimo un evento terminale (`done` o `failed`).

use crate::job::{JobStatus, ProgressEvent, ProgressSink};
use crate::progress_parser::clamp_percent;
use tracing::debug;

/// Per-job emitter with an "already finished" guard
pub struct JobTracker<'a> {
    job_id: String,
    sink: &'a dyn ProgressSink,
    latest_percent: f64,
    terminal: Option<JobStatus>,
}

impl<'a> JobTracker<'a> {
    pub fn new(job_id: impl Into<String>, sink: &'a dyn ProgressSink) -> Self {
        Self {
            job_id: job_id.into(),
            sink,
            latest_percent: 0.0,
            terminal: None,
        }
    }

    pub fn latest_percent(&self) -> f64 {
        self.latest_percent
    }

    /// Terminal status already reported, if any
    pub fn terminal(&self) -> Option<JobStatus> {
        self.terminal
    }

    /// Report a running percentage; ignored once the job is finished
    pub fn running(&mut self, percent: f64, message: Option<String>) {
        if self.terminal.is_some() {
            return;
        }
        self.latest_percent = self.latest_percent.max(clamp_percent(percent));
        self.send(JobStatus::Running, self.latest_percent, message);
    }

    /// Report completion at 100%. Returns false when a terminal event was already sent.
    pub fn done(&mut self) -> bool {
        if !self.finish(JobStatus::Done) {
            return false;
        }
        self.latest_percent = 100.0;
        self.send(JobStatus::Done, 100.0, None);
        true
    }

    /// Report failure at the last known percentage
    pub fn failed(&mut self, message: impl Into<String>) -> bool {
        if !self.finish(JobStatus::Failed) {
            return false;
        }
        self.send(JobStatus::Failed, self.latest_percent, Some(message.into()));
        true
    }

    fn finish(&mut self, status: JobStatus) -> bool {
        if let Some(previous) = self.terminal {
            debug!(
                "Job {}: ignoring {:?}, already {:?}",
                self.job_id, status, previous
            );
            return false;
        }
        self.terminal = Some(status);
        true
    }

    fn send(&self, status: JobStatus, percent: f64, message: Option<String>) {
        self.sink.emit(ProgressEvent {
            job_id: self.job_id.clone(),
            status,
            percent: clamp_percent(percent),
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<ProgressEvent>>);

    impl ProgressSink for Recorder {
        fn emit(&self, event: ProgressEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_single_terminal_event() {
        let recorder = Recorder::default();
        let mut tracker = JobTracker::new("job", &recorder);

        tracker.running(12.345, Some("ffmpeg".to_string()));
        assert!(tracker.done());
        assert!(!tracker.done());
        assert!(!tracker.failed("late failure"));
        tracker.running(50.0, None);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].percent, 12.35);
        assert_eq!(events[0].message.as_deref(), Some("ffmpeg"));
        assert_eq!(events[1].status, JobStatus::Done);
        assert_eq!(events[1].percent, 100.0);
        assert_eq!(tracker.terminal(), Some(JobStatus::Done));
    }

    #[test]
    fn test_failed_keeps_last_percent() {
        let recorder = Recorder::default();
        let mut tracker = JobTracker::new("job", &recorder);

        tracker.running(40.0, None);
        tracker.running(30.0, None);
        assert!(tracker.failed("boom"));

        let events = recorder.0.lock().unwrap();
        assert_eq!(events[1].percent, 40.0);
        assert_eq!(events[2].status, JobStatus::Failed);
        assert_eq!(events[2].percent, 40.0);
        assert_eq!(events[2].message.as_deref(), Some("boom"));
    }
}
