//! # Batch Converter
//!
//! Orchestratore per più job: ogni richiesta viene eseguita dal `JobRunner`
//! con un numero massimo di conversioni in parallelo (`workers`).
//! I job non condividono stato: ognuno ha il proprio processo, buffer e percentuale.

use crate::converter::job_runner::JobRunner;
use crate::job::{ConversionRequest, ConversionResult, ProgressSink};
use crate::progress::BatchStats;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Runs many conversion requests with bounded concurrency
pub struct BatchConverter {
    runner: Arc<JobRunner>,
    semaphore: Arc<Semaphore>,
}

impl BatchConverter {
    pub fn new(runner: Arc<JobRunner>, workers: usize) -> Self {
        info!("🔧 Running up to {} conversions at once", workers.max(1));
        Self {
            runner,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Run every request; results come back in request order
    pub async fn run(
        &self,
        requests: &[ConversionRequest],
        sink: &dyn ProgressSink,
    ) -> Vec<ConversionResult> {
        let jobs = requests.iter().map(|request| async move {
            // Never closed, so a permit is always granted.
            let _permit = self.semaphore.acquire().await.ok();
            debug!("Starting job {}", request.job_id);
            self.runner.run(request, sink).await
        });
        join_all(jobs).await
    }

    /// Run the batch and tally the outcome
    pub async fn run_with_stats(
        &self,
        requests: &[ConversionRequest],
        sink: &dyn ProgressSink,
    ) -> (Vec<ConversionResult>, BatchStats) {
        let results = self.run(requests, sink).await;
        let mut stats = BatchStats::new();
        for result in &results {
            stats.record(result);
        }
        (results, stats)
    }
}
