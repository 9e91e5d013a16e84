//! Bounded concurrent batch runner.

use super::DiagramPipeline;
use crate::logging::generate_run_id;
use crate::question::{DiagramRequest, DiagramResult, DiagramStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, info_span, warn, Instrument};

/// Results of one batch, in request order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<DiagramResult>,
}

impl BatchReport {
    pub fn count(&self, status: DiagramStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }
}

/// Question tasks of one batch.
///
/// Dropping the batch future (client disconnect, request timeout) cancels
/// the batch token and detaches the tasks instead of aborting them, so a
/// running stage finishes and no further attempt starts.
struct InFlight {
    tasks: JoinSet<(usize, DiagramResult)>,
    _cancel_on_drop: DropGuard,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            debug!(
                questions = self.tasks.len(),
                "Batch dropped, letting running questions wind down"
            );
        }
        self.tasks.detach_all();
    }
}

/// Process `requests` with at most `concurrency` questions in flight.
///
/// A question task that panics yields `skipped_exhausted` for that question
/// only. Cancelling `cancel`, or dropping the returned future, stops every
/// question before its next attempt.
pub async fn run_batch(
    pipeline: Arc<DiagramPipeline>,
    requests: Vec<DiagramRequest>,
    concurrency: usize,
    cancel: CancellationToken,
) -> BatchReport {
    let run_id = generate_run_id();
    let started_at = Utc::now();
    let span = info_span!("batch", run_id = %run_id);

    let results = async {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
        let batch_cancel = cancel.child_token();
        let mut in_flight = InFlight {
            tasks: JoinSet::new(),
            _cancel_on_drop: batch_cancel.clone().drop_guard(),
        };

        for (index, request) in requests.iter().cloned().enumerate() {
            let pipeline = pipeline.clone();
            let semaphore = semaphore.clone();
            let cancel = batch_cancel.clone();
            in_flight.tasks.spawn(
                async move {
                    let _permit = semaphore.acquire_owned().await;
                    (index, pipeline.process(&request, &cancel).await)
                }
                .in_current_span(),
            );
        }

        let mut slots: Vec<Option<DiagramResult>> = vec![None; requests.len()];
        while let Some(joined) = in_flight.tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "Question task failed"),
            }
        }

        let results: Vec<DiagramResult> = slots
            .into_iter()
            .zip(&requests)
            .map(|(slot, request)| {
                slot.unwrap_or_else(|| DiagramResult::exhausted(&request.question_id, 0, None))
            })
            .collect();

        info!(
            questions = results.len(),
            attached = results.iter().filter(|r| r.has_diagram()).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch finished"
        );
        results
    }
    .instrument(span)
    .await;

    BatchReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        results,
    }
}
