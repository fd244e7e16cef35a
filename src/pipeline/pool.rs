//! Worker pool: one tokio task per work batch
//!
//! Each task probes its batch sequentially and sends result lines over a
//! shared channel tagged with its batch index. The pool drains the channel
//! until every sender is gone, then joins every task.

use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::error::CheckerError;
use crate::pipeline::partitioner::WorkBatch;
use crate::validation::prober::{BatchStats, Prober};

enum WorkerEvent {
    Result { index: usize, line: String },
    Finished { index: usize, stats: BatchStats },
}

/// What one worker handed back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerOutput {
    pub index: usize,
    pub lines: Vec<String>,
    pub stats: BatchStats,
    /// False when the worker was aborted or panicked before finishing
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PoolReport {
    /// One entry per batch, in batch-index order
    pub outputs: Vec<WorkerOutput>,
    pub deadline_expired: bool,
    pub panicked: Vec<usize>,
    pub elapsed: Duration,
}

impl PoolReport {
    pub fn total_stats(&self) -> BatchStats {
        let mut total = BatchStats::default();
        for output in &self.outputs {
            total.merge(&output.stats);
        }
        total
    }

    pub fn result_count(&self) -> usize {
        self.outputs.iter().map(|o| o.lines.len()).sum()
    }

    /// Result lines of every worker, in batch-index order.
    pub fn result_lines(&self) -> impl Iterator<Item = &str> {
        self.outputs
            .iter()
            .flat_map(|o| o.lines.iter().map(String::as_str))
    }
}

/// Run one task per batch and wait for all of them.
///
/// With a `deadline`, tasks still running when it expires are aborted and
/// the results they already sent are kept.
pub async fn run_workers(
    prober: Arc<Prober>,
    batches: Vec<WorkBatch>,
    deadline: Option<Duration>,
) -> PoolReport {
    let started = Instant::now();
    let mut outputs: Vec<WorkerOutput> = batches
        .iter()
        .map(|batch| WorkerOutput {
            index: batch.index,
            ..WorkerOutput::default()
        })
        .collect();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handles: Vec<JoinHandle<()>> = batches
        .into_iter()
        .map(|batch| spawn_worker(prober.clone(), batch, tx.clone()))
        .collect();
    drop(tx);

    let drain = async {
        while let Some(event) = rx.recv().await {
            record(&mut outputs, event);
        }
    };

    let deadline_expired = match deadline {
        Some(limit) => tokio::time::timeout(limit, drain).await.is_err(),
        None => {
            drain.await;
            false
        }
    };

    if deadline_expired {
        let err = CheckerError::WorkerPool(format!(
            "deadline of {}s expired",
            deadline.unwrap_or_default().as_secs()
        ));
        error!("{err}; aborting unfinished workers");
        for handle in &handles {
            handle.abort();
        }
    }

    let mut panicked = Vec::new();
    for (position, joined) in join_all(handles).await.into_iter().enumerate() {
        let Err(err) = joined else { continue };
        let index = outputs.get(position).map_or(position, |o| o.index);
        if err.is_panic() {
            let err = CheckerError::WorkerPool(format!("worker {index:04} panicked"));
            error!("{err}; keeping the results it sent");
            panicked.push(index);
        } else {
            debug!("worker {index:04} cancelled");
        }
    }

    // Events sent between the deadline and the abort are still buffered
    while let Ok(event) = rx.try_recv() {
        record(&mut outputs, event);
    }

    let unfinished = outputs.iter().filter(|o| !o.completed).count();
    if unfinished > 0 {
        warn!("{unfinished} worker(s) did not finish their batch");
    }

    PoolReport {
        outputs,
        deadline_expired,
        panicked,
        elapsed: started.elapsed(),
    }
}

fn spawn_worker(
    prober: Arc<Prober>,
    batch: WorkBatch,
    tx: mpsc::UnboundedSender<WorkerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let index = batch.index;
        debug!("worker {index:04} starting on {} line(s)", batch.len());

        let stats = prober
            .probe_batch(&batch.lines, |result| {
                let _ = tx.send(WorkerEvent::Result {
                    index,
                    line: result.to_line(),
                });
            })
            .await;

        info!(
            "worker {index:04} finished: {} line(s), {} probed, {} reported",
            stats.lines, stats.probed, stats.emitted
        );
        let _ = tx.send(WorkerEvent::Finished { index, stats });
    })
}

fn record(outputs: &mut [WorkerOutput], event: WorkerEvent) {
    match event {
        WorkerEvent::Result { index, line } => {
            if let Some(output) = outputs.iter_mut().find(|o| o.index == index) {
                output.lines.push(line);
            }
        }
        WorkerEvent::Finished { index, stats } => {
            if let Some(output) = outputs.iter_mut().find(|o| o.index == index) {
                output.stats = stats;
                output.completed = true;
            }
        }
    }
}
