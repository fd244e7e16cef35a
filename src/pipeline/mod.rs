//! End-to-end run
//!
//! Partition the URL list, probe every batch on its own task, collate the
//! results in batch order and mail one report per non-empty cell.

pub mod partitioner;
pub mod pool;
pub mod workfiles;

use std::sync::Arc;

use crate::config::Config;
use crate::core::error::{CheckerError, Result};
use crate::notify::directory::RecordTypeDirectory;
use crate::notify::mailer::SendMail;
use crate::notify::notifier::{Notifier, NotifySummary};
use crate::reporting::collator::{Accumulator, CollationStats, Collator};
use crate::reporting::logging;
use crate::validation::exclusion::ExclusionSet;
use crate::validation::probe::HttpProbe;
use crate::validation::prober::{BatchStats, Prober};

// Re-export commonly used items
pub use partitioner::{PartitionPlan, WorkBatch, partition, plan};
pub use pool::{PoolReport, WorkerOutput, run_workers};
pub use workfiles::{WorkFiles, persist_input, read_input_lines};

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub plan: PartitionPlan,
    pub probe_stats: BatchStats,
    pub deadline_expired: bool,
    pub collation: CollationStats,
    pub accumulator: Accumulator,
    pub notification: NotifySummary,
}

pub struct Pipeline {
    config: Config,
    http: Arc<dyn HttpProbe>,
    mailer: Arc<dyn SendMail>,
}

impl Pipeline {
    pub fn new(config: Config, http: Arc<dyn HttpProbe>, mailer: Arc<dyn SendMail>) -> Self {
        Self {
            config,
            http,
            mailer,
        }
    }

    pub async fn run(
        &self,
        lines: Vec<String>,
        directory: &RecordTypeDirectory,
        exclusion: ExclusionSet,
    ) -> Result<RunReport> {
        if lines.is_empty() {
            return Err(CheckerError::EmptyInput);
        }

        let plan = plan(lines.len(), self.config.process_count())?;
        logging::log_partition_plan(&plan);

        let work_files = WorkFiles::new(self.config.temp_directory()?);
        match work_files.prepare(plan.worker_count()) {
            Ok(removed) if removed > 0 => log::debug!("removed {removed} stale work file(s)"),
            Ok(_) => {}
            Err(err) => log::warn!(
                "couldn't prepare {}: {err}",
                work_files.dir().display()
            ),
        }

        let batches = plan.split(lines)?;
        work_files.write_batches_logged(&batches);

        let prober = Arc::new(Prober::new(
            self.http.clone(),
            Arc::new(exclusion),
            self.config.redirector_host(),
        )?);
        let pool =
            run_workers(prober, batches, self.config.worker_deadline_duration()).await;
        logging::log_pool_complete(&pool);

        for output in &pool.outputs {
            if let Err(err) = work_files.write_results(output.index, &output.lines) {
                log::warn!(
                    "couldn't write {}: {err}",
                    work_files.result_path(output.index).display()
                );
            }
        }

        let mut collator = Collator::new();
        collator.collate_stream(pool.result_lines());
        let collation = collator.stats();
        let accumulator = collator.finish();
        logging::log_collation(&collation, &accumulator);

        let notifier = Notifier::new(
            self.mailer.clone(),
            self.config.smtp_server()?,
            self.config.from_mail()?,
        );
        let notification = notifier.notify(&accumulator, directory).await;
        logging::log_notification(&notification);

        Ok(RunReport {
            plan,
            probe_stats: pool.total_stats(),
            deadline_expired: pool.deadline_expired,
            collation,
            accumulator,
            notification,
        })
    }
}
