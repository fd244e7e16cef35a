use crate::config::Config;
use crate::notify::notifier::NotifySummary;
use crate::pipeline::partitioner::PartitionPlan;
use crate::pipeline::pool::PoolReport;
use crate::reporting::collator::{Accumulator, CollationStats};
use log::{debug, error, info, warn};

/// Initialize the logger with appropriate level based on verbosity
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logger initialized with level: {level:?}");
}

/// Log configuration information
pub fn log_config_info(config: &Config) {
    let deadline = config
        .worker_deadline
        .map_or_else(|| "none".to_string(), |secs| format!("{secs}s"));

    info!(
        "Configuration: workers={}, timeout={}s, deadline={deadline}",
        config.process_count(),
        config.timeout_duration().as_secs()
    );
    info!("Resolver host: {}", config.redirector_host());
    debug!(
        "Files: in_file={}, temp_directory={}, exclude={}, mailing_list={}",
        config.in_file.as_deref().unwrap_or("-"),
        config.temp_directory.as_deref().unwrap_or("-"),
        config.exclude.as_deref().unwrap_or("-"),
        config.mailing_list.as_deref().unwrap_or("-")
    );
    debug!(
        "Mail: server={}, from={}",
        config.smtp_server.as_deref().unwrap_or("-"),
        config.from_mail.as_deref().unwrap_or("-")
    );
}

/// Log how the input was split
pub fn log_partition_plan(plan: &PartitionPlan) {
    info!(
        "Partitioned {} line(s) into {} batch(es) (requested {} worker(s), chunk size {})",
        plan.total_lines,
        plan.worker_count(),
        plan.requested_workers,
        plan.chunk_size
    );
    if plan.remainder > 0 && plan.chunk_size > 0 {
        debug!("Extra batch for {} remaining line(s)", plan.remainder);
    }
}

/// Log the outcome of the worker pool
pub fn log_pool_complete(report: &PoolReport) {
    let stats = report.total_stats();
    info!(
        "Probing complete: {} line(s), {} probed, {} reported ({}ms)",
        stats.lines,
        stats.probed,
        report.result_count(),
        report.elapsed.as_millis()
    );
    debug!(
        "Skipped: {} malformed, {} excluded, {} repeated",
        stats.malformed, stats.excluded, stats.duplicates
    );
}

/// Log collation counters
pub fn log_collation(stats: &CollationStats, accumulator: &Accumulator) {
    info!(
        "Collated {} result(s) into {} report(s)",
        stats.routed,
        accumulator.len()
    );
    if stats.malformed > 0 {
        warn!("{} malformed result line(s) skipped", stats.malformed);
    }
    if stats.dropped > 0 {
        debug!("{} result(s) with unreported codes dropped", stats.dropped);
    }
}

/// Log the notification summary
pub fn log_notification(summary: &NotifySummary) {
    if summary.failed == 0 {
        info!(
            "Notification complete: {} sent, {} skipped",
            summary.sent, summary.skipped
        );
    } else {
        warn!(
            "Notification complete: {} sent, {} failed, {} skipped",
            summary.sent, summary.failed, summary.skipped
        );
    }
}

/// Log error information
pub fn log_error(message: &str, source: Option<&dyn std::error::Error>) {
    match source {
        Some(err) => error!("{message}: {err}"),
        None => error!("{message}"),
    }
}
