//! Static partitioning of the URL list into work batches

use crate::core::error::{CheckerError, Result};

/// Batch sizes for a given line count and requested worker count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    pub total_lines: usize,
    pub requested_workers: usize,
    pub chunk_size: usize,
    pub remainder: usize,
    pub batch_sizes: Vec<usize>,
}

impl PartitionPlan {
    /// Effective number of workers, one per batch
    pub fn worker_count(&self) -> usize {
        self.batch_sizes.len()
    }

    /// Cut `lines` into contiguous batches following this plan.
    pub fn split(&self, lines: Vec<String>) -> Result<Vec<WorkBatch>> {
        if lines.len() != self.total_lines {
            return Err(CheckerError::InvalidArgument(format!(
                "plan covers {} lines but {} were supplied",
                self.total_lines,
                lines.len()
            )));
        }

        let mut remaining = lines.into_iter();
        Ok(self
            .batch_sizes
            .iter()
            .enumerate()
            .map(|(index, &size)| WorkBatch {
                index,
                lines: remaining.by_ref().take(size).collect(),
            })
            .collect())
    }
}

/// A contiguous run of input lines owned by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkBatch {
    pub index: usize,
    pub lines: Vec<String>,
}

impl WorkBatch {
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Compute batch sizes for `total` lines over `workers` workers.
///
/// `workers` batches of `total / workers` lines are produced, plus one extra
/// batch for the remainder. With fewer lines than workers everything goes
/// into a single batch.
///
/// # Examples
/// ```
/// use urlchecker::pipeline::partitioner::plan;
///
/// assert_eq!(plan(10, 3).unwrap().batch_sizes, vec![3, 3, 3, 1]);
/// assert_eq!(plan(2, 6).unwrap().batch_sizes, vec![2]);
/// ```
pub fn plan(total: usize, workers: usize) -> Result<PartitionPlan> {
    if workers == 0 {
        return Err(CheckerError::InvalidArgument(
            "worker count must be at least 1".to_string(),
        ));
    }

    let chunk_size = total / workers;
    let remainder = total % workers;

    let batch_sizes = if chunk_size == 0 {
        vec![remainder]
    } else {
        let mut sizes = vec![chunk_size; workers];
        if remainder > 0 {
            sizes.push(remainder);
        }
        sizes
    };

    Ok(PartitionPlan {
        total_lines: total,
        requested_workers: workers,
        chunk_size,
        remainder,
        batch_sizes,
    })
}

/// Plan and split in one step.
pub fn partition(lines: Vec<String>, workers: usize) -> Result<Vec<WorkBatch>> {
    plan(lines.len(), workers)?.split(lines)
}
