//! Parallel range execution over a worker thread pool.
//!
//! The scheduler fans a contiguous item range out across worker threads:
//! callers hand it a closure and an item count, the range `[0, item_count)`
//! is split into contiguous partitions, and every partition is invoked on the
//! pool. The closure must tolerate concurrent invocation over disjoint
//! ranges; the scheduler guarantees the partitions cover the range exactly
//! once with no overlap, and makes no ordering promise between them.
//!
//! Ownership of a job is unambiguous at the type level:
//!
//! - [`JobScheduler::create`] returns a joinable [`JobHandle`] that the
//!   caller runs, waits on, and drops. Dropping a running handle waits
//!   first, so a job is never torn down while incomplete.
//! - [`JobScheduler::spawn`] is fire-and-forget: no handle is returned, the
//!   scheduler owns the job and releases it when the last partition
//!   completes.
//!
//! There is no cancellation once a job runs and no timeout on waiting; jobs
//! are bounded CPU-side batch work, so every partition terminates. A created
//! job that is never run is the only form of cancellation.
//!
//! # Example
//!
//! ```
//! use carapace_core::jobs::{JobScheduler, JobSchedulerConfig, JobStatus};
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! let scheduler = JobScheduler::new(JobSchedulerConfig::default()).unwrap();
//!
//! let tiles: Vec<AtomicU32> = (0..256).map(|_| AtomicU32::new(0)).collect();
//! let tiles = std::sync::Arc::new(tiles);
//! let tiles_for_job = tiles.clone();
//!
//! let job = scheduler.create(256, move |range| {
//!     for i in range {
//!         tiles_for_job[i].store(1, Ordering::Relaxed);
//!     }
//! });
//!
//! scheduler.run(&job);
//! job.wait();
//! assert_eq!(job.status(), JobStatus::Complete);
//! assert!(tiles.iter().all(|t| t.load(Ordering::Relaxed) == 1));
//! ```

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{JobError, Result};

/// Counter for unique job IDs, used only for diagnostics.
static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for creating a [`JobScheduler`].
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Number of worker threads. `None` means use the number of CPU cores.
    pub num_threads: Option<usize>,
    /// Name prefix for worker threads.
    pub thread_name: String,
    /// Stack size for worker threads in bytes.
    pub stack_size: Option<usize>,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name: "carapace-job".to_string(),
            stack_size: None,
        }
    }
}

impl JobSchedulerConfig {
    /// Create a new configuration with a custom thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
            ..Default::default()
        }
    }
}

/// Execution status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobStatus {
    /// Created, not yet run.
    Pending = 0,
    /// Partitions are queued or executing on the pool.
    Running = 1,
    /// Every partition has executed.
    Complete = 2,
}

/// The partition function: invoked once per partition with a disjoint
/// sub-range of `[0, item_count)`.
type JobFn = dyn Fn(Range<usize>) + Send + Sync + 'static;

/// Shared per-job state.
struct JobState {
    id: u64,
    func: Arc<JobFn>,
    item_count: usize,
    /// Explicit partition size; `0` means split evenly across the pool.
    chunk_size: usize,
    status: AtomicU8,
    remaining_partitions: AtomicUsize,
    done_mutex: Mutex<()>,
    done_condvar: Condvar,
}

impl JobState {
    fn status(&self) -> JobStatus {
        match self.status.load(Ordering::Acquire) {
            0 => JobStatus::Pending,
            1 => JobStatus::Running,
            _ => JobStatus::Complete,
        }
    }

    fn mark_complete(&self) {
        let _guard = self.done_mutex.lock();
        self.status.store(JobStatus::Complete as u8, Ordering::Release);
        self.done_condvar.notify_all();
    }

    fn wait(&self) {
        let mut guard = self.done_mutex.lock();
        while self.status.load(Ordering::Acquire) != JobStatus::Complete as u8 {
            self.done_condvar.wait(&mut guard);
        }
    }
}

/// A joinable handle to a created job.
///
/// Move-only. Dropping a handle whose job is running waits for completion
/// first; dropping a handle that was never run discards the job without
/// executing it.
pub struct JobHandle {
    state: Arc<JobState>,
}

impl JobHandle {
    /// Diagnostic job ID, unique per scheduler process.
    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// Non-blocking status query.
    ///
    /// Transitions are monotonic: `Pending -> Running -> Complete`.
    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Block until every partition has executed.
    ///
    /// Returns immediately if the job is already complete, or if it was
    /// never started (a job that is never [`run`](JobScheduler::run) has
    /// nothing to wait for).
    pub fn wait(&self) {
        if self.state.status() == JobStatus::Pending {
            return;
        }
        self.state.wait();
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        // A running job keeps borrowing its closure until the last partition
        // finishes; never tear the handle down ahead of that.
        if self.state.status() == JobStatus::Running {
            self.state.wait();
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("id", &self.id())
            .field("status", &self.status())
            .field("item_count", &self.state.item_count)
            .finish()
    }
}

/// A worker-pool-backed parallel range scheduler.
///
/// The pool is private to the scheduler; pass the scheduler by reference to
/// whatever needs it rather than stashing it in a global.
pub struct JobScheduler {
    pool: ThreadPool,
    active_jobs: Arc<AtomicUsize>,
    idle_mutex: Arc<Mutex<()>>,
    idle_condvar: Arc<Condvar>,
}

impl JobScheduler {
    /// Create a new scheduler with the given configuration.
    pub fn new(config: JobSchedulerConfig) -> Result<Self> {
        let mut builder = ThreadPoolBuilder::new()
            .thread_name(move |index| format!("{}-{}", config.thread_name, index));

        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }

        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = builder
            .build()
            .map_err(|e| JobError::PoolCreation(e.to_string()))?;

        tracing::debug!(
            target: "carapace_core::jobs",
            num_threads = pool.current_num_threads(),
            "job scheduler created"
        );

        Ok(Self {
            pool,
            active_jobs: Arc::new(AtomicUsize::new(0)),
            idle_mutex: Arc::new(Mutex::new(())),
            idle_condvar: Arc::new(Condvar::new()),
        })
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Number of jobs currently running.
    pub fn active_jobs(&self) -> usize {
        self.active_jobs.load(Ordering::Acquire)
    }

    /// Create a job over `item_count` items without starting it.
    ///
    /// The range is split evenly across the pool's threads when the job is
    /// run. `func` receives each partition's sub-range and must be safe to
    /// invoke concurrently over disjoint ranges.
    pub fn create<F>(&self, item_count: usize, func: F) -> JobHandle
    where
        F: Fn(Range<usize>) + Send + Sync + 'static,
    {
        JobHandle {
            state: self.create_inner(item_count, 0, func),
        }
    }

    /// Create a job with an explicit partition size.
    ///
    /// Use this when items are so uneven that the default even split leaves
    /// threads idle; a `chunk_size` of zero is treated as one.
    pub fn create_chunked<F>(&self, item_count: usize, chunk_size: usize, func: F) -> JobHandle
    where
        F: Fn(Range<usize>) + Send + Sync + 'static,
    {
        JobHandle {
            state: self.create_inner(item_count, chunk_size.max(1), func),
        }
    }

    fn create_inner<F>(&self, item_count: usize, chunk_size: usize, func: F) -> Arc<JobState>
    where
        F: Fn(Range<usize>) + Send + Sync + 'static,
    {
        Arc::new(JobState {
            id: NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed),
            func: Arc::new(func),
            item_count,
            chunk_size,
            status: AtomicU8::new(JobStatus::Pending as u8),
            remaining_partitions: AtomicUsize::new(0),
            done_mutex: Mutex::new(()),
            done_condvar: Condvar::new(),
        })
    }

    /// Enqueue a created job's partitions onto the pool.
    ///
    /// Running a job that has already started is a no-op.
    pub fn run(&self, handle: &JobHandle) {
        self.run_state(&handle.state);
    }

    /// Create and immediately run a fire-and-forget job.
    ///
    /// No handle is returned: the scheduler owns the job and releases it
    /// when the last partition completes. Use [`wait_idle`](Self::wait_idle)
    /// to drain all outstanding fire-and-forget work.
    pub fn spawn<F>(&self, item_count: usize, func: F)
    where
        F: Fn(Range<usize>) + Send + Sync + 'static,
    {
        // No JobHandle is ever constructed: the in-flight partitions hold
        // the only references, and the last one to finish releases the job.
        let state = self.create_inner(item_count, 0, func);
        self.run_state(&state);
    }

    /// Block until no jobs are running.
    pub fn wait_idle(&self) {
        let mut guard = self.idle_mutex.lock();
        while self.active_jobs.load(Ordering::Acquire) > 0 {
            self.idle_condvar.wait(&mut guard);
        }
    }

    fn run_state(&self, state: &Arc<JobState>) {
        if state
            .status
            .compare_exchange(
                JobStatus::Pending as u8,
                JobStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(target: "carapace_core::jobs", id = state.id, "job already started");
            return;
        }

        let partitions = partition_ranges(state.item_count, self.partition_size(state));

        if partitions.is_empty() {
            // Nothing to execute; the job is complete the moment it runs.
            state.mark_complete();
            return;
        }

        self.active_jobs.fetch_add(1, Ordering::AcqRel);
        state
            .remaining_partitions
            .store(partitions.len(), Ordering::Release);

        tracing::trace!(
            target: "carapace_core::jobs",
            id = state.id,
            items = state.item_count,
            partitions = partitions.len(),
            "job running"
        );

        for range in partitions {
            let state = state.clone();
            let active_jobs = self.active_jobs.clone();
            let idle_mutex = self.idle_mutex.clone();
            let idle_condvar = self.idle_condvar.clone();
            self.pool.spawn(move || {
                (state.func)(range);
                if state.remaining_partitions.fetch_sub(1, Ordering::AcqRel) == 1 {
                    state.mark_complete();
                    active_jobs.fetch_sub(1, Ordering::AcqRel);
                    let _guard = idle_mutex.lock();
                    idle_condvar.notify_all();
                }
            });
        }
    }

    /// Partition size for a job: explicit chunk, or an even split.
    fn partition_size(&self, state: &JobState) -> usize {
        if state.chunk_size > 0 {
            state.chunk_size
        } else {
            state.item_count.div_ceil(self.num_threads().max(1)).max(1)
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        // Fire-and-forget partitions still reference per-job state; let them
        // finish before the pool is torn down.
        self.wait_idle();
    }
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("num_threads", &self.num_threads())
            .field("active_jobs", &self.active_jobs())
            .finish()
    }
}

static_assertions::assert_impl_all!(JobScheduler: Send, Sync);
static_assertions::assert_impl_all!(JobHandle: Send, Sync);

/// Split `[0, item_count)` into contiguous partitions of `size` items (the
/// last may be shorter). Covers the range exactly once with no overlap.
fn partition_ranges(item_count: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    let mut ranges = Vec::with_capacity(item_count.div_ceil(size));
    let mut start = 0;
    while start < item_count {
        let end = (start + size).min(item_count);
        ranges.push(start..end);
        start = end;
    }
    ranges
}
