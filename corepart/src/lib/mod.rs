//! Welcome to `corepart`!
//!
//! This crate models how an operating system hands out contiguous chunks
//! of a fixed address range to a stream of variably-sized jobs. Two pool
//! models are provided: [`FixedPool`], whose partitions are laid out once
//! and never change shape, and [`DynamicPool`], whose partitions are cut
//! to measure on allocation and sewn back together on deallocation. Both
//! are driven through the [`Pool`] trait and both consult the same four
//! [`Strategy`] variants when looking for a home for a job.
//!
//! The engine keeps no opinion on where jobs come from or how its state
//! is rendered. Drivers feed it arrival/completion events and read
//! [`PoolSnapshot`]s back; everything else is their problem.

mod dynamic;
mod elements;
mod fixed;
mod place;
pub mod utils;

use crate::utils::*;

pub use crate::dynamic::DynamicPool;
pub use crate::elements::{
    FreeView, OccupantView, Partition, PartitionStatus, PartitionView, PoolSnapshot, WaitQueue,
    WaitingView,
};
pub use crate::fixed::FixedPool;
pub use crate::place::Strategy;
pub use crate::utils::myerrors::{JobNotFound, LayoutError};
pub use crate::utils::{JobId, Units};

/// Our fundamental unit of interest. A [`Job`] is a complete description
/// of a request for memory: some caller wants [`size`](Job::size)
/// contiguous units, and will hold on to them until it completes.
///
/// Jobs are immutable once created. Ids are assigned by whoever generates
/// the request stream and must be unique for as long as the job is
/// anywhere inside a pool; the engine indexes residents by them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Job {
    pub id:     JobId,
    pub size:   Units,
}

impl Job {
    #[inline]
    pub fn new(id: JobId, size: Units) -> Self {
        Self { id, size }
    }
}

/// The seam between the engine and its drivers.
///
/// Every operation runs to completion before the next one is accepted.
/// There is exactly one logical actor per pool; a placement decision and
/// a deallocation never overlap. Drivers that want concurrency must wrap
/// the whole pool in one critical section, since `submit` and `complete`
/// touch several index structures that must never be observed half-done.
pub trait Pool {
    /// Runs the chosen [`Strategy`] over the free partitions and places
    /// the job, or appends it to the wait queue when nothing fits.
    /// Never fails: a job that cannot be placed is queued, not dropped.
    fn submit(&mut self, strategy: Strategy, job: Job);

    /// Releases the partition occupied by `id` and re-attempts the wait
    /// queue. Completing an id that occupies nothing leaves the pool
    /// untouched and reports [`JobNotFound`].
    fn complete(&mut self, id: JobId) -> Result<(), JobNotFound>;

    /// `true` iff no partition is occupied and no job waits. Drivers use
    /// this to know when a simulation run has drained.
    fn is_empty(&self) -> bool;

    /// Ids of currently resident jobs, in admission order.
    fn residents(&self) -> Vec<JobId>;

    /// Read-only state for external reporting. The engine itself never
    /// formats output.
    fn snapshot(&self) -> PoolSnapshot;
}
