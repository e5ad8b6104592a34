use serde::Serialize;

use crate::utils::*;
use crate::Job;

/// A contiguous address range within a pool. Either free or occupied by
/// exactly one [`Job`] -- never both, never by more.
///
/// Dynamic partitions are mutable in `size` (they shrink on split and
/// grow on merge); their `address` is stable until a merge destroys the
/// record altogether. Fixed partitions keep both `address` and `size`
/// for the life of the pool, with only `occupant` ever changing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    pub address:    Units,
    pub size:       Units,
    pub occupant:   Option<Job>,
}

impl Partition {
    #[inline]
    pub fn new(size: Units, address: Units) -> Self {
        Self {
            address,
            size,
            occupant: None,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }

    /// A partition fits a job iff its size covers the job's.
    /// Equality is an exact fit.
    #[inline]
    pub fn fits(&self, want: Units) -> bool {
        want <= self.size
    }

    /// Unused space inside an occupied partition. Dynamic partitions
    /// are cut to measure, so anything non-zero here belongs to a fixed
    /// pool and stays lost until the occupant completes.
    #[inline]
    pub fn fragmentation(&self) -> Units {
        match self.occupant {
            Some(ref j) => self.size - j.size,
            None        => 0,
        }
    }

    #[inline]
    pub fn status(&self) -> PartitionStatus {
        if self.is_free() {
            PartitionStatus::Free
        } else {
            PartitionStatus::Busy
        }
    }
}

/// FIFO holding area for jobs that found no fitting partition at
/// submission time. Insertion order is preserved; admission back into
/// the pool always starts scanning from the head.
#[derive(Debug, Default)]
pub struct WaitQueue {
    jobs: VecDeque<Job>,
}

impl WaitQueue {
    #[inline]
    pub fn new() -> Self {
        Self {
            jobs: VecDeque::new(),
        }
    }

    #[inline]
    pub fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Position of the first queued job satisfying `admissible`,
    /// scanning from the head.
    pub fn first_admissible<F>(&self, mut admissible: F) -> Option<usize>
    where
        F: FnMut(&Job) -> bool,
    {
        self.jobs.iter().position(|j| admissible(j))
    }

    pub fn take(&mut self, idx: usize) -> Job {
        self.jobs.remove(idx).expect("queue index out of range")
    }

    pub fn views(&self) -> Vec<WaitingView> {
        self.jobs
            .iter()
            .map(|j| WaitingView {
                id:     j.id,
                size:   j.size,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PartitionStatus {
    Free,
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OccupantView {
    pub id:     JobId,
    pub size:   Units,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartitionView {
    pub address:        Units,
    pub size:           Units,
    pub status:         PartitionStatus,
    pub occupant:       Option<OccupantView>,
    // Populated only for occupied fixed partitions; a dynamic
    // partition wastes nothing by construction.
    pub fragmentation:  Option<Units>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FreeView {
    pub address:    Units,
    pub size:       Units,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WaitingView {
    pub id:     JobId,
    pub size:   Units,
}

/// Everything a reporting collaborator needs in one bundle. Partitions
/// and free blocks come out in ascending address order, waiting jobs in
/// queue order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub base:       Units,
    pub total:      Units,
    pub partitions: Vec<PartitionView>,
    pub free:       Vec<FreeView>,
    pub waiting:    Vec<WaitingView>,
}

pub(crate) fn snapshot(
    base:           Units,
    total:          Units,
    arena:          &Arena,
    queue:          &WaitQueue,
    report_frag:    bool,
) -> PoolSnapshot {
    let partitions = arena
        .values()
        .map(|p| PartitionView {
            address:    p.address,
            size:       p.size,
            status:     p.status(),
            occupant:   p.occupant.map(|j| OccupantView {
                id:     j.id,
                size:   j.size,
            }),
            fragmentation: match p.occupant {
                Some(_) if report_frag  => Some(p.fragmentation()),
                _                       => None,
            },
        })
        .collect();
    let free = arena
        .values()
        .filter(|p| p.is_free())
        .map(|p| FreeView {
            address:    p.address,
            size:       p.size,
        })
        .collect();

    PoolSnapshot {
        base,
        total,
        partitions,
        free,
        waiting: queue.views(),
    }
}
