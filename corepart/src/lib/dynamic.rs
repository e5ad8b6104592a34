use crate::elements::{self, Partition, PoolSnapshot, WaitQueue};
use crate::place::{self, Strategy};
use crate::utils::myerrors::{JobNotFound, LayoutError};
use crate::utils::*;
use crate::{Job, Pool};

/// An allocator over one initial partition spanning the whole range.
/// Allocation carves the chosen partition down to the job's exact size;
/// deallocation merges the freed range with any free address-neighbor,
/// so no two adjacent free partitions ever survive a completion.
pub struct DynamicPool {
    base:       Units,
    total:      Units,
    partitions: Arena,
    free:       FreeIndex,
    residents:  Residency,
    queue:      WaitQueue,
    cursor:     Units,
}

impl DynamicPool {
    pub fn new(total: Units, base: Units) -> Result<Self, LayoutError> {
        if total == 0 {
            return Err(LayoutError::new("dynamic pool must span at least one unit"));
        }
        let mut partitions = Arena::new();
        partitions.insert(base, Partition::new(total, base));
        let mut free = FreeIndex::new();
        free.insert(base);

        Ok(Self {
            base,
            total,
            partitions,
            free,
            residents:  Residency::default(),
            queue:      WaitQueue::new(),
            cursor:     base,
        })
    }

    /// Shrinks the chosen partition to the job's exact size and spawns a
    /// free remainder right after it. An exact fit spawns nothing.
    fn install(&mut self, addr: Units, job: Job) {
        let spare = {
            let p = self.partitions.get_mut(&addr).expect("free index out of sync");
            let spare = p.size - job.size;
            p.size = job.size;
            p.occupant = Some(job);
            spare
        };
        if spare > 0 {
            let cut = addr + job.size;
            self.partitions.insert(cut, Partition::new(spare, cut));
            self.free.insert(cut);
        }
        self.free.remove(&addr);
        self.residents.insert(job.id, addr);
    }

    /// Merges the freed partition with its free address-neighbors. The
    /// upper neighbor is folded in first, so a both-sides merge
    /// collapses into the lower record in a single pass.
    fn coalesce(&mut self, addr: Units) {
        let upper = addr + self.partitions[&addr].size;
        if self.free.remove(&upper) {
            let dead = self.partitions.remove(&upper).expect("free index out of sync");
            self.partitions
                .get_mut(&addr)
                .expect("arena out of sync")
                .size += dead.size;
        }
        let lower = self.partitions.range(..addr).next_back().map(|(a, _)| *a);
        match lower {
            Some(b) if self.free.contains(&b) => {
                let dead = self.partitions.remove(&addr).expect("arena out of sync");
                self.partitions
                    .get_mut(&b)
                    .expect("arena out of sync")
                    .size += dead.size;
            }
            _ => {
                self.free.insert(addr);
            }
        }
    }

    /// Admits at most one waiting job, head-first, always via first fit.
    /// One deallocation, one admission -- even if several now fit.
    fn retry_waiting(&mut self) {
        let hit = self.queue.first_admissible(|j| {
            place::first_fit(&self.partitions, &self.free, j.size).is_some()
        });
        if let Some(idx) = hit {
            let job = self.queue.take(idx);
            let addr = place::first_fit(&self.partitions, &self.free, job.size)
                .expect("fit vanished between scan and admission");
            self.install(addr, job);
        }
    }
}

impl Pool for DynamicPool {
    fn submit(&mut self, strategy: Strategy, job: Job) {
        match place::pick(strategy, &self.partitions, &self.free, job.size, self.cursor) {
            Some(addr) => {
                if let Strategy::Next = strategy {
                    self.cursor = addr;
                }
                self.install(addr, job);
            }
            None => {
                self.queue.push(job);
            }
        }
    }

    fn complete(&mut self, id: JobId) -> Result<(), JobNotFound> {
        let addr = self.residents.shift_remove(&id).ok_or(JobNotFound { id })?;
        self.partitions
            .get_mut(&addr)
            .expect("residency out of sync")
            .occupant = None;
        self.coalesce(addr);
        self.retry_waiting();

        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.residents.is_empty() && self.queue.is_empty()
    }

    fn residents(&self) -> Vec<JobId> {
        self.residents.keys().copied().collect()
    }

    fn snapshot(&self) -> PoolSnapshot {
        elements::snapshot(self.base, self.total, &self.partitions, &self.queue, false)
    }
}
