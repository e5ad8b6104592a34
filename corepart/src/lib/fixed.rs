use crate::elements::{self, Partition, PoolSnapshot, WaitQueue};
use crate::place::{self, Strategy};
use crate::utils::myerrors::{JobNotFound, LayoutError};
use crate::utils::*;
use crate::{Job, Pool};

/// An allocator over a static, caller-supplied list of partition sizes.
/// The layout is permanent: partitions never split and never merge, and
/// a job smaller than its partition simply wastes the difference until
/// it completes (internal fragmentation, tracked for diagnostics).
pub struct FixedPool {
    base:       Units,
    total:      Units,
    partitions: Arena,
    free:       FreeIndex,
    residents:  Residency,
    queue:      WaitQueue,
    cursor:     Units,
}

impl FixedPool {
    /// Lays out one partition per entry of `sizes`, consecutive from
    /// `base`. The entries must tile the declared range exactly: an
    /// empty list, a zero-sized entry, or a sum disagreeing with
    /// `total` all fail construction.
    pub fn new(total: Units, base: Units, sizes: &[Units]) -> Result<Self, LayoutError> {
        if sizes.is_empty() {
            return Err(LayoutError::new("fixed layout needs at least one partition"));
        }
        if sizes.iter().any(|s| *s == 0) {
            return Err(LayoutError::new("fixed layout contains a zero-sized partition"));
        }
        let span: Units = sizes.iter().sum();
        if span != total {
            return Err(LayoutError::new(format!(
                "layout spans {span} units but the pool declares {total}"
            )));
        }
        let mut partitions = Arena::new();
        let mut free = FreeIndex::new();
        let mut at = base;
        for s in sizes {
            partitions.insert(at, Partition::new(*s, at));
            free.insert(at);
            at += s;
        }

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

    /// Internal fragmentation summed over all occupied partitions.
    pub fn total_fragmentation(&self) -> Units {
        self.partitions.values().map(Partition::fragmentation).sum()
    }

    fn install(&mut self, addr: Units, job: Job) {
        self.partitions
            .get_mut(&addr)
            .expect("free index out of sync")
            .occupant = Some(job);
        self.free.remove(&addr);
        self.residents.insert(job.id, addr);
    }

    /// Admits at most one waiting job, head-first, always via first fit.
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

impl Pool for FixedPool {
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
        // No coalescing by construction; the record goes back as-is.
        self.free.insert(addr);
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
        elements::snapshot(self.base, self.total, &self.partitions, &self.queue, true)
    }
}
