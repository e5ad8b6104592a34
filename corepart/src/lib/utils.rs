pub use std::collections::{BTreeMap, BTreeSet, VecDeque};
pub use std::hash::BuildHasherDefault;

use ahash::AHasher;
use indexmap::IndexMap;

use crate::elements::Partition;

/// The unit for measuring both addresses and sizes. The engine does not
/// care whether a unit is a byte, a kilobyte or a page, as long as every
/// collaborator agrees on one meaning per pool.
pub type Units = usize;

/// Job identifiers. Assigned monotonically by the request generator;
/// the engine only demands uniqueness while the job is resident or
/// waiting.
pub type JobId = u32;

/// All partition records of a pool, keyed by their start address. The
/// union of the stored ranges tiles the pool's address space at all
/// times, with no gaps and no overlaps.
pub type Arena = BTreeMap<Units, Partition>;

/// Start addresses of the currently free partitions. Kept ordered so
/// that linear scans (first/best/worst fit) and range scans (next fit)
/// come for free.
pub type FreeIndex = BTreeSet<Units>;

/// Which partition, by start address, each resident job occupies.
/// Insertion order doubles as admission order.
pub type Residency = IndexMap<JobId, Units, BuildHasherDefault<AHasher>>;

pub mod myerrors {
    use thiserror::Error;

    use super::JobId;

    /// A completion was requested for a job id that occupies no
    /// partition. Recoverable: the pool's state is left untouched.
    #[derive(Error, Debug)]
    #[error("no resident job with id {}", id)]
    pub struct JobNotFound {
        pub id: JobId,
    }

    /// The requested pool geometry cannot produce a well-formed
    /// partition table. Fatal at construction time.
    #[derive(Error, Debug)]
    #[error("{message}")]
    pub struct LayoutError {
        pub message: String,
    }

    impl LayoutError {
        pub fn new<S: Into<String>>(message: S) -> Self {
            Self {
                message: message.into(),
            }
        }
    }
}
