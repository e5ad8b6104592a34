use clap::ValueEnum;

use crate::utils::{Arena, FreeIndex, Units};

/// The four classic placement policies. Each is a pure function of the
/// free-partition set (plus, for next fit, the pool's rotation cursor):
/// picking a partition mutates nothing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum Strategy {
    /// First fitting free partition in ascending address order
    First,
    /// Fitting partition with the least leftover space
    Best,
    /// Fitting partition with the most leftover space
    Worst,
    /// First fit, but scanning starts at the rotation cursor and wraps
    Next,
}

/// Selects the start address of a free partition able to host a
/// `want`-sized job, or `None` when nothing fits -- in which case the
/// caller enqueues the job.
///
/// Ties in best/worst fit go to the first candidate encountered in
/// address order, exact fits included.
pub fn pick(
    strategy:   Strategy,
    arena:      &Arena,
    free:       &FreeIndex,
    want:       Units,
    cursor:     Units,
) -> Option<Units> {
    match strategy {
        Strategy::First => first_fit(arena, free, want),
        Strategy::Best  => best_fit(arena, free, want),
        Strategy::Worst => worst_fit(arena, free, want),
        Strategy::Next  => next_fit(arena, free, want, cursor),
    }
}

pub(crate) fn first_fit(arena: &Arena, free: &FreeIndex, want: Units) -> Option<Units> {
    free.iter().copied().find(|a| arena[a].fits(want))
}

fn best_fit(arena: &Arena, free: &FreeIndex, want: Units) -> Option<Units> {
    // Running (leftover, address) pair; replaced only on strict
    // improvement, which is what makes the tie-break deterministic.
    let mut best: Option<(Units, Units)> = None;
    for a in free.iter().copied() {
        let p = &arena[&a];
        if !p.fits(want) {
            continue;
        }
        let leftover = p.size - want;
        match best {
            Some((incumbent, _)) if leftover >= incumbent => {}
            _ => {
                best = Some((leftover, a));
            }
        }
    }

    best.map(|(_, a)| a)
}

fn worst_fit(arena: &Arena, free: &FreeIndex, want: Units) -> Option<Units> {
    let mut worst: Option<(Units, Units)> = None;
    for a in free.iter().copied() {
        let p = &arena[&a];
        if !p.fits(want) {
            continue;
        }
        let leftover = p.size - want;
        match worst {
            Some((incumbent, _)) if leftover <= incumbent => {}
            _ => {
                worst = Some((leftover, a));
            }
        }
    }

    worst.map(|(_, a)| a)
}

fn next_fit(arena: &Arena, free: &FreeIndex, want: Units, cursor: Units) -> Option<Units> {
    // Tail of the free index first, then wrap around to the part the
    // cursor already rotated past.
    free.range(cursor..)
        .chain(free.range(..cursor))
        .copied()
        .find(|a| arena[a].fits(want))
}
