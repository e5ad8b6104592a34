pub use std::fs::File;
pub use std::io::{self, BufRead, BufReader, BufWriter, Write};
pub use std::path::{Path, PathBuf};

pub use anyhow::{Context, Error, Result};
use itertools::Itertools;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use corepart::{Job, JobId, PartitionStatus, PoolSnapshot, Units};

/// Knobs of a generated request stream. The file format is one line of
/// four whitespace-separated integers:
///
/// ```text
/// SEQUENCE_LENGTH MIN_JOB_SIZE MAX_JOB_SIZE REMOVE_CHANCE_PERCENT
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StreamSpec {
    pub length:         usize,
    pub min_size:       Units,
    pub max_size:       Units,
    pub remove_chance:  f64,
}

impl StreamSpec {
    pub fn from_file(path: &Path) -> Result<Self> {
        let fd = File::open(path).with_context(|| format!("cannot open stream config {path:?}"))?;
        let line = BufReader::new(fd)
            .lines()
            .next()
            .ok_or_else(|| Error::msg("empty stream config"))??;
        let fields = line
            .split_whitespace()
            .map(|tok| {
                tok.parse::<usize>()
                    .with_context(|| format!("bad number {tok:?} in stream config"))
            })
            .collect::<Result<Vec<usize>>>()?;
        if fields.len() != 4 {
            return Err(Error::msg("stream config wants exactly 4 fields"));
        }

        Self::checked(fields[0], fields[1], fields[2], fields[3] as f64 / 100.0)
    }

    pub fn checked(
        length:         usize,
        min_size:       Units,
        max_size:       Units,
        remove_chance:  f64,
    ) -> Result<Self> {
        if min_size == 0 || max_size <= min_size {
            return Err(Error::msg("job sizes want 0 < MIN < MAX"));
        }
        if !(0.0..=1.0).contains(&remove_chance) {
            return Err(Error::msg("removal chance wants a percentage"));
        }

        Ok(Self {
            length,
            min_size,
            max_size,
            remove_chance,
        })
    }
}

/// Reads a fixed-pool layout: one partition size per line, blanks and
/// `#` comments skipped.
pub fn load_fixed_layout(path: &Path) -> Result<Vec<Units>> {
    let fd = File::open(path).with_context(|| format!("cannot open layout {path:?}"))?;
    let mut sizes = vec![];
    for line in BufReader::new(fd).lines() {
        let line = line?;
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        sizes.push(
            stripped
                .parse::<Units>()
                .with_context(|| format!("bad partition size {stripped:?}"))?,
        );
    }
    if sizes.is_empty() {
        return Err(Error::msg("layout file holds no partition sizes"));
    }

    Ok(sizes)
}

/// The carve-up used when no layout file is given: 10/15/25 percent
/// shares with the remainder folded into a last, big partition.
pub fn default_layout(total: Units) -> Vec<Units> {
    let mut sizes: Vec<Units> = [10, 15, 25].iter().map(|pct| total * pct / 100).collect();
    let used: Units = sizes.iter().sum();
    sizes.push(total - used);

    sizes
}

/// A reproducible stream of job arrivals, plus the coin flips that
/// interleave random completions between them. One seed, one history.
pub struct JobStream {
    spec:       StreamSpec,
    rng:        ChaCha8Rng,
    next_id:    JobId,
    emitted:    usize,
}

impl JobStream {
    pub fn new(spec: StreamSpec, seed: u64) -> Self {
        Self {
            spec,
            rng:        ChaCha8Rng::seed_from_u64(seed),
            next_id:    1,
            emitted:    0,
        }
    }

    /// Flips the configured completion coin.
    pub fn wants_removal(&mut self) -> bool {
        self.rng.gen_bool(self.spec.remove_chance)
    }

    /// Picks the next completion victim uniformly among the residents.
    pub fn pick_resident(&mut self, residents: &[JobId]) -> Option<JobId> {
        residents.choose(&mut self.rng).copied()
    }
}

impl Iterator for JobStream {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        if self.emitted == self.spec.length {
            return None;
        }
        self.emitted += 1;
        let id = self.next_id;
        self.next_id += 1;

        Some(Job::new(
            id,
            self.rng.gen_range(self.spec.min_size..self.spec.max_size),
        ))
    }
}

/// What `--json` emits once a run has drained.
#[derive(Serialize)]
pub struct RunReport {
    pub model:      String,
    pub strategy:   String,
    pub seed:       u64,
    pub snapshot:   PoolSnapshot,
}

pub fn render_free_list(w: &mut dyn Write, snap: &PoolSnapshot) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "+Free List")?;
    writeln!(w, "+--------------------+---------------+")?;
    writeln!(w, "| Beginning Address  | Block Size    |")?;
    writeln!(w, "+--------------------+---------------+")?;
    for f in &snap.free {
        writeln!(w, "| {:<18} | {:<13} |", f.address, f.size)?;
    }
    writeln!(w, "+--------------------+---------------+")
}

pub fn render_partitions(w: &mut dyn Write, snap: &PoolSnapshot) -> io::Result<()> {
    writeln!(w)?;
    writeln!(w, "+Partition Status")?;
    writeln!(w, "+---------------+-----------------+------------+--------+----------+")?;
    writeln!(w, "| Mem Address   | Partition Size  | Occupant   | Status | Wasted   |")?;
    writeln!(w, "+---------------+-----------------+------------+--------+----------+")?;
    for p in &snap.partitions {
        let occupant = match p.occupant {
            Some(o) => format!("Job {}", o.id),
            None    => String::from("-"),
        };
        let status = match p.status {
            PartitionStatus::Free => "Free",
            PartitionStatus::Busy => "Busy",
        };
        let wasted = p
            .fragmentation
            .map(|f| f.to_string())
            .unwrap_or_default();
        writeln!(
            w,
            "| {:<13} | {:<15} | {:<10} | {:<6} | {:<8} |",
            p.address, p.size, occupant, status, wasted
        )?;
    }
    writeln!(w, "+---------------+-----------------+------------+--------+----------+")
}

pub fn render_wait_queue(w: &mut dyn Write, snap: &PoolSnapshot) -> io::Result<()> {
    writeln!(w)?;
    if snap.waiting.is_empty() {
        return writeln!(w, "No jobs currently waiting.");
    }
    writeln!(w, "+Job Waiting Queue")?;
    writeln!(w, "+----------------------+")?;
    writeln!(w, "| Job                  |")?;
    writeln!(w, "+----------------------+")?;
    for j in &snap.waiting {
        writeln!(w, "| {:<20} |", format!("Job {} - {} units", j.id, j.size))?;
    }
    writeln!(w, "+----------------------+")
}

pub fn render_all(w: &mut dyn Write, snap: &PoolSnapshot) -> io::Result<()> {
    render_free_list(w, snap)?;
    render_partitions(w, snap)?;
    render_wait_queue(w, snap)
}

/// One-line digest for narration between full tables.
pub fn summary_line(snap: &PoolSnapshot) -> String {
    let busy = snap
        .partitions
        .iter()
        .filter(|p| p.status == PartitionStatus::Busy)
        .count();
    let idle: Units = snap.free.iter().map(|f| f.size).sum();
    let waiting = snap.waiting.iter().map(|j| j.id.to_string()).join(", ");

    format!(
        "{} partitions ({} busy), {} free units, waiting: [{}]",
        snap.partitions.len(),
        busy,
        idle,
        waiting
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str, content: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn stream_spec_reads_one_line() {
        let p = scratch("memrig-stream-ok", "8 10 60 25\n");
        let spec = StreamSpec::from_file(&p).unwrap();
        assert_eq!(
            spec,
            StreamSpec {
                length:         8,
                min_size:       10,
                max_size:       60,
                remove_chance:  0.25,
            }
        );
    }

    #[test]
    fn stream_spec_rejects_garbage() {
        let short = scratch("memrig-stream-short", "8 10\n");
        assert!(StreamSpec::from_file(&short).is_err());
        let words = scratch("memrig-stream-words", "a b c d\n");
        assert!(StreamSpec::from_file(&words).is_err());
        assert!(StreamSpec::checked(8, 60, 10, 0.25).is_err());
        assert!(StreamSpec::checked(8, 10, 60, 2.5).is_err());
    }

    #[test]
    fn layout_skips_comments_and_blanks() {
        let p = scratch("memrig-layout", "# teaching layout\n\n20\n30\n50\n");
        assert_eq!(load_fixed_layout(&p).unwrap(), vec![20, 30, 50]);
        let empty = scratch("memrig-layout-empty", "# nothing here\n");
        assert!(load_fixed_layout(&empty).is_err());
    }

    #[test]
    fn default_layout_tiles_the_total() {
        for total in [200, 97, 1024] {
            assert_eq!(default_layout(total).iter().sum::<Units>(), total);
        }
    }

    #[test]
    fn job_streams_with_one_seed_agree() {
        let spec = StreamSpec::checked(32, 10, 60, 0.25).unwrap();
        let a: Vec<Job> = JobStream::new(spec, 62).collect();
        let b: Vec<Job> = JobStream::new(spec, 62).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.iter().all(|j| (10..60).contains(&j.size)));
        // Ids are monotone from 1.
        assert!(a.iter().enumerate().all(|(n, j)| j.id as usize == n + 1));
    }

    #[test]
    fn tables_render_what_the_pool_holds() {
        use corepart::{FixedPool, Pool, Strategy};

        let mut pool = FixedPool::new(100, 0, &[20, 30, 50]).unwrap();
        pool.submit(Strategy::First, Job::new(1, 18));
        pool.submit(Strategy::First, Job::new(2, 70));
        let snap = pool.snapshot();

        let mut out: Vec<u8> = vec![];
        render_all(&mut out, &snap).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Beginning Address"));
        assert!(text.contains("Job 1"));
        assert!(text.contains("Job 2 - 70 units"));

        assert_eq!(summary_line(&snap), "3 partitions (1 busy), 80 free units, waiting: [2]");
    }
}
