use clap::{Parser, ValueEnum};

use corepart::{DynamicPool, FixedPool, Pool, Strategy, Units};
use memrig::*;

/// Replays a random job stream against the classic partition models
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Placement strategy
    #[arg(value_enum)]
    strategy:   Strategy,

    /// Which pool models to run
    #[arg(value_enum, default_value_t = Model::Both)]
    model:      Model,

    /// Total pool span in units
    #[arg(short, long, default_value_t = 200)]
    size:       Units,

    /// Base address of the pool
    #[arg(short, long, default_value_t = 0)]
    base:       Units,

    /// Fixed layout file, one partition size per line
    #[arg(long, value_parser = clap::value_parser!(PathBuf))]
    layout:     Option<PathBuf>,

    /// Stream config file: LENGTH MIN MAX REMOVE_PERCENT on one line
    #[arg(long, value_parser = clap::value_parser!(PathBuf))]
    stream:     Option<PathBuf>,

    /// Number of job arrivals when no stream file is given
    #[arg(long, default_value_t = 12)]
    jobs:       usize,

    /// Smallest generated job
    #[arg(long, default_value_t = 10)]
    min_size:   Units,

    /// Largest generated job (exclusive)
    #[arg(long, default_value_t = 60)]
    max_size:   Units,

    /// Percent chance of a random completion after each arrival
    #[arg(long, default_value_t = 25)]
    remove_chance: u8,

    /// RNG seed; one seed reproduces one history
    #[arg(long, default_value_t = 62)]
    seed:       u64,

    /// Write the report here instead of stdout
    #[arg(short, long, value_parser = clap::value_parser!(PathBuf))]
    output:     Option<PathBuf>,

    /// Emit final snapshots as JSON instead of per-event tables
    #[arg(long)]
    json:       bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Model {
    /// Static partition layout, loaded once
    Fixed,
    /// Splittable/coalescible partitions
    Dynamic,
    /// Same stream through both models
    Both,
}

// `default_value_t` renders the default through Display.
impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Model::Fixed    => "fixed",
            Model::Dynamic  => "dynamic",
            Model::Both     => "both",
        };
        write!(f, "{name}")
    }
}

fn main() -> Result<()> {
    let cli = Args::parse();
    let spec = match cli.stream {
        Some(ref p) => StreamSpec::from_file(p)?,
        None => StreamSpec::checked(
            cli.jobs,
            cli.min_size,
            cli.max_size,
            cli.remove_chance as f64 / 100.0,
        )?,
    };
    let layout = match cli.layout {
        Some(ref p) => load_fixed_layout(p)?,
        None        => default_layout(cli.size),
    };
    let mut sink: Box<dyn Write> = match cli.output {
        Some(ref p) => Box::new(BufWriter::new(File::create(p)?)),
        None        => Box::new(io::stdout()),
    };

    // Every model replays the same seed, so each one sees the same
    // arrivals and the same removal coin flips.
    let mut reports = vec![];
    if cli.model != Model::Dynamic {
        let total: Units = layout.iter().sum();
        let mut pool = FixedPool::new(total, cli.base, &layout)?;
        writeln!(sink, "FIXED MEMORY SIMULATION")?;
        simulate(&mut pool, &spec, &cli, &mut sink)?;
        reports.push(report("fixed", &cli, pool.snapshot()));
        writeln!(sink, "total internal fragmentation: {} units", pool.total_fragmentation())?;
    }
    if cli.model != Model::Fixed {
        let mut pool = DynamicPool::new(cli.size, cli.base)?;
        writeln!(sink, "DYNAMIC MEMORY SIMULATION")?;
        simulate(&mut pool, &spec, &cli, &mut sink)?;
        reports.push(report("dynamic", &cli, pool.snapshot()));
    }
    if cli.json {
        serde_json::to_writer_pretty(&mut sink, &reports)?;
        writeln!(sink)?;
    }

    Ok(())
}

fn report(model: &str, cli: &Args, snapshot: corepart::PoolSnapshot) -> RunReport {
    RunReport {
        model:      model.into(),
        strategy:   format!("{:?}", cli.strategy),
        seed:       cli.seed,
        snapshot,
    }
}

/// Feeds the whole stream into the pool, interleaving random
/// completions, then keeps completing residents until the pool drains.
fn simulate<P: Pool>(
    pool:   &mut P,
    spec:   &StreamSpec,
    cli:    &Args,
    sink:   &mut Box<dyn Write>,
) -> Result<()> {
    let chatty = !cli.json;
    let mut stream = JobStream::new(*spec, cli.seed);
    while let Some(job) = stream.next() {
        writeln!(sink, "\n***ADD JOB {} ({} units)", job.id, job.size)?;
        pool.submit(cli.strategy, job);
        if chatty {
            render_all(sink, &pool.snapshot())?;
        }
        if stream.wants_removal() {
            remove_random(pool, &mut stream, sink, chatty)?;
        }
    }
    while !pool.is_empty() {
        if !remove_random(pool, &mut stream, sink, chatty)? {
            // Nothing resident, yet jobs still wait: they can never be
            // admitted, since no completion will come.
            let waiting = pool.snapshot().waiting.len();
            writeln!(sink, "\n{waiting} waiting job(s) fit no partition; stopping.")?;
            break;
        }
    }
    writeln!(sink, "\n{}", summary_line(&pool.snapshot()))?;

    Ok(())
}

fn remove_random<P: Pool>(
    pool:   &mut P,
    stream: &mut JobStream,
    sink:   &mut Box<dyn Write>,
    chatty: bool,
) -> Result<bool> {
    let residents = pool.residents();
    match stream.pick_resident(&residents) {
        Some(id) => {
            writeln!(sink, "\n***REMOVE JOB {id}")?;
            if let Err(e) = pool.complete(id) {
                // Recoverable per the engine's contract; narrate and
                // move on.
                writeln!(sink, "{e}; no job was removed.")?;
            }
            if chatty {
                render_all(sink, &pool.snapshot())?;
            }
            Ok(true)
        }
        None => Ok(false),
    }
}
