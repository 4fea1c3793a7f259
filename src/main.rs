use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::PathBuf,
};

use anyhow::Context;
use antcolony::{AcoConfig, DistanceMatrix, Solution};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Opt {
    /// A path to a JSON problem file, else reads from stdin
    file: Option<PathBuf>,

    /// Output file path (overwrites old files), else writes to stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ants per iteration
    #[arg(long)]
    ants: Option<usize>,

    #[arg(long)]
    iterations: Option<usize>,

    /// Pheromone influence exponent
    #[arg(long)]
    alpha: Option<f64>,

    /// Distance influence exponent
    #[arg(long)]
    beta: Option<f64>,

    /// Fraction of pheromone removed per iteration
    #[arg(long)]
    evaporation_rate: Option<f64>,

    /// Pheromone deposit scale
    #[arg(long)]
    q: Option<f64>,

    /// Build ants one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// Log more (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Opt {
    fn apply(&self, mut config: AcoConfig) -> AcoConfig {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ants) = self.ants {
            config.num_ants = ants;
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(beta) = self.beta {
            config.beta = beta;
        }
        if let Some(evaporation_rate) = self.evaporation_rate {
            config.evaporation_rate = evaporation_rate;
        }
        if let Some(q) = self.q {
            config.q = q;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProblemFile {
    distances: Vec<Vec<f64>>,
    #[serde(default)]
    config: AcoConfig,
}

fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    let level = match opt.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let problem: ProblemFile = match &opt.file {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(io::BufReader::new(file))
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => {
            info!("Reading from stdin");
            let mut bytes = vec![];
            io::stdin().read_to_end(&mut bytes)?;
            serde_json::from_slice(&bytes).context("parsing stdin")?
        }
    };

    let distances = DistanceMatrix::from_rows(problem.distances)?;
    let config = opt.apply(problem.config);
    let solution: Solution = antcolony::solve(distances, config)?;

    let mut out: Box<dyn Write> = match &opt.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut out, &solution)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
