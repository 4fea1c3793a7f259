use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{AcoError, Result},
    matrix::DistanceMatrix,
};

/// What the ants are looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// Closed tour visiting every node exactly once (TSP).
    #[default]
    Tour,
    /// Simple path from `origin` to `destination`. Zero off-diagonal distances
    /// are treated as missing edges.
    Path { origin: usize, destination: usize },
}

/// How completed tours reinforce the pheromone matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepositRule {
    /// Each traversed edge gains `Q / tour_length`.
    #[default]
    Quality,
    /// Legacy path-finding update: each traversed edge gains the pheromone
    /// level the ant observed on it when it chose that edge, regardless of
    /// tour quality.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcoConfig {
    /// Must match the distance matrix when set
    pub num_nodes: Option<usize>,
    /// Initial intensity of every edge
    pub pheromone_level: f64,
    /// Fraction of pheromone removed per iteration, in `[0, 1]`
    pub evaporation_rate: f64,
    /// Pheromone influence exponent
    pub alpha: f64,
    /// Distance influence exponent
    pub beta: f64,
    /// Deposit scale
    #[serde(rename = "Q", alias = "q")]
    pub q: f64,
    pub num_ants: usize,
    pub iterations: usize,
    pub problem: Problem,
    pub deposit: DepositRule,
    /// Mirror every deposit onto the reverse edge
    pub symmetric: bool,
    /// Per-ant step bound for [Problem::Path], `n - 1` when unset
    pub max_steps: Option<usize>,
    pub seed: Option<u64>,
    /// Construct the ants of a generation on the rayon thread pool
    pub parallel: bool,
}

impl Default for AcoConfig {
    fn default() -> Self {
        Self {
            num_nodes: None,
            pheromone_level: 1.0,
            evaporation_rate: 0.1,
            alpha: 1.0,
            beta: 2.0,
            q: 1.0,
            num_ants: 10,
            iterations: 100,
            problem: Problem::Tour,
            deposit: DepositRule::Quality,
            symmetric: true,
            max_steps: None,
            seed: None,
            parallel: true,
        }
    }
}

impl AcoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_num_ants(mut self, num_ants: usize) -> Self {
        self.num_ants = num_ants;
        self
    }

    #[must_use]
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    #[must_use]
    pub fn with_evaporation_rate(mut self, evaporation_rate: f64) -> Self {
        self.evaporation_rate = evaporation_rate;
        self
    }

    #[must_use]
    pub fn with_pheromone_level(mut self, pheromone_level: f64) -> Self {
        self.pheromone_level = pheromone_level;
        self
    }

    #[must_use]
    pub fn with_q(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    #[must_use]
    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.problem = problem;
        self
    }

    #[must_use]
    pub fn with_deposit(mut self, deposit: DepositRule) -> Self {
        self.deposit = deposit;
        self
    }

    #[must_use]
    pub fn with_symmetric(mut self, symmetric: bool) -> Self {
        self.symmetric = symmetric;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Step bound for a single ant on a graph of `len` nodes
    pub fn step_limit(&self, len: usize) -> usize {
        self.max_steps.unwrap_or(len.saturating_sub(1))
    }

    /// Check the configuration against the distances it will be solved on.
    pub fn validate(&self, distances: &DistanceMatrix) -> Result<()> {
        let len = distances.len();
        if let Some(num_nodes) = self.num_nodes {
            if num_nodes != len {
                return Err(AcoError::invalid(format!(
                    "num_nodes is {num_nodes} but the distance matrix has {len} nodes"
                )));
            }
        }
        if !(self.pheromone_level.is_finite() && self.pheromone_level > 0.) {
            return Err(AcoError::invalid(format!(
                "pheromone_level must be positive, got {}",
                self.pheromone_level
            )));
        }
        if !(0.0..=1.0).contains(&self.evaporation_rate) {
            return Err(AcoError::invalid(format!(
                "evaporation_rate must be in [0, 1], got {}",
                self.evaporation_rate
            )));
        }
        for (name, exponent) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(exponent.is_finite() && exponent >= 0.) {
                return Err(AcoError::invalid(format!(
                    "{name} must be non-negative, got {exponent}"
                )));
            }
        }
        if !(self.q.is_finite() && self.q > 0.) {
            return Err(AcoError::invalid(format!("Q must be positive, got {}", self.q)));
        }
        if self.num_ants == 0 {
            return Err(AcoError::invalid("num_ants must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(AcoError::invalid("iterations must be at least 1"));
        }
        if self.max_steps == Some(0) {
            return Err(AcoError::invalid("max_steps must be at least 1"));
        }

        match self.problem {
            Problem::Tour => {
                if let Some((i, j)) = distances.zero_edges().next() {
                    return Err(AcoError::invalid(format!(
                        "distance ({i}, {j}) is zero, every pair of distinct nodes needs a positive distance"
                    )));
                }
            }
            Problem::Path {
                origin,
                destination,
            } => {
                for (name, node) in [("origin", origin), ("destination", destination)] {
                    if node >= len {
                        return Err(AcoError::invalid(format!(
                            "{name} {node} is out of range for {len} nodes"
                        )));
                    }
                }
                if origin == destination {
                    return Err(AcoError::invalid(format!(
                        "origin and destination are both {origin}"
                    )));
                }
            }
        }

        if self.evaporation_rate == 0. {
            warn!("Evaporation is disabled, the colony may converge prematurely");
        }
        Ok(())
    }
}
