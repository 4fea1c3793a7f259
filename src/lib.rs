//! Ant Colony Optimization for closed tours (TSP) and simple paths.
//!
//! <https://en.wikipedia.org/wiki/Ant_colony_optimization_algorithms>

pub mod ant;
pub mod colony;
pub mod config;
pub mod error;
pub mod math;
pub mod matrix;
pub mod sampling;

pub use ant::{Ant, ColonyView};
pub use colony::{BestTour, Colony, Generation, Solution};
pub use config::{AcoConfig, DepositRule, Problem};
pub use error::{AcoError, Result};
pub use matrix::{DistanceMatrix, PheromoneMatrix};

/// Validate `config` against `distances` and run a fresh colony to completion.
pub fn solve(distances: DistanceMatrix, config: AcoConfig) -> Result<Solution> {
    Colony::new(distances, config)?.solve()
}
