use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    ant::{Ant, ColonyView},
    config::{AcoConfig, DepositRule, Problem},
    error::{AcoError, Result},
    matrix::{DistanceMatrix, PheromoneMatrix},
};

/// Shortest tour found so far
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestTour {
    pub tour: Vec<usize>,
    pub length: f64,
}

/// Outcome of [Colony::solve].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// For [Problem::Tour] each node appears once and the return to the first
    /// node is implied. For [Problem::Path] this runs from origin to destination.
    pub tour: Vec<usize>,
    pub length: f64,
    pub iterations: usize,
    /// Best length after each iteration
    pub history: Vec<f64>,
}

/// Summary of a single [Colony::iterate] call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Generation {
    pub iteration: usize,
    pub generation_best: f64,
    pub best_so_far: f64,
}

/// Owns the pheromone matrix and runs generations of ants over it.
///
/// The colony keeps its pheromone matrix and best tour between calls, so
/// [Colony::solve] on the same colony continues the previous run. Build a new
/// colony for an independent run.
#[derive(Debug, Clone)]
pub struct Colony {
    config: AcoConfig,
    distances: DistanceMatrix,
    pheromones: PheromoneMatrix,
    rng: ChaCha8Rng,
    best: Option<BestTour>,
    history: Vec<f64>,
}

impl Colony {
    pub fn new(distances: DistanceMatrix, config: AcoConfig) -> Result<Self> {
        config.validate(&distances)?;
        let pheromones = PheromoneMatrix::new(distances.len(), config.pheromone_level);
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            config,
            distances,
            pheromones,
            rng,
            best: None,
            history: vec![],
        })
    }

    pub fn config(&self) -> &AcoConfig {
        &self.config
    }

    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    pub fn pheromones(&self) -> &PheromoneMatrix {
        &self.pheromones
    }

    pub fn best(&self) -> Option<&BestTour> {
        self.best.as_ref()
    }

    /// Number of completed iterations
    pub fn iterations(&self) -> usize {
        self.history.len()
    }

    /// Run the configured number of iterations and return the best tour.
    pub fn solve(&mut self) -> Result<Solution> {
        info!(
            "Solving {:?} over {} nodes with {} ants for {} iterations",
            self.config.problem,
            self.distances.len(),
            self.config.num_ants,
            self.config.iterations
        );
        for _ in 0..self.config.iterations {
            self.iterate()?;
        }
        let best = self
            .best
            .clone()
            .ok_or_else(|| AcoError::invalid("no iterations were run"))?;
        info!("Best length {} after {} iterations", best.length, self.iterations());
        Ok(Solution {
            tour: best.tour,
            length: best.length,
            iterations: self.iterations(),
            history: self.history.clone(),
        })
    }

    /// Construct one generation of ants, update the pheromones with their tours,
    /// and keep the best of them if it beats the best so far.
    ///
    /// A stuck ant fails the whole iteration and leaves the pheromones untouched.
    pub fn iterate(&mut self) -> Result<Generation> {
        let ants = self.construct_generation()?;
        self.update_pheromones(&ants)?;

        let iteration = self.history.len() + 1;
        let generation_best = ants
            .iter()
            .map(Ant::tour_length)
            .fold(f64::INFINITY, f64::min);
        if let Some(ant) = ants.into_iter().reduce(|shortest, ant| {
            if ant.tour_length() < shortest.tour_length() {
                ant
            } else {
                shortest
            }
        }) {
            let improved = self
                .best
                .as_ref()
                .map_or(true, |best| ant.tour_length() < best.length);
            if improved {
                info!(
                    "Iteration {}/{}: new best {}",
                    iteration,
                    self.config.iterations,
                    ant.tour_length()
                );
                self.best = Some(BestTour {
                    length: ant.tour_length(),
                    tour: ant.into_tour(),
                });
            }
        }

        let best_so_far = self.best.as_ref().map_or(f64::INFINITY, |best| best.length);
        self.history.push(best_so_far);
        debug!(
            "Iteration {} (generation best: {}, best: {}, pheromone: {})",
            iteration,
            generation_best,
            best_so_far,
            self.pheromones.total()
        );
        Ok(Generation {
            iteration,
            generation_best,
            best_so_far,
        })
    }

    /// Every ant gets its own generator seeded from the colony's, so a fixed seed
    /// gives the same ants whether or not they are built in parallel.
    fn construct_generation(&mut self) -> Result<Vec<Ant>> {
        let seeds = (0..self.config.num_ants)
            .map(|_| self.rng.gen::<u64>())
            .collect::<Vec<_>>();

        let len = self.distances.len();
        let problem = self.config.problem;
        let step_limit = self.config.step_limit(len);
        let view = ColonyView {
            distances: &self.distances,
            pheromones: &self.pheromones,
            alpha: self.config.alpha,
            beta: self.config.beta,
        };
        let build = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let start = match problem {
                // Tour cost does not depend on where the cycle starts
                Problem::Tour => rng.gen_range(0..len),
                Problem::Path { origin, .. } => origin,
            };
            Ant::construct(start, view, problem, step_limit, &mut rng)
        };

        // Collected per ant first so the reported failure is the lowest-indexed one
        let ants: Vec<Result<Ant>> = if self.config.parallel {
            seeds.into_par_iter().map(build).collect()
        } else {
            seeds.into_iter().map(build).collect()
        };
        ants.into_iter().collect()
    }

    /// Evaporate, then deposit along every edge of every ant's tour.
    fn update_pheromones(&mut self, ants: &[Ant]) -> Result<()> {
        self.pheromones.evaporate(self.config.evaporation_rate);
        for ant in ants {
            let quality = match self.config.deposit {
                DepositRule::Quality if ant.tour_length() > 0. => {
                    Some(self.config.q / ant.tour_length())
                }
                DepositRule::Quality => {
                    return Err(AcoError::invalid(format!(
                        "tour {:?} has zero length",
                        ant.tour()
                    )))
                }
                DepositRule::Memory => None,
            };
            for (from, to) in ant.edges() {
                let amount = match quality {
                    Some(amount) => amount,
                    None => ant.remembered(from).unwrap_or(0.),
                };
                self.pheromones.deposit(from, to, amount)?;
                if self.config.symmetric {
                    self.pheromones.deposit(to, from, amount)?;
                }
            }
        }
        Ok(())
    }
}
